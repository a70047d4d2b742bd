use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct Config {
    #[clap(short = 'H', long, env, default_value_t = String::from("127.0.0.1"))]
    pub host: String,
    #[clap(short, long, env, default_value_t = 7205)]
    pub port: u16,

    #[clap(long, env, default_value_t = String::from("production"))]
    pub env: String,

    #[clap(long = "db", env)]
    pub database_url: String,

    #[clap(long, env, default_value_t = 16)]
    pub database_pool_size: usize,

    #[clap(long, env)]
    pub honeycomb_team: Option<String>,
    #[clap(long, env, default_value_t = String::from("orgdesk"))]
    pub honeycomb_dataset: String,
}

impl Config {
    /// Production mode hides error details from clients.
    pub fn production(&self) -> bool {
        self.env != "development" && self.env != "test" && !cfg!(debug_assertions)
    }
}
