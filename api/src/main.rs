use clap::{Parser, Subcommand};

mod cmd {
    pub mod admin;
    pub mod server;
}

#[derive(Debug, Parser)]
#[clap(name = "orgdesk", about = "Multi-tenant administration console")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP server
    Server(orgdesk_api::config::Config),
    /// Administrative tasks that run directly against the database
    Admin(cmd::admin::AdminArgs),
}

#[tokio::main]
async fn main() -> Result<(), eyre::Report> {
    color_eyre::install()?;
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Server(config) => cmd::server::run(config).await?,
        Commands::Admin(args) => cmd::admin::admin_commands(args)?,
    }

    Ok(())
}
