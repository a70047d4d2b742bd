use clap::{Args, Subcommand};
use diesel::{Connection, PgConnection};

use orgdesk_db::object_id;

mod bootstrap;
mod make_session;

#[derive(Debug, Args)]
pub struct AdminArgs {
    #[clap(subcommand)]
    commands: Commands,

    #[clap(long = "db", env = "DATABASE_URL", global = true)]
    database_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an object ID
    ///
    /// This is useful for preparing initial data or for testing.
    MakeId(MakeId),
    /// Create a user holding `system.superadmin`, or grant it to an existing user.
    ///
    /// Until someone can log in there is no other way to reach the console.
    BootstrapSuperadmin(bootstrap::BootstrapArgs),
    /// Issue a session token for a user
    MakeSession(make_session::MakeSessionArgs),
}

#[derive(Debug, Args)]
pub struct MakeId {
    #[clap(subcommand)]
    command: IdType,
}

#[derive(Debug, Subcommand)]
enum IdType {
    User,
    Organization,
    SystemPermission,
    OrgPermission,
    SystemGroup,
    TemplateGroup,
    CustomGroup,
    Department,
    News,
    Session,
}

pub fn admin_commands(cmd: AdminArgs) -> Result<(), eyre::Report> {
    match cmd.commands {
        Commands::MakeId(MakeId { command }) => make_id(command),
        Commands::BootstrapSuperadmin(args) => {
            let mut conn = connect(cmd.database_url)?;
            bootstrap::bootstrap(&mut conn, args)?;
        }
        Commands::MakeSession(args) => {
            let mut conn = connect(cmd.database_url)?;
            make_session::make_session(&mut conn, args)?;
        }
    }

    Ok(())
}

fn connect(database_url: Option<String>) -> Result<PgConnection, eyre::Report> {
    let url = database_url.ok_or_else(|| eyre::eyre!("DATABASE_URL is not set"))?;
    let conn = PgConnection::establish(url.as_str())?;
    Ok(conn)
}

fn make_id(id: IdType) {
    let id = match id {
        IdType::User => object_id::UserId::new().to_string(),
        IdType::Organization => object_id::OrganizationId::new().to_string(),
        IdType::SystemPermission => object_id::SystemPermissionId::new().to_string(),
        IdType::OrgPermission => object_id::OrgPermissionId::new().to_string(),
        IdType::SystemGroup => object_id::SystemGroupId::new().to_string(),
        IdType::TemplateGroup => object_id::TemplateGroupId::new().to_string(),
        IdType::CustomGroup => object_id::CustomGroupId::new().to_string(),
        IdType::Department => object_id::DepartmentId::new().to_string(),
        IdType::News => object_id::NewsId::new().to_string(),
        IdType::Session => object_id::SessionId::new().to_string(),
    };

    println!("{id}");
}
