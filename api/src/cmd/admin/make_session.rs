use chrono::{Duration, Utc};
use clap::Args;
use diesel::prelude::*;
use eyre::{eyre, Result};

use db::{
    object_id::{SessionId, UserId},
    sessions::Session,
};
use orgdesk_db as db;

#[derive(Debug, Args)]
pub struct MakeSessionArgs {
    /// The email of the user the session belongs to
    #[clap(long)]
    email: String,
    /// How long the session stays valid
    #[clap(long, default_value_t = 24)]
    hours: i64,
}

/// Prints the new token, to be sent as `Authorization: Bearer <token>`.
pub fn make_session(conn: &mut PgConnection, args: MakeSessionArgs) -> Result<()> {
    let user_id = db::users::table
        .select(db::users::user_id)
        .filter(db::users::email.eq(&args.email))
        .first::<UserId>(conn)
        .optional()?
        .ok_or_else(|| eyre!("No user with email {}", args.email))?;

    let session = Session {
        session_id: SessionId::new(),
        user_id,
        expires: Utc::now() + Duration::hours(args.hours),
    };

    diesel::insert_into(db::sessions::table)
        .values(&session)
        .execute(conn)?;

    println!("{}", session.session_id);
    Ok(())
}
