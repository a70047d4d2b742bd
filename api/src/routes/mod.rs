use axum::Router;
use diesel::PgConnection;
use garde::Validate;
use orgdesk_db::object_id::{OrganizationId, UserId};
use serde::Deserialize;

use crate::{shared_state::AppState, Error};

mod custom_groups;
mod departments;
mod health;
mod me;
mod news;
mod org_info;
mod organizations;
mod permissions;
mod system_groups;
mod template_groups;
mod users;

pub fn configure_routes() -> Router<AppState> {
    let api = Router::new()
        .merge(health::configure())
        .merge(me::configure())
        .nest("/users", users::configure())
        .nest("/organizations", organizations::configure())
        .merge(permissions::configure())
        .nest("/system_groups", system_groups::configure())
        .nest("/template_groups", template_groups::configure())
        .merge(org_info::configure())
        .merge(custom_groups::configure())
        .merge(departments::configure())
        .merge(news::configure());

    Router::new().nest("/api", api)
}

/// Body for creating any kind of permission group.
#[derive(Debug, Deserialize, Validate)]
pub struct NewGroupInput {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(inner(length(min = 1)))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GroupUpdateInput {
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(skip)]
    pub description: Option<String>,
    /// Replaces the whole bundle when present. Unknown codes are rejected when resolved.
    #[garde(skip)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MemberInput {
    pub user_id: UserId,
}

/// Membership and content inserts reference these rows. Checking first turns a missing row
/// into a 404 instead of a foreign key violation.
pub(super) fn ensure_user(conn: &mut PgConnection, id: UserId) -> Result<(), Error> {
    if orgdesk_db::users::exists(conn, id)? {
        Ok(())
    } else {
        Err(Error::ObjectNotFound("user"))
    }
}

/// Locks the organization row until the transaction ends.
pub(super) fn lock_organization(conn: &mut PgConnection, id: OrganizationId) -> Result<(), Error> {
    if orgdesk_db::organizations::lock(conn, id)? {
        Ok(())
    } else {
        Err(Error::ObjectNotFound("organization"))
    }
}
