use axum::{
    extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use orgdesk_auth::PermissionSet;
use orgdesk_db::object_id::{OrganizationId, UserId};
use serde::{Deserialize, Serialize};

use crate::{auth::Authenticated, shared_state::AppState, Error};

#[derive(Debug, Deserialize)]
struct MeQuery {
    organization: Option<OrganizationId>,
}

#[derive(Debug, Serialize)]
struct OrgPermissions {
    id: OrganizationId,
    permissions: PermissionSet,
}

#[derive(Debug, Serialize)]
struct MyPermissions {
    user_id: UserId,
    superadmin: bool,
    system: PermissionSet,
    organization: Option<OrgPermissions>,
}

/// The caller's own effective permissions, for clients deciding what to show. This needs no
/// permission beyond being signed in.
async fn my_permissions(
    auth: Authenticated,
    Query(query): Query<MeQuery>,
) -> Result<impl IntoResponse, Error> {
    let system = auth.0.system_permissions().await?;
    let superadmin = auth.0.is_superadmin().await?;

    let organization = match query.organization {
        Some(org) => Some(OrgPermissions {
            id: org,
            permissions: (*auth.0.org_permissions(org.into_inner()).await?).clone(),
        }),
        None => None,
    };

    Ok((
        StatusCode::OK,
        Json(MyPermissions {
            user_id: auth.user_id(),
            superadmin,
            system: (*system).clone(),
            organization,
        }),
    ))
}

pub fn configure() -> Router<AppState> {
    Router::new().route("/me/permissions", get(my_permissions))
}
