use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use garde::Validate;
use serde::Deserialize;

use orgdesk_auth::OrgCode;
use orgdesk_db::{object_id::OrganizationId, organizations::OrganizationUpdate};

use super::organizations::{fetch_organization, update_organization};
use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

/// The slug is managed from the system console only.
#[derive(Debug, Deserialize, Validate)]
pub struct OrgInfoInput {
    #[garde(length(min = 1))]
    pub name: String,
}

async fn get_info(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::InfoView).await?;
    let org = fetch_organization(&state, org_id).await?;
    Ok((StatusCode::OK, Json(org)))
}

async fn write_info(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
    Json(body): Json<OrgInfoInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::InfoEdit).await?;
    validate_struct(&body)?;

    let update = OrganizationUpdate {
        name: Some(body.name),
        slug: None,
        updated: Some(Utc::now()),
    };
    let org = update_organization(&state, org_id, update).await?;
    Ok((StatusCode::OK, Json(org)))
}

pub fn configure() -> Router<AppState> {
    Router::new().route("/orgs/:org_id", get(get_info).put(write_info))
}
