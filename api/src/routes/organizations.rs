use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use garde::Validate;
use serde::Deserialize;
use serde_json::json;

use db::{
    object_id::OrganizationId,
    organizations::{NewOrganization, Organization, OrganizationUpdate},
    PoolExt,
};
use orgdesk_auth::SystemCode;
use orgdesk_db as db;

use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

#[derive(Debug, Deserialize, Validate)]
pub struct NewOrganizationInput {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(pattern(r"^[a-z0-9]+(-[a-z0-9]+)*$"))]
    pub slug: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrganizationUpdateInput {
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(pattern(r"^[a-z0-9]+(-[a-z0-9]+)*$"))]
    pub slug: Option<String>,
}

async fn list_organizations(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::OrganizationsView).await?;

    let orgs = state
        .db
        .interact(|conn| {
            db::organizations::table
                .select(Organization::as_select())
                .order_by(db::organizations::name)
                .load::<Organization>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::OK, Json(orgs)))
}

async fn get_organization(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::OrganizationsView).await?;
    let org = fetch_organization(&state, org_id).await?;
    Ok((StatusCode::OK, Json(org)))
}

pub(super) async fn fetch_organization(
    state: &AppState,
    org_id: OrganizationId,
) -> Result<Organization, Error> {
    state
        .db
        .interact(move |conn| {
            db::organizations::table
                .select(Organization::as_select())
                .filter(db::organizations::organization_id.eq(org_id))
                .first::<Organization>(conn)
                .optional()
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::ObjectNotFound("organization"))
}

async fn new_organization(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<NewOrganizationInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::OrganizationsManage).await?;
    validate_struct(&body)?;

    let value = NewOrganization {
        organization_id: OrganizationId::new(),
        name: body.name,
        slug: body.slug,
    };

    let org = state
        .db
        .interact(move |conn| {
            diesel::insert_into(db::organizations::table)
                .values(&value)
                .returning(Organization::as_select())
                .get_result::<Organization>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(org)))
}

async fn write_organization(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
    Json(body): Json<OrganizationUpdateInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::OrganizationsManage).await?;
    validate_struct(&body)?;

    let update = OrganizationUpdate {
        name: body.name,
        slug: body.slug,
        updated: Some(Utc::now()),
    };
    let org = update_organization(&state, org_id, update).await?;
    Ok((StatusCode::OK, Json(org)))
}

pub(super) async fn update_organization(
    state: &AppState,
    org_id: OrganizationId,
    update: OrganizationUpdate,
) -> Result<Organization, Error> {
    state
        .db
        .interact(move |conn| {
            diesel::update(db::organizations::table)
                .filter(db::organizations::organization_id.eq(org_id))
                .set(&update)
                .returning(Organization::as_select())
                .get_result::<Organization>(conn)
                .optional()
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::ObjectNotFound("organization"))
}

/// Fails while the organization still owns custom groups or has template memberships scoped to
/// it. Departments and news go with the organization.
async fn delete_organization(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::OrganizationsManage).await?;

    state
        .db
        .transaction(move |conn| {
            let dependents = db::organizations::dependent_count(conn, org_id)?;
            if dependents > 0 {
                return Err(Error::InUse("organization", dependents));
            }

            let deleted = diesel::delete(db::organizations::table)
                .filter(db::organizations::organization_id.eq(org_id))
                .execute(conn)?;
            if deleted == 0 {
                return Err(Error::ObjectNotFound("organization"));
            }

            Ok(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/", get(list_organizations).post(new_organization))
        .route(
            "/:org_id",
            get(get_organization)
                .put(write_organization)
                .delete(delete_organization),
        )
}
