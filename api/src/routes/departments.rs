use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use garde::Validate;
use serde::Deserialize;
use serde_json::json;

use db::{
    departments::{Department, NewDepartment},
    object_id::{DepartmentId, OrganizationId},
    ordering::MoveDirection,
    PoolExt,
};
use orgdesk_auth::OrgCode;
use orgdesk_db as db;

use super::lock_organization;
use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

#[derive(Debug, Deserialize, Validate)]
pub struct DepartmentInput {
    #[garde(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveInput {
    pub direction: MoveDirection,
}

fn list_in_org(conn: &mut PgConnection, org_id: OrganizationId) -> Result<Vec<Department>, Error> {
    db::departments::table
        .select(Department::as_select())
        .filter(db::departments::organization_id.eq(org_id))
        .order_by((db::departments::sort_order, db::departments::department_id))
        .load::<Department>(conn)
        .map_err(Error::from)
}

async fn list_departments(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::DepartmentsView).await?;

    let departments = state
        .db
        .interact(move |conn| list_in_org(conn, org_id))
        .await?;

    Ok((StatusCode::OK, Json(departments)))
}

/// New departments go to the end of the list.
async fn new_department(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
    Json(body): Json<DepartmentInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::DepartmentsEdit).await?;
    validate_struct(&body)?;

    let department = state
        .db
        .transaction(move |conn| {
            lock_organization(conn, org_id)?;
            let sort_order = db::departments::next_sort_order(conn, org_id)?;
            diesel::insert_into(db::departments::table)
                .values(NewDepartment {
                    department_id: DepartmentId::new(),
                    organization_id: org_id,
                    name: body.name,
                    sort_order,
                })
                .returning(Department::as_select())
                .get_result::<Department>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(department)))
}

async fn write_department(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, department_id)): Path<(OrganizationId, DepartmentId)>,
    Json(body): Json<DepartmentInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::DepartmentsEdit).await?;
    validate_struct(&body)?;

    let department = state
        .db
        .interact(move |conn| {
            diesel::update(db::departments::table)
                .filter(db::departments::department_id.eq(department_id))
                .filter(db::departments::organization_id.eq(org_id))
                .set((
                    db::departments::name.eq(body.name),
                    db::departments::updated.eq(Utc::now()),
                ))
                .returning(Department::as_select())
                .get_result::<Department>(conn)
                .optional()
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::ObjectNotFound("department"))?;

    Ok((StatusCode::OK, Json(department)))
}

async fn delete_department(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, department_id)): Path<(OrganizationId, DepartmentId)>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::DepartmentsDelete).await?;

    let deleted = state
        .db
        .interact(move |conn| {
            diesel::delete(db::departments::table)
                .filter(db::departments::department_id.eq(department_id))
                .filter(db::departments::organization_id.eq(org_id))
                .execute(conn)
                .map_err(Error::from)
        })
        .await?;

    if deleted == 0 {
        return Err(Error::ObjectNotFound("department"));
    }

    Ok((StatusCode::OK, Json(json!({}))))
}

/// Swap the department with its neighbour and return the reordered list.
async fn move_department(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, department_id)): Path<(OrganizationId, DepartmentId)>,
    Json(body): Json<MoveInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::DepartmentsEdit).await?;

    let departments = state
        .db
        .transaction(move |conn| {
            db::departments::move_department::<Error>(conn, org_id, department_id, body.direction)?;
            list_in_org(conn, org_id)
        })
        .await?;

    Ok((StatusCode::OK, Json(departments)))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route(
            "/orgs/:org_id/departments",
            get(list_departments).post(new_department),
        )
        .route(
            "/orgs/:org_id/departments/:department_id",
            put(write_department).delete(delete_department),
        )
        .route(
            "/orgs/:org_id/departments/:department_id/move",
            post(move_department),
        )
}
