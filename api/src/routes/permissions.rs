//! The two permission code catalogs. Listing goes through the registry; creating and deleting
//! codes is ordinary guarded CRUD.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use diesel::prelude::*;
use garde::Validate;
use serde::Deserialize;
use serde_json::json;

use db::{
    object_id::{OrgPermissionId, SystemPermissionId},
    permissions::{NewOrgPermission, NewSystemPermission, OrgPermission, SystemPermission},
    PoolExt,
};
use orgdesk_auth::{OrgCode, SystemCode};
use orgdesk_db as db;

use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

#[derive(Debug, Deserialize, Validate)]
pub struct NewSystemPermissionInput {
    #[garde(pattern(r"^system\.[a-z0-9_]+(\.[a-z0-9_]+)*$"))]
    pub code: String,
    #[garde(skip)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewOrgPermissionInput {
    #[garde(pattern(r"^org\.[a-z0-9_]+(\.[a-z0-9_]+)*$"))]
    pub code: String,
    #[garde(skip)]
    pub description: Option<String>,
}

async fn list_system_permissions(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::PermissionsView).await?;
    let perms = state.registry.list_system_permissions().await?;
    Ok((StatusCode::OK, Json(perms)))
}

async fn list_org_permissions(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::PermissionsView).await?;
    let perms = state.registry.list_org_permissions().await?;
    Ok((StatusCode::OK, Json(perms)))
}

async fn new_system_permission(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<NewSystemPermissionInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::PermissionsManage).await?;
    validate_struct(&body)?;

    let value = NewSystemPermission {
        system_permission_id: SystemPermissionId::new(),
        code: body.code,
        description: body.description.unwrap_or_default(),
    };

    let perm = state
        .db
        .interact(move |conn| {
            diesel::insert_into(db::permissions::system_permissions::table)
                .values(&value)
                .returning(SystemPermission::as_select())
                .get_result::<SystemPermission>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(perm)))
}

async fn new_org_permission(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<NewOrgPermissionInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::PermissionsManage).await?;
    validate_struct(&body)?;

    let value = NewOrgPermission {
        org_permission_id: OrgPermissionId::new(),
        code: body.code,
        description: body.description.unwrap_or_default(),
    };

    let perm = state
        .db
        .interact(move |conn| {
            diesel::insert_into(db::permissions::org_permissions::table)
                .values(&value)
                .returning(OrgPermission::as_select())
                .get_result::<OrgPermission>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(perm)))
}

async fn delete_system_permission(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::PermissionsManage).await?;

    if SystemCode::ALL.iter().any(|c| c.as_str() == code) {
        return Err(Error::BuiltinPermission(code));
    }

    state
        .db
        .transaction(move |conn| {
            use db::permissions::system_permissions::dsl;
            let id = dsl::system_permissions
                .select(dsl::system_permission_id)
                .filter(dsl::code.eq(&code))
                .first::<SystemPermissionId>(conn)
                .optional()?
                .ok_or(Error::ObjectNotFound("permission"))?;

            let references = db::permissions::system_permission_references(conn, id)?;
            if references > 0 {
                return Err(Error::InUse("permission", references));
            }

            diesel::delete(dsl::system_permissions)
                .filter(dsl::system_permission_id.eq(id))
                .execute(conn)?;
            Ok(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

async fn delete_org_permission(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::PermissionsManage).await?;

    if OrgCode::ALL.iter().any(|c| c.as_str() == code) {
        return Err(Error::BuiltinPermission(code));
    }

    state
        .db
        .transaction(move |conn| {
            use db::permissions::org_permissions::dsl;
            let id = dsl::org_permissions
                .select(dsl::org_permission_id)
                .filter(dsl::code.eq(&code))
                .first::<OrgPermissionId>(conn)
                .optional()?
                .ok_or(Error::ObjectNotFound("permission"))?;

            let references = db::permissions::org_permission_references(conn, id)?;
            if references > 0 {
                return Err(Error::InUse("permission", references));
            }

            diesel::delete(dsl::org_permissions)
                .filter(dsl::org_permission_id.eq(id))
                .execute(conn)?;
            Ok(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route(
            "/system_permissions",
            get(list_system_permissions).post(new_system_permission),
        )
        .route("/system_permissions/:code", delete(delete_system_permission))
        .route(
            "/org_permissions",
            get(list_org_permissions).post(new_org_permission),
        )
        .route("/org_permissions/:code", delete(delete_org_permission))
}
