use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use serde_json::json;

use db::{
    object_id::{SystemGroupId, UserId},
    system_groups::{NewSystemGroup, SystemGroup, SystemGroupMember, SystemGroupUpdate},
    PoolExt,
};
use orgdesk_auth::SystemCode;
use orgdesk_db as db;

use super::{ensure_user, GroupUpdateInput, MemberInput, NewGroupInput};
use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

#[derive(Debug, Serialize)]
pub struct GroupDetails {
    #[serde(flatten)]
    group: SystemGroup,
    permissions: Vec<String>,
    members: Vec<UserId>,
}

fn load_details(conn: &mut PgConnection, group_id: SystemGroupId) -> Result<GroupDetails, Error> {
    let group = db::system_groups::table
        .select(SystemGroup::as_select())
        .filter(db::system_groups::system_group_id.eq(group_id))
        .first::<SystemGroup>(conn)
        .optional()?
        .ok_or(Error::ObjectNotFound("system group"))?;

    Ok(GroupDetails {
        group,
        permissions: db::system_groups::permission_codes(conn, group_id)?,
        members: db::system_groups::members(conn, group_id)?,
    })
}

/// Only system codes may appear in a system group's bundle.
fn resolve_codes(
    conn: &mut PgConnection,
    codes: &[String],
) -> Result<Vec<db::object_id::SystemPermissionId>, Error> {
    let (ids, missing) = db::permissions::system_permission_ids(conn, codes)?;
    if !missing.is_empty() {
        return Err(Error::UnknownPermissionCodes(missing));
    }
    Ok(ids)
}

async fn list_groups(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::GroupsView).await?;

    let groups = state
        .db
        .interact(|conn| {
            db::system_groups::table
                .select(SystemGroup::as_select())
                .order_by(db::system_groups::name)
                .load::<SystemGroup>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::OK, Json(groups)))
}

async fn get_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(group_id): Path<SystemGroupId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::GroupsView).await?;
    let details = state
        .db
        .interact(move |conn| load_details(conn, group_id))
        .await?;
    Ok((StatusCode::OK, Json(details)))
}

async fn new_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<NewGroupInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::GroupsManage).await?;
    validate_struct(&body)?;

    let group_id = SystemGroupId::new();
    let details = state
        .db
        .transaction(move |conn| {
            let permission_ids = resolve_codes(conn, &body.permissions)?;
            diesel::insert_into(db::system_groups::table)
                .values(NewSystemGroup {
                    system_group_id: group_id,
                    name: body.name,
                    description: body.description.unwrap_or_default(),
                })
                .execute(conn)?;
            db::system_groups::set_permissions(conn, group_id, &permission_ids)?;
            load_details(conn, group_id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(details)))
}

async fn write_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(group_id): Path<SystemGroupId>,
    Json(body): Json<GroupUpdateInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::GroupsManage).await?;
    validate_struct(&body)?;

    let details = state
        .db
        .transaction(move |conn| {
            let updated = diesel::update(db::system_groups::table)
                .filter(db::system_groups::system_group_id.eq(group_id))
                .set(&SystemGroupUpdate {
                    name: body.name,
                    description: body.description,
                    updated: Some(Utc::now()),
                })
                .execute(conn)?;
            if updated == 0 {
                return Err(Error::ObjectNotFound("system group"));
            }

            if let Some(codes) = body.permissions {
                let permission_ids = resolve_codes(conn, &codes)?;
                db::system_groups::set_permissions(conn, group_id, &permission_ids)?;
            }

            load_details(conn, group_id)
        })
        .await?;

    Ok((StatusCode::OK, Json(details)))
}

async fn delete_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(group_id): Path<SystemGroupId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::GroupsManage).await?;

    state
        .db
        .transaction(move |conn| {
            let members = db::system_groups::member_count(conn, group_id)?;
            if members > 0 {
                return Err(Error::InUse("system group", members));
            }

            let deleted = diesel::delete(db::system_groups::table)
                .filter(db::system_groups::system_group_id.eq(group_id))
                .execute(conn)?;
            if deleted == 0 {
                return Err(Error::ObjectNotFound("system group"));
            }
            Ok(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

async fn add_member(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(group_id): Path<SystemGroupId>,
    Json(body): Json<MemberInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::GroupsManage).await?;

    state
        .db
        .transaction(move |conn| {
            if !db::system_groups::exists(conn, group_id)? {
                return Err(Error::ObjectNotFound("system group"));
            }
            ensure_user(conn, body.user_id)?;

            diesel::insert_into(db::system_groups::system_group_members::table)
                .values(SystemGroupMember {
                    system_group_id: group_id,
                    user_id: body.user_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

async fn remove_member(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((group_id, user_id)): Path<(SystemGroupId, UserId)>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::GroupsManage).await?;

    state
        .db
        .interact(move |conn| {
            use db::system_groups::system_group_members::dsl;
            let deleted = diesel::delete(dsl::system_group_members)
                .filter(dsl::system_group_id.eq(group_id))
                .filter(dsl::user_id.eq(user_id))
                .execute(conn)?;
            if deleted == 0 {
                return Err(Error::ObjectNotFound("membership"));
            }
            Ok(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(new_group))
        .route(
            "/:group_id",
            get(get_group).put(write_group).delete(delete_group),
        )
        .route("/:group_id/members", post(add_member))
        .route("/:group_id/members/:user_id", delete(remove_member))
}
