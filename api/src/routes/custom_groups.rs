//! Groups owned by one organization. Members of the organization with `org.groups.view` may
//! list them; changing them takes the system-level `system.custom_groups.manage` code.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use serde_json::json;

use db::{
    custom_groups::{CustomGroup, CustomGroupMember, CustomGroupUpdate, NewCustomGroup},
    object_id::{CustomGroupId, OrganizationId, UserId},
    PoolExt,
};
use orgdesk_auth::{OrgCode, SystemCode};
use orgdesk_db as db;

use super::{
    ensure_user, template_groups::resolve_org_codes, GroupUpdateInput, MemberInput, NewGroupInput,
};
use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

#[derive(Debug, Serialize)]
pub struct CustomGroupDetails {
    #[serde(flatten)]
    group: CustomGroup,
    permissions: Vec<String>,
    members: Vec<UserId>,
}

fn load_details(
    conn: &mut PgConnection,
    org_id: OrganizationId,
    group_id: CustomGroupId,
) -> Result<CustomGroupDetails, Error> {
    let group = db::custom_groups::get_in_org(conn, org_id, group_id)?
        .ok_or(Error::ObjectNotFound("group"))?;

    Ok(CustomGroupDetails {
        group,
        permissions: db::custom_groups::permission_codes(conn, group_id)?,
        members: db::custom_groups::members(conn, group_id)?,
    })
}

fn ensure_in_org(
    conn: &mut PgConnection,
    org_id: OrganizationId,
    group_id: CustomGroupId,
) -> Result<(), Error> {
    db::custom_groups::get_in_org(conn, org_id, group_id)?
        .map(|_| ())
        .ok_or(Error::ObjectNotFound("group"))
}

async fn list_groups(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::GroupsView).await?;

    let groups = state
        .db
        .interact(move |conn| {
            let groups = db::custom_groups::table
                .select(CustomGroup::as_select())
                .filter(db::custom_groups::organization_id.eq(org_id))
                .order_by(db::custom_groups::name)
                .load::<CustomGroup>(conn)?;

            groups
                .into_iter()
                .map(|group| {
                    let group_id = group.custom_group_id;
                    Ok(CustomGroupDetails {
                        group,
                        permissions: db::custom_groups::permission_codes(conn, group_id)?,
                        members: db::custom_groups::members(conn, group_id)?,
                    })
                })
                .collect::<Result<Vec<_>, Error>>()
        })
        .await?;

    Ok((StatusCode::OK, Json(groups)))
}

async fn new_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
    Json(body): Json<NewGroupInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::CustomGroupsManage).await?;
    validate_struct(&body)?;

    let group_id = CustomGroupId::new();
    let details = state
        .db
        .transaction(move |conn| {
            if !db::organizations::exists(conn, org_id)? {
                return Err(Error::ObjectNotFound("organization"));
            }

            let permission_ids = resolve_org_codes(conn, &body.permissions)?;
            diesel::insert_into(db::custom_groups::table)
                .values(NewCustomGroup {
                    custom_group_id: group_id,
                    organization_id: org_id,
                    name: body.name,
                    description: body.description.unwrap_or_default(),
                })
                .execute(conn)?;
            db::custom_groups::set_permissions(conn, group_id, &permission_ids)?;
            load_details(conn, org_id, group_id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(details)))
}

async fn write_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, group_id)): Path<(OrganizationId, CustomGroupId)>,
    Json(body): Json<GroupUpdateInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::CustomGroupsManage).await?;
    validate_struct(&body)?;

    let details = state
        .db
        .transaction(move |conn| {
            let updated = diesel::update(db::custom_groups::table)
                .filter(db::custom_groups::custom_group_id.eq(group_id))
                .filter(db::custom_groups::organization_id.eq(org_id))
                .set(&CustomGroupUpdate {
                    name: body.name,
                    description: body.description,
                    updated: Some(Utc::now()),
                })
                .execute(conn)?;
            if updated == 0 {
                return Err(Error::ObjectNotFound("group"));
            }

            if let Some(codes) = body.permissions {
                let permission_ids = resolve_org_codes(conn, &codes)?;
                db::custom_groups::set_permissions(conn, group_id, &permission_ids)?;
            }

            load_details(conn, org_id, group_id)
        })
        .await?;

    Ok((StatusCode::OK, Json(details)))
}

async fn delete_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, group_id)): Path<(OrganizationId, CustomGroupId)>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::CustomGroupsManage).await?;

    state
        .db
        .transaction(move |conn| {
            ensure_in_org(conn, org_id, group_id)?;

            let members = db::custom_groups::member_count(conn, group_id)?;
            if members > 0 {
                return Err(Error::InUse("group", members));
            }

            diesel::delete(db::custom_groups::table)
                .filter(db::custom_groups::custom_group_id.eq(group_id))
                .execute(conn)?;
            Ok(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

async fn add_member(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, group_id)): Path<(OrganizationId, CustomGroupId)>,
    Json(body): Json<MemberInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::CustomGroupsManage).await?;

    state
        .db
        .transaction(move |conn| {
            ensure_in_org(conn, org_id, group_id)?;
            ensure_user(conn, body.user_id)?;
            diesel::insert_into(db::custom_groups::custom_group_members::table)
                .values(CustomGroupMember {
                    custom_group_id: group_id,
                    user_id: body.user_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok::<(), Error>(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

async fn remove_member(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, group_id, user_id)): Path<(OrganizationId, CustomGroupId, UserId)>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::CustomGroupsManage).await?;

    state
        .db
        .transaction(move |conn| {
            use db::custom_groups::custom_group_members::dsl;
            ensure_in_org(conn, org_id, group_id)?;

            let deleted = diesel::delete(dsl::custom_group_members)
                .filter(dsl::custom_group_id.eq(group_id))
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
        .route("/orgs/:org_id/groups", get(list_groups).post(new_group))
        .route(
            "/orgs/:org_id/groups/:group_id",
            put(write_group).delete(delete_group),
        )
        .route("/orgs/:org_id/groups/:group_id/members", post(add_member))
        .route(
            "/orgs/:org_id/groups/:group_id/members/:user_id",
            delete(remove_member),
        )
}
