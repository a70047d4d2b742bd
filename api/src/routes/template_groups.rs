//! Template groups are defined here once and granted per organization: every membership row
//! names the organization it applies to.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use db::{
    object_id::{OrgPermissionId, OrganizationId, TemplateGroupId, UserId},
    template_groups::{
        NewTemplateGroup, TemplateGroup, TemplateGroupMember, TemplateGroupUpdate,
    },
    PoolExt,
};
use orgdesk_auth::SystemCode;
use orgdesk_db as db;

use super::{ensure_user, GroupUpdateInput, NewGroupInput};
use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

#[derive(Debug, Deserialize)]
pub struct TemplateMemberInput {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
}

#[derive(Debug, Serialize)]
pub struct TemplateGroupDetails {
    #[serde(flatten)]
    group: TemplateGroup,
    permissions: Vec<String>,
    members: Vec<TemplateGroupMember>,
}

fn load_details(
    conn: &mut PgConnection,
    group_id: TemplateGroupId,
) -> Result<TemplateGroupDetails, Error> {
    let group = db::template_groups::table
        .select(TemplateGroup::as_select())
        .filter(db::template_groups::template_group_id.eq(group_id))
        .first::<TemplateGroup>(conn)
        .optional()?
        .ok_or(Error::ObjectNotFound("template group"))?;

    Ok(TemplateGroupDetails {
        group,
        permissions: db::template_groups::permission_codes(conn, group_id)?,
        members: db::template_groups::members(conn, group_id)?,
    })
}

/// Template bundles hold organization codes only.
pub(super) fn resolve_org_codes(
    conn: &mut PgConnection,
    codes: &[String],
) -> Result<Vec<OrgPermissionId>, Error> {
    let (ids, missing) = db::permissions::org_permission_ids(conn, codes)?;
    if !missing.is_empty() {
        return Err(Error::UnknownPermissionCodes(missing));
    }
    Ok(ids)
}

async fn list_groups(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::TemplateGroupsView).await?;

    let groups = state
        .db
        .interact(|conn| {
            db::template_groups::table
                .select(TemplateGroup::as_select())
                .order_by(db::template_groups::name)
                .load::<TemplateGroup>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::OK, Json(groups)))
}

async fn get_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(group_id): Path<TemplateGroupId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::TemplateGroupsView).await?;
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
    auth.require_system(SystemCode::TemplateGroupsManage).await?;
    validate_struct(&body)?;

    let group_id = TemplateGroupId::new();
    let details = state
        .db
        .transaction(move |conn| {
            let permission_ids = resolve_org_codes(conn, &body.permissions)?;
            diesel::insert_into(db::template_groups::table)
                .values(NewTemplateGroup {
                    template_group_id: group_id,
                    name: body.name,
                    description: body.description.unwrap_or_default(),
                })
                .execute(conn)?;
            db::template_groups::set_permissions(conn, group_id, &permission_ids)?;
            load_details(conn, group_id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(details)))
}

async fn write_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(group_id): Path<TemplateGroupId>,
    Json(body): Json<GroupUpdateInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::TemplateGroupsManage).await?;
    validate_struct(&body)?;

    let details = state
        .db
        .transaction(move |conn| {
            let updated = diesel::update(db::template_groups::table)
                .filter(db::template_groups::template_group_id.eq(group_id))
                .set(&TemplateGroupUpdate {
                    name: body.name,
                    description: body.description,
                    updated: Some(Utc::now()),
                })
                .execute(conn)?;
            if updated == 0 {
                return Err(Error::ObjectNotFound("template group"));
            }

            if let Some(codes) = body.permissions {
                let permission_ids = resolve_org_codes(conn, &codes)?;
                db::template_groups::set_permissions(conn, group_id, &permission_ids)?;
            }

            load_details(conn, group_id)
        })
        .await?;

    Ok((StatusCode::OK, Json(details)))
}

async fn delete_group(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(group_id): Path<TemplateGroupId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::TemplateGroupsManage).await?;

    state
        .db
        .transaction(move |conn| {
            let members = db::template_groups::member_count(conn, group_id)?;
            if members > 0 {
                return Err(Error::InUse("template group", members));
            }

            let deleted = diesel::delete(db::template_groups::table)
                .filter(db::template_groups::template_group_id.eq(group_id))
                .execute(conn)?;
            if deleted == 0 {
                return Err(Error::ObjectNotFound("template group"));
            }
            Ok(())
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}

async fn add_member(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(group_id): Path<TemplateGroupId>,
    Json(body): Json<TemplateMemberInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::TemplateGroupsManage).await?;

    state
        .db
        .transaction(move |conn| {
            if !db::template_groups::exists(conn, group_id)? {
                return Err(Error::ObjectNotFound("template group"));
            }
            ensure_user(conn, body.user_id)?;
            if !db::organizations::exists(conn, body.organization_id)? {
                return Err(Error::ObjectNotFound("organization"));
            }

            diesel::insert_into(db::template_groups::template_group_members::table)
                .values(TemplateGroupMember {
                    template_group_id: group_id,
                    user_id: body.user_id,
                    organization_id: body.organization_id,
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
    Path((group_id, org_id, user_id)): Path<(TemplateGroupId, OrganizationId, UserId)>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::TemplateGroupsManage).await?;

    state
        .db
        .interact(move |conn| {
            use db::template_groups::template_group_members::dsl;
            let deleted = diesel::delete(dsl::template_group_members)
                .filter(dsl::template_group_id.eq(group_id))
                .filter(dsl::organization_id.eq(org_id))
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
        .route(
            "/:group_id/members/:org_id/:user_id",
            delete(remove_member),
        )
}
