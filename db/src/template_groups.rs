//! Organization groups defined once at system level. Membership rows carry the organization
//! the grant applies to.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::{
    object_id::{OrgPermissionId, OrganizationId, TemplateGroupId, UserId},
    schema::*,
};

pub use crate::schema::template_groups::*;
pub use crate::schema::{template_group_members, template_group_permissions};

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(template_group_id))]
pub struct TemplateGroup {
    #[serde(rename = "id")]
    pub template_group_id: TemplateGroupId,
    pub name: String,
    pub description: String,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = template_groups)]
pub struct NewTemplateGroup {
    pub template_group_id: TemplateGroupId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = template_groups)]
pub struct TemplateGroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = template_group_permissions)]
pub struct TemplateGroupPermission {
    pub template_group_id: TemplateGroupId,
    pub org_permission_id: OrgPermissionId,
}

#[derive(Debug, Serialize, Queryable, Insertable)]
#[diesel(table_name = template_group_members)]
pub struct TemplateGroupMember {
    pub template_group_id: TemplateGroupId,
    pub user_id: UserId,
    pub organization_id: OrganizationId,
}

/// Codes granted to the user in one organization through template group memberships scoped to
/// that organization.
pub fn codes_for_user_in_org(
    conn: &mut PgConnection,
    user: UserId,
    organization: OrganizationId,
) -> QueryResult<Vec<String>> {
    template_group_members::table
        .inner_join(
            template_group_permissions::table.on(template_group_permissions::template_group_id
                .eq(template_group_members::template_group_id)),
        )
        .inner_join(
            org_permissions::table.on(org_permissions::org_permission_id
                .eq(template_group_permissions::org_permission_id)),
        )
        .filter(template_group_members::user_id.eq(user))
        .filter(template_group_members::organization_id.eq(organization))
        .select(org_permissions::code)
        .distinct()
        .load::<String>(conn)
}

pub fn permission_codes(
    conn: &mut PgConnection,
    group: TemplateGroupId,
) -> QueryResult<Vec<String>> {
    template_group_permissions::table
        .inner_join(org_permissions::table)
        .filter(template_group_permissions::template_group_id.eq(group))
        .select(org_permissions::code)
        .order_by(org_permissions::code)
        .load::<String>(conn)
}

/// Replace the group's bundle with exactly these permissions.
pub fn set_permissions(
    conn: &mut PgConnection,
    group: TemplateGroupId,
    permissions: &[OrgPermissionId],
) -> QueryResult<()> {
    diesel::delete(template_group_permissions::table)
        .filter(template_group_permissions::template_group_id.eq(group))
        .execute(conn)?;

    let rows = permissions
        .iter()
        .map(|&org_permission_id| TemplateGroupPermission {
            template_group_id: group,
            org_permission_id,
        })
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return Ok(());
    }

    diesel::insert_into(template_group_permissions::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

pub fn members(
    conn: &mut PgConnection,
    group: TemplateGroupId,
) -> QueryResult<Vec<TemplateGroupMember>> {
    template_group_members::table
        .select((
            template_group_members::template_group_id,
            template_group_members::user_id,
            template_group_members::organization_id,
        ))
        .filter(template_group_members::template_group_id.eq(group))
        .order_by(template_group_members::added)
        .load(conn)
}

pub fn member_count(conn: &mut PgConnection, group: TemplateGroupId) -> QueryResult<i64> {
    template_group_members::table
        .filter(template_group_members::template_group_id.eq(group))
        .count()
        .get_result(conn)
}

pub fn exists(conn: &mut PgConnection, id: TemplateGroupId) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        table.filter(template_group_id.eq(id)),
    ))
    .get_result(conn)
}
