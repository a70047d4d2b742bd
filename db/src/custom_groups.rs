//! Groups owned by a single organization.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::{
    object_id::{CustomGroupId, OrgPermissionId, OrganizationId, UserId},
    schema::*,
};

pub use crate::schema::custom_groups::*;
pub use crate::schema::{custom_group_members, custom_group_permissions};

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(custom_group_id))]
pub struct CustomGroup {
    #[serde(rename = "id")]
    pub custom_group_id: CustomGroupId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: String,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = custom_groups)]
pub struct NewCustomGroup {
    pub custom_group_id: CustomGroupId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = custom_groups)]
pub struct CustomGroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = custom_group_permissions)]
pub struct CustomGroupPermission {
    pub custom_group_id: CustomGroupId,
    pub org_permission_id: OrgPermissionId,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = custom_group_members)]
pub struct CustomGroupMember {
    pub custom_group_id: CustomGroupId,
    pub user_id: UserId,
}

/// Codes granted to the user through custom groups belonging to the organization.
pub fn codes_for_user_in_org(
    conn: &mut PgConnection,
    user: UserId,
    organization: OrganizationId,
) -> QueryResult<Vec<String>> {
    custom_group_members::table
        .inner_join(custom_groups::table)
        .inner_join(
            custom_group_permissions::table.on(custom_group_permissions::custom_group_id
                .eq(custom_group_members::custom_group_id)),
        )
        .inner_join(
            org_permissions::table.on(org_permissions::org_permission_id
                .eq(custom_group_permissions::org_permission_id)),
        )
        .filter(custom_group_members::user_id.eq(user))
        .filter(custom_groups::organization_id.eq(organization))
        .select(org_permissions::code)
        .distinct()
        .load::<String>(conn)
}

/// Fetch a group only if it belongs to the organization.
pub fn get_in_org(
    conn: &mut PgConnection,
    organization: OrganizationId,
    group: CustomGroupId,
) -> QueryResult<Option<CustomGroup>> {
    custom_groups::table
        .select(CustomGroup::as_select())
        .filter(custom_groups::custom_group_id.eq(group))
        .filter(custom_groups::organization_id.eq(organization))
        .first(conn)
        .optional()
}

pub fn permission_codes(conn: &mut PgConnection, group: CustomGroupId) -> QueryResult<Vec<String>> {
    custom_group_permissions::table
        .inner_join(org_permissions::table)
        .filter(custom_group_permissions::custom_group_id.eq(group))
        .select(org_permissions::code)
        .order_by(org_permissions::code)
        .load::<String>(conn)
}

/// Replace the group's bundle with exactly these permissions.
pub fn set_permissions(
    conn: &mut PgConnection,
    group: CustomGroupId,
    permissions: &[OrgPermissionId],
) -> QueryResult<()> {
    diesel::delete(custom_group_permissions::table)
        .filter(custom_group_permissions::custom_group_id.eq(group))
        .execute(conn)?;

    let rows = permissions
        .iter()
        .map(|&org_permission_id| CustomGroupPermission {
            custom_group_id: group,
            org_permission_id,
        })
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return Ok(());
    }

    diesel::insert_into(custom_group_permissions::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

pub fn members(conn: &mut PgConnection, group: CustomGroupId) -> QueryResult<Vec<UserId>> {
    custom_group_members::table
        .select(custom_group_members::user_id)
        .filter(custom_group_members::custom_group_id.eq(group))
        .order_by(custom_group_members::added)
        .load(conn)
}

pub fn member_count(conn: &mut PgConnection, group: CustomGroupId) -> QueryResult<i64> {
    custom_group_members::table
        .filter(custom_group_members::custom_group_id.eq(group))
        .count()
        .get_result(conn)
}
