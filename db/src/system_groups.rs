use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::{
    object_id::{SystemGroupId, SystemPermissionId, UserId},
    schema::*,
};

pub use crate::schema::system_groups::*;
pub use crate::schema::{system_group_members, system_group_permissions};

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(system_group_id))]
pub struct SystemGroup {
    #[serde(rename = "id")]
    pub system_group_id: SystemGroupId,
    pub name: String,
    pub description: String,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = system_groups)]
pub struct NewSystemGroup {
    pub system_group_id: SystemGroupId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = system_groups)]
pub struct SystemGroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = system_group_permissions)]
pub struct SystemGroupPermission {
    pub system_group_id: SystemGroupId,
    pub system_permission_id: SystemPermissionId,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = system_group_members)]
pub struct SystemGroupMember {
    pub system_group_id: SystemGroupId,
    pub user_id: UserId,
}

/// Every code granted to the user through any system group, deduplicated.
pub fn codes_for_user(conn: &mut PgConnection, user: UserId) -> QueryResult<Vec<String>> {
    system_group_members::table
        .inner_join(
            system_group_permissions::table.on(system_group_permissions::system_group_id
                .eq(system_group_members::system_group_id)),
        )
        .inner_join(
            system_permissions::table.on(system_permissions::system_permission_id
                .eq(system_group_permissions::system_permission_id)),
        )
        .filter(system_group_members::user_id.eq(user))
        .select(system_permissions::code)
        .distinct()
        .load::<String>(conn)
}

pub fn permission_codes(conn: &mut PgConnection, group: SystemGroupId) -> QueryResult<Vec<String>> {
    system_group_permissions::table
        .inner_join(system_permissions::table)
        .filter(system_group_permissions::system_group_id.eq(group))
        .select(system_permissions::code)
        .order_by(system_permissions::code)
        .load::<String>(conn)
}

/// Replace the group's bundle with exactly these permissions.
pub fn set_permissions(
    conn: &mut PgConnection,
    group: SystemGroupId,
    permissions: &[SystemPermissionId],
) -> QueryResult<()> {
    diesel::delete(system_group_permissions::table)
        .filter(system_group_permissions::system_group_id.eq(group))
        .execute(conn)?;

    let rows = permissions
        .iter()
        .map(|&system_permission_id| SystemGroupPermission {
            system_group_id: group,
            system_permission_id,
        })
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return Ok(());
    }

    diesel::insert_into(system_group_permissions::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

pub fn members(conn: &mut PgConnection, group: SystemGroupId) -> QueryResult<Vec<UserId>> {
    system_group_members::table
        .select(system_group_members::user_id)
        .filter(system_group_members::system_group_id.eq(group))
        .order_by(system_group_members::added)
        .load(conn)
}

pub fn member_count(conn: &mut PgConnection, group: SystemGroupId) -> QueryResult<i64> {
    system_group_members::table
        .filter(system_group_members::system_group_id.eq(group))
        .count()
        .get_result(conn)
}

pub fn exists(conn: &mut PgConnection, id: SystemGroupId) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        table.filter(system_group_id.eq(id)),
    ))
    .get_result(conn)
}
