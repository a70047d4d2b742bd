//! Permission code catalogs for both scopes.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::{
    object_id::{OrgPermissionId, SystemPermissionId},
    schema::*,
};

pub use crate::schema::{org_permissions, system_permissions};

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(system_permission_id))]
pub struct SystemPermission {
    #[serde(rename = "id")]
    pub system_permission_id: SystemPermissionId,
    pub code: String,
    pub description: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = system_permissions)]
pub struct NewSystemPermission {
    pub system_permission_id: SystemPermissionId,
    pub code: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(org_permission_id))]
pub struct OrgPermission {
    #[serde(rename = "id")]
    pub org_permission_id: OrgPermissionId,
    pub code: String,
    pub description: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = org_permissions)]
pub struct NewOrgPermission {
    pub org_permission_id: OrgPermissionId,
    pub code: String,
    pub description: String,
}

/// Look up system permission ids by code. Codes with no matching row are returned in the
/// second element.
pub fn system_permission_ids(
    conn: &mut PgConnection,
    codes: &[String],
) -> QueryResult<(Vec<SystemPermissionId>, Vec<String>)> {
    let found = system_permissions::table
        .select((
            system_permissions::system_permission_id,
            system_permissions::code,
        ))
        .filter(system_permissions::code.eq_any(codes))
        .load::<(SystemPermissionId, String)>(conn)?;

    Ok(split_found(codes, found))
}

/// Look up organization permission ids by code. Codes with no matching row, including any
/// system-scope code, are returned in the second element.
pub fn org_permission_ids(
    conn: &mut PgConnection,
    codes: &[String],
) -> QueryResult<(Vec<OrgPermissionId>, Vec<String>)> {
    let found = org_permissions::table
        .select((org_permissions::org_permission_id, org_permissions::code))
        .filter(org_permissions::code.eq_any(codes))
        .load::<(OrgPermissionId, String)>(conn)?;

    Ok(split_found(codes, found))
}

fn split_found<ID>(codes: &[String], found: Vec<(ID, String)>) -> (Vec<ID>, Vec<String>) {
    let missing = codes
        .iter()
        .filter(|code| !found.iter().any(|(_, c)| c == *code))
        .cloned()
        .collect();
    let ids = found.into_iter().map(|(id, _)| id).collect();
    (ids, missing)
}

/// Number of group bundles that include this system permission.
pub fn system_permission_references(
    conn: &mut PgConnection,
    id: SystemPermissionId,
) -> QueryResult<i64> {
    system_group_permissions::table
        .filter(system_group_permissions::system_permission_id.eq(id))
        .count()
        .get_result(conn)
}

/// Number of template and custom group bundles that include this organization permission.
pub fn org_permission_references(
    conn: &mut PgConnection,
    id: OrgPermissionId,
) -> QueryResult<i64> {
    let template = template_group_permissions::table
        .filter(template_group_permissions::org_permission_id.eq(id))
        .count()
        .get_result::<i64>(conn)?;
    let custom = custom_group_permissions::table
        .filter(custom_group_permissions::org_permission_id.eq(id))
        .count()
        .get_result::<i64>(conn)?;
    Ok(template + custom)
}

#[cfg(test)]
mod tests {
    use super::split_found;

    #[test]
    fn split_found_reports_unknown_codes() {
        let codes = vec![
            "org.news.view".to_string(),
            "system.superadmin".to_string(),
            "org.info.view".to_string(),
        ];
        let found = vec![(1, "org.info.view".to_string()), (2, "org.news.view".to_string())];

        let (ids, missing) = split_found(&codes, found);
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(missing, vec!["system.superadmin".to_string()]);
    }
}
