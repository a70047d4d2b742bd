use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::{object_id::OrganizationId, schema::*};

pub use crate::schema::organizations::*;

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(organization_id))]
pub struct Organization {
    #[serde(rename = "id")]
    pub organization_id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = organizations)]
pub struct NewOrganization {
    pub organization_id: OrganizationId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = organizations)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

/// Custom groups owned by the organization plus template memberships scoped to it. An
/// organization can only be deleted when this is zero.
pub fn dependent_count(conn: &mut PgConnection, id: OrganizationId) -> QueryResult<i64> {
    let groups = custom_groups::table
        .filter(custom_groups::organization_id.eq(id))
        .count()
        .get_result::<i64>(conn)?;

    let memberships = template_group_members::table
        .filter(template_group_members::organization_id.eq(id))
        .count()
        .get_result::<i64>(conn)?;

    Ok(groups + memberships)
}

pub fn exists(conn: &mut PgConnection, id: OrganizationId) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        table.filter(organization_id.eq(id)),
    ))
    .get_result(conn)
}

/// Take a row lock on the organization for the rest of the transaction. Writers that derive
/// per-organization values from existing rows serialize on this lock. `false` when the
/// organization does not exist.
pub fn lock(conn: &mut PgConnection, id: OrganizationId) -> QueryResult<bool> {
    table
        .select(organization_id)
        .filter(organization_id.eq(id))
        .for_update()
        .first::<OrganizationId>(conn)
        .optional()
        .map(|row| row.is_some())
}
