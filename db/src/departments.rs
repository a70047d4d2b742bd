use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::{
    object_id::{DepartmentId, OrganizationId},
    ordering::{plan_move, MoveDirection, OrderingError},
    schema::*,
};

pub use crate::schema::departments::*;

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(department_id))]
pub struct Department {
    #[serde(rename = "id")]
    pub department_id: DepartmentId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub sort_order: i32,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = departments)]
pub struct NewDepartment {
    pub department_id: DepartmentId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub sort_order: i32,
}

/// The order value for a department appended to the end of the organization's list. Callers
/// hold the organization lock (`organizations::lock`) so that concurrent appends see each
/// other's rows.
pub fn next_sort_order(conn: &mut PgConnection, organization: OrganizationId) -> QueryResult<i32> {
    let max = table
        .select(diesel::dsl::max(sort_order))
        .filter(organization_id.eq(organization))
        .first::<Option<i32>>(conn)?;
    Ok(max.map(|m| m + 1).unwrap_or(0))
}

/// Swap the department with its neighbour. This must run inside a transaction: the
/// organization row is locked first, so moves and appends in the same organization serialize.
pub fn move_department<E>(
    conn: &mut PgConnection,
    organization: OrganizationId,
    department: DepartmentId,
    direction: MoveDirection,
) -> Result<(), E>
where
    E: From<diesel::result::Error> + From<OrderingError>,
{
    if !crate::organizations::lock(conn, organization)? {
        return Err(OrderingError::NotFound.into());
    }

    let items = table
        .select((department_id, sort_order))
        .filter(organization_id.eq(organization))
        .order_by((sort_order, department_id))
        .for_update()
        .load::<(DepartmentId, i32)>(conn)?;

    let writes = plan_move(&items, department, direction)?;

    let now = Utc::now();
    for (id, order) in writes {
        diesel::update(table)
            .filter(department_id.eq(id))
            .filter(organization_id.eq(organization))
            .set((sort_order.eq(order), updated.eq(now)))
            .execute(conn)?;
    }

    Ok(())
}
