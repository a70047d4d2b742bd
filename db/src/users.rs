use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::{object_id::UserId, schema::*};

pub use crate::schema::users::*;

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(user_id))]
pub struct User {
    #[serde(rename = "id")]
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub active: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub active: Option<bool>,
    pub updated: Option<DateTime<Utc>>,
}

/// `None` when the user does not exist.
pub fn active_status(conn: &mut PgConnection, id: UserId) -> QueryResult<Option<bool>> {
    table
        .select(active)
        .filter(user_id.eq(id))
        .first::<bool>(conn)
        .optional()
}

pub fn exists(conn: &mut PgConnection, id: UserId) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(table.filter(user_id.eq(id)))).get_result(conn)
}
