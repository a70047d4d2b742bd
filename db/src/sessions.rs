use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{
    object_id::{SessionId, UserId},
    schema::*,
};

pub use crate::schema::sessions::*;

#[derive(Clone, Debug, Queryable, Identifiable, Insertable)]
#[diesel(primary_key(session_id))]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub expires: DateTime<Utc>,
}

/// The user owning an unexpired session.
pub fn user_for_session(conn: &mut PgConnection, id: SessionId) -> QueryResult<Option<UserId>> {
    table
        .select(user_id)
        .filter(session_id.eq(id))
        .filter(expires.gt(diesel::dsl::now))
        .first::<UserId>(conn)
        .optional()
}
