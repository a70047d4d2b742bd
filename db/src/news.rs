use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::{
    object_id::{NewsId, OrganizationId},
    schema::*,
};

pub use crate::schema::news::*;

#[derive(Clone, Debug, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = news, primary_key(news_id))]
pub struct NewsItem {
    #[serde(rename = "id")]
    pub news_id: NewsId,
    pub organization_id: OrganizationId,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = news)]
pub struct NewNewsItem {
    pub news_id: NewsId,
    pub organization_id: OrganizationId,
    pub title: String,
    pub body: String,
    pub published: bool,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = news)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub published: Option<bool>,
    pub updated: Option<DateTime<Utc>>,
}
