use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use garde::Validate;
use serde::Deserialize;
use serde_json::json;

use db::{
    news::{NewNewsItem, NewsItem, NewsUpdate},
    object_id::{NewsId, OrganizationId},
    PoolExt,
};
use orgdesk_auth::OrgCode;
use orgdesk_db as db;

use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

#[derive(Debug, Deserialize, Validate)]
pub struct NewNewsInput {
    #[garde(length(min = 1))]
    pub title: String,
    #[garde(skip)]
    pub body: String,
    #[garde(skip)]
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewsUpdateInput {
    #[garde(length(min = 1))]
    pub title: Option<String>,
    #[garde(skip)]
    pub body: Option<String>,
    #[garde(skip)]
    pub published: Option<bool>,
}

async fn list_news(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::NewsView).await?;

    let items = state
        .db
        .interact(move |conn| {
            db::news::table
                .select(NewsItem::as_select())
                .filter(db::news::organization_id.eq(org_id))
                .order_by(db::news::created.desc())
                .load::<NewsItem>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::OK, Json(items)))
}

async fn get_news(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, news_id)): Path<(OrganizationId, NewsId)>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::NewsView).await?;

    let item = state
        .db
        .interact(move |conn| {
            db::news::table
                .select(NewsItem::as_select())
                .filter(db::news::news_id.eq(news_id))
                .filter(db::news::organization_id.eq(org_id))
                .first::<NewsItem>(conn)
                .optional()
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::ObjectNotFound("news item"))?;

    Ok((StatusCode::OK, Json(item)))
}

async fn new_news(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(org_id): Path<OrganizationId>,
    Json(body): Json<NewNewsInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::NewsEdit).await?;
    validate_struct(&body)?;

    let value = NewNewsItem {
        news_id: NewsId::new(),
        organization_id: org_id,
        title: body.title,
        body: body.body,
        published: body.published,
    };

    let item = state
        .db
        .transaction(move |conn| {
            if !db::organizations::exists(conn, org_id)? {
                return Err(Error::ObjectNotFound("organization"));
            }

            diesel::insert_into(db::news::table)
                .values(&value)
                .returning(NewsItem::as_select())
                .get_result::<NewsItem>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn write_news(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, news_id)): Path<(OrganizationId, NewsId)>,
    Json(body): Json<NewsUpdateInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::NewsEdit).await?;
    validate_struct(&body)?;

    let update = NewsUpdate {
        title: body.title,
        body: body.body,
        published: body.published,
        updated: Some(Utc::now()),
    };

    let item = state
        .db
        .interact(move |conn| {
            diesel::update(db::news::table)
                .filter(db::news::news_id.eq(news_id))
                .filter(db::news::organization_id.eq(org_id))
                .set(&update)
                .returning(NewsItem::as_select())
                .get_result::<NewsItem>(conn)
                .optional()
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::ObjectNotFound("news item"))?;

    Ok((StatusCode::OK, Json(item)))
}

async fn delete_news(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((org_id, news_id)): Path<(OrganizationId, NewsId)>,
) -> Result<impl IntoResponse, Error> {
    auth.require_org(org_id, OrgCode::NewsDelete).await?;

    let deleted = state
        .db
        .interact(move |conn| {
            diesel::delete(db::news::table)
                .filter(db::news::news_id.eq(news_id))
                .filter(db::news::organization_id.eq(org_id))
                .execute(conn)
                .map_err(Error::from)
        })
        .await?;

    if deleted == 0 {
        return Err(Error::ObjectNotFound("news item"));
    }

    Ok((StatusCode::OK, Json(json!({}))))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/orgs/:org_id/news", get(list_news).post(new_news))
        .route(
            "/orgs/:org_id/news/:news_id",
            get(get_news).put(write_news).delete(delete_news),
        )
}
