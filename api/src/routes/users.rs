use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use garde::Validate;
use serde::Deserialize;

use db::{
    object_id::UserId,
    users::{NewUser, User, UserUpdate},
    PoolExt,
};
use orgdesk_auth::SystemCode;
use orgdesk_db as db;

use crate::{auth::Authenticated, shared_state::AppState, validation::validate_struct, Error};

#[derive(Debug, Deserialize, Validate)]
pub struct NewUserInput {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdateInput {
    #[garde(email)]
    pub email: Option<String>,
    #[garde(length(min = 1))]
    pub name: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::UsersView).await?;

    let users = state
        .db
        .interact(|conn| {
            db::users::table
                .select(User::as_select())
                .order_by(db::users::email)
                .load::<User>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::OK, Json(users)))
}

async fn get_user(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::UsersView).await?;

    let user = state
        .db
        .interact(move |conn| {
            db::users::table
                .select(User::as_select())
                .filter(db::users::user_id.eq(user_id))
                .first::<User>(conn)
                .optional()
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::ObjectNotFound("user"))?;

    Ok((StatusCode::OK, Json(user)))
}

async fn new_user(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<NewUserInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::UsersManage).await?;
    validate_struct(&body)?;

    let value = NewUser {
        user_id: UserId::new(),
        email: body.email,
        name: body.name,
        active: body.active.unwrap_or(true),
    };

    let user = state
        .db
        .interact(move |conn| {
            diesel::insert_into(db::users::table)
                .values(&value)
                .returning(User::as_select())
                .get_result::<User>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn write_user(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(user_id): Path<UserId>,
    Json(body): Json<UserUpdateInput>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::UsersManage).await?;
    validate_struct(&body)?;

    let update = UserUpdate {
        email: body.email,
        name: body.name,
        active: None,
        updated: Some(Utc::now()),
    };

    let user = update_user(&state, user_id, update).await?;
    Ok((StatusCode::OK, Json(user)))
}

async fn deactivate_user(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::UsersManage).await?;
    let user = set_active(&state, user_id, false).await?;
    Ok((StatusCode::OK, Json(user)))
}

async fn activate_user(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse, Error> {
    auth.require_system(SystemCode::UsersManage).await?;
    let user = set_active(&state, user_id, true).await?;
    Ok((StatusCode::OK, Json(user)))
}

/// Deactivation takes effect on the user's next request; nothing caches their permissions.
async fn set_active(state: &AppState, user_id: UserId, active: bool) -> Result<User, Error> {
    let update = UserUpdate {
        active: Some(active),
        updated: Some(Utc::now()),
        ..Default::default()
    };
    update_user(state, user_id, update).await
}

async fn update_user(state: &AppState, user_id: UserId, update: UserUpdate) -> Result<User, Error> {
    state
        .db
        .interact(move |conn| {
            diesel::update(db::users::table)
                .filter(db::users::user_id.eq(user_id))
                .set(&update)
                .returning(User::as_select())
                .get_result::<User>(conn)
                .optional()
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::ObjectNotFound("user"))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(new_user))
        .route("/:user_id", get(get_user).put(write_user))
        .route("/:user_id/deactivate", post(deactivate_user))
        .route("/:user_id/activate", post(activate_user))
}
