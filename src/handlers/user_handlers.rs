use crate::error::Result;
use crate::models::{PublicUser, UserPage, UserUpdate};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /users?page=&limit=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPage>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10);

    let users = state.user_service.get_users(page, limit).await?;
    Ok(Json(users))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>> {
    let user = state.user_service.find_by_id(id).await?;
    Ok(Json(user.into()))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<PublicUser>> {
    let user = state.user_service.update_user(id, update).await?;
    Ok(Json(user.into()))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>> {
    let user = state.user_service.delete_user(id).await?;
    Ok(Json(user.into()))
}
