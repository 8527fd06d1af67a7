use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::services::media::{CreateMedia, MediaService, UpdateMedia};
use crate::store::Store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub filter_name: Option<String>,
}

/// Paging values arrive as strings; anything unparseable falls back to the
/// defaults rather than erroring.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

/// POST /media
pub async fn create_media(
    State(store): State<Store>,
    actor: AuthUser,
    Json(dto): Json<CreateMedia>,
) -> Result<Envelope, ApiError> {
    MediaService::new(store).create_media(&actor, dto).await
}

/// GET /media
pub async fn list_media(State(store): State<Store>) -> Result<Envelope, ApiError> {
    MediaService::new(store).list_media().await
}

/// POST /media/search/result
pub async fn search_media(
    State(store): State<Store>,
    Query(query): Query<SearchQuery>,
    Json(body): Json<SearchBody>,
) -> Result<Envelope, ApiError> {
    let offset = query.offset.as_deref().and_then(|v| v.parse::<i64>().ok());
    let limit = query.limit.as_deref().and_then(|v| v.parse::<i64>().ok());

    MediaService::new(store).search_media(body.filter_name.as_deref(), offset, limit).await
}

/// GET /media/:id
pub async fn get_media(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaService::new(store).get_media(id).await
}

/// PUT /media/:id
pub async fn update_media(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateMedia>,
) -> Result<Envelope, ApiError> {
    MediaService::new(store).update_media(&actor, id, dto).await
}

/// PUT /media/suspend/:id
pub async fn suspend_media(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaService::new(store).suspend_media(&actor, id).await
}

/// PUT /media/unsuspend/:id
pub async fn unsuspend_media(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaService::new(store).unsuspend_media(&actor, id).await
}

/// DELETE /media/:id
pub async fn delete_media(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaService::new(store).delete_media(&actor, id).await
}

/// DELETE /media/total/:id
pub async fn delete_total_media(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaService::new(store).delete_total_media(&actor, id).await
}
