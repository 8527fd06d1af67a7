use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::services::media_tag::{CreateMediaTag, MediaTagService, UpdateMediaTag};
use crate::store::Store;

/// POST /media/data/tag
pub async fn create_media_tag(
    State(store): State<Store>,
    actor: AuthUser,
    Json(dto): Json<CreateMediaTag>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).create_media_tag(&actor, dto).await
}

/// GET /media/data/tag
pub async fn list_media_tags(State(store): State<Store>) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).list_media_tags().await
}

/// GET /media/data/tag/:id
pub async fn get_media_tag(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).get_media_tag(id).await
}

/// PUT /media/data/tag/:id
pub async fn update_media_tag(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateMediaTag>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).update_media_tag(id, dto).await
}

/// PUT /media/data/tag/suspend/:id
pub async fn suspend_media_tag(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).suspend_media_tag(id).await
}

/// PUT /media/data/tag/unsuspend/:id
pub async fn unsuspend_media_tag(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).unsuspend_media_tag(id).await
}

/// PUT /media/data/tag/feature/:id
pub async fn feature_media_tag(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).feature_media_tag(id).await
}

/// PUT /media/data/tag/unfeature/:id
pub async fn unfeature_media_tag(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).unfeature_media_tag(id).await
}

/// DELETE /media/data/tag/:id
pub async fn delete_media_tag(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).delete_media_tag(id).await
}

/// DELETE /media/data/tag/total/:id
pub async fn delete_total_media_tag(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MediaTagService::new(store).delete_total_media_tag(id).await
}
