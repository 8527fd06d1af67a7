use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::services::minister::{CreateMinister, MinisterService, UpdateMinister};
use crate::store::Store;

/// POST /minister
pub async fn create_minister(
    State(store): State<Store>,
    actor: AuthUser,
    Json(dto): Json<CreateMinister>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).create_minister(&actor, dto).await
}

/// GET /minister
pub async fn list_ministers(State(store): State<Store>) -> Result<Envelope, ApiError> {
    MinisterService::new(store).list_ministers().await
}

/// GET /minister/:id
pub async fn get_minister(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).get_minister(id).await
}

/// PUT /minister/:id
pub async fn update_minister(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateMinister>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).update_minister(id, dto).await
}

/// PUT /minister/suspend/:id
pub async fn suspend_minister(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).suspend_minister(id).await
}

/// PUT /minister/unsuspend/:id
pub async fn unsuspend_minister(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).unsuspend_minister(id).await
}

/// PUT /minister/feature/:id
pub async fn feature_minister(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).feature_minister(id).await
}

/// PUT /minister/unfeature/:id
pub async fn unfeature_minister(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).unfeature_minister(id).await
}

/// DELETE /minister/:id
pub async fn delete_minister(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).delete_minister(id).await
}

/// DELETE /minister/total/:id
pub async fn delete_total_minister(
    State(store): State<Store>,
    _actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    MinisterService::new(store).delete_total_minister(id).await
}
