use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::services::channel_link::{ChannelLinkService, CreateChannelLink, UpdateChannelLink};
use crate::store::Store;

/// POST /channel/link/data
pub async fn create_channel_link(
    State(store): State<Store>,
    actor: AuthUser,
    Json(dto): Json<CreateChannelLink>,
) -> Result<Envelope, ApiError> {
    ChannelLinkService::new(store).create_channel_link(&actor, dto).await
}

/// GET /channel/link/data
pub async fn list_channel_links(
    State(store): State<Store>,
    actor: AuthUser,
) -> Result<Envelope, ApiError> {
    ChannelLinkService::new(store).list_channel_links(&actor).await
}

/// GET /channel/link/data/:id
pub async fn get_channel_link(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelLinkService::new(store).get_channel_link(&actor, id).await
}

/// PUT /channel/link/data/:id
pub async fn update_channel_link(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateChannelLink>,
) -> Result<Envelope, ApiError> {
    ChannelLinkService::new(store).update_channel_link(&actor, id, dto).await
}

/// PUT /channel/link/data/suspend/:id
pub async fn suspend_channel_link(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelLinkService::new(store).suspend_channel_link(&actor, id).await
}

/// PUT /channel/link/data/unsuspend/:id
pub async fn unsuspend_channel_link(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelLinkService::new(store).unsuspend_channel_link(&actor, id).await
}

/// DELETE /channel/link/data/:id
pub async fn delete_channel_link(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelLinkService::new(store).delete_channel_link(&actor, id).await
}

/// DELETE /channel/link/data/total/:id
pub async fn delete_total_channel_link(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelLinkService::new(store).delete_total_channel_link(&actor, id).await
}
