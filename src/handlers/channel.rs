use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::services::channel::{ChannelService, CreateChannel, UpdateChannel};
use crate::store::Store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChannelQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    pub verify: Option<String>,
}

/// POST /channel/data
pub async fn create_channel(
    State(store): State<Store>,
    actor: AuthUser,
    Json(dto): Json<CreateChannel>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).create_channel(&actor, dto).await
}

/// GET /channel/data
pub async fn list_channels(State(store): State<Store>) -> Result<Envelope, ApiError> {
    ChannelService::new(store).list_channels().await
}

/// GET /channel/data/all
pub async fn list_all_channels(State(store): State<Store>) -> Result<Envelope, ApiError> {
    ChannelService::new(store).list_all_channels().await
}

/// GET /channel/auth/data
pub async fn list_channels_auth(
    State(store): State<Store>,
    actor: AuthUser,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).list_channels_auth(&actor).await
}

/// GET /channel/user/data?userId=
pub async fn list_user_channels(
    State(store): State<Store>,
    actor: AuthUser,
    Query(query): Query<UserChannelQuery>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).list_user_channels(&actor, query.user_id.as_deref()).await
}

/// GET /channel/data/:id
pub async fn get_channel(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).get_channel(id).await
}

/// PUT /channel/data/:id
pub async fn update_channel(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateChannel>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).update_channel(&actor, id, dto).await
}

/// PUT /channel/data/suspend/:id
pub async fn suspend_channel(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).suspend_channel(&actor, id).await
}

/// PUT /channel/data/unsuspend/:id
pub async fn unsuspend_channel(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).unsuspend_channel(&actor, id).await
}

/// DELETE /channel/data/:id
pub async fn delete_channel(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).delete_channel(&actor, id).await
}

/// DELETE /channel/data/total/:id
pub async fn delete_total_channel(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).delete_total_channel(&actor, id).await
}

/// PUT /channel/verify/:id
pub async fn verify_channel(
    State(store): State<Store>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<VerifyBody>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).verify_channel(&actor, id, body.verify.as_deref()).await
}

/// GET /channel/user/subscription
pub async fn list_user_subscriptions(
    State(store): State<Store>,
    actor: AuthUser,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).list_user_subscriptions(&actor).await
}

/// GET /channel/user/onesubscription/:channelId
pub async fn list_user_one_subscription(
    State(store): State<Store>,
    actor: AuthUser,
    Path(channel_id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).list_user_one_subscription(&actor, channel_id).await
}

/// PUT /channel/user/subscription/:channelId
pub async fn subscribe(
    State(store): State<Store>,
    actor: AuthUser,
    Path(channel_id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).subscribe(&actor, channel_id).await
}

/// PUT /channel/user/unsubscription/:channelId
pub async fn unsubscribe(
    State(store): State<Store>,
    actor: AuthUser,
    Path(channel_id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).unsubscribe(&actor, channel_id).await
}

/// PUT /channel/user/notify/:channelId
pub async fn notify(
    State(store): State<Store>,
    actor: AuthUser,
    Path(channel_id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).notify(&actor, channel_id).await
}

/// PUT /channel/user/unnotify/:channelId
pub async fn unnotify(
    State(store): State<Store>,
    actor: AuthUser,
    Path(channel_id): Path<Uuid>,
) -> Result<Envelope, ApiError> {
    ChannelService::new(store).unnotify(&actor, channel_id).await
}
