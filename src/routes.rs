use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{channel, channel_link, media, media_tag, minister};
use crate::store::Store;

pub fn app(store: Store) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(channel_routes())
        .merge(channel_link_routes())
        .merge(media_routes())
        .merge(minister_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

fn channel_routes() -> Router<Store> {
    Router::new()
        .route("/channel/data", post(channel::create_channel).get(channel::list_channels))
        .route("/channel/data/all", get(channel::list_all_channels))
        .route("/channel/auth/data", get(channel::list_channels_auth))
        .route(
            "/channel/data/:id",
            get(channel::get_channel)
                .put(channel::update_channel)
                .delete(channel::delete_channel),
        )
        .route("/channel/data/suspend/:id", put(channel::suspend_channel))
        .route("/channel/data/unsuspend/:id", put(channel::unsuspend_channel))
        .route("/channel/data/total/:id", delete(channel::delete_total_channel))
        .route("/channel/verify/:id", put(channel::verify_channel))
        // subscriptions and per-user views
        .route("/channel/user/data", get(channel::list_user_channels))
        .route("/channel/user/subscription", get(channel::list_user_subscriptions))
        .route(
            "/channel/user/onesubscription/:channelId",
            get(channel::list_user_one_subscription),
        )
        .route("/channel/user/subscription/:channelId", put(channel::subscribe))
        .route("/channel/user/unsubscription/:channelId", put(channel::unsubscribe))
        .route("/channel/user/notify/:channelId", put(channel::notify))
        .route("/channel/user/unnotify/:channelId", put(channel::unnotify))
}

fn channel_link_routes() -> Router<Store> {
    Router::new()
        .route(
            "/channel/link/data",
            post(channel_link::create_channel_link).get(channel_link::list_channel_links),
        )
        .route(
            "/channel/link/data/:id",
            get(channel_link::get_channel_link)
                .put(channel_link::update_channel_link)
                .delete(channel_link::delete_channel_link),
        )
        .route("/channel/link/data/suspend/:id", put(channel_link::suspend_channel_link))
        .route("/channel/link/data/unsuspend/:id", put(channel_link::unsuspend_channel_link))
        .route("/channel/link/data/total/:id", delete(channel_link::delete_total_channel_link))
}

fn media_routes() -> Router<Store> {
    Router::new()
        .route("/media", post(media::create_media).get(media::list_media))
        .route("/media/search/result", post(media::search_media))
        .route(
            "/media/:id",
            get(media::get_media).put(media::update_media).delete(media::delete_media),
        )
        .route("/media/suspend/:id", put(media::suspend_media))
        .route("/media/unsuspend/:id", put(media::unsuspend_media))
        .route("/media/total/:id", delete(media::delete_total_media))
        // tags live under the media prefix
        .route(
            "/media/data/tag",
            post(media_tag::create_media_tag).get(media_tag::list_media_tags),
        )
        .route(
            "/media/data/tag/:id",
            get(media_tag::get_media_tag)
                .put(media_tag::update_media_tag)
                .delete(media_tag::delete_media_tag),
        )
        .route("/media/data/tag/suspend/:id", put(media_tag::suspend_media_tag))
        .route("/media/data/tag/unsuspend/:id", put(media_tag::unsuspend_media_tag))
        .route("/media/data/tag/feature/:id", put(media_tag::feature_media_tag))
        .route("/media/data/tag/unfeature/:id", put(media_tag::unfeature_media_tag))
        .route("/media/data/tag/total/:id", delete(media_tag::delete_total_media_tag))
}

fn minister_routes() -> Router<Store> {
    Router::new()
        .route("/minister", post(minister::create_minister).get(minister::list_ministers))
        .route(
            "/minister/:id",
            get(minister::get_minister)
                .put(minister::update_minister)
                .delete(minister::delete_minister),
        )
        .route("/minister/suspend/:id", put(minister::suspend_minister))
        .route("/minister/unsuspend/:id", put(minister::unsuspend_minister))
        .route("/minister/feature/:id", put(minister::feature_minister))
        .route("/minister/unfeature/:id", put(minister::unfeature_minister))
        .route("/minister/total/:id", delete(minister::delete_total_minister))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Chapelcast API",
        "version": version,
        "description": "Multi-tenant content API for religious media",
        "endpoints": {
            "channel": "/channel/data[/:id] (GET public, mutations need a bearer token)",
            "channel_links": "/channel/link/data[/:id] (protected)",
            "subscriptions": "/channel/user/subscription[/:channelId] (protected)",
            "media": "/media[/:id], /media/search/result",
            "media_tags": "/media/data/tag[/:id]",
            "ministers": "/minister[/:id]",
        }
    }))
}

async fn health(
    axum::extract::State(store): axum::extract::State<Store>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match sqlx::query("SELECT 1").execute(store.pool()).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
