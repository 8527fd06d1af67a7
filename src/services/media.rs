use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::Row;
use uuid::Uuid;

use crate::aspects::{self, ListSpec, Populate};
use crate::auth::AuthUser;
use crate::config;
use crate::crypto::FieldCipher;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::store::{EntityKind, Store};

use super::{patch_field, value_string, AssocPatch, OneOrMany};

const MEDIA_LIST_POPULATE: &[Populate] = &[
    Populate { field: "mediaChannel", entity: EntityKind::Channel },
    Populate { field: "mediaTag", entity: EntityKind::MediaTag },
    Populate { field: "minister", entity: EntityKind::Minister },
];

const MEDIA_ONE_POPULATE: &[Populate] =
    &[Populate { field: "minister", entity: EntityKind::Minister }];

const MEDIA_SEARCH_POPULATE: &[Populate] =
    &[Populate { field: "mediaChannel", entity: EntityKind::Channel }];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedia {
    pub name: Option<String>,
    pub pretty_name: Option<String>,
    pub source_link: Option<String>,
    pub thumbnail_link: Option<OneOrMany<String>>,
    pub media_channel: Option<OneOrMany<Uuid>>,
    pub media_category: Option<OneOrMany<String>>,
    pub media_tag: Option<OneOrMany<Uuid>>,
    pub minister: Option<OneOrMany<Uuid>>,
    pub description: Option<String>,
    pub views: Option<String>,
    pub likes: Option<String>,
    pub dislikes: Option<String>,
    pub trending: Option<String>,
    pub trending_at: Option<DateTime<Utc>>,
    pub schedule_at: Option<DateTime<Utc>>,
    pub media_length: Option<String>,
}

/// Engagement counters and trending state are maintained server-side and are
/// deliberately absent here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedia {
    pub name: Option<String>,
    pub pretty_name: Option<String>,
    pub source_link: Option<String>,
    pub thumbnail_link: Option<AssocPatch<String>>,
    pub media_channel: Option<AssocPatch<Uuid>>,
    pub media_category: Option<AssocPatch<String>>,
    pub media_tag: Option<AssocPatch<Uuid>>,
    pub minister: Option<AssocPatch<Uuid>>,
    pub description: Option<String>,
    pub schedule_at: Option<DateTime<Utc>>,
}

pub struct MediaService {
    store: Store,
}

impl MediaService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Media carries no required fields; duplicate pretty names are rejected
    /// by the store's unique index and surfaced as a validation failure.
    pub async fn create_media(
        &self,
        actor: &AuthUser,
        dto: CreateMedia,
    ) -> Result<Envelope, ApiError> {
        aspects::create_record(&self.store, EntityKind::Media, actor, self.insert_media(actor, dto))
            .await
    }

    async fn insert_media(&self, actor: &AuthUser, dto: CreateMedia) -> Result<Value, ApiError> {
        let mut media_channel: Vec<Uuid> = dto.media_channel.map(Into::into).unwrap_or_default();
        if media_channel.is_empty() {
            // Publishers without an explicit channel post to their first one.
            if let Some(default_id) = self.default_channel_id(actor).await? {
                media_channel.push(default_id);
            }
        }

        let secret_source_link = match dto.source_link.as_deref() {
            Some(link) => Some(self.store.cipher().encrypt(link)?),
            None => None,
        };

        let thumbnail_link: Vec<String> = dto.thumbnail_link.map(Into::into).unwrap_or_default();
        let media_category: Vec<String> = dto.media_category.map(Into::into).unwrap_or_default();
        let media_tag: Vec<Uuid> = dto.media_tag.map(Into::into).unwrap_or_default();
        let minister: Vec<Uuid> = dto.minister.map(Into::into).unwrap_or_default();

        let row = sqlx::query(
            r#"INSERT INTO media
                   ("userId", "tenantId", name, "prettyName", "secretSourceLink",
                    "thumbnailLink", "mediaChannel", "mediaTag", minister, "mediaCategory",
                    description, views, likes, dislikes, trending, "trendingAt",
                    "scheduleAt", "mediaLength")
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                       COALESCE($17, now()), $18)
               RETURNING row_to_json(media) AS doc"#,
        )
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .bind(&dto.name)
        .bind(&dto.pretty_name)
        .bind(&secret_source_link)
        .bind(&thumbnail_link)
        .bind(&media_channel)
        .bind(&media_tag)
        .bind(&minister)
        .bind(&media_category)
        .bind(&dto.description)
        .bind(&dto.views)
        .bind(&dto.likes)
        .bind(&dto.dislikes)
        .bind(&dto.trending)
        .bind(dto.trending_at)
        .bind(dto.schedule_at)
        .bind(&dto.media_length)
        .fetch_one(self.store.pool())
        .await
        .map_err(|e| ApiError::on_conflict(e, "prettyName"))?;

        let mut doc: Value = row.try_get("doc")?;
        aspects::decrypt_doc(&self.store, EntityKind::Media, &mut doc)?;
        Ok(doc)
    }

    async fn default_channel_id(&self, actor: &AuthUser) -> Result<Option<Uuid>, ApiError> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"SELECT id FROM channels WHERE "tenantId" = $1 AND "userId" = $2
               ORDER BY "createdAt" ASC LIMIT 1"#,
        )
        .bind(&actor.tenant_id)
        .bind(&actor.user_id)
        .fetch_optional(self.store.pool())
        .await?;

        Ok(id)
    }

    pub async fn list_media(&self) -> Result<Envelope, ApiError> {
        let spec =
            ListSpec { active_only: true, populate: MEDIA_LIST_POPULATE, ..Default::default() };
        aspects::list(&self.store, EntityKind::Media, &spec, None).await
    }

    pub async fn get_media(&self, id: Uuid) -> Result<Envelope, ApiError> {
        let spec = ListSpec { populate: MEDIA_ONE_POPULATE, ..Default::default() };
        aspects::list_one(&self.store, EntityKind::Media, &spec, id, None).await
    }

    /// Delegates matching to the store's full-text index; ranking is not our
    /// concern here. Missing filter or an empty result answers NOT_FOUND.
    pub async fn search_media(
        &self,
        filter_name: Option<&str>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Envelope, ApiError> {
        let Some(filter_name) = filter_name.filter(|s| !s.trim().is_empty()) else {
            return Ok(Envelope::not_found());
        };

        let offset = offset.filter(|v| *v >= 0).unwrap_or(0);
        let limit = limit.filter(|v| *v > 0).unwrap_or(config::config().api.search_default_limit);

        let rows = sqlx::query(
            r#"SELECT row_to_json(t) AS doc FROM (
                   SELECT * FROM media
                   WHERE "isActive" = TRUE
                     AND to_tsvector('english', coalesce(name, '') || ' ' || coalesce(description, ''))
                         @@ websearch_to_tsquery('english', $1)
                   ORDER BY "createdAt" DESC
                   OFFSET $2 LIMIT $3
               ) t"#,
        )
        .bind(filter_name)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.store.pool())
        .await?;

        if rows.is_empty() {
            return Ok(Envelope::not_found());
        }

        let mut docs = rows
            .iter()
            .map(|row| row.try_get::<Value, _>("doc"))
            .collect::<Result<Vec<_>, _>>()?;

        aspects::decrypt_docs(&self.store, EntityKind::Media, &mut docs)?;
        aspects::populate(&self.store, &mut docs, MEDIA_SEARCH_POPULATE).await?;

        Ok(Envelope::success(Value::Array(docs)))
    }

    pub async fn update_media(
        &self,
        actor: &AuthUser,
        id: Uuid,
        dto: UpdateMedia,
    ) -> Result<Envelope, ApiError> {
        let Some(existing) =
            aspects::fetch_one(&self.store, EntityKind::Media, id, Some(actor)).await?
        else {
            return Ok(Envelope::not_found());
        };

        let mut media_channel: Vec<Uuid> = patch_field(dto.media_channel, &existing, "mediaChannel");
        let media_tag: Vec<Uuid> = patch_field(dto.media_tag, &existing, "mediaTag");
        let minister: Vec<Uuid> = patch_field(dto.minister, &existing, "minister");
        let media_category: Vec<String> = patch_field(dto.media_category, &existing, "mediaCategory");
        let thumbnail_link: Vec<String> = patch_field(dto.thumbnail_link, &existing, "thumbnailLink");

        if media_channel.is_empty() {
            if let Some(default_id) = self.default_channel_id(actor).await? {
                media_channel.push(default_id);
            }
        }

        let name = dto.name.or_else(|| value_string(&existing, "name"));
        let pretty_name = dto.pretty_name.or_else(|| value_string(&existing, "prettyName"));
        let description = dto.description.or_else(|| value_string(&existing, "description"));

        // fetch_one already decrypted the stored link, so both branches here
        // hold plaintext and get sealed on the way back in.
        let source_plain =
            dto.source_link.or_else(|| value_string(&existing, "secretSourceLink"));
        let secret_source_link = match source_plain.as_deref() {
            Some(link) => Some(self.store.cipher().encrypt(link)?),
            None => None,
        };

        let row = sqlx::query(
            r#"UPDATE media
               SET name = $1, "prettyName" = $2, "secretSourceLink" = $3,
                   "mediaChannel" = $4, "mediaTag" = $5, minister = $6,
                   "mediaCategory" = $7, "thumbnailLink" = $8, description = $9,
                   "scheduleAt" = COALESCE($10, "scheduleAt"), "lastUpdatedAt" = now()
               WHERE id = $11 AND "tenantId" = $12 AND "userId" = $13
               RETURNING row_to_json(media) AS doc"#,
        )
        .bind(&name)
        .bind(&pretty_name)
        .bind(&secret_source_link)
        .bind(&media_channel)
        .bind(&media_tag)
        .bind(&minister)
        .bind(&media_category)
        .bind(&thumbnail_link)
        .bind(&description)
        .bind(dto.schedule_at)
        .bind(id)
        .bind(&actor.tenant_id)
        .bind(&actor.user_id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| ApiError::on_conflict(e, "prettyName"))?;

        match row {
            Some(row) => {
                let mut doc: Value = row.try_get("doc")?;
                aspects::decrypt_doc(&self.store, EntityKind::Media, &mut doc)?;
                Ok(Envelope::success(doc))
            }
            None => Ok(Envelope::not_found()),
        }
    }

    pub async fn suspend_media(&self, actor: &AuthUser, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::suspend(&self.store, EntityKind::Media, id, Some(actor)).await
    }

    /// Reactivation is gated on the publisher's standing: the media's first
    /// associated channel must be verified.
    pub async fn unsuspend_media(&self, actor: &AuthUser, id: Uuid) -> Result<Envelope, ApiError> {
        let Some(media) =
            aspects::fetch_one(&self.store, EntityKind::Media, id, Some(actor)).await?
        else {
            return Ok(Envelope::not_found());
        };

        let first_channel = media
            .get("mediaChannel")
            .and_then(Value::as_array)
            .and_then(|channels| channels.first())
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());

        let verified = match first_channel {
            Some(channel_id) => sqlx::query_scalar::<_, bool>(
                r#"SELECT "isVerified" FROM channels WHERE id = $1"#,
            )
            .bind(channel_id)
            .fetch_optional(self.store.pool())
            .await?
            .unwrap_or(false),
            None => false,
        };

        if !verified {
            return Ok(Envelope::failed_validation(json!({ "err": "Channel Unverified" })));
        }

        aspects::unsuspend(&self.store, EntityKind::Media, id, Some(actor)).await
    }

    pub async fn delete_media(&self, actor: &AuthUser, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::remove(&self.store, EntityKind::Media, id, Some(actor)).await
    }

    pub async fn delete_total_media(
        &self,
        actor: &AuthUser,
        id: Uuid,
    ) -> Result<Envelope, ApiError> {
        aspects::remove_total(&self.store, EntityKind::Media, id, Some(actor)).await
    }
}
