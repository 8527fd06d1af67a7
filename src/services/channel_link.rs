use serde::Deserialize;
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use crate::aspects::{self, ListSpec, Populate};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::store::{EntityKind, Store};
use crate::validate::{self, FieldError};

use super::{patch_field, value_string, AssocPatch, OneOrMany};

const LINK_POPULATE: &[Populate] =
    &[Populate { field: "mediaChannel", entity: EntityKind::Channel }];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelLink {
    pub media_channel: Option<OneOrMany<Uuid>>,
    pub link_key: Option<String>,
    pub link_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelLink {
    pub media_channel: Option<AssocPatch<Uuid>>,
    pub link_key: Option<String>,
    pub link_value: Option<String>,
}

pub struct ChannelLinkService {
    store: Store,
}

impl ChannelLinkService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_channel_link(
        &self,
        actor: &AuthUser,
        dto: CreateChannelLink,
    ) -> Result<Envelope, ApiError> {
        let mut errors: Vec<FieldError> = Vec::new();
        validate::require(&mut errors, "linkKey", "Link Key", dto.link_key.as_deref());
        validate::require(&mut errors, "linkValue", "Link Value", dto.link_value.as_deref());
        if validate::has_errors(&errors) {
            return Ok(Envelope::failed_validation(validate::failure_payload(&errors)));
        }

        aspects::create_record(
            &self.store,
            EntityKind::ChannelLink,
            actor,
            self.insert_channel_link(actor, dto),
        )
        .await
    }

    async fn insert_channel_link(
        &self,
        actor: &AuthUser,
        dto: CreateChannelLink,
    ) -> Result<Value, ApiError> {
        let media_channel: Vec<Uuid> = dto.media_channel.map(Into::into).unwrap_or_default();

        let row = sqlx::query(
            r#"INSERT INTO channel_links ("userId", "tenantId", "mediaChannel", "linkKey", "linkValue")
               VALUES ($1, $2, $3, $4, $5)
               RETURNING row_to_json(channel_links) AS doc"#,
        )
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .bind(&media_channel)
        .bind(&dto.link_key)
        .bind(&dto.link_value)
        .fetch_one(self.store.pool())
        .await?;

        Ok(row.try_get("doc")?)
    }

    pub async fn list_channel_links(&self, actor: &AuthUser) -> Result<Envelope, ApiError> {
        let spec =
            ListSpec { tenant_scoped: true, populate: LINK_POPULATE, ..Default::default() };
        aspects::list(&self.store, EntityKind::ChannelLink, &spec, Some(actor)).await
    }

    pub async fn get_channel_link(&self, actor: &AuthUser, id: Uuid) -> Result<Envelope, ApiError> {
        let spec =
            ListSpec { tenant_scoped: true, populate: LINK_POPULATE, ..Default::default() };
        aspects::list_one(&self.store, EntityKind::ChannelLink, &spec, id, Some(actor)).await
    }

    pub async fn update_channel_link(
        &self,
        actor: &AuthUser,
        id: Uuid,
        dto: UpdateChannelLink,
    ) -> Result<Envelope, ApiError> {
        let Some(existing) =
            aspects::fetch_one(&self.store, EntityKind::ChannelLink, id, Some(actor)).await?
        else {
            return Ok(Envelope::not_found());
        };

        let media_channel: Vec<Uuid> = patch_field(dto.media_channel, &existing, "mediaChannel");
        let link_key = dto.link_key.or_else(|| value_string(&existing, "linkKey"));
        let link_value = dto.link_value.or_else(|| value_string(&existing, "linkValue"));

        let row = sqlx::query(
            r#"UPDATE channel_links
               SET "mediaChannel" = $1, "linkKey" = $2, "linkValue" = $3, "lastUpdatedAt" = now()
               WHERE id = $4 AND "tenantId" = $5 AND "userId" = $6
               RETURNING row_to_json(channel_links) AS doc"#,
        )
        .bind(&media_channel)
        .bind(&link_key)
        .bind(&link_value)
        .bind(id)
        .bind(&actor.tenant_id)
        .bind(&actor.user_id)
        .fetch_optional(self.store.pool())
        .await?;

        match row {
            Some(row) => Ok(Envelope::success(row.try_get("doc")?)),
            None => Ok(Envelope::not_found()),
        }
    }

    pub async fn suspend_channel_link(
        &self,
        actor: &AuthUser,
        id: Uuid,
    ) -> Result<Envelope, ApiError> {
        aspects::suspend(&self.store, EntityKind::ChannelLink, id, Some(actor)).await
    }

    pub async fn unsuspend_channel_link(
        &self,
        actor: &AuthUser,
        id: Uuid,
    ) -> Result<Envelope, ApiError> {
        aspects::unsuspend(&self.store, EntityKind::ChannelLink, id, Some(actor)).await
    }

    pub async fn delete_channel_link(
        &self,
        actor: &AuthUser,
        id: Uuid,
    ) -> Result<Envelope, ApiError> {
        aspects::remove(&self.store, EntityKind::ChannelLink, id, Some(actor)).await
    }

    pub async fn delete_total_channel_link(
        &self,
        actor: &AuthUser,
        id: Uuid,
    ) -> Result<Envelope, ApiError> {
        aspects::remove_total(&self.store, EntityKind::ChannelLink, id, Some(actor)).await
    }
}
