use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::Row;
use uuid::Uuid;

use crate::aspects::{self, ListSpec, Populate};
use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::response::Envelope;
use crate::store::{EntityKind, Store};
use crate::validate::{self, FieldError};

use super::value_string;

const SUBSCRIPTION_POPULATE: &[Populate] =
    &[Populate { field: "mediaChannel", entity: EntityKind::Channel }];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub banner_image_link: Option<String>,
    pub image_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub banner_image_link: Option<String>,
    pub image_link: Option<String>,
}

pub struct ChannelService {
    store: Store,
}

impl ChannelService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_channel(
        &self,
        actor: &AuthUser,
        dto: CreateChannel,
    ) -> Result<Envelope, ApiError> {
        let errors = self.validate_new_channel(actor, &dto).await?;
        if validate::has_errors(&errors) {
            return Ok(Envelope::failed_validation(validate::failure_payload(&errors)));
        }

        aspects::create_record(
            &self.store,
            EntityKind::Channel,
            actor,
            self.insert_channel(actor, dto),
        )
        .await
    }

    async fn validate_new_channel(
        &self,
        actor: &AuthUser,
        dto: &CreateChannel,
    ) -> Result<Vec<FieldError>, ApiError> {
        let mut errors = Vec::new();
        validate::require(&mut errors, "name", "Name", dto.name.as_deref());

        if let Some(name) = dto.name.as_deref() {
            let count: i64 = sqlx::query_scalar(
                r#"SELECT count(*) FROM channels WHERE "tenantId" = $1 AND name = $2"#,
            )
            .bind(&actor.tenant_id)
            .bind(name)
            .fetch_one(self.store.pool())
            .await?;

            if count > 0 {
                errors.push(FieldError::duplicate("name"));
            }
        }

        Ok(errors)
    }

    async fn insert_channel(
        &self,
        actor: &AuthUser,
        dto: CreateChannel,
    ) -> Result<Value, ApiError> {
        let row = sqlx::query(
            r#"INSERT INTO channels ("userId", "tenantId", name, description, "bannerImageLink", "imageLink")
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING row_to_json(channels) AS doc"#,
        )
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(&dto.banner_image_link)
        .bind(&dto.image_link)
        .fetch_one(self.store.pool())
        .await
        .map_err(|e| ApiError::on_conflict(e, "name"))?;

        Ok(row.try_get("doc")?)
    }

    pub async fn list_channels(&self) -> Result<Envelope, ApiError> {
        let spec = ListSpec { active_only: true, ..Default::default() };
        aspects::list(&self.store, EntityKind::Channel, &spec, None).await
    }

    pub async fn list_all_channels(&self) -> Result<Envelope, ApiError> {
        aspects::list(&self.store, EntityKind::Channel, &ListSpec::default(), None).await
    }

    pub async fn list_channels_auth(&self, actor: &AuthUser) -> Result<Envelope, ApiError> {
        let spec = ListSpec { tenant_scoped: true, ..Default::default() };
        aspects::list(&self.store, EntityKind::Channel, &spec, Some(actor)).await
    }

    /// The caller may only enumerate their own channels; any other userId in
    /// the query is answered with NOT_FOUND rather than another user's data.
    pub async fn list_user_channels(
        &self,
        actor: &AuthUser,
        user_id_query: Option<&str>,
    ) -> Result<Envelope, ApiError> {
        if user_id_query != Some(actor.user_id.as_str()) {
            return Ok(Envelope::not_found());
        }

        let spec = ListSpec { tenant_scoped: true, ..Default::default() };
        aspects::list(&self.store, EntityKind::Channel, &spec, Some(actor)).await
    }

    pub async fn get_channel(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::list_one(&self.store, EntityKind::Channel, &ListSpec::default(), id, None).await
    }

    pub async fn update_channel(
        &self,
        actor: &AuthUser,
        id: Uuid,
        dto: UpdateChannel,
    ) -> Result<Envelope, ApiError> {
        let Some(existing) =
            aspects::fetch_one(&self.store, EntityKind::Channel, id, Some(actor)).await?
        else {
            return Ok(Envelope::not_found());
        };

        let name = dto.name.or_else(|| value_string(&existing, "name"));
        let description = dto.description.or_else(|| value_string(&existing, "description"));
        let banner = dto.banner_image_link.or_else(|| value_string(&existing, "bannerImageLink"));
        let image = dto.image_link.or_else(|| value_string(&existing, "imageLink"));

        let row = sqlx::query(
            r#"UPDATE channels
               SET name = $1, description = $2, "bannerImageLink" = $3, "imageLink" = $4, "lastUpdatedAt" = now()
               WHERE id = $5 AND "tenantId" = $6 AND "userId" = $7
               RETURNING row_to_json(channels) AS doc"#,
        )
        .bind(&name)
        .bind(&description)
        .bind(&banner)
        .bind(&image)
        .bind(id)
        .bind(&actor.tenant_id)
        .bind(&actor.user_id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| ApiError::on_conflict(e, "name"))?;

        match row {
            Some(row) => Ok(Envelope::success(row.try_get("doc")?)),
            None => Ok(Envelope::not_found()),
        }
    }

    pub async fn suspend_channel(&self, actor: &AuthUser, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::suspend(&self.store, EntityKind::Channel, id, Some(actor)).await
    }

    pub async fn unsuspend_channel(
        &self,
        actor: &AuthUser,
        id: Uuid,
    ) -> Result<Envelope, ApiError> {
        aspects::unsuspend(&self.store, EntityKind::Channel, id, Some(actor)).await
    }

    pub async fn delete_channel(&self, actor: &AuthUser, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::remove(&self.store, EntityKind::Channel, id, Some(actor)).await
    }

    pub async fn delete_total_channel(
        &self,
        actor: &AuthUser,
        id: Uuid,
    ) -> Result<Envelope, ApiError> {
        aspects::remove_total(&self.store, EntityKind::Channel, id, Some(actor)).await
    }

    /// Verification is reserved for elevated roles and takes a case-insensitive
    /// yes/no instruction. Lookup is deliberately unscoped: admins verify
    /// channels across tenants.
    pub async fn verify_channel(
        &self,
        actor: &AuthUser,
        id: Uuid,
        instruction: Option<&str>,
    ) -> Result<Envelope, ApiError> {
        if !auth::is_elevated(&actor.user_type) {
            return Ok(Envelope::unauthorized_empty());
        }

        let verified = match instruction.map(str::to_uppercase).as_deref() {
            Some("YES") => true,
            Some("NO") => false,
            _ => return Ok(Envelope::failed_validation_empty()),
        };

        let row = sqlx::query(
            r#"UPDATE channels SET "isVerified" = $1, "lastUpdatedAt" = now()
               WHERE id = $2
               RETURNING row_to_json(channels) AS doc"#,
        )
        .bind(verified)
        .bind(id)
        .fetch_optional(self.store.pool())
        .await?;

        match row {
            Some(row) => Ok(Envelope::success(row.try_get("doc")?)),
            None => Ok(Envelope::not_found()),
        }
    }

    // ---- subscriptions -------------------------------------------------

    pub async fn list_user_subscriptions(&self, actor: &AuthUser) -> Result<Envelope, ApiError> {
        let rows = sqlx::query(
            r#"SELECT row_to_json(cs) AS doc FROM channel_subscriptions cs
               WHERE "userId" = $1 AND "tenantId" = $2
               ORDER BY "createdAt" DESC"#,
        )
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .fetch_all(self.store.pool())
        .await?;

        let mut docs = rows
            .iter()
            .map(|row| row.try_get::<Value, _>("doc"))
            .collect::<Result<Vec<_>, _>>()?;

        aspects::populate(&self.store, &mut docs, SUBSCRIPTION_POPULATE).await?;

        Ok(Envelope::success(Value::Array(docs)))
    }

    pub async fn list_user_one_subscription(
        &self,
        actor: &AuthUser,
        channel_id: Uuid,
    ) -> Result<Envelope, ApiError> {
        match self.find_subscription(actor, channel_id).await? {
            Some(doc) => Ok(Envelope::success(doc)),
            None => Ok(Envelope::success(Value::Array(Vec::new()))),
        }
    }

    /// Idempotent subscribe. The conditional upsert returns a row only when
    /// the document was created or flipped from unsubscribed, which is
    /// exactly when the channel counter may move.
    pub async fn subscribe(&self, actor: &AuthUser, channel_id: Uuid) -> Result<Envelope, ApiError> {
        if self.find_tenant_channel(actor, channel_id).await?.is_none() {
            return Ok(Envelope::not_found_with(json!({ "msg": "Channel Not Found" })));
        }

        let row = sqlx::query(
            r#"INSERT INTO channel_subscriptions AS cs ("mediaChannel", "userId", "tenantId", subscribed)
               VALUES ($1, $2, $3, TRUE)
               ON CONFLICT ("userId", "mediaChannel", "tenantId")
               DO UPDATE SET subscribed = TRUE, "lastUpdatedAt" = now()
               WHERE cs.subscribed IS DISTINCT FROM TRUE
               RETURNING row_to_json(cs) AS doc"#,
        )
        .bind(channel_id)
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .fetch_optional(self.store.pool())
        .await?;

        match row {
            Some(row) => {
                self.bump_subscribers(channel_id, 1).await?;
                Ok(Envelope::success(row.try_get("doc")?))
            }
            None => {
                let existing = self.find_subscription(actor, channel_id).await?;
                Ok(Envelope::success(existing.unwrap_or_else(|| Value::Array(Vec::new()))))
            }
        }
    }

    /// Unsubscribing also clears the notification flag. The counter moves
    /// only when a subscribed document actually flipped.
    pub async fn unsubscribe(
        &self,
        actor: &AuthUser,
        channel_id: Uuid,
    ) -> Result<Envelope, ApiError> {
        if self.find_tenant_channel(actor, channel_id).await?.is_none() {
            return Ok(Envelope::not_found_with(json!({ "msg": "Channel Not Found" })));
        }

        let row = sqlx::query(
            r#"UPDATE channel_subscriptions AS cs
               SET subscribed = FALSE, "notifyMe" = FALSE, "lastUpdatedAt" = now()
               WHERE "mediaChannel" = $1 AND "userId" = $2 AND "tenantId" = $3 AND cs.subscribed = TRUE
               RETURNING row_to_json(cs) AS doc"#,
        )
        .bind(channel_id)
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .fetch_optional(self.store.pool())
        .await?;

        match row {
            Some(row) => {
                self.bump_subscribers(channel_id, -1).await?;
                Ok(Envelope::success(row.try_get("doc")?))
            }
            None => Ok(Envelope::success_empty()),
        }
    }

    /// Asking for notifications implies being subscribed. The subscriber
    /// counter is left alone here, matching the long-standing behavior.
    pub async fn notify(&self, actor: &AuthUser, channel_id: Uuid) -> Result<Envelope, ApiError> {
        if self.find_tenant_channel(actor, channel_id).await?.is_none() {
            return Ok(Envelope::not_found_with(json!({ "msg": "Channel Not Found" })));
        }

        let row = sqlx::query(
            r#"INSERT INTO channel_subscriptions AS cs ("mediaChannel", "userId", "tenantId", subscribed, "notifyMe")
               VALUES ($1, $2, $3, TRUE, TRUE)
               ON CONFLICT ("userId", "mediaChannel", "tenantId")
               DO UPDATE SET subscribed = TRUE, "notifyMe" = TRUE, "lastUpdatedAt" = now()
               RETURNING row_to_json(cs) AS doc"#,
        )
        .bind(channel_id)
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .fetch_one(self.store.pool())
        .await?;

        Ok(Envelope::success(row.try_get("doc")?))
    }

    pub async fn unnotify(&self, actor: &AuthUser, channel_id: Uuid) -> Result<Envelope, ApiError> {
        if self.find_tenant_channel(actor, channel_id).await?.is_none() {
            return Ok(Envelope::not_found_with(json!({ "msg": "Channel Not Found" })));
        }

        let row = sqlx::query(
            r#"UPDATE channel_subscriptions AS cs
               SET "notifyMe" = FALSE, "lastUpdatedAt" = now()
               WHERE "mediaChannel" = $1 AND "userId" = $2 AND "tenantId" = $3
               RETURNING row_to_json(cs) AS doc"#,
        )
        .bind(channel_id)
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .fetch_optional(self.store.pool())
        .await?;

        match row {
            Some(row) => Ok(Envelope::success(row.try_get("doc")?)),
            None => Ok(Envelope::success_empty()),
        }
    }

    async fn find_tenant_channel(
        &self,
        actor: &AuthUser,
        channel_id: Uuid,
    ) -> Result<Option<Value>, ApiError> {
        let row = sqlx::query(
            r#"SELECT row_to_json(c) AS doc FROM channels c WHERE id = $1 AND "tenantId" = $2"#,
        )
        .bind(channel_id)
        .bind(&actor.tenant_id)
        .fetch_optional(self.store.pool())
        .await?;

        Ok(row.map(|r| r.try_get("doc")).transpose()?)
    }

    async fn find_subscription(
        &self,
        actor: &AuthUser,
        channel_id: Uuid,
    ) -> Result<Option<Value>, ApiError> {
        let row = sqlx::query(
            r#"SELECT row_to_json(cs) AS doc FROM channel_subscriptions cs
               WHERE "mediaChannel" = $1 AND "userId" = $2 AND "tenantId" = $3"#,
        )
        .bind(channel_id)
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .fetch_optional(self.store.pool())
        .await?;

        Ok(row.map(|r| r.try_get("doc")).transpose()?)
    }

    /// Atomic counter move over the stringly-typed subscriber count. An
    /// unparseable stored value restarts the count at 1 on increment and
    /// blocks the decrement entirely.
    async fn bump_subscribers(&self, channel_id: Uuid, delta: i64) -> Result<(), ApiError> {
        let sql = if delta >= 0 {
            r#"UPDATE channels
               SET subscribers = ((CASE WHEN subscribers ~ '^[0-9]+$' THEN subscribers::bigint ELSE 0 END) + 1)::text,
                   "lastUpdatedAt" = now()
               WHERE id = $1"#
        } else {
            r#"UPDATE channels
               SET subscribers = (subscribers::bigint - 1)::text, "lastUpdatedAt" = now()
               WHERE id = $1
                 AND (CASE WHEN subscribers ~ '^[0-9]+$' THEN subscribers::bigint ELSE 0 END) > 0"#
        };

        sqlx::query(sql).bind(channel_id).execute(self.store.pool()).await?;
        Ok(())
    }
}
