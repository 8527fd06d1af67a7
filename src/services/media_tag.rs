use serde::Deserialize;
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use crate::aspects::{self, ListSpec};
use crate::auth::AuthUser;
use crate::crypto::{name_hash, FieldCipher};
use crate::error::ApiError;
use crate::response::Envelope;
use crate::store::{EntityKind, Store};
use crate::validate::{self, CoreType, FieldError, CORE_TYPE_MESSAGE};

use super::value_string;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaTag {
    pub name: Option<String>,
    pub pretty_name: Option<String>,
    pub image: Option<String>,
    pub core_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMediaTag {
    pub name: Option<String>,
    pub pretty_name: Option<String>,
    pub image: Option<String>,
    pub core_type: Option<String>,
}

pub struct MediaTagService {
    store: Store,
}

impl MediaTagService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_media_tag(
        &self,
        actor: &AuthUser,
        dto: CreateMediaTag,
    ) -> Result<Envelope, ApiError> {
        let errors = self.validate_new_media_tag(&dto).await?;
        if validate::has_errors(&errors) {
            return Ok(Envelope::failed_validation(validate::failure_payload(&errors)));
        }

        aspects::create_record(
            &self.store,
            EntityKind::MediaTag,
            actor,
            self.insert_media_tag(actor, dto),
        )
        .await
    }

    async fn validate_new_media_tag(
        &self,
        dto: &CreateMediaTag,
    ) -> Result<Vec<FieldError>, ApiError> {
        let mut errors = Vec::new();
        validate::require(&mut errors, "name", "Name", dto.name.as_deref());
        validate::require(&mut errors, "coreType", "Core Type", dto.core_type.as_deref());
        validate::check_enum(
            &mut errors,
            "coreType",
            CORE_TYPE_MESSAGE,
            dto.core_type.as_deref(),
            CoreType::parse,
        );

        // Uniqueness runs against the hash; the plaintext name is encrypted
        // at rest and cannot carry an index.
        if let Some(name) = dto.name.as_deref() {
            if self.count_by_name_hash(name).await? > 0 {
                errors.push(FieldError::duplicate("name"));
            }
        }

        Ok(errors)
    }

    async fn count_by_name_hash(&self, name: &str) -> Result<i64, ApiError> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT count(*) FROM media_tags WHERE "nameHash" = $1"#)
                .bind(name_hash(name))
                .fetch_one(self.store.pool())
                .await?;
        Ok(count)
    }

    async fn insert_media_tag(
        &self,
        actor: &AuthUser,
        dto: CreateMediaTag,
    ) -> Result<Value, ApiError> {
        let name = dto.name.unwrap_or_default();
        let secret_name = self.store.cipher().encrypt(&name)?;
        let secret_image = match dto.image.as_deref() {
            Some(image) => Some(self.store.cipher().encrypt(image)?),
            None => None,
        };

        let row = sqlx::query(
            r#"INSERT INTO media_tags
                   ("userId", "tenantId", "secretName", "secretImage", "nameHash", "prettyName", "coreType")
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING row_to_json(media_tags) AS doc"#,
        )
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .bind(&secret_name)
        .bind(&secret_image)
        .bind(name_hash(&name))
        .bind(&dto.pretty_name)
        .bind(&dto.core_type)
        .fetch_one(self.store.pool())
        .await
        .map_err(|e| ApiError::on_conflict(e, "name"))?;

        let mut doc: Value = row.try_get("doc")?;
        aspects::decrypt_doc(&self.store, EntityKind::MediaTag, &mut doc)?;
        Ok(doc)
    }

    /// Tags are a global catalog; listing is never tenant scoped.
    pub async fn list_media_tags(&self) -> Result<Envelope, ApiError> {
        let spec = ListSpec { active_only: true, ..Default::default() };
        aspects::list(&self.store, EntityKind::MediaTag, &spec, None).await
    }

    pub async fn get_media_tag(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::list_one(&self.store, EntityKind::MediaTag, &ListSpec::default(), id, None).await
    }

    pub async fn update_media_tag(
        &self,
        id: Uuid,
        dto: UpdateMediaTag,
    ) -> Result<Envelope, ApiError> {
        let Some(existing) =
            aspects::fetch_one(&self.store, EntityKind::MediaTag, id, None).await?
        else {
            return Ok(Envelope::not_found());
        };

        let mut errors = Vec::new();
        validate::check_enum(
            &mut errors,
            "coreType",
            CORE_TYPE_MESSAGE,
            dto.core_type.as_deref(),
            CoreType::parse,
        );
        if validate::has_errors(&errors) {
            return Ok(Envelope::failed_validation(validate::failure_payload(&errors)));
        }

        // fetch_one hands back plaintext secrets, so merging and re-sealing
        // is symmetric for changed and unchanged values.
        let name = dto.name.or_else(|| value_string(&existing, "secretName"));
        let image = dto.image.or_else(|| value_string(&existing, "secretImage"));
        let pretty_name = dto.pretty_name.or_else(|| value_string(&existing, "prettyName"));
        let core_type = dto.core_type.or_else(|| value_string(&existing, "coreType"));

        let secret_name = match name.as_deref() {
            Some(n) => Some(self.store.cipher().encrypt(n)?),
            None => None,
        };
        let secret_image = match image.as_deref() {
            Some(i) => Some(self.store.cipher().encrypt(i)?),
            None => None,
        };
        let hash = name.as_deref().map(name_hash);

        let row = sqlx::query(
            r#"UPDATE media_tags
               SET "secretName" = $1, "secretImage" = $2,
                   "nameHash" = COALESCE($3, "nameHash"),
                   "prettyName" = $4, "coreType" = $5, "lastUpdatedAt" = now()
               WHERE id = $6
               RETURNING row_to_json(media_tags) AS doc"#,
        )
        .bind(&secret_name)
        .bind(&secret_image)
        .bind(&hash)
        .bind(&pretty_name)
        .bind(&core_type)
        .bind(id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| ApiError::on_conflict(e, "name"))?;

        match row {
            Some(row) => {
                let mut doc: Value = row.try_get("doc")?;
                aspects::decrypt_doc(&self.store, EntityKind::MediaTag, &mut doc)?;
                Ok(Envelope::success(doc))
            }
            None => Ok(Envelope::not_found()),
        }
    }

    pub async fn suspend_media_tag(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::suspend(&self.store, EntityKind::MediaTag, id, None).await
    }

    pub async fn unsuspend_media_tag(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::unsuspend(&self.store, EntityKind::MediaTag, id, None).await
    }

    pub async fn feature_media_tag(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::feature(&self.store, EntityKind::MediaTag, id, None).await
    }

    pub async fn unfeature_media_tag(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::unfeature(&self.store, EntityKind::MediaTag, id, None).await
    }

    pub async fn delete_media_tag(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::remove(&self.store, EntityKind::MediaTag, id, None).await
    }

    pub async fn delete_total_media_tag(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::remove_total(&self.store, EntityKind::MediaTag, id, None).await
    }
}
