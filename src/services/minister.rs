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
use crate::validate::{self, CoreType, FieldError, Office, CORE_TYPE_MESSAGE, OFFICE_MESSAGE};

use super::value_string;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMinister {
    pub name: Option<String>,
    pub pretty_name: Option<String>,
    pub image: Option<String>,
    pub ministry: Option<String>,
    pub core_type: Option<String>,
    pub office: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMinister {
    pub name: Option<String>,
    pub pretty_name: Option<String>,
    pub image: Option<String>,
    pub ministry: Option<String>,
    pub core_type: Option<String>,
    pub office: Option<String>,
}

pub struct MinisterService {
    store: Store,
}

impl MinisterService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_minister(
        &self,
        actor: &AuthUser,
        dto: CreateMinister,
    ) -> Result<Envelope, ApiError> {
        let errors = self.validate_minister(&dto).await?;
        if validate::has_errors(&errors) {
            return Ok(Envelope::failed_validation(validate::failure_payload(&errors)));
        }

        aspects::create_record(
            &self.store,
            EntityKind::Minister,
            actor,
            self.insert_minister(actor, dto),
        )
        .await
    }

    async fn validate_minister(&self, dto: &CreateMinister) -> Result<Vec<FieldError>, ApiError> {
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
        validate::check_enum(
            &mut errors,
            "office",
            OFFICE_MESSAGE,
            dto.office.as_deref(),
            Office::parse,
        );

        if let Some(name) = dto.name.as_deref() {
            if self.count_by_name_hash(name).await? > 0 {
                errors.push(FieldError::duplicate("name"));
            }
        }

        Ok(errors)
    }

    async fn count_by_name_hash(&self, name: &str) -> Result<i64, ApiError> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT count(*) FROM ministers WHERE "nameHash" = $1"#)
                .bind(name_hash(name))
                .fetch_one(self.store.pool())
                .await?;
        Ok(count)
    }

    async fn insert_minister(
        &self,
        actor: &AuthUser,
        dto: CreateMinister,
    ) -> Result<Value, ApiError> {
        let name = dto.name.unwrap_or_default();
        let secret_name = self.store.cipher().encrypt(&name)?;
        let secret_image = match dto.image.as_deref() {
            Some(image) => Some(self.store.cipher().encrypt(image)?),
            None => None,
        };

        let row = sqlx::query(
            r#"INSERT INTO ministers
                   ("userId", "tenantId", "secretName", "secretImage", "nameHash", "prettyName",
                    ministry, "coreType", office)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING row_to_json(ministers) AS doc"#,
        )
        .bind(&actor.user_id)
        .bind(&actor.tenant_id)
        .bind(&secret_name)
        .bind(&secret_image)
        .bind(name_hash(&name))
        .bind(&dto.pretty_name)
        .bind(&dto.ministry)
        .bind(&dto.core_type)
        .bind(&dto.office)
        .fetch_one(self.store.pool())
        .await
        .map_err(|e| ApiError::on_conflict(e, "name"))?;

        let mut doc: Value = row.try_get("doc")?;
        aspects::decrypt_doc(&self.store, EntityKind::Minister, &mut doc)?;
        Ok(doc)
    }

    /// Ministers are a global catalog; listing is never tenant scoped.
    pub async fn list_ministers(&self) -> Result<Envelope, ApiError> {
        let spec = ListSpec { active_only: true, ..Default::default() };
        aspects::list(&self.store, EntityKind::Minister, &spec, None).await
    }

    pub async fn get_minister(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::list_one(&self.store, EntityKind::Minister, &ListSpec::default(), id, None).await
    }

    pub async fn update_minister(
        &self,
        id: Uuid,
        dto: UpdateMinister,
    ) -> Result<Envelope, ApiError> {
        let Some(existing) =
            aspects::fetch_one(&self.store, EntityKind::Minister, id, None).await?
        else {
            return Ok(Envelope::not_found());
        };

        let stored_name = value_string(&existing, "secretName");
        let mut errors = Vec::new();
        validate::check_enum(
            &mut errors,
            "coreType",
            CORE_TYPE_MESSAGE,
            dto.core_type.as_deref(),
            CoreType::parse,
        );
        validate::check_enum(
            &mut errors,
            "office",
            OFFICE_MESSAGE,
            dto.office.as_deref(),
            Office::parse,
        );

        // Renaming re-runs the uniqueness check; keeping the same name skips it.
        if let Some(new_name) = dto.name.as_deref() {
            if stored_name.as_deref() != Some(new_name)
                && self.count_by_name_hash(new_name).await? > 0
            {
                errors.push(FieldError::duplicate("name"));
            }
        }

        if validate::has_errors(&errors) {
            return Ok(Envelope::failed_validation(validate::failure_payload(&errors)));
        }

        let name = dto.name.or(stored_name);
        let image = dto.image.or_else(|| value_string(&existing, "secretImage"));
        let pretty_name = dto.pretty_name.or_else(|| value_string(&existing, "prettyName"));
        let ministry = dto.ministry.or_else(|| value_string(&existing, "ministry"));
        let core_type = dto.core_type.or_else(|| value_string(&existing, "coreType"));
        let office = dto.office.or_else(|| value_string(&existing, "office"));

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
            r#"UPDATE ministers
               SET "secretName" = $1, "secretImage" = $2,
                   "nameHash" = COALESCE($3, "nameHash"),
                   "prettyName" = $4, ministry = $5, "coreType" = $6, office = $7,
                   "lastUpdatedAt" = now()
               WHERE id = $8
               RETURNING row_to_json(ministers) AS doc"#,
        )
        .bind(&secret_name)
        .bind(&secret_image)
        .bind(&hash)
        .bind(&pretty_name)
        .bind(&ministry)
        .bind(&core_type)
        .bind(&office)
        .bind(id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| ApiError::on_conflict(e, "name"))?;

        match row {
            Some(row) => {
                let mut doc: Value = row.try_get("doc")?;
                aspects::decrypt_doc(&self.store, EntityKind::Minister, &mut doc)?;
                Ok(Envelope::success(doc))
            }
            None => Ok(Envelope::not_found()),
        }
    }

    pub async fn suspend_minister(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::suspend(&self.store, EntityKind::Minister, id, None).await
    }

    pub async fn unsuspend_minister(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::unsuspend(&self.store, EntityKind::Minister, id, None).await
    }

    pub async fn feature_minister(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::feature(&self.store, EntityKind::Minister, id, None).await
    }

    pub async fn unfeature_minister(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::unfeature(&self.store, EntityKind::Minister, id, None).await
    }

    pub async fn delete_minister(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::remove(&self.store, EntityKind::Minister, id, None).await
    }

    pub async fn delete_total_minister(&self, id: Uuid) -> Result<Envelope, ApiError> {
        aspects::remove_total(&self.store, EntityKind::Minister, id, None).await
    }
}
