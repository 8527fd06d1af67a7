//! Cross-cutting CRUD behavior, written once and composed by every entity
//! service: audit-trail recording on creation, standardized list shaping
//! (scoping, sorting, reference population), and the uniform
//! suspend/unsuspend/feature/unfeature/remove semantics.
//!
//! These are plain higher-order functions over an [`EntityKind`]; services
//! stay thin declarations of what query or document they need, while this
//! module owns how it is executed, recorded and shaped.

use std::collections::HashMap;
use std::future::Future;

use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::crypto::FieldCipher;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::store::{EntityKind, Store};

/// Sort order for list queries. Columns are compile-time constants supplied
/// by services, never caller input.
#[derive(Debug, Clone, Copy)]
pub struct Sort {
    pub column: &'static str,
    pub descending: bool,
}

impl Default for Sort {
    fn default() -> Self {
        Self { column: "createdAt", descending: true }
    }
}

/// Reference field to expand into the documents it points at.
#[derive(Debug, Clone, Copy)]
pub struct Populate {
    pub field: &'static str,
    pub entity: EntityKind,
}

/// Query-shaping descriptor returned (conceptually) by each list call site.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    /// Merge tenant+owner scoping into the query when caller identity is present.
    pub tenant_scoped: bool,
    /// Exclude suspended documents. Off for the explicit "all" variants.
    pub active_only: bool,
    pub sort: Sort,
    pub populate: &'static [Populate],
}

impl Default for ListSpec {
    fn default() -> Self {
        Self { tenant_scoped: false, active_only: false, sort: Sort::default(), populate: &[] }
    }
}

fn order_clause(sort: &Sort) -> String {
    format!(r#""{}" {}"#, sort.column, if sort.descending { "DESC" } else { "ASC" })
}

fn build_list_sql(entity: EntityKind, spec: &ListSpec, scoped: bool) -> String {
    let mut clauses: Vec<&str> = Vec::new();
    if spec.active_only {
        clauses.push(r#""isActive" = TRUE"#);
    }
    if scoped {
        clauses.push(r#""tenantId" = $1 AND "userId" = $2"#);
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    format!(
        "SELECT row_to_json(t) AS doc FROM (SELECT * FROM {}{} ORDER BY {}) t",
        entity.table(),
        where_sql,
        order_clause(&spec.sort)
    )
}

/// Run the caller-built insert, then record the creation in the audit trail
/// and emit the saved document. A failed insert propagates as the error
/// envelope and writes no trail entry; a failed trail write never fails the
/// request once the document is durable.
pub async fn create_record<F>(
    store: &Store,
    entity: EntityKind,
    auth: &AuthUser,
    persist: F,
) -> Result<Envelope, ApiError>
where
    F: Future<Output = Result<Value, ApiError>>,
{
    let doc = persist.await?;
    record_trail(store, entity, &doc, auth).await;
    Ok(Envelope::success(doc))
}

async fn record_trail(store: &Store, entity: EntityKind, doc: &Value, auth: &AuthUser) {
    let record_id = doc
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok());

    let Some(record_id) = record_id else {
        tracing::warn!(entity = entity.tag(), "saved document has no id; skipping trail entry");
        return;
    };

    let result = sqlx::query(
        r#"INSERT INTO audit_trail (entity, "recordId", "userId", "tenantId", action)
           VALUES ($1, $2, $3, $4, 'created')"#,
    )
    .bind(entity.tag())
    .bind(record_id)
    .bind(&auth.user_id)
    .bind(&auth.tenant_id)
    .execute(store.pool())
    .await;

    if let Err(err) = result {
        tracing::warn!(entity = entity.tag(), %record_id, "audit trail write failed: {}", err);
    }
}

/// List documents for an entity. Tenant/owner scoping is merged only when the
/// descriptor asks for it and caller identity is present. No matches is a
/// SUCCESS with an empty list, never an error.
pub async fn list(
    store: &Store,
    entity: EntityKind,
    spec: &ListSpec,
    auth: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    let scope = if spec.tenant_scoped { auth } else { None };
    let sql = build_list_sql(entity, spec, scope.is_some());

    let mut query = sqlx::query(&sql);
    if let Some(actor) = scope {
        query = query.bind(&actor.tenant_id).bind(&actor.user_id);
    }

    let rows = query.fetch_all(store.pool()).await?;
    let mut docs = rows
        .iter()
        .map(|row| row.try_get::<Value, _>("doc"))
        .collect::<Result<Vec<_>, _>>()?;

    decrypt_docs(store, entity, &mut docs)?;
    populate(store, &mut docs, spec.populate).await?;

    Ok(Envelope::success(Value::Array(docs)))
}

/// Fetch a single document by path identifier; NOT_FOUND when absent.
pub async fn list_one(
    store: &Store,
    entity: EntityKind,
    spec: &ListSpec,
    id: Uuid,
    auth: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    let scope = if spec.tenant_scoped { auth } else { None };

    match fetch_one(store, entity, id, scope).await? {
        Some(doc) => {
            let mut docs = vec![doc];
            populate(store, &mut docs, spec.populate).await?;
            Ok(Envelope::success(docs.remove(0)))
        }
        None => Ok(Envelope::not_found()),
    }
}

/// Load one document as JSON, decrypting secret fields. Shared by the list-one
/// wrapper and the services' read-modify-write update flows.
pub async fn fetch_one(
    store: &Store,
    entity: EntityKind,
    id: Uuid,
    scope: Option<&AuthUser>,
) -> Result<Option<Value>, ApiError> {
    let sql = if scope.is_some() {
        format!(
            r#"SELECT row_to_json(t) AS doc FROM (SELECT * FROM {} WHERE id = $1 AND "tenantId" = $2 AND "userId" = $3) t"#,
            entity.table()
        )
    } else {
        format!(
            "SELECT row_to_json(t) AS doc FROM (SELECT * FROM {} WHERE id = $1) t",
            entity.table()
        )
    };

    let mut query = sqlx::query(&sql).bind(id);
    if let Some(actor) = scope {
        query = query.bind(&actor.tenant_id).bind(&actor.user_id);
    }

    match query.fetch_optional(store.pool()).await? {
        Some(row) => {
            let mut doc: Value = row.try_get("doc")?;
            decrypt_doc(store, entity, &mut doc)?;
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}

/// Soft-suspend: flip the active flag off.
pub async fn suspend(
    store: &Store,
    entity: EntityKind,
    id: Uuid,
    scope: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    toggle(store, entity, id, r#""isActive" = FALSE"#, scope).await
}

/// Reactivate a suspended document.
pub async fn unsuspend(
    store: &Store,
    entity: EntityKind,
    id: Uuid,
    scope: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    toggle(store, entity, id, r#""isActive" = TRUE"#, scope).await
}

pub async fn feature(
    store: &Store,
    entity: EntityKind,
    id: Uuid,
    scope: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    toggle(store, entity, id, r#"featured = TRUE, "featuredAt" = now()"#, scope).await
}

pub async fn unfeature(
    store: &Store,
    entity: EntityKind,
    id: Uuid,
    scope: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    toggle(store, entity, id, r#"featured = FALSE, "featuredAt" = NULL"#, scope).await
}

/// Reversible removal: same state transition as suspend, kept as its own
/// entry point so deletion call sites read as deletions.
pub async fn remove(
    store: &Store,
    entity: EntityKind,
    id: Uuid,
    scope: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    suspend(store, entity, id, scope).await
}

/// Irreversible removal: the document is erased from the collection.
pub async fn remove_total(
    store: &Store,
    entity: EntityKind,
    id: Uuid,
    scope: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    let scope_sql = if scope.is_some() { r#" AND "tenantId" = $2 AND "userId" = $3"# } else { "" };
    let sql = format!(
        "DELETE FROM {t} WHERE id = $1{scope} RETURNING row_to_json({t}) AS doc",
        t = entity.table(),
        scope = scope_sql
    );

    let mut query = sqlx::query(&sql).bind(id);
    if let Some(actor) = scope {
        query = query.bind(&actor.tenant_id).bind(&actor.user_id);
    }

    match query.fetch_optional(store.pool()).await? {
        Some(row) => {
            let mut doc: Value = row.try_get("doc")?;
            decrypt_doc(store, entity, &mut doc)?;
            Ok(Envelope::success(doc))
        }
        None => Ok(Envelope::not_found()),
    }
}

async fn toggle(
    store: &Store,
    entity: EntityKind,
    id: Uuid,
    set_sql: &str,
    scope: Option<&AuthUser>,
) -> Result<Envelope, ApiError> {
    let scope_sql = if scope.is_some() { r#" AND "tenantId" = $2 AND "userId" = $3"# } else { "" };
    let sql = format!(
        r#"UPDATE {t} SET {set}, "lastUpdatedAt" = now() WHERE id = $1{scope} RETURNING row_to_json({t}) AS doc"#,
        t = entity.table(),
        set = set_sql,
        scope = scope_sql
    );

    let mut query = sqlx::query(&sql).bind(id);
    if let Some(actor) = scope {
        query = query.bind(&actor.tenant_id).bind(&actor.user_id);
    }

    match query.fetch_optional(store.pool()).await? {
        Some(row) => {
            let mut doc: Value = row.try_get("doc")?;
            decrypt_doc(store, entity, &mut doc)?;
            Ok(Envelope::success(doc))
        }
        None => Ok(Envelope::not_found()),
    }
}

/// Expand reference fields into the documents they point at. Stored UUIDs
/// whose target no longer exists are left in place as identifiers.
pub async fn populate(
    store: &Store,
    docs: &mut [Value],
    fields: &[Populate],
) -> Result<(), ApiError> {
    for p in fields {
        let mut ids: Vec<Uuid> = Vec::new();
        for doc in docs.iter() {
            collect_ids(doc.get(p.field), &mut ids);
        }
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            continue;
        }

        let sql = format!(
            "SELECT row_to_json(t) AS doc FROM (SELECT * FROM {} WHERE id = ANY($1)) t",
            p.entity.table()
        );
        let rows = sqlx::query(&sql).bind(&ids).fetch_all(store.pool()).await?;

        let mut referenced: HashMap<String, Value> = HashMap::new();
        for row in rows {
            let mut doc: Value = row.try_get("doc")?;
            decrypt_doc(store, p.entity, &mut doc)?;
            if let Some(id) = doc.get("id").and_then(Value::as_str).map(str::to_string) {
                referenced.insert(id, doc);
            }
        }

        for doc in docs.iter_mut() {
            if let Some(field) = doc.get_mut(p.field) {
                embed(field, &referenced);
            }
        }
    }

    Ok(())
}

fn collect_ids(value: Option<&Value>, ids: &mut Vec<Uuid>) {
    match value {
        Some(Value::String(s)) => {
            if let Ok(id) = Uuid::parse_str(s) {
                ids.push(id);
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                if let Some(id) = item.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
                    ids.push(id);
                }
            }
        }
        _ => {}
    }
}

fn embed(field: &mut Value, referenced: &HashMap<String, Value>) {
    match field {
        Value::String(s) => {
            let replacement = referenced.get(s.as_str()).cloned();
            if let Some(doc) = replacement {
                *field = doc;
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                let replacement = item.as_str().and_then(|s| referenced.get(s)).cloned();
                if let Some(doc) = replacement {
                    *item = doc;
                }
            }
        }
        _ => {}
    }
}

/// Decrypt the entity's designated secret fields in place.
pub fn decrypt_doc(store: &Store, entity: EntityKind, doc: &mut Value) -> Result<(), ApiError> {
    for field in entity.secret_fields() {
        if let Some(value) = doc.get_mut(*field) {
            let plain = match value.as_str() {
                Some(ciphertext) => Some(store.cipher().decrypt(ciphertext)?),
                None => None,
            };
            if let Some(plain) = plain {
                *value = Value::String(plain);
            }
        }
    }
    Ok(())
}

pub fn decrypt_docs(
    store: &Store,
    entity: EntityKind,
    docs: &mut [Value],
) -> Result<(), ApiError> {
    for doc in docs.iter_mut() {
        decrypt_doc(store, entity, doc)?;
    }
    Ok(())
}
