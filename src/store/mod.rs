//! Store handle shared by every service. The pool and the field cipher are
//! created once at startup and injected at construction time; nothing hangs
//! off a request context or a process-wide mutable global.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::crypto::FieldCipher;

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
    cipher: Arc<dyn FieldCipher>,
}

impl Store {
    pub fn new(pool: PgPool, cipher: Arc<dyn FieldCipher>) -> Self {
        Self { pool, cipher }
    }

    pub async fn connect(
        config: &AppConfig,
        cipher: Arc<dyn FieldCipher>,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
            .connect(&config.database.url)
            .await?;

        Ok(Self::new(pool, cipher))
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn cipher(&self) -> &dyn FieldCipher {
        self.cipher.as_ref()
    }
}

/// The five content collections the aspect layer can operate on generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Channel,
    ChannelSubscription,
    Media,
    MediaTag,
    Minister,
    ChannelLink,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Channel => "channels",
            EntityKind::ChannelSubscription => "channel_subscriptions",
            EntityKind::Media => "media",
            EntityKind::MediaTag => "media_tags",
            EntityKind::Minister => "ministers",
            EntityKind::ChannelLink => "channel_links",
        }
    }

    /// Entity tag recorded in the audit trail.
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Channel => "channel",
            EntityKind::ChannelSubscription => "channelSubscription",
            EntityKind::Media => "media",
            EntityKind::MediaTag => "mediaTag",
            EntityKind::Minister => "minister",
            EntityKind::ChannelLink => "channelLink",
        }
    }

    /// Columns that hold ciphertext and must pass through the field cipher
    /// on their way in and out of the store.
    pub fn secret_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Media => &["secretSourceLink"],
            EntityKind::MediaTag | EntityKind::Minister => &["secretName", "secretImage"],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_tables_and_tags() {
        assert_eq!(EntityKind::Channel.table(), "channels");
        assert_eq!(EntityKind::MediaTag.table(), "media_tags");
        assert_eq!(EntityKind::MediaTag.tag(), "mediaTag");
        assert_eq!(EntityKind::ChannelLink.tag(), "channelLink");
    }

    #[test]
    fn secret_fields_cover_encrypted_columns_only() {
        assert_eq!(EntityKind::Media.secret_fields(), &["secretSourceLink"]);
        assert_eq!(EntityKind::Minister.secret_fields(), &["secretName", "secretImage"]);
        assert!(EntityKind::Channel.secret_fields().is_empty());
        assert!(EntityKind::ChannelSubscription.secret_fields().is_empty());
    }
}
