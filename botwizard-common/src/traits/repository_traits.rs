// File: botwizard-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Error;
use crate::models::{
    Channel, FaqEntry, GoogleCredential, MessageLogEntry, Project, SpreadsheetBinding,
};

/// Per-project settings key/value store, upsert on (project_id, key).
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_value(&self, project_id: Uuid, key: &str) -> Result<Option<String>, Error>;
    async fn set_value(&self, project_id: Uuid, key: &str, value: &str) -> Result<(), Error>;
    async fn delete_value(&self, project_id: Uuid, key: &str) -> Result<(), Error>;
}

/// Durable persistence of the per-project delegated Google credential.
/// Storage contract only; refresh logic lives in the auth manager.
#[async_trait]
pub trait GoogleTokenRepository: Send + Sync {
    /// Overwrites any existing record for the project.
    async fn store_token_record(
        &self,
        project_id: Uuid,
        credential: &GoogleCredential,
    ) -> Result<(), Error>;

    async fn get_token_record(&self, project_id: Uuid) -> Result<Option<GoogleCredential>, Error>;

    async fn delete_token_record(&self, project_id: Uuid) -> Result<(), Error>;
}

/// Persistence of the project-to-spreadsheet binding. Re-binding replaces
/// the previous binding.
#[async_trait]
pub trait SheetBindingRepository: Send + Sync {
    async fn store_binding(&self, binding: &SpreadsheetBinding) -> Result<(), Error>;
    async fn get_binding(&self, project_id: Uuid) -> Result<Option<SpreadsheetBinding>, Error>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, Error>;

    /// Project ids owned by a dashboard user, for analytics scoping.
    async fn project_ids_for_owner(&self, user_id: Uuid) -> Result<Vec<Uuid>, Error>;
}

/// Append-only message log. Entries are never mutated.
#[async_trait]
pub trait MessageLogRepository: Send + Sync {
    async fn insert(&self, entry: &MessageLogEntry) -> Result<(), Error>;

    /// All entries for the given projects with `created_at` in
    /// `[start, end]`, ordered by timestamp ascending. Ordering is by
    /// timestamp value only; callers must not assume insertion order.
    async fn fetch_in_range(
        &self,
        project_ids: &[Uuid],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MessageLogEntry>, Error>;
}

#[async_trait]
pub trait FaqRepository: Send + Sync {
    async fn active_for_project(&self, project_id: Uuid) -> Result<Vec<FaqEntry>, Error>;
}

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn active_for_project(&self, project_id: Uuid) -> Result<Vec<Channel>, Error>;
}
