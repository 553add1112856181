use uuid::Uuid;

use crate::{
    api::error,
    modules::upload::{
        model::NewUpload,
        schema::{Priority, UploadEntity},
    },
};

#[async_trait::async_trait]
pub trait UploadRepository {
    async fn create(&self, upload: &NewUpload) -> Result<UploadEntity, error::SystemError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UploadEntity>, error::SystemError>;

    async fn find_all(&self) -> Result<Vec<UploadEntity>, error::SystemError>;

    async fn find_by_owner(&self, owner_id: &Uuid) -> Result<Vec<UploadEntity>, error::SystemError>;

    /// Moves a New upload to In Progress. Returns false when the upload was
    /// not New (or is gone), so the transition happens at most once.
    async fn mark_in_progress(&self, id: i64) -> Result<bool, error::SystemError>;

    async fn resolve(
        &self,
        id: i64,
        admin_comment: &str,
    ) -> Result<Option<UploadEntity>, error::SystemError>;

    async fn update_priority(
        &self,
        id: i64,
        priority: Priority,
    ) -> Result<Option<UploadEntity>, error::SystemError>;

    async fn delete(&self, id: i64) -> Result<bool, error::SystemError>;
}
