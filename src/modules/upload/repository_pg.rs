use uuid::Uuid;

use crate::{
    api::error,
    modules::upload::{
        model::NewUpload,
        repository::UploadRepository,
        schema::{Priority, UploadEntity, UploadStatus},
    },
};

#[derive(Clone)]
pub struct UploadRepositoryPg {
    pool: sqlx::PgPool,
}

impl UploadRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UploadRepository for UploadRepositoryPg {
    async fn create(&self, upload: &NewUpload) -> Result<UploadEntity, error::SystemError> {
        let entity = sqlx::query_as::<_, UploadEntity>(
            r#"
            INSERT INTO uploads
                (owner_id, title, original_filename, storage_path, mime_type, file_size, user_comment, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(upload.owner_id)
        .bind(&upload.title)
        .bind(&upload.original_filename)
        .bind(&upload.storage_path)
        .bind(&upload.mime_type)
        .bind(upload.file_size)
        .bind(&upload.user_comment)
        .bind(upload.priority)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UploadEntity>, error::SystemError> {
        let upload = sqlx::query_as::<_, UploadEntity>("SELECT * FROM uploads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(upload)
    }

    async fn find_all(&self) -> Result<Vec<UploadEntity>, error::SystemError> {
        let uploads = sqlx::query_as::<_, UploadEntity>("SELECT * FROM uploads ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(uploads)
    }

    async fn find_by_owner(&self, owner_id: &Uuid) -> Result<Vec<UploadEntity>, error::SystemError> {
        let uploads = sqlx::query_as::<_, UploadEntity>(
            "SELECT * FROM uploads WHERE owner_id = $1 ORDER BY id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(uploads)
    }

    async fn mark_in_progress(&self, id: i64) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            r#"
            UPDATE uploads
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(UploadStatus::InProgress)
        .bind(UploadStatus::New)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn resolve(
        &self,
        id: i64,
        admin_comment: &str,
    ) -> Result<Option<UploadEntity>, error::SystemError> {
        let upload = sqlx::query_as::<_, UploadEntity>(
            r#"
            UPDATE uploads
            SET status = $2, admin_comment = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(UploadStatus::Resolved)
        .bind(admin_comment)
        .fetch_optional(&self.pool)
        .await?;
        Ok(upload)
    }

    async fn update_priority(
        &self,
        id: i64,
        priority: Priority,
    ) -> Result<Option<UploadEntity>, error::SystemError> {
        let upload = sqlx::query_as::<_, UploadEntity>(
            "UPDATE uploads SET priority = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(priority)
        .fetch_optional(&self.pool)
        .await?;
        Ok(upload)
    }

    async fn delete(&self, id: i64) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM uploads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}
