use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::error;
use crate::constants::{MAX_FIELD_SIZE, MAX_UPLOAD_SIZE};
use crate::modules::upload::schema::{Priority, UploadEntity, UploadStatus};
use crate::modules::upload::validation::{validate_file, validate_priority};

/// File part of a submission. Bytes past the size limit are counted but
/// not kept.
#[derive(Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub size: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { filename: filename.into(), size: bytes.len(), bytes }
    }
}

#[derive(Validate)]
pub struct UploadForm {
    #[validate(length(min = 1, max = 40, message = "Title must be 1 to 40 characters long"))]
    pub title: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub user_comment: String,
    #[validate(required(message = "This field is required."), custom(function = "validate_file"))]
    pub file: Option<UploadedFile>,
    #[validate(
        required(message = "This field is required."),
        custom(function = "validate_priority")
    )]
    pub priority: Option<i16>,
}

impl UploadForm {
    /// Collects the `title`, `user_comment`, `file` and `priority` parts.
    /// Unknown parts are drained and ignored.
    pub async fn from_multipart(mut payload: Multipart) -> Result<Self, error::Error> {
        let mut form =
            UploadForm { title: String::new(), user_comment: String::new(), file: None, priority: None };

        while let Some(mut field) =
            payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            let is_file = name == "file";
            let mut bytes = Vec::new();
            let mut size = 0usize;
            while let Some(chunk) =
                field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
            {
                size += chunk.len();
                if !is_file && size > MAX_FIELD_SIZE {
                    return Err(error::Error::bad_request(format!("Form field '{name}' is too large")));
                }
                if size <= MAX_UPLOAD_SIZE {
                    bytes.extend_from_slice(&chunk);
                }
            }

            match name.as_str() {
                "file" => {
                    // An empty file input still sends a part, with an empty filename.
                    if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                        let mut file = UploadedFile::new(filename, bytes);
                        file.size = size;
                        form.file = Some(file);
                    }
                }
                "title" => form.title = text(bytes)?,
                "user_comment" => form.user_comment = text(bytes)?,
                "priority" => form.priority = text(bytes)?.trim().parse().ok(),
                _ => {}
            }
        }

        Ok(form)
    }
}

fn text(bytes: Vec<u8>) -> Result<String, error::Error> {
    String::from_utf8(bytes).map_err(|_| error::Error::bad_request("Form fields must be UTF-8"))
}

/// Row to insert once a submission has been validated and stored.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub original_filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub file_size: i64,
    pub user_comment: String,
    pub priority: Priority,
}

/// The comment is stored as submitted, empty included.
#[derive(Deserialize, Validate)]
pub struct ResolveModel {
    #[serde(default)]
    pub comment: String,
}

#[derive(Deserialize, Validate)]
pub struct ChangePriorityModel {
    #[validate(custom(function = "validate_priority"))]
    pub priority: i16,
}

#[derive(Deserialize)]
pub struct SortQuery {
    pub sort_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: i64,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub original_filename: String,
    pub mime_type: String,
    pub file_size: i64,
    pub user_comment: String,
    pub admin_comment: String,
    pub status: UploadStatus,
    pub priority: i16,
    pub priority_label: &'static str,
    pub url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<UploadEntity> for UploadResponse {
    fn from(entity: UploadEntity) -> Self {
        UploadResponse {
            url: format!("/upload/{}/file", entity.id),
            id: entity.id,
            owner_id: entity.owner_id,
            title: entity.title,
            original_filename: entity.original_filename,
            mime_type: entity.mime_type,
            file_size: entity.file_size,
            user_comment: entity.user_comment,
            admin_comment: entity.admin_comment,
            status: entity.status,
            priority: entity.priority.value(),
            priority_label: entity.priority.label(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// A sorted listing together with the sort key that produced it.
#[derive(Debug, Serialize)]
pub struct ListingPage {
    pub sort_by: &'static str,
    pub uploads: Vec<UploadResponse>,
}
