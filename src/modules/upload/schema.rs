use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "upload_status")]
pub enum UploadStatus {
    #[default]
    #[sqlx(rename = "New")]
    #[serde(rename = "New")]
    New,
    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sqlx(rename = "Resolved")]
    #[serde(rename = "Resolved")]
    Resolved,
}

/// Submitter-chosen urgency, 1 (lowest) to 5 (highest).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Priority(i16);

impl Priority {
    pub const LOWEST: Priority = Priority(1);
    pub const HIGHEST: Priority = Priority(5);

    pub fn new(value: i16) -> Option<Self> {
        (Self::LOWEST.0..=Self::HIGHEST.0).contains(&value).then_some(Priority(value))
    }

    pub fn value(self) -> i16 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Lowest Priority",
            2 => "Low Priority",
            3 => "Moderate Priority",
            4 => "High Priority",
            _ => "Highest Priority",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOWEST
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UploadEntity {
    pub id: i64,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub original_filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub file_size: i64,
    pub user_comment: String,
    pub admin_comment: String,
    pub status: UploadStatus,
    pub priority: Priority,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
