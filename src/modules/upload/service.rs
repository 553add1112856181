use log::info;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::api::error;
use crate::modules::session::store::SessionStore;
use crate::modules::upload::{
    access,
    model::{ListingPage, NewUpload, UploadForm},
    repository::UploadRepository,
    schema::{Priority, UploadEntity},
    sorting::SortKey,
    validation::sniff_mime,
};
use crate::utils::Claims;

/// Where stored files live.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
}

impl UploadConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self { upload_dir: upload_dir.into() }
    }
}

/// Which records a listing page draws from.
#[derive(Debug, Clone, Copy)]
enum ListingScope {
    Owner(Uuid),
    All,
}

fn no_access() -> error::SystemError {
    error::SystemError::forbidden("You do not have permission to access this upload")
}

fn upload_not_found() -> error::SystemError {
    error::SystemError::not_found("Upload not found")
}

#[derive(Clone)]
pub struct UploadService {
    repo: Arc<dyn UploadRepository + Send + Sync>,
    sessions: Arc<dyn SessionStore + Send + Sync>,
    config: UploadConfig,
}

impl UploadService {
    pub fn with_dependencies(
        repo: Arc<dyn UploadRepository + Send + Sync>,
        sessions: Arc<dyn SessionStore + Send + Sync>,
        config: UploadConfig,
    ) -> Self {
        info!("UploadService initialized, storing files in {}", config.upload_dir.display());
        UploadService { repo, sessions, config }
    }

    /// Unique on-disk name that keeps the client's extension when it is sane.
    fn generate_filename(original_filename: &str) -> String {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase);
        let uuid = Uuid::now_v7();
        match extension {
            Some(ext) => format!("{uuid}.{ext}"),
            None => uuid.to_string(),
        }
    }

    async fn save_file(&self, filename: &str, bytes: &[u8]) -> Result<String, error::SystemError> {
        tokio::fs::create_dir_all(&self.config.upload_dir).await?;

        let file_path = self.config.upload_dir.join(filename);
        tokio::fs::write(&file_path, bytes).await?;

        Ok(file_path.to_string_lossy().into_owned())
    }

    async fn find(&self, id: i64) -> Result<UploadEntity, error::SystemError> {
        self.repo.find_by_id(id).await?.ok_or_else(upload_not_found)
    }

    /// Validates the submission, stores the file and records it. Anonymous
    /// submissions are kept without an owner.
    pub async fn create_upload(
        &self,
        form: UploadForm,
        submitter: Option<&Claims>,
    ) -> Result<UploadEntity, error::SystemError> {
        form.validate()?;

        let UploadForm { title, user_comment, file, priority } = form;
        let file = file.ok_or_else(|| error::SystemError::bad_request("No file found in request"))?;
        let priority = priority
            .and_then(Priority::new)
            .ok_or_else(|| error::SystemError::bad_request("Invalid priority"))?;

        let mime_type = sniff_mime(&mut Cursor::new(&file.bytes))?;

        let filename = Self::generate_filename(&file.filename);
        let storage_path = self.save_file(&filename, &file.bytes).await?;

        let new_upload = NewUpload {
            owner_id: submitter.map(|c| c.sub),
            title,
            original_filename: file.filename,
            storage_path,
            mime_type: mime_type.essence_str().to_string(),
            file_size: file.size as i64,
            user_comment,
            priority,
        };

        let upload = self.repo.create(&new_upload).await?;
        info!(
            "Upload {} ({}, {} bytes) submitted by {:?}",
            upload.id, upload.mime_type, upload.file_size, upload.owner_id
        );
        Ok(upload)
    }

    /// Stores a non-empty requested key for the session, then returns the
    /// session's key (most_recent when nothing is remembered).
    async fn remembered_sort_key(
        &self,
        viewer: &Claims,
        requested: Option<&str>,
    ) -> Result<SortKey, error::SystemError> {
        let session = viewer.session_id();
        if let Some(raw) = requested.filter(|r| !r.is_empty()) {
            self.sessions.set_sort_key(&session, raw).await?;
        }

        let stored = self.sessions.sort_key(&session).await?;
        Ok(stored.as_deref().map(SortKey::parse).unwrap_or_default())
    }

    async fn listing(
        &self,
        viewer: &Claims,
        requested: Option<&str>,
        scope: ListingScope,
    ) -> Result<ListingPage, error::SystemError> {
        let key = self.remembered_sort_key(viewer, requested).await?;
        let uploads = match scope {
            ListingScope::Owner(owner) => self.repo.find_by_owner(&owner).await?,
            ListingScope::All => self.repo.find_all().await?,
        };

        let uploads = key.arrange(uploads).into_iter().map(Into::into).collect();
        Ok(ListingPage { sort_by: key.as_str(), uploads })
    }

    /// The viewer's own uploads. Anonymous viewers get an empty page.
    pub async fn user_listing(
        &self,
        viewer: Option<&Claims>,
        requested: Option<&str>,
    ) -> Result<ListingPage, error::SystemError> {
        match viewer {
            Some(viewer) => self.listing(viewer, requested, ListingScope::Owner(viewer.sub)).await,
            None => Ok(ListingPage { sort_by: SortKey::default().as_str(), uploads: Vec::new() }),
        }
    }

    /// Every upload, for staff.
    pub async fn staff_listing(
        &self,
        viewer: Option<&Claims>,
        requested: Option<&str>,
    ) -> Result<ListingPage, error::SystemError> {
        match viewer {
            Some(viewer) if viewer.is_staff() => {
                self.listing(viewer, requested, ListingScope::All).await
            }
            _ => Err(error::SystemError::forbidden("This page is for staff only")),
        }
    }

    /// Detail page. A staff viewer moves a New upload to In Progress.
    pub async fn view_detail(
        &self,
        id: i64,
        viewer: Option<&Claims>,
    ) -> Result<UploadEntity, error::SystemError> {
        let mut upload = self.find(id).await?;
        if !access::can_view(viewer, &upload) {
            return Err(no_access());
        }

        let is_staff = viewer.is_some_and(Claims::is_staff);
        if let Some(next) = upload.status.after_detail_view(is_staff) {
            if self.repo.mark_in_progress(id).await? {
                info!("Upload {} moved to {:?} on staff view", id, next);
            }
            upload = self.find(id).await?;
        }

        Ok(upload)
    }

    pub async fn resolve(
        &self,
        id: i64,
        viewer: Option<&Claims>,
        comment: &str,
    ) -> Result<UploadEntity, error::SystemError> {
        let upload = self.find(id).await?;
        if !access::can_resolve(viewer) {
            return Err(no_access());
        }

        if upload.status.is_terminal() {
            info!("Upload {} already resolved, replacing admin comment", id);
        }

        let resolved = self.repo.resolve(id, comment).await?.ok_or_else(upload_not_found)?;
        info!("Upload {} moved from {:?} to {:?}", id, upload.status, upload.status.after_resolve());
        Ok(resolved)
    }

    /// Updates the priority and then renders the detail page, so a staff
    /// member changing a New upload's priority also starts work on it.
    pub async fn change_priority(
        &self,
        id: i64,
        viewer: Option<&Claims>,
        priority: i16,
    ) -> Result<UploadEntity, error::SystemError> {
        let upload = self.find(id).await?;
        if !access::can_change_priority(viewer, &upload) {
            return Err(no_access());
        }

        let priority =
            Priority::new(priority).ok_or_else(|| error::SystemError::bad_request("Invalid priority"))?;
        self.repo.update_priority(id, priority).await?.ok_or_else(upload_not_found)?;
        info!("Upload {} priority set to {}", id, priority.value());

        self.view_detail(id, viewer).await
    }

    pub async fn delete(&self, id: i64, viewer: Option<&Claims>) -> Result<(), error::SystemError> {
        let upload = self.find(id).await?;
        if !access::can_delete(viewer, &upload) {
            return Err(no_access());
        }

        if !self.repo.delete(id).await? {
            return Err(upload_not_found());
        }

        // The record is gone; a blob left behind is only logged.
        if let Err(e) = tokio::fs::remove_file(&upload.storage_path).await {
            log::warn!("Could not remove {}: {}", upload.storage_path, e);
        }
        info!("Upload {} deleted", id);
        Ok(())
    }

    /// Stored bytes of an upload, with the same visibility as its detail page.
    pub async fn read_file(
        &self,
        id: i64,
        viewer: Option<&Claims>,
    ) -> Result<(UploadEntity, Vec<u8>), error::SystemError> {
        let upload = self.find(id).await?;
        if !access::can_view(viewer, &upload) {
            return Err(no_access());
        }

        let bytes = match tokio::fs::read(&upload.storage_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(error::SystemError::not_found("Stored file is missing"));
            }
            Err(e) => return Err(e.into()),
        };
        Ok((upload, bytes))
    }
}
