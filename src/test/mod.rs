//! In-memory doubles for the repositories and the session store, plus
//! fixtures shared by unit and HTTP tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use actix_web::web;
use uuid::Uuid;

use crate::api::error;
use crate::modules::session::store::SessionStore;
use crate::modules::upload::{
    model::NewUpload,
    repository::UploadRepository,
    schema::{Priority, UploadEntity, UploadStatus},
    service::{UploadConfig, UploadService},
};
use crate::modules::user::{
    model::InsertUser,
    repository::UserRepository,
    schema::{UserEntity, UserRole},
    service::UserService,
};
use crate::utils::{Claims, TokenKind};
use crate::ENV;

static INIT: Once = Once::new();

/// Services wired to in-memory storage, for HTTP tests.
pub struct TestState {
    pub uploads: web::Data<UploadService>,
    pub users: web::Data<UserService>,
    pub repo: Arc<MemoryUploadRepository>,
    pub sessions: Arc<MemorySessionStore>,
    _dir: tempfile::TempDir,
}

impl TestState {
    pub fn new() -> Self {
        init_env();
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(MemoryUploadRepository::default());
        let sessions = Arc::new(MemorySessionStore::default());
        let uploads = UploadService::with_dependencies(
            repo.clone(),
            sessions.clone(),
            UploadConfig::new(dir.path()),
        );
        let users = UserService::with_dependencies(
            Arc::new(MemoryUserRepository::default()),
            sessions.clone(),
        );
        TestState {
            uploads: web::Data::new(uploads),
            users: web::Data::new(users),
            repo,
            sessions,
            _dir: dir,
        }
    }
}

/// Initializes the full route table over a [`TestState`].
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::from_fn(crate::middlewares::identify))
                .app_data($state.uploads.clone())
                .app_data($state.users.clone())
                .configure(crate::routes),
        )
        .await
    };
}
pub(crate) use test_app;

/// Provides the variables `ENV` requires, unless the environment already does.
pub fn init_env() {
    INIT.call_once(|| {
        for (key, value) in [
            ("SECRET_KEY", "test-secret"),
            ("DATABASE_URL", "postgres://localhost/triage_desk_test"),
            ("REDIS_URL", "redis://127.0.0.1/"),
        ] {
            if std::env::var_os(key).is_none() {
                std::env::set_var(key, value);
            }
        }
    });
}

/// Bearer header value for a fresh, open session of a new user with `role`.
pub fn bearer(state: &TestState, role: UserRole) -> (Claims, String) {
    init_env();
    let claims = Claims::new(&Uuid::now_v7(), &role, 600)
        .with_jti(Uuid::now_v7())
        .with_kind(TokenKind::AccessToken);
    state.sessions.open(claims.session_id(), claims.sub);
    let token = claims.encode(ENV.jwt_secret.as_ref()).unwrap();
    (claims, format!("Bearer {token}"))
}

pub fn upload_fixture(id: i64, owner_id: Option<Uuid>) -> UploadEntity {
    let now = chrono::Utc::now();
    UploadEntity {
        id,
        owner_id,
        title: format!("upload {id}"),
        original_filename: "file.txt".into(),
        storage_path: format!("/nonexistent/{id}.txt"),
        mime_type: "text/plain".into(),
        file_size: 25,
        user_comment: String::new(),
        admin_comment: "No comment yet".into(),
        status: UploadStatus::default(),
        priority: Priority::default(),
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct UploadTable {
    rows: Vec<UploadEntity>,
    last_id: i64,
    in_progress_transitions: usize,
    fail_deletes: bool,
}

#[derive(Default)]
pub struct MemoryUploadRepository {
    table: Mutex<UploadTable>,
}

impl MemoryUploadRepository {
    pub fn snapshot(&self) -> Vec<UploadEntity> {
        self.table.lock().unwrap().rows.clone()
    }

    pub fn in_progress_transitions(&self) -> usize {
        self.table.lock().unwrap().in_progress_transitions
    }

    /// Makes every later `delete` fail like a lost database connection.
    pub fn fail_deletes(&self) {
        self.table.lock().unwrap().fail_deletes = true;
    }

    pub fn insert(&self, mut upload: UploadEntity) -> UploadEntity {
        let mut table = self.table.lock().unwrap();
        table.last_id += 1;
        upload.id = table.last_id;
        table.rows.push(upload.clone());
        upload
    }

    fn update<F>(&self, id: i64, f: F) -> Option<UploadEntity>
    where
        F: FnOnce(&mut UploadEntity),
    {
        let mut table = self.table.lock().unwrap();
        let row = table.rows.iter_mut().find(|u| u.id == id)?;
        f(row);
        row.updated_at = chrono::Utc::now();
        Some(row.clone())
    }
}

#[async_trait::async_trait]
impl UploadRepository for MemoryUploadRepository {
    async fn create(&self, upload: &NewUpload) -> Result<UploadEntity, error::SystemError> {
        let mut row = upload_fixture(0, upload.owner_id);
        row.title = upload.title.clone();
        row.original_filename = upload.original_filename.clone();
        row.storage_path = upload.storage_path.clone();
        row.mime_type = upload.mime_type.clone();
        row.file_size = upload.file_size;
        row.user_comment = upload.user_comment.clone();
        row.priority = upload.priority;
        Ok(self.insert(row))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UploadEntity>, error::SystemError> {
        Ok(self.table.lock().unwrap().rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<UploadEntity>, error::SystemError> {
        Ok(self.snapshot())
    }

    async fn find_by_owner(&self, owner_id: &Uuid) -> Result<Vec<UploadEntity>, error::SystemError> {
        Ok(self.snapshot().into_iter().filter(|u| u.owner_id.as_ref() == Some(owner_id)).collect())
    }

    async fn mark_in_progress(&self, id: i64) -> Result<bool, error::SystemError> {
        let mut table = self.table.lock().unwrap();
        let Some(row) = table.rows.iter_mut().find(|u| u.id == id && u.status == UploadStatus::New)
        else {
            return Ok(false);
        };
        row.status = UploadStatus::InProgress;
        table.in_progress_transitions += 1;
        Ok(true)
    }

    async fn resolve(
        &self,
        id: i64,
        admin_comment: &str,
    ) -> Result<Option<UploadEntity>, error::SystemError> {
        Ok(self.update(id, |u| {
            u.status = u.status.after_resolve();
            u.admin_comment = admin_comment.to_string();
        }))
    }

    async fn update_priority(
        &self,
        id: i64,
        priority: Priority,
    ) -> Result<Option<UploadEntity>, error::SystemError> {
        Ok(self.update(id, |u| u.priority = priority))
    }

    async fn delete(&self, id: i64) -> Result<bool, error::SystemError> {
        let mut table = self.table.lock().unwrap();
        if table.fail_deletes {
            return Err(error::SystemError::DatabaseError("connection reset".into()));
        }
        let before = table.rows.len();
        table.rows.retain(|u| u.id != id);
        Ok(table.rows.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<UserEntity>>,
}

#[async_trait::async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| &u.id == id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username.eq_ignore_ascii_case(username)).cloned())
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username.eq_ignore_ascii_case(&user.username)) {
            return Err(error::SystemError::Conflict(None));
        }
        let now = chrono::Utc::now();
        let id = Uuid::now_v7();
        users.push(UserEntity {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            hash_password: user.hash_password.clone(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sort_keys: Mutex<HashMap<Uuid, String>>,
    refresh_tokens: Mutex<HashMap<Uuid, Uuid>>,
}

impl MemorySessionStore {
    pub fn open(&self, session: Uuid, user_id: Uuid) {
        self.refresh_tokens.lock().unwrap().insert(session, user_id);
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn sort_key(&self, session: &Uuid) -> Result<Option<String>, error::SystemError> {
        Ok(self.sort_keys.lock().unwrap().get(session).cloned())
    }

    async fn set_sort_key(&self, session: &Uuid, key: &str) -> Result<(), error::SystemError> {
        self.sort_keys.lock().unwrap().insert(*session, key.to_string());
        Ok(())
    }

    async fn save_refresh_token(
        &self,
        session: &Uuid,
        user_id: &Uuid,
        _ttl_secs: u64,
    ) -> Result<(), error::SystemError> {
        self.refresh_tokens.lock().unwrap().insert(*session, *user_id);
        Ok(())
    }

    async fn refresh_token_owner(&self, session: &Uuid) -> Result<Option<Uuid>, error::SystemError> {
        Ok(self.refresh_tokens.lock().unwrap().get(session).copied())
    }

    async fn end_session(&self, session: &Uuid) -> Result<(), error::SystemError> {
        self.sort_keys.lock().unwrap().remove(session);
        self.refresh_tokens.lock().unwrap().remove(session);
        Ok(())
    }
}
