use uuid::Uuid;

use crate::api::error;

/// Server-side state attached to a sign-in session.
#[async_trait::async_trait]
pub trait SessionStore {
    /// Sort key remembered for the session's listing pages.
    async fn sort_key(&self, session: &Uuid) -> Result<Option<String>, error::SystemError>;

    async fn set_sort_key(&self, session: &Uuid, key: &str) -> Result<(), error::SystemError>;

    async fn save_refresh_token(
        &self,
        session: &Uuid,
        user_id: &Uuid,
        ttl_secs: u64,
    ) -> Result<(), error::SystemError>;

    /// Owner of the live refresh token for `session`, if any.
    async fn refresh_token_owner(&self, session: &Uuid) -> Result<Option<Uuid>, error::SystemError>;

    /// Drops everything stored for the session.
    async fn end_session(&self, session: &Uuid) -> Result<(), error::SystemError>;
}
