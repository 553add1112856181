use uuid::Uuid;

use crate::{api::error, configs::RedisCache, modules::session::store::SessionStore, ENV};

fn sort_key_key(session: &Uuid) -> String {
    format!("session:{session}:sort_by")
}

fn refresh_key(session: &Uuid) -> String {
    format!("refresh_token:{session}")
}

#[async_trait::async_trait]
impl SessionStore for RedisCache {
    async fn sort_key(&self, session: &Uuid) -> Result<Option<String>, error::SystemError> {
        self.get::<String>(&sort_key_key(session)).await
    }

    async fn set_sort_key(&self, session: &Uuid, key: &str) -> Result<(), error::SystemError> {
        // Lives as long as the session can be refreshed.
        self.set(&sort_key_key(session), &key, ENV.refresh_token_expiration).await
    }

    async fn save_refresh_token(
        &self,
        session: &Uuid,
        user_id: &Uuid,
        ttl_secs: u64,
    ) -> Result<(), error::SystemError> {
        self.set(&refresh_key(session), user_id, ttl_secs).await
    }

    async fn refresh_token_owner(&self, session: &Uuid) -> Result<Option<Uuid>, error::SystemError> {
        self.get::<Uuid>(&refresh_key(session)).await
    }

    async fn end_session(&self, session: &Uuid) -> Result<(), error::SystemError> {
        self.delete(&[sort_key_key(session), refresh_key(session)]).await
    }
}
