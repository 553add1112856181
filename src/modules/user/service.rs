use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::session::store::SessionStore;
use crate::modules::user::model::{InsertUser, SignInModel, SignUpModel, TokenPair};
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::UserEntity;
use crate::utils::{hash_password, verify_password, Claims, TokenKind};
use crate::ENV;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<dyn SessionStore + Send + Sync>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<dyn SessionStore + Send + Sync>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, sessions }
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<Uuid, error::SystemError> {
        let hash_password = hash_password(&user.password)?;

        let new_user =
            InsertUser { username: user.username, email: user.email, hash_password };

        let user_id = self.repo.create(&new_user).await?;
        info!("User {} signed up", user_id);
        Ok(user_id)
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<TokenPair, error::SystemError> {
        let user_entity = self
            .repo
            .find_by_username(&user.username)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid username or password"))?;

        let valid = verify_password(&user_entity.hash_password, &user.password)?;
        if !valid {
            return Err(error::SystemError::unauthorized("Invalid username or password"));
        }

        let session = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        self.issue_tokens(&user_entity, session).await
    }

    /// Rotates both tokens, keeping the session (and what it remembers).
    pub async fn refresh(&self, refresh_token: Option<String>) -> Result<TokenPair, error::SystemError> {
        let token =
            refresh_token.ok_or_else(|| error::SystemError::unauthorized("Missing refresh token"))?;

        let claims = Claims::decode(&token, ENV.jwt_secret.as_ref())
            .map_err(|_| error::SystemError::unauthorized("Token Invalid or Expired"))?;
        let session = match (&claims.kind, claims.jti) {
            (Some(TokenKind::RefreshToken), Some(jti)) => jti,
            _ => return Err(error::SystemError::unauthorized("Token Invalid or Expired")),
        };

        let owner = self.sessions.refresh_token_owner(&session).await?;
        if owner != Some(claims.sub) {
            return Err(error::SystemError::unauthorized("Session has ended"));
        }

        let user_entity = self
            .repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("User no longer exists"))?;

        self.issue_tokens(&user_entity, session).await
    }

    /// Ends the session named by the refresh token and/or the access claims.
    /// Whether the session behind an access token is still open. Signing out
    /// closes it, so older access tokens stop working right away.
    pub async fn session_is_live(&self, claims: &Claims) -> Result<bool, error::SystemError> {
        let Some(session) = claims.jti else {
            return Ok(false);
        };
        let owner = self.sessions.refresh_token_owner(&session).await?;
        Ok(owner == Some(claims.sub))
    }

    pub async fn sign_out(
        &self,
        refresh_token: Option<String>,
        claims: Option<&Claims>,
    ) -> Result<(), error::SystemError> {
        let from_cookie = refresh_token
            .and_then(|t| Claims::decode(&t, ENV.jwt_secret.as_ref()).ok())
            .and_then(|c| c.jti);

        let mut sessions: Vec<Uuid> = from_cookie.into_iter().collect();
        if let Some(claims) = claims {
            let session = claims.session_id();
            if !sessions.contains(&session) {
                sessions.push(session);
            }
        }

        for session in &sessions {
            self.sessions.end_session(session).await?;
            info!("Session {} ended", session);
        }
        Ok(())
    }

    async fn issue_tokens(
        &self,
        user: &UserEntity,
        session: Uuid,
    ) -> Result<TokenPair, error::SystemError> {
        let access_token = Claims::new(&user.id, &user.role, ENV.access_token_expiration)
            .with_jti(session)
            .with_kind(TokenKind::AccessToken)
            .encode(ENV.jwt_secret.as_ref())?;

        let refresh_token = Claims::new(&user.id, &user.role, ENV.refresh_token_expiration)
            .with_jti(session)
            .with_kind(TokenKind::RefreshToken)
            .encode(ENV.jwt_secret.as_ref())?;

        self.sessions.save_refresh_token(&session, &user.id, ENV.refresh_token_expiration).await?;

        Ok(TokenPair { access_token, refresh_token })
    }
}
