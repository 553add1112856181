use actix_web::{web, FromRequest};
use argon2::{
    password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{api::error, modules::user::schema::UserRole};

lazy_static::lazy_static! {
  static ref ARGON2: Argon2<'static> = Argon2::default();
}

pub fn hash_password(password: &str) -> Result<String, error::SystemError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = ARGON2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> Result<bool, error::SystemError> {
    let parsed_hash = PasswordHash::new(hash)?;
    match ARGON2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(error::SystemError::HashError(e)),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TokenKind {
    RefreshToken,
    AccessToken,
}

/// JWT claims. `jti` identifies the sign-in session and is shared by the
/// access and refresh tokens issued together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: u64,
    pub exp: u64,
    pub jti: Option<Uuid>,
    pub role: UserRole,
    #[serde(rename = "typ")]
    pub kind: Option<TokenKind>,
}

impl Claims {
    pub fn new(sub: &Uuid, role: &UserRole, exp: u64) -> Self {
        let now = chrono::Utc::now().timestamp() as u64;
        Claims { sub: *sub, iat: now, exp: now + exp, role: role.clone(), jti: None, kind: None }
    }

    pub fn with_jti(mut self, jti: Uuid) -> Self {
        self.jti = Some(jti);
        self
    }

    pub fn with_kind(mut self, kind: TokenKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Key of the server-side session these claims belong to.
    pub fn session_id(&self) -> Uuid {
        self.jti.unwrap_or(self.sub)
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn encode(&self, secret: &[u8]) -> Result<String, error::SystemError> {
        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, self, &EncodingKey::from_secret(secret))?;
        Ok(token)
    }

    pub fn decode(token: &str, secret: &[u8]) -> Result<Self, error::SystemError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        let token_data = decode::<Self>(token, &DecodingKey::from_secret(secret), &validation)?;
        Ok(token_data.claims)
    }
}

pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest for ValidatedJson<T>
where
    T: Validate + serde::de::DeserializeOwned + 'static,
{
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let fut = web::Json::<T>::from_request(req, payload);

        Box::pin(async move {
            let json = fut.await.map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            let model = json.into_inner();
            model.validate().map_err(|e| error::Error::InvalidForm(error::field_errors(&e)))?;
            Ok(ValidatedJson(model))
        })
    }
}

/// Url-encoded form body, validated the same way as [`ValidatedJson`].
pub struct ValidatedForm<T>(pub T);

impl<T> FromRequest for ValidatedForm<T>
where
    T: Validate + serde::de::DeserializeOwned + 'static,
{
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let fut = web::Form::<T>::from_request(req, payload);

        Box::pin(async move {
            let form = fut.await.map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            let model = form.into_inner();
            model.validate().map_err(|e| error::Error::InvalidForm(error::field_errors(&e)))?;
            Ok(ValidatedForm(model))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "battery staple").unwrap());
    }

    #[test]
    fn claims_keep_session_and_role() {
        let user = Uuid::now_v7();
        let session = Uuid::now_v7();
        let token = Claims::new(&user, &UserRole::Staff, 60)
            .with_jti(session)
            .with_kind(TokenKind::AccessToken)
            .encode(b"secret")
            .unwrap();

        let claims = Claims::decode(&token, b"secret").unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.session_id(), session);
        assert!(claims.is_staff());
        assert_eq!(claims.kind, Some(TokenKind::AccessToken));
        assert!(Claims::decode(&token, b"other").is_err());
    }
}
