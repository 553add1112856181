use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};

use crate::{
    api::error,
    modules::user::service::UserService,
    utils::{Claims, TokenKind},
    ENV,
};

/// Attaches the caller's [`Claims`] to the request when a bearer token is
/// present. No token means an anonymous request; a bad token, or one whose
/// session has been signed out, is refused.
pub async fn identify<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let auth = req.headers().get("Authorization").and_then(|h| h.to_str().ok());

    if let Some(header) = auth {
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| error::Error::unauthorized("Token Invalid or Expired"))?;

        let claims = Claims::decode(token, ENV.jwt_secret.as_ref())
            .map_err(|_| error::Error::unauthorized("Token Invalid or Expired"))?;

        if claims.kind == Some(TokenKind::RefreshToken) {
            return Err(error::Error::unauthorized("Token Invalid or Expired").into());
        }

        let users = req.app_data::<web::Data<UserService>>().cloned().ok_or_else(|| {
            log::error!("UserService is not registered as app data");
            error::Error::InternalServer
        })?;
        if !users.session_is_live(&claims).await.map_err(error::Error::from)? {
            return Err(error::Error::unauthorized("Session has ended").into());
        }

        req.extensions_mut().insert(claims);
    }

    next.call(req).await
}

/// Claims of the signed-in caller, if any.
pub fn get_viewer(req: &HttpRequest) -> Option<Claims> {
    req.extensions().get::<Claims>().cloned()
}
