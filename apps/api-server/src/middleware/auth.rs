//! Request extractors for admin sessions and anonymous visitors.

use std::future::{Ready, ready};
use std::net::SocketAddr;

use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use futures::future::{FutureExt, LocalBoxFuture};

use quill_core::domain::is_valid_identity;
use quill_core::ports::{AuthError, Session};
use quill_infra::hash_ip;
use quill_shared::ErrorResponse;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Header a client may use to present its own persisted visitor token.
pub const VISITOR_HEADER: &str = "X-Visitor-Id";

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::Revoked
            | AuthError::MissingAuth
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your session has expired. Please login again."),
            AuthError::Revoked => ErrorResponse::new(401, "Signed Out")
                .with_detail("This session has been signed out. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::InvalidCredentials => ErrorResponse::unauthorized(),
            AuthError::InsufficientPermissions => {
                ErrorResponse::forbidden("Admin role required")
            }
            other => {
                tracing::error!(error = %other, "Authentication backend failure");
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

/// The raw bearer token, unchecked. Used where the session itself is the subject
/// (signing out).
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequest for BearerToken {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(bearer_token(req).map(BearerToken).map_err(AuthenticationError))
    }
}

/// A live session whose user holds the admin role at the time of the request.
///
/// ```ignore
/// async fn dashboard(admin: AdminIdentity) -> impl Responder {
///     format!("Hello, {}!", admin.session.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub session: Session,
}

impl FromRequest for AdminIdentity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        async move {
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AuthenticationError(AuthError::InvalidToken(
                    "Server configuration error".to_string(),
                )));
            };
            let token = token.map_err(AuthenticationError)?;

            state
                .gate
                .authorize(&token)
                .await
                .map(|session| AdminIdentity { session })
                .map_err(AuthenticationError)
        }
        .boxed_local()
    }
}

/// Anonymous visitor key used to de-duplicate likes.
///
/// A valid `X-Visitor-Id` header wins; otherwise the salted hash of the client
/// address is used so the raw address is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorIdentity(pub String);

impl VisitorIdentity {
    fn resolve(req: &HttpRequest) -> Result<Self, AppError> {
        if let Some(token) = req
            .headers()
            .get(VISITOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| is_valid_identity(token))
        {
            return Ok(Self(token.to_string()));
        }

        let salt = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.identity_salt.clone())
            .ok_or_else(|| AppError::Internal("AppState not found in app data".to_string()))?;

        let ip = client_ip(req)
            .ok_or_else(|| AppError::BadRequest("Unable to identify visitor".to_string()))?;

        Ok(Self(hash_ip(&salt, &ip)))
    }
}

impl FromRequest for VisitorIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::resolve(req))
    }
}

fn client_ip(req: &HttpRequest) -> Option<String> {
    let info = req.connection_info();
    let addr = info.realip_remote_addr()?;
    Some(
        addr.parse::<SocketAddr>()
            .map(|socket| socket.ip().to_string())
            .unwrap_or_else(|_| addr.to_string()),
    )
}
