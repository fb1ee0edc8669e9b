//! Authentication handlers.

use actix_web::{HttpResponse, web};

use quill_shared::dto::{LoginRequest, LoginResponse, SessionResponse};

use crate::middleware::auth::{AdminIdentity, BearerToken};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/auth/login
///
/// Only accounts holding the admin role get a token. Every failure answers
/// `success: false` with a message.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    match state.gate.admit(&req.email, &req.password).await {
        Ok(session) => Ok(HttpResponse::Ok().json(LoginResponse::granted(
            session.access_token,
            state.tokens.expiration_seconds(),
        ))),
        Err(outcome) => Ok(HttpResponse::Unauthorized().json(LoginResponse::denied(
            outcome.error.unwrap_or_else(|| "Login failed".to_string()),
        ))),
    }
}

/// POST /api/auth/logout
pub async fn logout(state: web::Data<AppState>, token: BearerToken) -> AppResult<HttpResponse> {
    // Signing out an already dead token is not an error for the client.
    if let Err(e) = state.gate.sign_out_token(&token.0).await {
        tracing::debug!(error = %e, "Logout with inactive token");
    }
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/auth/me - Admin only
pub async fn me(admin: AdminIdentity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(SessionResponse {
        user_id: admin.session.user_id,
        email: admin.session.email,
        expires_at: admin.session.expires_at,
    }))
}
