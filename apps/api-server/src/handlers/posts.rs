//! Public blog handlers: live posts, comments and likes.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use quill_core::domain::{NewComment, Post};
use quill_core::error::DomainError;
use quill_shared::dto::{CommentRequest, LikeResponse};

use super::{comment_response, post_response, post_summary};
use crate::middleware::auth::VisitorIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

async fn live_post(state: &AppState, slug: &str) -> AppResult<Post> {
    let now = Utc::now();
    state
        .store
        .get_by_slug(slug)
        .await?
        .filter(|post| post.is_live_at(now))
        .ok_or_else(|| DomainError::not_found("post", slug).into())
}

/// GET /api/posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let posts = state.store.list_published().await?;

    Ok(HttpResponse::Ok().json(
        posts
            .iter()
            .map(|post| post_summary(post, now))
            .collect::<Vec<_>>(),
    ))
}

/// GET /api/posts/{slug}
///
/// Counts a view without waiting for it; a failed increment never fails the read.
pub async fn get_post(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = live_post(&state, &slug).await?;

    let store = state.store.clone();
    let id = post.id;
    tokio::spawn(async move { store.increment_views(id).await });

    Ok(HttpResponse::Ok().json(post_response(post, Utc::now())))
}

/// GET /api/posts/{slug}/comments
pub async fn list_comments(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = live_post(&state, &slug).await?;
    let comments = state.store.list_comments(post.id).await?;

    Ok(HttpResponse::Ok().json(
        comments
            .into_iter()
            .map(comment_response)
            .collect::<Vec<_>>(),
    ))
}

/// POST /api/posts/{slug}/comments
pub async fn create_comment(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let post = live_post(&state, &slug).await?;
    if !post.allow_comments {
        return Err(AppError::Forbidden(
            "Comments are disabled for this post".to_string(),
        ));
    }

    let req = body.into_inner();
    let comment = NewComment::new(post.id, req.author, req.body).prepare()?;
    let created = state.store.create_comment(comment).await?;

    tracing::info!(post_id = %post.id, comment_id = %created.id, "Comment added");
    Ok(HttpResponse::Created().json(comment_response(created)))
}

/// GET /api/posts/{slug}/like
pub async fn like_status(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    visitor: VisitorIdentity,
) -> AppResult<HttpResponse> {
    let post = live_post(&state, &slug).await?;
    let liked = state.likes.has_liked(post.id, &visitor.0).await;

    Ok(HttpResponse::Ok().json(LikeResponse {
        liked,
        likes: Some(post.likes),
    }))
}

/// POST /api/posts/{slug}/like
///
/// Toggles the visitor's like. A second toggle for the same visitor while the
/// first is still running answers 409.
pub async fn toggle_like(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    visitor: VisitorIdentity,
) -> AppResult<HttpResponse> {
    let post = live_post(&state, &slug).await?;
    let liked = state.likes.toggle(post.id, &visitor.0).await?;

    let likes = match state.store.get_by_id(post.id).await {
        Ok(post) => post.map(|p| p.likes),
        Err(e) => {
            tracing::warn!(post_id = %post.id, error = %e, "Like count refresh failed");
            None
        }
    };

    Ok(HttpResponse::Ok().json(LikeResponse { liked, likes }))
}
