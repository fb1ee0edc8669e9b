//! Admin handlers. Every handler takes an [`AdminIdentity`], so the session and
//! the admin role are both re-checked on each request.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use quill_core::domain::{BlogStats, PostDraft, PostPatch};
use quill_core::error::DomainError;
use quill_shared::dto::{
    CreatePostRequest, PreviewRequest, PreviewResponse, StatsResponse, UpdatePostRequest,
};

use super::{post_response, post_summary};
use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn draft_from(req: CreatePostRequest) -> PostDraft {
    let mut draft = PostDraft::new(req.title, req.content, req.excerpt).published(req.published);
    if let Some(slug) = req.slug {
        draft = draft.with_slug(slug);
    }
    if let Some(at) = req.publish_at {
        draft = draft.scheduled_for(at);
    }
    draft.cover_image = req.cover_image;
    draft.tags = req.tags;
    draft.allow_comments = req.allow_comments.unwrap_or(true);
    draft.author = req.author.unwrap_or_default();
    draft.location = req.location;
    draft
}

fn patch_from(req: UpdatePostRequest) -> PostPatch {
    PostPatch {
        title: req.title,
        content: req.content,
        excerpt: req.excerpt,
        slug: req.slug,
        cover_image: req.cover_image,
        tags: req.tags,
        published: req.published,
        publish_at: req.publish_at,
        allow_comments: req.allow_comments,
        author: req.author,
        location: req.location,
    }
}

/// GET /api/admin/posts - every post, drafts and scheduled included.
pub async fn list_posts(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let posts = state.store.list_all().await?;

    Ok(HttpResponse::Ok().json(
        posts
            .iter()
            .map(|post| post_summary(post, now))
            .collect::<Vec<_>>(),
    ))
}

/// POST /api/admin/posts
pub async fn create_post(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let draft = draft_from(body.into_inner()).prepare()?;
    let post = state.store.create(draft).await?;

    tracing::info!(post_id = %post.id, slug = %post.slug, by = %admin.session.user_id, "Post created");
    Ok(HttpResponse::Created().json(post_response(post, Utc::now())))
}

/// GET /api/admin/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = id.into_inner();
    let post = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("post", id))?;

    Ok(HttpResponse::Ok().json(post_response(post, Utc::now())))
}

/// PATCH /api/admin/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    id: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = id.into_inner();
    let patch = patch_from(body.into_inner());
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let post = state.store.update(id, patch.prepare()?).await?;

    tracing::info!(post_id = %id, by = %admin.session.user_id, "Post updated");
    Ok(HttpResponse::Ok().json(post_response(post, Utc::now())))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = id.into_inner();
    state.store.delete(id).await?;

    tracing::info!(post_id = %id, by = %admin.session.user_id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/admin/stats
pub async fn stats(state: web::Data<AppState>, _admin: AdminIdentity) -> AppResult<HttpResponse> {
    let posts = state.store.list_all().await?;
    let stats = BlogStats::from_posts(&posts, Utc::now());

    Ok(HttpResponse::Ok().json(StatsResponse {
        total: stats.total,
        published: stats.published,
        scheduled: stats.scheduled,
        drafts: stats.drafts,
        views: stats.views,
        likes: stats.likes,
        comments: stats.comments,
    }))
}

/// DELETE /api/admin/comments/{id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = id.into_inner();
    state.store.delete_comment(id).await?;

    tracing::info!(comment_id = %id, by = %admin.session.user_id, "Comment deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/admin/preview - render markdown exactly as readers will see it.
pub async fn preview(
    _admin: AdminIdentity,
    body: web::Json<PreviewRequest>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(PreviewResponse {
        html: quill_markdown::render(&body.content),
    }))
}
