//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod health;
mod posts;

use actix_web::web;
use chrono::{DateTime, Utc};

use quill_core::domain::{Comment, Post};
use quill_shared::dto::{CommentResponse, PostResponse, PostSummary};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("/{slug}", web::get().to(posts::get_post))
                    .service(
                        web::resource("/{slug}/comments")
                            .route(web::get().to(posts::list_comments))
                            .route(web::post().to(posts::create_comment)),
                    )
                    .service(
                        web::resource("/{slug}/like")
                            .route(web::get().to(posts::like_status))
                            .route(web::post().to(posts::toggle_like)),
                    ),
            )
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/me", web::get().to(auth::me)),
            )
            // Admin routes, role checked per request
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/posts")
                            .route(web::get().to(admin::list_posts))
                            .route(web::post().to(admin::create_post)),
                    )
                    .service(
                        web::resource("/posts/{id}")
                            .route(web::get().to(admin::get_post))
                            .route(web::patch().to(admin::update_post))
                            .route(web::delete().to(admin::delete_post)),
                    )
                    .route("/stats", web::get().to(admin::stats))
                    .route("/comments/{id}", web::delete().to(admin::delete_comment))
                    .route("/preview", web::post().to(admin::preview)),
            ),
    );
}

fn post_summary(post: &Post, now: DateTime<Utc>) -> PostSummary {
    PostSummary {
        id: post.id,
        title: post.title.clone(),
        excerpt: post.excerpt.clone(),
        slug: post.slug.clone(),
        cover_image: post.cover_image.clone(),
        tags: post.tags.clone(),
        status: post.status_at(now).to_string(),
        publish_at: post.publish_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
        likes: post.likes,
        views: post.views,
        comment_count: post.comment_count,
        author: post.author.clone(),
        location: post.location.clone(),
        reading_minutes: post.reading_minutes(),
    }
}

fn post_response(post: Post, now: DateTime<Utc>) -> PostResponse {
    PostResponse {
        summary: post_summary(&post, now),
        html: quill_markdown::render(&post.content),
        content: post.content,
        allow_comments: post.allow_comments,
    }
}

fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author: comment.author,
        body_html: quill_markdown::escape_html(&comment.body).replace('\n', "<br>"),
        created_at: comment.created_at,
    }
}
