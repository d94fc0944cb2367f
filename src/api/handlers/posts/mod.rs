//! Post authoring, listing, and publishing endpoints.
//!
//! Posts are the core content unit: markdown body, a stable URL slug derived
//! from the title on create, a publish flag, an owning user, and zero or more
//! categories through the join table. Handlers parse and validate input, then
//! delegate database access to the shared `storage` module.
//!
//! Flow Overview:
//! 1) Validate payload shape and bounds.
//! 2) Normalize the slug (create only; slugs never change after create).
//! 3) Perform the storage operation, resolving slug collisions by suffixing.
//! 4) Shape the response DTO, attaching the post's categories.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use tracing::error;

mod markdown;
mod storage;
mod types;

#[cfg(test)]
mod tests;

use super::slug::{is_valid_slug, normalize_slug};
use storage::{
    create_post_with_categories, delete_post_record, fetch_post_by_id, fetch_post_by_slug,
    fetch_posts_page, publish_post_record, update_post_record, NewPost, PostChanges, PostFilter,
};
pub(crate) use types::{
    CreatePostRequest, ListPostsQuery, ListPostsResponse, PostCategory, PostDetailResponse,
    PostResponse, UpdatePostRequest,
};

const TITLE_MAX: usize = 255;
const EXCERPT_MAX: usize = 500;
const SLUG_MIN: usize = 1;
const SLUG_MAX: usize = 255;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Clamps caller-supplied pagination to sane bounds instead of rejecting it.
const fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = match limit {
        Some(value) if value < 1 => 1,
        Some(value) if value > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
        Some(value) => value,
        None => DEFAULT_PAGE_SIZE,
    };
    let offset = match offset {
        Some(value) if value > 0 => value,
        _ => 0,
    };
    (limit, offset)
}

#[utoipa::path(
    post,
    path = "/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created.", body = PostResponse),
        (status = 400, description = "Invalid input.", body = String),
    ),
    tag = "posts"
)]
/// Creates a post for the given author and returns a `PostResponse`.
/// The slug is derived from the title and collision-resolved on insert, so
/// creating two posts with the same title succeeds with distinct slugs.
/// Category links are inserted in the same transaction as the post row.
pub async fn create_post(
    pool: Extension<PgPool>,
    Json(payload): Json<CreatePostRequest>,
) -> impl IntoResponse {
    let title = payload.title.trim();
    if title.is_empty() {
        return (StatusCode::BAD_REQUEST, "Title is required.").into_response();
    }
    if title.chars().count() > TITLE_MAX {
        return (StatusCode::BAD_REQUEST, "Title too long.").into_response();
    }
    if payload.content.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Content is required.").into_response();
    }
    if let Some(excerpt) = payload.excerpt.as_deref() {
        if excerpt.chars().count() > EXCERPT_MAX {
            return (StatusCode::BAD_REQUEST, "Excerpt too long.").into_response();
        }
    }
    if payload.user_id < 1 {
        return (StatusCode::BAD_REQUEST, "User ID required.").into_response();
    }

    let Some(base_slug) = normalize_slug(title, SLUG_MIN, SLUG_MAX) else {
        return (StatusCode::BAD_REQUEST, "Title does not produce a valid slug.").into_response();
    };

    let new_post = NewPost {
        title,
        content: &payload.content,
        excerpt: payload.excerpt.as_deref(),
        published: payload.published,
        user_id: payload.user_id,
        category_ids: &payload.category_ids,
    };

    match create_post_with_categories(&pool, &new_post, &base_slug).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/posts",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "Paginated post listing.", body = ListPostsResponse),
    ),
    tag = "posts"
)]
/// Lists posts ordered newest first, with optional publish-state and category
/// filters. `total` counts the whole filtered set, not just the current page.
/// `limit` and `offset` are clamped to sane bounds rather than rejected.
pub async fn list_posts(
    Query(query): Query<ListPostsQuery>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let (limit, offset) = clamp_page(query.limit, query.offset);

    let filter = PostFilter {
        published: query.published,
        category_id: query.category_id,
    };

    match fetch_posts_page(&pool, &filter, limit, offset).await {
        Ok((posts, total)) => (StatusCode::OK, Json(ListPostsResponse { posts, total })).into_response(),
        Err(err) => {
            error!("Failed to list posts: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/posts/by-slug/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post detail with rendered HTML.", body = PostDetailResponse),
        (status = 404, description = "Post not found."),
    ),
    tag = "posts"
)]
/// Fetches a post by slug for public reading. The response carries
/// `content_html`, the markdown body rendered server-side, alongside the raw
/// markdown and the post's categories.
pub async fn get_post_by_slug(
    Path(slug): Path<String>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    // Malformed slugs can never match a stored one; skip the query.
    if !is_valid_slug(&slug) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match fetch_post_by_slug(&pool, &slug).await {
        Ok(Some(post)) => {
            let content_html = markdown::render_html(&post.content);
            (
                StatusCode::OK,
                Json(PostDetailResponse::from_post(post, content_html)),
            )
                .into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch post by slug: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/posts/{id}",
    params(("id" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post detail (raw markdown).", body = PostResponse),
        (status = 404, description = "Post not found."),
    ),
    tag = "posts"
)]
/// Fetches a post by id with raw markdown content, as used by edit forms.
pub async fn get_post(Path(id): Path<i32>, pool: Extension<PgPool>) -> impl IntoResponse {
    match fetch_post_by_id(&pool, id).await {
        Ok(Some(post)) => (StatusCode::OK, Json(post)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch post: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/v1/posts/{id}",
    request_body = UpdatePostRequest,
    params(("id" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post updated.", body = PostResponse),
        (status = 400, description = "Invalid input.", body = String),
        (status = 404, description = "Post not found."),
    ),
    tag = "posts"
)]
/// Applies a partial update to a post and returns the updated `PostResponse`.
/// The slug is never regenerated on title changes, keeping public URLs stable.
/// When `category_ids` is present it replaces the full category set; an empty
/// array clears all links. An empty string for `excerpt` clears it.
/// `updated_at` is bumped on every update.
pub async fn update_post(
    Path(id): Path<i32>,
    pool: Extension<PgPool>,
    Json(payload): Json<UpdatePostRequest>,
) -> impl IntoResponse {
    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if payload.title.is_some() && title.is_none() {
        return (StatusCode::BAD_REQUEST, "Title is required.").into_response();
    }
    if let Some(title) = title {
        if title.chars().count() > TITLE_MAX {
            return (StatusCode::BAD_REQUEST, "Title too long.").into_response();
        }
    }

    let content = payload.content.as_deref().filter(|value| !value.trim().is_empty());
    if payload.content.is_some() && content.is_none() {
        return (StatusCode::BAD_REQUEST, "Content is required.").into_response();
    }

    if let Some(excerpt) = payload.excerpt.as_deref() {
        if excerpt.chars().count() > EXCERPT_MAX {
            return (StatusCode::BAD_REQUEST, "Excerpt too long.").into_response();
        }
    }

    if title.is_none()
        && content.is_none()
        && payload.excerpt.is_none()
        && payload.published.is_none()
        && payload.category_ids.is_none()
    {
        return (StatusCode::BAD_REQUEST, "No updates provided.").into_response();
    }

    let changes = PostChanges {
        title,
        content,
        excerpt: payload.excerpt.as_deref(),
        published: payload.published,
        category_ids: payload.category_ids.as_deref(),
    };

    match update_post_record(&pool, id, &changes).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/posts/{id}",
    params(("id" = i32, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted."),
        (status = 404, description = "Post not found."),
    ),
    tag = "posts"
)]
/// Deletes a post. Category links are removed by the database cascade.
pub async fn delete_post(Path(id): Path<i32>, pool: Extension<PgPool>) -> impl IntoResponse {
    match delete_post_record(&pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/posts/{id}/publish",
    params(("id" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post published.", body = PostResponse),
        (status = 404, description = "Post not found."),
    ),
    tag = "posts"
)]
/// Marks a draft as published and returns the updated post. Publishing an
/// already-published post is a no-op beyond bumping `updated_at`.
pub async fn publish_post(Path(id): Path<i32>, pool: Extension<PgPool>) -> impl IntoResponse {
    match publish_post_record(&pool, id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}
