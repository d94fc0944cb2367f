//! Category management endpoints.
//!
//! Categories are flat, named tags attachable to many posts. Unlike posts,
//! a category's slug follows its name: renaming regenerates the slug, and
//! name collisions are rejected with `409` rather than suffix-resolved,
//! because the name itself is unique.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use tracing::error;

mod storage;
mod types;

#[cfg(test)]
mod tests;

use super::slug::normalize_slug;
use storage::{
    delete_category_record, fetch_categories, insert_category, update_category_record,
    CategoryChanges,
};
pub(crate) use types::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};

const NAME_MAX: usize = 100;
const SLUG_MIN: usize = 1;
const SLUG_MAX: usize = 255;

#[utoipa::path(
    post,
    path = "/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created.", body = CategoryResponse),
        (status = 400, description = "Invalid input.", body = String),
        (status = 409, description = "Category with this name already exists.", body = String),
    ),
    tag = "categories"
)]
/// Creates a category with a slug derived from its name.
pub async fn create_category(
    pool: Extension<PgPool>,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let name = payload.name.trim();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Name is required.").into_response();
    }
    if name.chars().count() > NAME_MAX {
        return (StatusCode::BAD_REQUEST, "Name too long.").into_response();
    }

    let Some(slug) = normalize_slug(name, SLUG_MIN, SLUG_MAX) else {
        return (StatusCode::BAD_REQUEST, "Name does not produce a valid slug.").into_response();
    };

    match insert_category(&pool, name, &slug, payload.description.as_deref()).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/categories",
    responses(
        (status = 200, description = "List categories.", body = [CategoryResponse]),
    ),
    tag = "categories"
)]
/// Lists all categories ordered by name.
pub async fn list_categories(pool: Extension<PgPool>) -> impl IntoResponse {
    match fetch_categories(&pool).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => {
            error!("Failed to list categories: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/v1/categories/{id}",
    request_body = UpdateCategoryRequest,
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category updated.", body = CategoryResponse),
        (status = 400, description = "Invalid input.", body = String),
        (status = 404, description = "Category not found."),
        (status = 409, description = "Category with this name already exists.", body = String),
    ),
    tag = "categories"
)]
/// Updates a category. A new name regenerates the slug; an empty string for
/// `description` clears it.
pub async fn update_category(
    Path(id): Path<i32>,
    pool: Extension<PgPool>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if payload.name.is_some() && name.is_none() {
        return (StatusCode::BAD_REQUEST, "Name is required.").into_response();
    }
    if let Some(name) = name {
        if name.chars().count() > NAME_MAX {
            return (StatusCode::BAD_REQUEST, "Name too long.").into_response();
        }
    }

    let slug = match name {
        Some(name) => match normalize_slug(name, SLUG_MIN, SLUG_MAX) {
            Some(slug) => Some(slug),
            None => {
                return (StatusCode::BAD_REQUEST, "Name does not produce a valid slug.")
                    .into_response()
            }
        },
        None => None,
    };

    if name.is_none() && payload.description.is_none() {
        return (StatusCode::BAD_REQUEST, "No updates provided.").into_response();
    }

    let changes = CategoryChanges {
        name,
        slug: slug.as_deref(),
        description: payload.description.as_deref(),
    };

    match update_category_record(&pool, id, &changes).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted."),
        (status = 404, description = "Category not found."),
    ),
    tag = "categories"
)]
/// Deletes a category. Post links are removed by the database cascade; posts
/// themselves are untouched.
pub async fn delete_category(Path(id): Path<i32>, pool: Extension<PgPool>) -> impl IntoResponse {
    match delete_category_record(&pool, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
