//! SQL storage helpers for categories.

use axum::{http::StatusCode, response::IntoResponse};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::error;

use super::super::is_unique_violation;
use super::types::CategoryResponse;

const CATEGORY_COLUMNS: &str = r#"id, name, slug, description,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at"#;

#[derive(Debug)]
pub(super) struct CategoryChanges<'a> {
    pub name: Option<&'a str>,
    pub slug: Option<&'a str>,
    pub description: Option<&'a str>,
}

#[derive(Debug)]
pub(super) enum CategoryError {
    Conflict(&'static str),
    NotFound,
    Database(sqlx::Error),
}

impl IntoResponse for CategoryError {
    /// Maps storage-layer failures into stable HTTP responses for handlers.
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Conflict(message) => (StatusCode::CONFLICT, message).into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Database(err) => {
                error!("Database error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn category_from_row(row: &PgRow) -> CategoryResponse {
    CategoryResponse {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Inserts a category; name and slug uniqueness violations both map to `409`.
pub(super) async fn insert_category(
    pool: &PgPool,
    name: &str,
    slug: &str,
    description: Option<&str>,
) -> Result<CategoryResponse, CategoryError> {
    let query = format!(
        r"
        INSERT INTO categories (name, slug, description)
        VALUES ($1, $2, $3)
        RETURNING {CATEGORY_COLUMNS}
        "
    );
    let insert = sqlx::query(&query)
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(pool)
        .await;

    match insert {
        Ok(row) => Ok(category_from_row(&row)),
        Err(err) => {
            if is_unique_violation(&err) {
                Err(CategoryError::Conflict(
                    "A category with this name already exists.",
                ))
            } else {
                Err(CategoryError::Database(err))
            }
        }
    }
}

/// Lists all categories ordered by name.
pub(super) async fn fetch_categories(pool: &PgPool) -> Result<Vec<CategoryResponse>, sqlx::Error> {
    let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name");
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    Ok(rows.iter().map(category_from_row).collect())
}

/// Applies a partial update. The description is only touched when the caller
/// provided one, and an empty string stores NULL.
pub(super) async fn update_category_record(
    pool: &PgPool,
    id: i32,
    changes: &CategoryChanges<'_>,
) -> Result<CategoryResponse, CategoryError> {
    let description = changes
        .description
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let query = format!(
        r"
        UPDATE categories
        SET
            name = COALESCE($1, name),
            slug = COALESCE($2, slug),
            description = CASE WHEN $3 THEN $4 ELSE description END,
            updated_at = now()
        WHERE id = $5
        RETURNING {CATEGORY_COLUMNS}
        "
    );
    let update = sqlx::query(&query)
        .bind(changes.name)
        .bind(changes.slug)
        .bind(changes.description.is_some())
        .bind(description)
        .bind(id)
        .fetch_optional(pool)
        .await;

    match update {
        Ok(Some(row)) => Ok(category_from_row(&row)),
        Ok(None) => Err(CategoryError::NotFound),
        Err(err) => {
            if is_unique_violation(&err) {
                Err(CategoryError::Conflict(
                    "A category with this name already exists.",
                ))
            } else {
                Err(CategoryError::Database(err))
            }
        }
    }
}

/// Deletes a category; join rows cascade in the database.
pub(super) async fn delete_category_record(pool: &PgPool, id: i32) -> Result<(), CategoryError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(CategoryError::Database)?;

    if result.rows_affected() == 0 {
        return Err(CategoryError::NotFound);
    }
    Ok(())
}
