//! Shared SQL storage helpers for posts and their category links.
//!
//! This module owns the queries behind post CRUD, the paginated/filtered
//! listing, and the replace-all semantics for category links. Handlers stay
//! focused on parsing input and shaping HTTP responses.

use axum::{http::StatusCode, response::IntoResponse};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use std::collections::HashMap;
use tracing::error;

use super::super::slug::with_suffix;
use super::super::{is_fk_violation, is_unique_violation};
use super::types::{PostCategory, PostResponse};
use super::SLUG_MAX;

const POST_COLUMNS: &str = r#"id, title, slug, content, excerpt, published, user_id,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at"#;

#[derive(Debug)]
pub(super) struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub excerpt: Option<&'a str>,
    pub published: bool,
    pub user_id: i32,
    pub category_ids: &'a [i32],
}

#[derive(Debug)]
pub(super) struct PostChanges<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub excerpt: Option<&'a str>,
    pub published: Option<bool>,
    pub category_ids: Option<&'a [i32]>,
}

/// Publish-state and category filters shared by the listing and count queries.
#[derive(Debug)]
pub(super) struct PostFilter {
    pub published: Option<bool>,
    pub category_id: Option<i32>,
}

#[derive(Debug)]
pub(super) enum PostError {
    BadRequest(&'static str),
    Conflict(&'static str),
    NotFound,
    Database(sqlx::Error),
}

impl IntoResponse for PostError {
    /// Maps storage-layer failures into stable HTTP responses for handlers.
    /// Database errors are logged server-side and surfaced as `500` without leaking details.
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Conflict(message) => (StatusCode::CONFLICT, message).into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Database(err) => {
                error!("Database error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn post_from_row(row: &PgRow) -> PostResponse {
    PostResponse {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        published: row.get("published"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        categories: Vec::new(),
    }
}

/// Inserts a post and its category links in one transaction.
/// Slug collisions are resolved by suffixing within `SLUG_MAX`; unknown author
/// or category references are mapped to `400` via foreign-key violations.
pub(super) async fn create_post_with_categories(
    pool: &PgPool,
    post: &NewPost<'_>,
    base_slug: &str,
) -> Result<PostResponse, PostError> {
    let mut attempt = 0;
    loop {
        let slug = if attempt == 0 {
            base_slug.to_string()
        } else {
            let suffix = attempt + 1;
            let Some(slug) = with_suffix(base_slug, suffix, SLUG_MAX) else {
                return Err(PostError::Conflict("Post slug is unavailable."));
            };
            slug
        };

        let mut tx = pool.begin().await.map_err(PostError::Database)?;
        let query = format!(
            r"
            INSERT INTO posts (title, slug, content, excerpt, published, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "
        );
        let insert = sqlx::query(&query)
            .bind(post.title)
            .bind(&slug)
            .bind(post.content)
            .bind(post.excerpt)
            .bind(post.published)
            .bind(post.user_id)
            .fetch_one(&mut *tx)
            .await;

        let row = match insert {
            Ok(row) => row,
            Err(err) => {
                if is_unique_violation(&err) {
                    let _ = tx.rollback().await;
                    attempt += 1;
                    continue;
                }
                if is_fk_violation(&err) {
                    let _ = tx.rollback().await;
                    return Err(PostError::BadRequest("Unknown user id."));
                }
                return Err(PostError::Database(err));
            }
        };

        let mut response = post_from_row(&row);

        if let Err(err) = insert_category_links(&mut tx, response.id, post.category_ids).await {
            let _ = tx.rollback().await;
            return Err(err);
        }

        tx.commit().await.map_err(PostError::Database)?;

        attach_categories(pool, std::slice::from_mut(&mut response))
            .await
            .map_err(PostError::Database)?;

        return Ok(response);
    }
}

/// Inserts join rows for a post. Duplicate ids in the payload are tolerated
/// via the composite primary key (`ON CONFLICT DO NOTHING`).
async fn insert_category_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    post_id: i32,
    category_ids: &[i32],
) -> Result<(), PostError> {
    for category_id in category_ids {
        let result = sqlx::query(
            r"
            INSERT INTO post_categories (post_id, category_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(post_id)
        .bind(*category_id)
        .execute(&mut **tx)
        .await;

        if let Err(err) = result {
            if is_fk_violation(&err) {
                return Err(PostError::BadRequest("Unknown category id."));
            }
            return Err(PostError::Database(err));
        }
    }
    Ok(())
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    let mut prefix = " WHERE ";
    if let Some(published) = filter.published {
        builder.push(prefix);
        builder.push("published = ");
        builder.push_bind(published);
        prefix = " AND ";
    }
    if let Some(category_id) = filter.category_id {
        builder.push(prefix);
        builder.push(
            "EXISTS (SELECT 1 FROM post_categories pc WHERE pc.post_id = posts.id AND pc.category_id = ",
        );
        builder.push_bind(category_id);
        builder.push(")");
    }
}

/// Fetches one page of posts ordered newest first, plus the total count over
/// the same filtered set. Pagination happens in SQL, not in memory.
pub(super) async fn fetch_posts_page(
    pool: &PgPool,
    filter: &PostFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PostResponse>, i64), sqlx::Error> {
    let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
    push_filters(&mut count_builder, filter);
    let total: i64 = count_builder.build().fetch_one(pool).await?.get(0);

    if total == 0 {
        return Ok((Vec::new(), 0));
    }

    let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
    builder.push(POST_COLUMNS);
    builder.push(" FROM posts");
    push_filters(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows = builder.build().fetch_all(pool).await?;
    let mut posts: Vec<PostResponse> = rows.iter().map(post_from_row).collect();

    attach_categories(pool, &mut posts).await?;

    Ok((posts, total))
}

/// Fetches a single post by slug with its categories attached.
pub(super) async fn fetch_post_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<PostResponse>, sqlx::Error> {
    let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1");
    let row = sqlx::query(&query).bind(slug).fetch_optional(pool).await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut post = post_from_row(&row);
    attach_categories(pool, std::slice::from_mut(&mut post)).await?;
    Ok(Some(post))
}

/// Fetches a single post by id with its categories attached.
pub(super) async fn fetch_post_by_id(
    pool: &PgPool,
    id: i32,
) -> Result<Option<PostResponse>, sqlx::Error> {
    let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
    let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut post = post_from_row(&row);
    attach_categories(pool, std::slice::from_mut(&mut post)).await?;
    Ok(Some(post))
}

/// Applies a partial update and, when `category_ids` is present, replaces the
/// full category link set in the same transaction. The slug is untouched.
/// The excerpt is only touched when the caller provided one, and an empty
/// string stores NULL.
pub(super) async fn update_post_record(
    pool: &PgPool,
    id: i32,
    changes: &PostChanges<'_>,
) -> Result<PostResponse, PostError> {
    let excerpt = changes
        .excerpt
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let mut tx = pool.begin().await.map_err(PostError::Database)?;

    let query = format!(
        r"
        UPDATE posts
        SET
            title = COALESCE($1, title),
            content = COALESCE($2, content),
            excerpt = CASE WHEN $3 THEN $4 ELSE excerpt END,
            published = COALESCE($5, published),
            updated_at = now()
        WHERE id = $6
        RETURNING {POST_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.excerpt.is_some())
        .bind(excerpt)
        .bind(changes.published)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(PostError::Database)?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Err(PostError::NotFound);
    };
    let mut response = post_from_row(&row);

    if let Some(category_ids) = changes.category_ids {
        sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(PostError::Database)?;

        if let Err(err) = insert_category_links(&mut tx, id, category_ids).await {
            let _ = tx.rollback().await;
            return Err(err);
        }
    }

    tx.commit().await.map_err(PostError::Database)?;

    attach_categories(pool, std::slice::from_mut(&mut response))
        .await
        .map_err(PostError::Database)?;

    Ok(response)
}

/// Deletes a post; join rows cascade in the database.
pub(super) async fn delete_post_record(pool: &PgPool, id: i32) -> Result<(), PostError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(PostError::Database)?;

    if result.rows_affected() == 0 {
        return Err(PostError::NotFound);
    }
    Ok(())
}

/// Flips a post to published and bumps `updated_at`.
pub(super) async fn publish_post_record(pool: &PgPool, id: i32) -> Result<PostResponse, PostError> {
    let query = format!(
        r"
        UPDATE posts
        SET published = true, updated_at = now()
        WHERE id = $1
        RETURNING {POST_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(PostError::Database)?;

    let Some(row) = row else {
        return Err(PostError::NotFound);
    };
    let mut response = post_from_row(&row);

    attach_categories(pool, std::slice::from_mut(&mut response))
        .await
        .map_err(PostError::Database)?;

    Ok(response)
}

/// Loads the categories for a batch of posts in one query and distributes them
/// onto the response DTOs, ordered by category name.
async fn attach_categories(pool: &PgPool, posts: &mut [PostResponse]) -> Result<(), sqlx::Error> {
    if posts.is_empty() {
        return Ok(());
    }

    let ids: Vec<i32> = posts.iter().map(|post| post.id).collect();
    let rows = sqlx::query(
        r"
        SELECT pc.post_id, c.id, c.name, c.slug
        FROM post_categories pc
        JOIN categories c ON c.id = pc.category_id
        WHERE pc.post_id = ANY($1)
        ORDER BY c.name
        ",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut by_post: HashMap<i32, Vec<PostCategory>> = HashMap::new();
    for row in rows {
        by_post
            .entry(row.get("post_id"))
            .or_default()
            .push(PostCategory {
                id: row.get("id"),
                name: row.get("name"),
                slug: row.get("slug"),
            });
    }

    for post in posts {
        if let Some(categories) = by_post.remove(&post.id) {
            post.categories = categories;
        }
    }

    Ok(())
}
