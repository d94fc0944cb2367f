//! End-to-end API tests against a real Postgres.
//!
//! The suite builds the in-process router and drives it with `tower`'s
//! `oneshot`, so no listener or child process is involved. It needs a
//! database: set `QUILL_TEST_DSN` to a Postgres URL with create-table
//! privileges, otherwise every test skips.
//!
//! Fixtures use ULID-derived names so tests can run repeatedly against the
//! same database without tripping unique constraints.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Extension, Router,
};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;
use ulid::Ulid;

const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

async fn setup() -> Result<Option<Router>> {
    let Ok(dsn) = std::env::var("QUILL_TEST_DSN") else {
        eprintln!("Skipping integration test: QUILL_TEST_DSN is not set");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&dsn)
        .await
        .context("Failed to connect to test database")?;
    apply_schema(&pool).await?;

    Ok(Some(quill::api::router().layer(Extension(pool))))
}

async fn apply_schema(pool: &PgPool) -> Result<()> {
    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute schema statement {}", index + 1))?;
    }
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        if line.trim().starts_with("--") && current.trim().is_empty() {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if line.trim().ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    Ok((status, value))
}

/// Unique lowercase token for names, titles, and emails.
fn token() -> String {
    Ulid::new().to_string().to_lowercase()
}

async fn create_user(app: &Router) -> Result<i64> {
    let suffix = token();
    let (status, user) = request(
        app,
        Method::POST,
        "/v1/users",
        Some(json!({
            "name": format!("Author {suffix}"),
            "email": format!("author-{suffix}@example.com"),
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "user create failed: {user}");
    user["id"].as_i64().context("user id missing")
}

async fn create_category(app: &Router, name: &str) -> Result<Value> {
    let (status, category) = request(
        app,
        Method::POST,
        "/v1/categories",
        Some(json!({ "name": name })),
    )
    .await?;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "category create failed: {category}"
    );
    Ok(category)
}

#[tokio::test]
async fn post_lifecycle() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let user_id = create_user(&app).await?;
    let rust_cat = create_category(&app, &format!("Rust {}", token())).await?;
    let web_cat = create_category(&app, &format!("Web {}", token())).await?;

    let suffix = token();
    let (status, post) = request(
        &app,
        Method::POST,
        "/v1/posts",
        Some(json!({
            "title": format!("Hello World {suffix}"),
            "content": "# Welcome\n\nFirst **post**.",
            "excerpt": "A short intro.",
            "published": false,
            "category_ids": [rust_cat["id"]],
            "user_id": user_id,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "post create failed: {post}");
    let post_id = post["id"].as_i64().context("post id missing")?;
    let slug = post["slug"].as_str().context("slug missing")?.to_string();
    assert_eq!(slug, format!("hello-world-{suffix}"));
    assert_eq!(post["published"], json!(false));
    assert_eq!(post["categories"].as_array().map(Vec::len), Some(1));

    // Slug read returns rendered HTML alongside the raw markdown.
    let (status, detail) =
        request(&app, Method::GET, &format!("/v1/posts/by-slug/{slug}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    let html = detail["content_html"].as_str().context("html missing")?;
    assert!(html.contains("<h1>Welcome</h1>"));
    assert!(html.contains("<strong>post</strong>"));

    // Update: title changes, slug stays; categories are replaced wholesale.
    let (status, updated) = request(
        &app,
        Method::PATCH,
        &format!("/v1/posts/{post_id}"),
        Some(json!({
            "title": format!("Hello Again {suffix}"),
            "category_ids": [web_cat["id"]],
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "post update failed: {updated}");
    assert_eq!(updated["slug"].as_str(), Some(slug.as_str()));
    assert_eq!(updated["title"].as_str().map(|t| t.starts_with("Hello Again")), Some(true));
    let categories = updated["categories"].as_array().context("categories")?;
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["id"], web_cat["id"]);
    assert_eq!(updated["excerpt"].as_str(), Some("A short intro."));

    // Empty string clears the excerpt.
    let (status, cleared) = request(
        &app,
        Method::PATCH,
        &format!("/v1/posts/{post_id}"),
        Some(json!({ "excerpt": "" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["excerpt"], Value::Null);

    // Publish flips the flag.
    let (status, published) = request(
        &app,
        Method::POST,
        &format!("/v1/posts/{post_id}/publish"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["published"], json!(true));

    // Delete, then both id and slug reads 404.
    let (status, _) = request(&app, Method::DELETE, &format!("/v1/posts/{post_id}"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = request(&app, Method::GET, &format!("/v1/posts/{post_id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
        request(&app, Method::GET, &format!("/v1/posts/by-slug/{slug}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn duplicate_titles_get_suffixed_slugs() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let user_id = create_user(&app).await?;
    let title = format!("Release Notes {}", token());

    let mut slugs = Vec::new();
    for _ in 0..3 {
        let (status, post) = request(
            &app,
            Method::POST,
            "/v1/posts",
            Some(json!({
                "title": title,
                "content": "Same title, different post.",
                "user_id": user_id,
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED, "post create failed: {post}");
        slugs.push(post["slug"].as_str().context("slug")?.to_string());
    }

    assert_eq!(slugs[1], format!("{}-2", slugs[0]));
    assert_eq!(slugs[2], format!("{}-3", slugs[0]));

    Ok(())
}

#[tokio::test]
async fn list_posts_filters_and_paginates() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let user_id = create_user(&app).await?;
    let category = create_category(&app, &format!("Filtered {}", token())).await?;
    let category_id = category["id"].as_i64().context("category id")?;

    for index in 0..3 {
        let (status, post) = request(
            &app,
            Method::POST,
            "/v1/posts",
            Some(json!({
                "title": format!("Filtered Post {index} {}", token()),
                "content": "Body.",
                "published": index != 0,
                "category_ids": [category_id],
                "user_id": user_id,
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED, "post create failed: {post}");
    }

    // The category filter isolates this test's rows from everything else.
    let (status, page) = request(
        &app,
        Method::GET,
        &format!("/v1/posts?category_id={category_id}"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(3));
    assert_eq!(page["posts"].as_array().map(Vec::len), Some(3));

    let (status, page) = request(
        &app,
        Method::GET,
        &format!("/v1/posts?category_id={category_id}&published=true"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(2));

    let (status, page) = request(
        &app,
        Method::GET,
        &format!("/v1/posts?category_id={category_id}&limit=2&offset=2"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(3));
    assert_eq!(page["posts"].as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn category_lifecycle() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let name = format!("Databases {}", token());
    let category = create_category(&app, &name).await?;
    let category_id = category["id"].as_i64().context("category id")?;
    assert_eq!(
        category["slug"].as_str(),
        Some(name.replace(' ', "-").to_lowercase().as_str())
    );

    // Duplicate names conflict instead of suffixing.
    let (status, _) = request(
        &app,
        Method::POST,
        "/v1/categories",
        Some(json!({ "name": name })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Rename regenerates the slug.
    let renamed = format!("Storage {}", token());
    let (status, updated) = request(
        &app,
        Method::PATCH,
        &format!("/v1/categories/{category_id}"),
        Some(json!({ "name": renamed, "description": "All things storage." })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "category update failed: {updated}");
    assert_eq!(
        updated["slug"].as_str(),
        Some(renamed.replace(' ', "-").to_lowercase().as_str())
    );
    assert_eq!(updated["description"].as_str(), Some("All things storage."));

    // Empty string clears the description.
    let (status, cleared) = request(
        &app,
        Method::PATCH,
        &format!("/v1/categories/{category_id}"),
        Some(json!({ "description": "" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["description"], Value::Null);

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/v1/categories/{category_id}"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/v1/categories/{category_id}"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn deleting_category_detaches_posts() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let user_id = create_user(&app).await?;
    let category = create_category(&app, &format!("Ephemeral {}", token())).await?;
    let category_id = category["id"].as_i64().context("category id")?;

    let (status, post) = request(
        &app,
        Method::POST,
        "/v1/posts",
        Some(json!({
            "title": format!("Survivor {}", token()),
            "content": "Outlives its category.",
            "category_ids": [category_id],
            "user_id": user_id,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "post create failed: {post}");
    let post_id = post["id"].as_i64().context("post id")?;

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/v1/categories/{category_id}"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The post remains, with its category link gone.
    let (status, post) = request(&app, Method::GET, &format!("/v1/posts/{post_id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["categories"].as_array().map(Vec::len), Some(0));

    Ok(())
}

#[tokio::test]
async fn unknown_category_rejected_on_create() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let user_id = create_user(&app).await?;
    let (status, body) = request(
        &app,
        Method::POST,
        "/v1/posts",
        Some(json!({
            "title": format!("Orphan {}", token()),
            "content": "Body.",
            "category_ids": [999_999_999],
            "user_id": user_id,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected: {body}");

    Ok(())
}

#[tokio::test]
async fn unknown_author_rejected_on_create() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let (status, body) = request(
        &app,
        Method::POST,
        "/v1/posts",
        Some(json!({
            "title": format!("Ghost Writer {}", token()),
            "content": "Body.",
            "user_id": 999_999_999,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected: {body}");

    Ok(())
}

#[tokio::test]
async fn renaming_category_to_existing_name_conflicts() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let taken = format!("Taken {}", token());
    create_category(&app, &taken).await?;
    let other = create_category(&app, &format!("Other {}", token())).await?;
    let other_id = other["id"].as_i64().context("category id")?;

    let (status, body) = request(
        &app,
        Method::PATCH,
        &format!("/v1/categories/{other_id}"),
        Some(json!({ "name": taken })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT, "unexpected: {body}");

    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let email = format!("dup-{}@example.com", token());
    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let (status, body) = request(
            &app,
            Method::POST,
            "/v1/users",
            Some(json!({ "name": "Duplicate", "email": email })),
        )
        .await?;
        assert_eq!(status, expected, "unexpected: {body}");
    }

    Ok(())
}

#[tokio::test]
async fn health_reports_database() -> Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };

    let (status, body) = request(&app, Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"].as_str(), Some("ok"));
    assert_eq!(body["name"].as_str(), Some(env!("CARGO_PKG_NAME")));

    Ok(())
}
