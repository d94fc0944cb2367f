use super::handlers::{categories, health, posts, users};
use utoipa::openapi::{Contact, InfoBuilder, License, Tag};
use utoipa::OpenApi;

/// Drives the generated `OpenAPI` document.
///
/// Add new endpoints to `paths(...)` and their payloads to `schemas(...)` so
/// the Swagger UI stays complete. Routes like `/` or `OPTIONS /health` are
/// intentionally not documented.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        posts::create_post,
        posts::list_posts,
        posts::get_post_by_slug,
        posts::get_post,
        posts::update_post,
        posts::delete_post,
        posts::publish_post,
        categories::create_category,
        categories::list_categories,
        categories::update_category,
        categories::delete_category,
        users::create_user,
        users::list_users,
        users::get_user,
    ),
    components(schemas(
        health::Health,
        posts::CreatePostRequest,
        posts::UpdatePostRequest,
        posts::PostCategory,
        posts::PostResponse,
        posts::PostDetailResponse,
        posts::ListPostsResponse,
        categories::CreateCategoryRequest,
        categories::UpdateCategoryRequest,
        categories::CategoryResponse,
        users::CreateUserRequest,
        users::UserResponse,
    ))
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();

    // Use Cargo.toml metadata instead of the derive defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.contact = cargo_contact();
    info.license = cargo_license();
    spec.info = info;

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service and database health".to_string());

    let mut posts_tag = Tag::new("posts");
    posts_tag.description = Some("Post authoring, listing, and publishing".to_string());

    let mut categories_tag = Tag::new("categories");
    categories_tag.description = Some("Category management".to_string());

    let mut users_tag = Tag::new("users");
    users_tag.description = Some("Author accounts".to_string());

    spec.tags = Some(vec![health_tag, posts_tag, categories_tag, users_tag]);

    spec
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}
