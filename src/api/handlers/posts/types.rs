//! Request/response types for the posts API.
//!
//! These payloads are shared between handlers and `OpenAPI` generation.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub category_ids: Vec<i32>,
    pub user_id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// New excerpt; an empty string clears the stored value.
    pub excerpt: Option<String>,
    pub published: Option<bool>,
    pub category_ids: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPostsQuery {
    /// Filter by publish state; omit to list both drafts and published posts.
    pub published: Option<bool>,
    /// Only posts linked to this category.
    pub category_id: Option<i32>,
    /// Page size (default 10, capped at 100).
    pub limit: Option<i64>,
    /// Rows to skip (default 0).
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostCategory {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub published: bool,
    pub user_id: i32,
    pub created_at: String,
    pub updated_at: String,
    pub categories: Vec<PostCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostDetailResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub content: String,
    /// Markdown body rendered to HTML for public reading views.
    pub content_html: String,
    pub excerpt: Option<String>,
    pub published: bool,
    pub user_id: i32,
    pub created_at: String,
    pub updated_at: String,
    pub categories: Vec<PostCategory>,
}

impl PostDetailResponse {
    pub(super) fn from_post(post: PostResponse, content_html: String) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            content_html,
            excerpt: post.excerpt,
            published: post.published,
            user_id: post.user_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            categories: post.categories,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListPostsResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
}
