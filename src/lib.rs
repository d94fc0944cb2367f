//! # Quill (Blogging Platform API)
//!
//! `quill` is the API service behind a multi-user blogging platform: users
//! author markdown posts, organize them with categories (many-to-many), and
//! publish them or keep them as drafts.
//!
//! ## Content Model (Users, Posts, Categories)
//!
//! Posts belong to a user and carry zero or more categories through a join
//! table with a composite primary key. Deleting a user removes their posts;
//! deleting a post or category removes its join rows. Both constraints live in
//! the database schema (`sql/schema.sql`), not in application code.
//!
//! - **Slug Normalization:** Post and category slugs are normalized to
//!   lowercase, URL-safe strings (`[a-z0-9-]`) and are unique per table.
//!   Post slug collisions are resolved by suffixing (`my-title-2`); category
//!   name collisions are rejected with `409`.
//! - **Publish State:** A post is either `published` (publicly listable) or a
//!   draft. Listings can filter on publish state and category.
//! - **Stable Identifiers:** A post slug is assigned on create and never
//!   regenerated on title changes, so public URLs stay valid. Category slugs
//!   follow their name on rename.
//!
//! ## API Surface
//!
//! REST-style JSON endpoints under `/v1` (posts, categories, users) plus
//! `/health` and a Swagger UI at `/docs`. The OpenAPI document is generated
//! from the handler annotations and can be exported with the `openapi` binary.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
