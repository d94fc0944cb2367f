//! API handlers and shared utilities for Quill.
//!
//! This module organizes the service's route handlers and provides common
//! functions for validation and database error classification.

pub mod categories;
pub mod health;
pub mod posts;
pub mod root;
pub mod users;

pub(crate) mod slug;

use regex::Regex;

/// Lightweight email sanity check used before persisting user rows.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Returns `true` when `err` is a database unique-violation (SQLSTATE `23505`).
/// This is used to translate constraint errors into stable API `409` responses.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Returns `true` when `err` is a foreign-key violation (SQLSTATE `23503`).
/// Unknown author or category references surface as `400` rather than `500`.
pub(crate) fn is_fk_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23503"),
        _ => false,
    }
}
