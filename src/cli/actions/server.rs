use crate::api;
use crate::cli::actions::Action;
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
///
/// # Errors
///
/// Returns an error if the DSN is not a valid URL or the server fails to start.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            cors_origin,
        } => {
            // Fail fast on malformed connection strings instead of at pool setup.
            Url::parse(&dsn).with_context(|| "Invalid database DSN".to_string())?;

            api::new(port, dsn, &cors_origin).await?;
        }
    }

    Ok(())
}
