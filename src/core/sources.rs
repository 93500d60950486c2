use std::fs;
use std::time::Duration;

use reqwest::Client;

use crate::utils::error::{MergeError, Result};

/// Reads the newline-delimited source list. Blank lines and `!` comments are
/// skipped; file order is preserved and duplicates are kept.
///
/// An unreadable list is the one fatal precondition of a run.
pub fn load_sources(path: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|_| MergeError::MissingSourcesError {
        path: path.to_string(),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('!'))
        .map(str::to_string)
        .collect())
}

/// Fetches one source as plain text and splits it into lines.
///
/// A single attempt with a bounded timeout; network errors and non-success
/// statuses are returned to the caller, which logs them and moves on.
pub async fn fetch_source(client: &Client, url: &str, timeout: Duration) -> Result<Vec<String>> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;

    let body = response.text().await?;
    Ok(body.lines().map(str::to_string).collect())
}
