//! Download action with SHA-256 verification.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::execute::types::ExecuteError;
use crate::util::hash::hash_bytes;

const DOWNLOADS_DIR: &str = "downloads";

/// Downloads `url` into `<deploy_dir>/downloads/` and verifies it.
///
/// A file already present with the expected digest is reused without
/// touching the network. Nothing is written when the digest does not match.
/// Returns the path of the verified file.
pub async fn execute_fetch(url: &str, expected_sha256: &str, deploy_dir: &Path) -> Result<PathBuf, ExecuteError> {
  let expected = expected_sha256.to_ascii_lowercase();
  let downloads_dir = deploy_dir.join(DOWNLOADS_DIR);
  fs::create_dir_all(&downloads_dir).await?;

  let dest_path = downloads_dir.join(url_to_filename(url));

  if let Ok(existing) = fs::read(&dest_path).await {
    let actual = hash_bytes(&existing).0;
    if actual == expected {
      info!(url = %url, path = ?dest_path, "download cached");
      return Ok(dest_path);
    }
    debug!(expected = %expected, actual = %actual, "cached download is stale, fetching again");
  }

  info!(url = %url, "fetching");

  let fetch_err = |message: String| ExecuteError::FetchFailed {
    url: url.to_string(),
    message,
  };

  let response = reqwest::get(url).await.map_err(|e| fetch_err(e.to_string()))?;
  if !response.status().is_success() {
    return Err(fetch_err(format!("HTTP {}", response.status())));
  }
  let bytes = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;

  let actual = hash_bytes(&bytes).0;
  if actual != expected {
    return Err(ExecuteError::HashMismatch {
      url: url.to_string(),
      expected,
      actual,
    });
  }

  fs::write(&dest_path, &bytes).await?;
  info!(path = ?dest_path, size = bytes.len(), "download complete");

  Ok(dest_path)
}

/// Derives a safe file name from the last URL path segment, falling back to
/// a digest of the URL.
fn url_to_filename(url: &str) -> String {
  let last = url.rsplit('/').next().unwrap_or_default();
  let last = last.split(['?', '#']).next().unwrap_or_default();

  let sanitized: String = last
    .chars()
    .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
    .collect();

  if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
    format!("download_{}", &hash_bytes(url.as_bytes()).0[..16])
  } else {
    sanitized
  }
}
