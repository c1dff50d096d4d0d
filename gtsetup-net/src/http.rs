// gtsetup-net/src/http.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use gtsetup_common::error::{Result, SetupError};
use gtsetup_common::model::ArtifactSpec;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File as TokioFile};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::validation::validate_url;

const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = concat!("gtsetup/", env!("CARGO_PKG_VERSION"));

pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SetupError::HttpError(format!("Failed to build HTTP client: {e}")))
}

/// Downloads `artifact` into `work_dir` and returns the local path.
pub async fn fetch_artifact(client: &Client, artifact: &ArtifactSpec, work_dir: &Path) -> Result<PathBuf> {
    let local_path = artifact.local_path(work_dir);
    debug!(
        "Fetching {} from {} into {}",
        artifact.kind,
        artifact.url,
        local_path.display()
    );
    fetch_to_file(client, &artifact.url, &local_path)
        .await
        .map_err(|e| match e {
            SetupError::DownloadError(..) | SetupError::ValidationError(_) => e,
            other => SetupError::DownloadError(
                artifact.file_name(),
                artifact.url.clone(),
                other.to_string(),
            ),
        })
}

/// Streams the body of `url` into `final_path`.
///
/// The body goes to a hidden `.download` sibling first and is renamed into
/// place only once complete, so a failed transfer never leaves a truncated
/// file at `final_path`.
pub async fn fetch_to_file(client: &Client, url: &str, final_path: &Path) -> Result<PathBuf> {
    validate_url(url)?;

    let temp_filename = format!(
        ".{}.download",
        final_path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = final_path.with_file_name(temp_filename);
    debug!("Downloading to temporary path: {}", temp_path.display());
    if fs::try_exists(&temp_path).await.unwrap_or(false) {
        if let Err(e) = fs::remove_file(&temp_path).await {
            warn!(
                "Could not remove existing temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    if let Err(e) = stream_to(client, url, final_path, &temp_path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    fs::rename(&temp_path, final_path).await.map_err(|e| {
        SetupError::InstallError(format!(
            "Failed to move temp file {} to {}: {}",
            temp_path.display(),
            final_path.display(),
            e
        ))
    })?;
    debug!("Download complete: {}", final_path.display());
    Ok(final_path.to_path_buf())
}

async fn stream_to(client: &Client, url: &str, final_path: &Path, temp_path: &Path) -> Result<()> {
    let file_label = final_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let response = client.get(url).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        SetupError::DownloadError(
            file_label.clone(),
            url.to_string(),
            format!("request failed: {e}"),
        )
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        error!("HTTP error {} for URL {}", status, url);
        let reason = match status {
            StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
            StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
            other => format!("HTTP error {other}"),
        };
        return Err(SetupError::DownloadError(file_label, url.to_string(), reason));
    }

    let mut temp_file = TokioFile::create(temp_path).await.map_err(|e| {
        SetupError::InstallError(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            SetupError::DownloadError(
                file_label.clone(),
                url.to_string(),
                format!("failed to read response body: {e}"),
            )
        })?;
        temp_file.write_all(&chunk).await.map_err(|e| {
            SetupError::InstallError(format!(
                "Failed to write download stream to {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        written += chunk.len() as u64;
    }
    temp_file.flush().await?;
    drop(temp_file);
    debug!("Wrote {} bytes to {}", written, temp_path.display());
    Ok(())
}
