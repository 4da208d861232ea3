//! Upload a field file to the import endpoint.

use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use super::{parse_response, ImportError};
use crate::nomenclature::Field;

/// POST the file as `multipart/form-data` (part `file`) and parse the reply.
///
/// The endpoint answers failures with an `{error}` document and a 4xx/5xx
/// status, so the body is parsed whatever the status is.
pub async fn upload_file(
    endpoint: &str,
    path: &Path,
    timeout_after: Duration,
) -> Result<Vec<Field>, ImportError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("fields.csv")
        .to_string();

    let part = Part::bytes(bytes).file_name(file_name).mime_str("text/csv")?;
    let form = Form::new().part("file", part);

    tracing::debug!("Uploading {} to {}", path.display(), endpoint);

    let client = reqwest::Client::new();
    let request = async {
        let response = client.post(endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok::<_, ImportError>((status, body))
    };

    let (status, body) = timeout(timeout_after, request)
        .await
        .map_err(|_| ImportError::Timeout(timeout_after.as_secs()))??;

    tracing::debug!("Upload answered with HTTP {}", status);

    match parse_response(&body) {
        Err(ImportError::Json(e)) => Err(ImportError::Malformed(format!("HTTP {}: {}", status, e))),
        other => other,
    }
}
