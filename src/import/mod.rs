//! Bulk field import.
//!
//! A field set arrives either from the upload endpoint (the file is posted
//! and the JSON reply carries the parsed fields) or from a local file parsed
//! in-process. Both paths end in the same response contract: a document
//! with a `fields` array is a success, anything else is a failure.

pub mod sectioned;
pub mod upload;

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::nomenclature::Field;

/// Default upload endpoint (the form builder's own server)
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/upload";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No file selected")]
    NoFile,
    #[error("Invalid file type: {0}")]
    UnsupportedFile(String),
    #[error("{0}")]
    Rejected(String),
    #[error("Response did not contain a field list")]
    MissingFields,
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Upload timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Import task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Reply document of the import endpoint
#[derive(Debug, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ImportResponse {
    /// A missing `fields` array is a failure, never an empty field set
    pub fn into_fields(self) -> Result<Vec<Field>, ImportError> {
        match (self.fields, self.error) {
            (Some(mut fields), _) => {
                for field in &mut fields {
                    field.selected = None;
                }
                Ok(fields)
            }
            (None, Some(error)) => Err(ImportError::Rejected(error)),
            (None, None) => Err(ImportError::MissingFields),
        }
    }
}

/// Parse a response body into a field set
pub fn parse_response(body: &str) -> Result<Vec<Field>, ImportError> {
    let response: ImportResponse = serde_json::from_str(body)?;
    response.into_fields()
}

/// Where a file gets turned into fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Upload { endpoint: String, timeout: Duration },
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Json,
}

fn file_kind(path: &Path) -> Result<FileKind, ImportError> {
    if path.as_os_str().is_empty() {
        return Err(ImportError::NoFile);
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("csv") => Ok(FileKind::Csv),
        Some("json") => Ok(FileKind::Json),
        _ => Err(ImportError::UnsupportedFile(path.display().to_string())),
    }
}

/// Whether the file browser should offer this file for import
pub fn is_importable(path: &Path) -> bool {
    file_kind(path).is_ok()
}

/// Import a file into a complete field set.
///
/// CSV files go to the endpoint when one is configured. JSON files already
/// hold a response document and are always read locally.
pub async fn import_file(path: &Path, source: &ImportSource) -> Result<Vec<Field>, ImportError> {
    let kind = file_kind(path)?;
    if !path.is_file() {
        return Err(ImportError::NoFile);
    }

    tracing::info!("Importing fields from {}", path.display());

    let fields = match (kind, source) {
        (FileKind::Csv, ImportSource::Upload { endpoint, timeout }) => {
            upload::upload_file(endpoint, path, *timeout).await?
        }
        (FileKind::Csv, ImportSource::Local) => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || sectioned::parse_file(&path)).await??
        }
        (FileKind::Json, _) => {
            let body = tokio::fs::read_to_string(path).await?;
            parse_response(&body)?
        }
    };

    tracing::info!("Imported {} fields", fields.len());
    Ok(fields)
}
