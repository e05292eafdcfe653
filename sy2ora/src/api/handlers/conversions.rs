//! HTTP handler for batch conversion.

use crate::AppState;
use crate::api::models::conversions::{ConvertResponse, ErrorResponse};
use crate::conversion::SourceFile;
use crate::errors::{Error, Result};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

/// Name of the repeatable multipart field carrying the uploads.
pub const FILES_FIELD: &str = "files";

pub const NO_FILES_PART: &str = "No files part in the request";
pub const NO_FILES_UPLOADED: &str = "No files uploaded";

#[utoipa::path(
    post,
    path = "/convert-multiple",
    tag = "conversions",
    summary = "Convert SQL files",
    description = "Convert a batch of Sybase SQL files to Oracle SQL. Upload each file as a `files` part. \
                   Only `.sql` and `.txt` files are converted; others are listed under `skipped`. \
                   A file whose model call fails gets the content `Error: No response from Ollama`.",
    request_body(
        content_type = "multipart/form-data",
        description = "One or more `files` parts, each with a filename"
    ),
    responses(
        (status = 200, description = "Batch converted", body = ConvertResponse),
        (status = 400, description = "Missing or empty `files` field", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn convert_multiple(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ConvertResponse>> {
    let files = read_uploaded_files(multipart, state.config.limits.max_upload_size).await?;
    let received = files.len();

    let outcome = state.converter.convert_batch(files).await;

    tracing::info!(
        received,
        converted = outcome.converted.len(),
        skipped = outcome.skipped.len(),
        "Conversion batch completed"
    );

    Ok(Json(outcome.into()))
}

/// Collect every `files` part that carries a filename.
///
/// A body that is not multipart at all is treated like one without a `files` field, and so is a
/// `files` field sent as plain text. Parts with an empty filename are what browsers send for an
/// empty file input, so they count towards the field being present but not as uploads.
async fn read_uploaded_files(
    multipart: std::result::Result<Multipart, MultipartRejection>,
    max_upload_size: usize,
) -> Result<Vec<SourceFile>> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Request is not a readable multipart form");
        Error::BadRequest {
            message: NO_FILES_PART.to_string(),
        }
    })?;

    let mut field_present = false;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_size))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        field_present = true;

        if filename.is_empty() {
            continue;
        }

        let content = field.bytes().await.map_err(|e| multipart_error(e, max_upload_size))?;
        tracing::debug!(filename = %filename, bytes = content.len(), "Received file");
        files.push(SourceFile::new(filename, content.to_vec()));
    }

    if !field_present {
        return Err(Error::BadRequest {
            message: NO_FILES_PART.to_string(),
        });
    }

    if files.is_empty() {
        return Err(Error::BadRequest {
            message: NO_FILES_UPLOADED.to_string(),
        });
    }

    Ok(files)
}

fn multipart_error(e: MultipartError, max_upload_size: usize) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { limit: max_upload_size }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", e.body_text()),
        }
    }
}
