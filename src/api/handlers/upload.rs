use crate::AppState;
use crate::api::error::AppError;
use crate::api::view::Banner;
use crate::services::upload_service::{UploadError, UploadedFile};
use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode, header},
    response::Html,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::warn;
use utoipa::ToSchema;

/// Name of the multipart field carrying the file
pub const FILE_FIELD: &str = "file";

#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Accepts a multipart upload and streams the `file` field to the bucket.
///
/// Outcomes are rendered as a banner on the upload page, so input, configuration
/// and backend failures all answer 200. Only an oversized body is rejected
/// with 413.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload page with a success or error banner", content_type = "text/html", body = String),
        (status = 413, description = "Request body exceeds the upload limit")
    ),
    tag = "upload"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, AppError> {
    let limit = state.config.max_upload_size;
    if let Some(length) = content_length(&headers) {
        if length > limit {
            warn!("Rejected upload of {} bytes (limit {})", length, limit);
            return Err(too_large(limit));
        }
    }

    // No multipart body at all (bare POST, urlencoded form, bad boundary)
    // means no file was sent
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!("No multipart body in request: {}", rejection.body_text());
            let banner = Banner::failed(&UploadError::no_file());
            return state.pages.render(&state.config, Some(&banner));
        }
    };

    let outcome = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                warn!("No file in request");
                break Err(UploadError::no_file());
            }
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                warn!("Upload body exceeded the limit: {}", e);
                return Err(too_large(limit));
            }
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                break Err(UploadError::Input(format!(
                    "Malformed upload request: {}",
                    e.body_text()
                )));
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file = UploadedFile {
            filename: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            body: Box::new(StreamReader::new(Box::pin(
                field.map_err(std::io::Error::other),
            ))),
        };

        break state.upload_service.upload(file).await;
    };

    state
        .pages
        .render(&state.config, Some(&Banner::from(outcome)))
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn too_large(limit: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "Request body exceeds the maximum upload size of {} MB",
        limit / 1024 / 1024
    ))
}
