use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{ClassesResponse, ConfigResponse, DetectResponse, OkResponse};
use crate::domain::errors::{DomainError, DomainResult};

/// Name of the multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "file";

/// Pulls the first `file` part out of the form: (original filename, bytes).
pub async fn read_upload(mut multipart: Multipart) -> DomainResult<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_err("malformed upload", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(String::from)
            .ok_or_else(|| DomainError::InvalidInput("upload has no file name".into()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| upload_err("reading upload", e))?;
        return Ok((filename, data));
    }
    Err(DomainError::InvalidInput(format!("missing `{UPLOAD_FIELD}` field")))
}

/// A body over `DefaultBodyLimit` surfaces here as a multipart error with status 413.
fn upload_err(context: &str, e: MultipartError) -> DomainError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DomainError::PayloadTooLarge(format!("{context}: {e}"))
    } else {
        DomainError::InvalidInput(format!("{context}: {e}"))
    }
}

pub async fn detect(State(st): State<HttpState>, multipart: Multipart) -> Result<Json<DetectResponse>, ApiError> {
    let (filename, data) = read_upload(multipart).await?;
    let report = st.detection.detect_upload(&filename, &data).await?;
    Ok(Json(DetectResponse::from(&report)))
}

pub async fn list_classes(State(st): State<HttpState>) -> impl IntoResponse {
    Json(ClassesResponse { classes: st.catalog.classes().to_vec() })
}

pub async fn get_config(State(st): State<HttpState>) -> impl IntoResponse {
    let infer = st.catalog.inference();
    Json(ConfigResponse {
        model_path: infer.model.onnx_path.clone(),
        label_count: st.catalog.label_count(),
        params: infer.params.clone(),
    })
}

pub async fn health(State(st): State<HttpState>) -> Result<Json<OkResponse>, ApiError> {
    st.catalog.check_model().await?;
    Ok(Json(OkResponse { ok: true }))
}
