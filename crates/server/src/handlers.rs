//! Request handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Multipart, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use rangedrop_protocol::constants::{BEARER, CHUNK_FIELD, OCTET_STREAM, RANGE_UNIT};
use rangedrop_protocol::{
    ByteRangeSpec, ChunkResponse, ContentRange, InitUploadResponse, TokenResponse, UploadSession,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Form(form) = form.map_err(|e| ApiError::BadRequest(format!("invalid login form: {e}")))?;
    let issued = state.issuer.login(&form.username, &form.password)?;
    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: BEARER.to_string(),
        expires_in: issued.expires_in,
    }))
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// Query string of `POST /init_upload`. Parsed by hand so missing or
/// non-numeric values produce a JSON error body.
#[derive(Debug, Deserialize)]
pub struct InitParams {
    pub file_id: Option<String>,
    pub total_size: Option<String>,
}

/// `POST /init_upload?file_id=&total_size=`
pub async fn init_upload(
    State(state): State<AppState>,
    Query(params): Query<InitParams>,
) -> ApiResult<Json<InitUploadResponse>> {
    let file_id = params
        .file_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("file_id is required".into()))?;
    let total_size = params
        .total_size
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("total_size is required".into()))?
        .trim()
        .parse::<u64>()
        .map_err(|_| ApiError::BadRequest("total_size must be a positive integer".into()))?;

    let metadata = state.manager.init(&file_id, total_size).await?;

    Ok(Json(InitUploadResponse {
        message: "Upload initialized successfully".into(),
        file_id,
        chunk_size: state.config.chunk_size,
        metadata,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChunkParams {
    pub file_id: Option<String>,
}

/// `POST /upload_chunk?file_id=` with a `Content-Range` header and a
/// multipart `chunk` field.
pub async fn upload_chunk(
    State(state): State<AppState>,
    Query(params): Query<ChunkParams>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ChunkResponse>> {
    let file_id = params
        .file_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("file_id is required".into()))?;

    let range: ContentRange = headers
        .get(header::CONTENT_RANGE)
        .ok_or_else(|| ApiError::BadRequest("Content-Range header is required".into()))?
        .to_str()
        .map_err(|_| ApiError::BadRequest("invalid Content-Range header".into()))?
        .parse()?;

    let mut multipart =
        multipart.map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?;

    let mut payload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some(CHUNK_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read chunk: {e}")))?;
            payload = Some(data);
            break;
        }
    }
    let payload =
        payload.ok_or_else(|| ApiError::BadRequest(format!("missing `{CHUNK_FIELD}` field")))?;

    let ack = state.manager.upload_chunk(&file_id, range, payload).await?;

    let message = if ack.replayed {
        "chunk already processed"
    } else {
        "chunk uploaded successfully"
    };
    Ok(Json(ChunkResponse {
        message: message.into(),
        receipt: ack.receipt,
    }))
}

/// `GET /status/{file_id}`
pub async fn status(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<Json<UploadSession>> {
    Ok(Json(state.manager.status(&file_id).await?))
}

/// `GET /download/{file_id}` honoring an optional single `Range`.
pub async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let spec = headers
        .get(header::RANGE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ApiError::BadRequest("invalid Range header".into()))?
                .parse::<ByteRangeSpec>()
                .map_err(ApiError::from)
        })
        .transpose()?;

    let download = state.manager.download(&file_id, spec).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static(RANGE_UNIT));
    response_headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(&format!("attachment; filename={file_id}"))?,
    );
    response_headers.insert(
        header::CONTENT_LENGTH,
        header_value(&download.content_length().to_string())?,
    );

    let status = match download.content_range() {
        Some(content_range) => {
            response_headers.insert(header::CONTENT_RANGE, header_value(&content_range)?);
            tracing::debug!(file_id = %file_id, range = %content_range, "serving partial download");
            StatusCode::PARTIAL_CONTENT
        }
        None => {
            tracing::debug!(file_id = %file_id, size = download.file_size, "serving full download");
            StatusCode::OK
        }
    };

    let body = Body::from_stream(ReaderStream::new(download.into_reader()));
    Ok((status, response_headers, body).into_response())
}

fn header_value(value: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| ApiError::Internal("failed to build header".into()))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
