//! File serving endpoints
//!
//! - GET /
//! - GET /trans, /trans/:bucket/:id
//! - GET /public/:file

use axum::{
    Router,
    extract::{Path, Query, State, rejection::PathRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::service::content_type_for;

/// Values of `?dl=` that force a download
const TRUTHY_FLAGS: [&str; 6] = ["true", "1", "yes", "y", "t", "on"];

/// Create file router
///
/// Routes:
/// - GET /
/// - GET /trans
/// - GET /trans/:bucket/:id
/// - GET /public/:file
pub fn files_router() -> Router<AppState> {
    Router::new()
        .route("/", get(hello))
        .route("/trans", get(trans_index))
        .route("/trans/:bucket/:id", get(trans_page))
        .route("/public/:file", get(public_file))
}

/// Whether a query flag value asks for a download
pub fn is_truthy(flag: &str) -> bool {
    TRUTHY_FLAGS.contains(&flag)
}

/// Append `.html` unless the id already ends with it
pub fn ensure_html_suffix(id: &str) -> String {
    if id.ends_with(".html") {
        id.to_string()
    } else {
        format!("{id}.html")
    }
}

/// `Content-Disposition` value forcing a download of `file_name`
///
/// Plain ASCII names are quoted; anything else uses the RFC 5987
/// `filename*` form, which is always ASCII.
fn attachment_disposition(file_name: &str) -> HeaderValue {
    let value = if file_name.is_ascii() && !file_name.chars().any(|c| c.is_ascii_control()) {
        let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
        format!("attachment; filename=\"{escaped}\"")
    } else {
        format!("attachment; filename*=UTF-8''{}", urlencoding::encode(file_name))
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// GET /
async fn hello() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "hello": "world" }))
}

/// GET /trans
async fn trans_index() -> AppError {
    AppError::MissingParameter("bucket")
}

#[derive(Debug, Deserialize)]
struct TransParams {
    bucket: String,
    id: String,
}

/// GET /trans/:bucket/:id
///
/// Serves `<id>.html` from an arbitrary bucket as HTML.
async fn trans_page(
    State(state): State<AppState>,
    params: Result<Path<TransParams>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(params) = params.map_err(|_| AppError::MissingParameter("id"))?;
    if params.bucket.is_empty() {
        return Err(AppError::MissingParameter("bucket"));
    }
    if params.id.is_empty() {
        return Err(AppError::MissingParameter("id"));
    }

    let name = ensure_html_suffix(&params.id);
    tracing::debug!(bucket = %params.bucket, name = %name, "Serving translated page");

    let data = state
        .gateway
        .get_bytes(&name, Some(&params.bucket))
        .await
        .ok_or(AppError::ObjectUnavailable)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        data,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct PublicQuery {
    dl: Option<String>,
}

/// GET /public/:file
///
/// Query: ?dl=true forces a download
async fn public_file(
    State(state): State<AppState>,
    file: Result<Path<String>, PathRejection>,
    query: Option<Query<PublicQuery>>,
) -> Result<Response, AppError> {
    let Path(file_name) = file.map_err(|_| AppError::MissingParameter("file"))?;
    if file_name.is_empty() {
        return Err(AppError::MissingParameter("file"));
    }

    let data = state
        .gateway
        .get_bytes(&file_name, None)
        .await
        .ok_or(AppError::ObjectUnavailable)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&file_name)),
    );

    let download = query
        .and_then(|Query(query)| query.dl)
        .is_some_and(|flag| is_truthy(&flag));
    if download {
        headers.insert(header::CONTENT_DISPOSITION, attachment_disposition(&file_name));
    }

    Ok((StatusCode::OK, headers, data).into_response())
}
