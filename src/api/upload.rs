//! Upload endpoints
//!
//! - GET /upload (form)
//! - GET /validate/:pass (password check used by the form script)
//! - POST /upload (multipart: `pass`, `file`)

use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State, multipart::MultipartRejection,
        rejection::PathRejection,
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};

use super::client::ClientId;
use super::pages::UPLOAD_HTML;
use crate::AppState;
use crate::auth::Verdict;
use crate::error::AppError;

/// Create upload router
///
/// Routes:
/// - GET /upload
/// - POST /upload
/// - GET /validate
/// - GET /validate/:pass
pub fn upload_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            get(upload_form)
                .post(upload_file)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/validate", get(validate_missing))
        .route("/validate/:pass", get(validate_password))
}

/// GET /upload
async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_HTML)
}

fn verdict_response(verdict: Verdict) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        verdict.as_str(),
    )
        .into_response()
}

/// GET /validate/:pass
///
/// Always 200; the body is `true`, `false` or `blocked`. A segment that
/// does not decode counts as a missing password.
async fn validate_password(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    pass: Result<Path<String>, PathRejection>,
) -> Response {
    let pass = pass.ok().map(|Path(pass)| pass);
    let verdict = state
        .limiter
        .check_password(&client, pass.as_deref(), &state.config.upload.password)
        .await;
    verdict_response(verdict)
}

/// GET /validate
///
/// A check without a password; never costs an attempt.
async fn validate_missing(State(state): State<AppState>, ClientId(client): ClientId) -> Response {
    let verdict = state
        .limiter
        .check_password(&client, None, &state.config.upload.password)
        .await;
    verdict_response(verdict)
}

/// A parsed upload form
#[derive(Debug, Default)]
struct UploadForm {
    pass: Option<String>,
    file_name: Option<String>,
    file_data: Option<Vec<u8>>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::UploadRejected(format!("Failed to parse multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "pass" => {
                form.pass = Some(field.text().await.map_err(|e| {
                    AppError::UploadRejected(format!("Failed to read password: {}", e))
                })?);
            }
            "file" => {
                form.file_name = field.file_name().map(ToOwned::to_owned);

                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::UploadRejected(format!("Failed to read file: {}", e)))?
                {
                    bytes.extend_from_slice(&chunk);
                }
                form.file_data = Some(bytes);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /upload
///
/// Redirects to the public URL of the stored file.
async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, AppError> {
    let multipart = multipart
        .map_err(|e| AppError::UploadRejected(format!("Expected multipart form: {}", e)))?;
    let form = read_upload_form(multipart).await?;

    let pass = form
        .pass
        .filter(|pass| !pass.is_empty())
        .ok_or_else(|| AppError::UploadRejected("No password provided".to_string()))?;
    let (name, data) = match (form.file_name, form.file_data) {
        (Some(name), Some(data)) if !name.is_empty() => (name, data),
        _ => return Err(AppError::UploadRejected("No file provided".to_string())),
    };

    // The form path does not consult the retry limiter.
    if pass != state.config.upload.password {
        return Err(AppError::UploadRejected("Wrong password".to_string()));
    }

    let uploaded = state
        .gateway
        .upload_bytes(&name, data, state.gateway.default_bucket())
        .await
        .map_err(|error| {
            tracing::error!(name = %name, %error, "Upload failed");
            AppError::UploadFailed(error.to_string())
        })?;

    Ok(Redirect::to(&uploaded.url))
}
