// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly detail payloads
///
/// Responses always carry a `detail` field. For most variants it is a plain
/// string; `FieldConflict` carries a structured payload the dashboard forms
/// use to attach the message to a specific input.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    // 400 Bad Request (an outbound fetch against a caller-supplied origin failed)
    UpstreamFetch(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict on a named form field
    FieldConflict { loc: &'static str, message: String },

    // 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamFetch(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::FieldConflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the `detail` payload for the response body
    pub fn detail(&self) -> Value {
        match self {
            ApiError::FieldConflict { loc, message } => json!({
                "type": "FormFieldError",
                "loc": loc,
                "message": message,
            }),
            ApiError::BadRequest(msg)
            | ApiError::UpstreamFetch(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => Value::String(msg.clone()),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn upstream_fetch(message: impl Into<String>) -> Self {
        ApiError::UpstreamFetch(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn field_conflict(loc: &'static str, message: impl Into<String>) -> Self {
        ApiError::FieldConflict {
            loc,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::registry::RegistryError> for ApiError {
    fn from(err: crate::registry::RegistryError) -> Self {
        use crate::registry::RegistryError;
        match err {
            RegistryError::DatasetExists(_) => {
                ApiError::field_conflict("name", "A dataset with this name already exists")
            }
            RegistryError::InvalidDatasetName(name) => {
                ApiError::bad_request(format!("Invalid dataset name: '{}'", name))
            }
            RegistryError::DatasetNotFound(uid) => {
                ApiError::not_found(format!("Dataset with UID '{}' not found", uid))
            }
            RegistryError::JobNotFound(uid) => {
                ApiError::not_found(format!("Job with UID '{}' not found", uid))
            }
            RegistryError::Metadata { path, source } => {
                tracing::error!("Unreadable metadata at {}: {}", path.display(), source);
                ApiError::internal(format!("Invalid metadata file: {}", path.display()))
            }
            RegistryError::Io(e) => {
                tracing::error!("Registry I/O error: {}", e);
                ApiError::internal(format!("Registry I/O error: {}", e))
            }
        }
    }
}

impl From<crate::preview::PreviewError> for ApiError {
    fn from(err: crate::preview::PreviewError) -> Self {
        tracing::error!("File preview failed: {}", err);
        ApiError::internal(err.to_string())
    }
}

impl From<crate::staging::StagingError> for ApiError {
    fn from(err: crate::staging::StagingError) -> Self {
        use crate::staging::StagingError;
        match err {
            StagingError::NoFiles => ApiError::bad_request("No dataset files provided"),
            StagingError::MockFetch(e) => {
                ApiError::upstream_fetch(format!("Failed to download mock dataset: {}", e))
            }
            StagingError::Io(e) => {
                tracing::error!("Upload staging I/O error: {}", e);
                ApiError::internal(format!("Failed to stage uploaded files: {}", e))
            }
        }
    }
}

impl From<crate::sources::SourceStoreError> for ApiError {
    fn from(err: crate::sources::SourceStoreError) -> Self {
        tracing::error!("Dataset source registry error: {}", err);
        ApiError::internal(err.to_string())
    }
}

impl From<crate::trust::TrustStoreError> for ApiError {
    fn from(err: crate::trust::TrustStoreError) -> Self {
        tracing::error!("Trusted datasites store error: {}", err);
        ApiError::internal(err.to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::FieldConflict { loc, message } => write!(f, "{}: {}", loc, message),
            ApiError::BadRequest(msg)
            | ApiError::UpstreamFetch(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
