// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::catalog::LoadError;
use crate::services::notion::NotionError;
use crate::services::supabase::SupabaseError;
use crate::services::webhook::WebhookError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity
    UnprocessableEntity(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::UnprocessableEntity(_) => 422,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::UnprocessableEntity(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert service error types to ApiError
impl From<SupabaseError> for ApiError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::NotConfigured => {
                ApiError::service_unavailable("Credenciales de Supabase no configuradas")
            }
            SupabaseError::Http(e) => {
                tracing::error!("Supabase request failed: {}", e);
                ApiError::bad_gateway("No se pudo contactar el servicio de autenticación")
            }
            SupabaseError::Api { status, message } => {
                // 4xx from GoTrue/PostgREST usually means bad credentials or input
                if status.is_client_error() {
                    ApiError::unauthorized(message)
                } else {
                    tracing::error!("Supabase API error {}: {}", status, message);
                    ApiError::bad_gateway("Error del servicio de autenticación")
                }
            }
        }
    }
}

impl From<NotionError> for ApiError {
    fn from(err: NotionError) -> Self {
        match err {
            NotionError::NotConfigured => {
                ApiError::service_unavailable("Credenciales de Notion no configuradas")
            }
            NotionError::Http(e) => {
                tracing::error!("Notion request failed: {}", e);
                ApiError::bad_gateway("No se pudo contactar Notion")
            }
            NotionError::Api { status, .. } => {
                tracing::error!("Notion API error: {}", status);
                ApiError::bad_gateway(format!("Error de Notion: {}", status.as_u16()))
            }
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::NotConfigured(var) => ApiError::service_unavailable(format!(
                "URL de Webhook ({}) no configurada en .env",
                var
            )),
            WebhookError::Http(e) => {
                tracing::error!("Webhook request failed: {}", e);
                ApiError::bad_gateway("No se pudo contactar el servidor de destino")
            }
            WebhookError::Upstream { status, body } => ApiError::bad_gateway(format!(
                "Error en el servidor de destino (Status: {}): {}",
                status.as_u16(),
                body
            )),
        }
    }
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotConfigured => {
                ApiError::service_unavailable("Credenciales de Notion no configuradas")
            }
            LoadError::Source(msg) => {
                tracing::error!("Catalog load failed: {}", msg);
                ApiError::bad_gateway("No se pudo sincronizar el catálogo")
            }
            LoadError::AlreadyRefreshing => {
                // Callers normally serve the stale snapshot instead of surfacing this
                ApiError::conflict("Sincronización en curso")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
