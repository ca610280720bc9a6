use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::{Map, Value};

use super::ForceQuery;
use crate::catalog::CatalogSnapshot;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::modules::{ModuleTool, LOGISTICS_TOOLS};
use crate::services::webhook::WebhookError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: &'static [ModuleTool],
}

/// GET /api/logistics/tools
pub async fn tools(Extension(user): Extension<AuthUser>) -> ApiResult<ToolsResponse> {
    user.require_module("Logistica", "Logística")?;
    Ok(ApiResponse::success(ToolsResponse {
        tools: LOGISTICS_TOOLS,
    }))
}

/// GET /api/logistics/items - piece codes for the material-capture form.
pub async fn items(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    Query(query): Query<ForceQuery>,
) -> ApiResult<CatalogSnapshot<String>> {
    let handle = state
        .catalogs
        .logistics_items
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Credenciales de Notion no configuradas"))?;

    let snapshot = handle.fetch(query.is_forced()).await?;
    Ok(ApiResponse::success(snapshot))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /api/logistics/submit - forward the material capture to n8n.
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Map<String, Value>>,
) -> ApiResult<MessageResponse> {
    let url = crate::config::config()
        .webhooks
        .logistics_url
        .clone()
        .ok_or(WebhookError::NotConfigured("LOGISTICA_WEBHOOK_URL"))?;

    state
        .webhooks
        .forward(&url, payload, &user, "AutoIntelli Web App - Logística")
        .await?;

    Ok(ApiResponse::success(MessageResponse {
        message: "Materiales registrados exitosamente",
    }))
}
