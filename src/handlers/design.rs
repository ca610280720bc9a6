use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::{Map, Value};

use super::ForceQuery;
use crate::catalog::CatalogSnapshot;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::modules::{ModuleTool, DESIGN_TOOLS};
use crate::services::webhook::WebhookError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: &'static [ModuleTool],
}

/// GET /api/design/tools
pub async fn tools(Extension(user): Extension<AuthUser>) -> ApiResult<ToolsResponse> {
    user.require_module("Diseño", "Diseño")?;
    Ok(ApiResponse::success(ToolsResponse {
        tools: DESIGN_TOOLS,
    }))
}

/// GET /api/design/accessories - accessory names for the capture form.
pub async fn accessories(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    Query(query): Query<ForceQuery>,
) -> ApiResult<CatalogSnapshot<String>> {
    let handle = state
        .catalogs
        .design_accessories
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Credenciales de Notion no configuradas"))?;

    let snapshot = handle.fetch(query.is_forced()).await?;
    Ok(ApiResponse::success(snapshot))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /api/design/submit - forward the accessories request, falling back to
/// the general webhook when the design-specific one is unset.
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Map<String, Value>>,
) -> ApiResult<MessageResponse> {
    let webhooks = &crate::config::config().webhooks;
    let url = webhooks
        .design_url
        .clone()
        .or_else(|| webhooks.general_url.clone())
        .ok_or(WebhookError::NotConfigured("N8N_WEBHOOK_URL_DISENO"))?;

    state
        .webhooks
        .forward(&url, payload, &user, "AutoIntelli Design Module")
        .await?;

    Ok(ApiResponse::success(MessageResponse {
        message: "Solicitud enviada exitosamente",
    }))
}
