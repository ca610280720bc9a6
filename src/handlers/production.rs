use axum::extract::{Query, State};
use axum::Extension;
use serde::Serialize;

use super::ForceQuery;
use crate::catalog::loaders::PlanningRecord;
use crate::catalog::CatalogSnapshot;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::modules::{ModuleTool, PRODUCTION_TOOLS};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: &'static [ModuleTool],
}

/// GET /api/production/tools
pub async fn tools(Extension(user): Extension<AuthUser>) -> ApiResult<ToolsResponse> {
    user.require_module("Produccion", "Producción")?;
    Ok(ApiResponse::success(ToolsResponse {
        tools: PRODUCTION_TOOLS,
    }))
}

/// GET /api/production/planning - the planning board snapshot.
pub async fn planning(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ForceQuery>,
) -> ApiResult<CatalogSnapshot<PlanningRecord>> {
    user.require_module("Produccion", "Producción")?;

    let handle = state
        .catalogs
        .planning
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Credenciales de Notion no configuradas"))?;

    let snapshot = handle.fetch(query.is_forced()).await?;
    Ok(ApiResponse::success(snapshot))
}
