use axum::Extension;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::modules::{allowed_modules, SystemModule};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub modules: Vec<SystemModule>,
    pub roles: Vec<String>,
}

/// GET /api/modules - the navigation entries the caller's roles allow.
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<DashboardResponse> {
    let modules = allowed_modules(&user.roles);
    Ok(ApiResponse::success(DashboardResponse {
        modules,
        roles: user.roles,
    }))
}
