use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::modules::available_roles;
use crate::services::supabase::Profile;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub profiles: Vec<Profile>,
    pub available_roles: Vec<&'static str>,
}

/// GET /api/admin/users - every profile, newest first, plus the assignable
/// roles.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserListResponse> {
    user.require_admin()?;

    let profiles = state.supabase.list_profiles().await?;
    Ok(ApiResponse::success(UserListResponse {
        profiles,
        available_roles: available_roles(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateRequest {
    pub user_id: Uuid,
    pub status: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /api/admin/users/update - set a profile's approval status and roles.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UserUpdateRequest>,
) -> ApiResult<MessageResponse> {
    user.require_admin()?;

    state
        .supabase
        .update_profile(payload.user_id, &payload.status, &payload.roles)
        .await?;

    Ok(ApiResponse::success(MessageResponse {
        message: "Usuario actualizado correctamente.",
    }))
}
