use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::supabase::{SupabaseError, STATUS_APPROVED, STATUS_PENDING};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserInfo,
    pub expires_in: i64,
}

/// POST /auth/login - Supabase sign-in, profile status check, session token.
///
/// Accounts whose profile is missing get a pending fallback row; only
/// approved accounts receive a token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let session = state
        .supabase
        .sign_in_with_password(&payload.email, &payload.password)
        .await
        .map_err(|err| match err {
            SupabaseError::Api { status, .. } if status.is_client_error() => {
                ApiError::unauthorized("Credenciales de acceso inválidas.")
            }
            other => other.into(),
        })?;
    let user_id = session.user.id;

    let profile = state.supabase.fetch_profile(user_id).await?;
    let (status, roles, username) = match profile {
        Some(p) => (p.status().to_string(), p.roles, p.username),
        None => {
            // Auth user without a profile row: create the fallback and leave
            // them pending
            state.supabase.insert_profile(user_id, &payload.email).await?;
            (STATUS_PENDING.to_string(), Vec::new(), None)
        }
    };

    if status != STATUS_APPROVED {
        if let Err(e) = state.supabase.sign_out(&session.access_token).await {
            tracing::warn!("sign-out after rejected login failed: {}", e);
        }
        let message = if status == STATUS_PENDING {
            "Tu cuenta está pendiente de aprobación por un administrador."
        } else {
            "El acceso a tu cuenta ha sido denegado o cancelado."
        };
        return Err(ApiError::forbidden(message));
    }

    let claims = Claims::new(user_id, payload.email, username, roles);
    let token = generate_jwt(&claims)?;
    let expires_in = claims.expires_in();

    Ok(ApiResponse::success(LoginResponse {
        message: "Inicio de sesión exitoso",
        token,
        user: UserInfo {
            id: user_id,
            email: claims.email,
            username: claims.username,
            roles: claims.roles,
        },
        expires_in,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /auth/register - sign up and park the account pending approval.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<MessageResponse> {
    if payload.password != payload.confirm_password {
        return Err(ApiError::unprocessable_entity("Las contraseñas no coinciden."));
    }

    if !password_meets_policy(&payload.password) {
        return Err(ApiError::unprocessable_entity(
            "La contraseña no cumple con los requisitos de seguridad.",
        ));
    }

    if state.supabase.username_taken(&payload.username).await? {
        return Err(ApiError::conflict("El nombre de usuario ya está en uso."));
    }

    let signup = state
        .supabase
        .sign_up(&payload.email, &payload.password)
        .await
        .map_err(|err| match err {
            SupabaseError::Api { status, message } if status.is_client_error() => {
                ApiError::bad_request(format!("Error en el registro: {}", message))
            }
            other => other.into(),
        })?;

    if let Some(user_id) = signup.user_id() {
        state
            .supabase
            .upsert_profile(user_id, &payload.email, &payload.full_name, &payload.username)
            .await?;
    }

    Ok(ApiResponse::created(MessageResponse {
        message: "Registro exitoso. Tu cuenta está pendiente de aprobación.",
    }))
}

/// GET /auth/whoami - echo of the authenticated session.
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<UserInfo> {
    Ok(ApiResponse::success(UserInfo {
        id: user.user_id,
        email: user.email,
        username: user.username,
        roles: user.roles,
    }))
}

/// POST /auth/logout - sessions are stateless JWTs, so this only acknowledges;
/// the client drops the token.
pub async fn logout(Extension(_user): Extension<AuthUser>) -> ApiResult<MessageResponse> {
    Ok(ApiResponse::success(MessageResponse {
        message: "Sesión cerrada",
    }))
}

/// At least 10 chars with upper, lower, digit and one symbol from the set the
/// registration form advertises.
fn password_meets_policy(password: &str) -> bool {
    const SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";
    password.len() >= 10
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SYMBOLS.contains(c))
}
