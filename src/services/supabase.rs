use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

use crate::config::SupabaseConfig;

pub const STATUS_PENDING: &str = "Pendiente";
pub const STATUS_APPROVED: &str = "Aprobado";

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("Supabase credentials not configured")]
    NotConfigured,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Supabase API error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// Row in the `profiles` table. Approval status and per-module roles live
/// here rather than on the auth user itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "roles_or_empty")]
    pub roles: Vec<String>,
    pub created_at: Option<String>,
}

/// Rows created by the login fallback have a null `roles` column.
fn roles_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Profile {
    /// Profiles created before the approval flow existed have no status.
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or(STATUS_PENDING)
    }
}

#[derive(Debug, Deserialize)]
pub struct SupabaseUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SupabaseSession {
    pub access_token: String,
    pub user: SupabaseUser,
}

/// GoTrue's signup endpoint returns a session when auto-confirm is on and a
/// bare user object otherwise. Cover both shapes.
#[derive(Debug, Deserialize)]
pub struct SignUpResponse {
    pub user: Option<SupabaseUser>,
    pub id: Option<Uuid>,
}

impl SignUpResponse {
    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id).or(self.id)
    }
}

/// Thin REST client over Supabase's GoTrue auth and PostgREST table APIs.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base: Option<Url>,
    key: Option<String>,
}

impl SupabaseClient {
    pub fn from_config(cfg: &SupabaseConfig) -> Self {
        let base = cfg.url.as_deref().and_then(|u| Url::parse(u).ok());
        if cfg.url.is_some() && base.is_none() {
            tracing::warn!("SUPABASE_URL is not a valid URL; auth disabled");
        }
        Self {
            http: reqwest::Client::new(),
            base,
            key: cfg.key.clone(),
        }
    }

    pub fn new(url: &str, key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: Url::parse(url).ok(),
            key: Some(key.to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base.is_some() && self.key.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<(Url, &str), SupabaseError> {
        match (&self.base, &self.key) {
            (Some(base), Some(key)) => {
                let url = base.join(path).map_err(|_| SupabaseError::NotConfigured)?;
                Ok((url, key))
            }
            _ => Err(SupabaseError::NotConfigured),
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SupabaseSession, SupabaseError> {
        let (url, key) = self.endpoint("auth/v1/token")?;
        let response = self
            .http
            .post(url)
            .query(&[("grant_type", "password")])
            .header("apikey", key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        decode_response(response).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, SupabaseError> {
        let (url, key) = self.endpoint("auth/v1/signup")?;
        let response = self
            .http
            .post(url)
            .header("apikey", key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        decode_response(response).await
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let (url, key) = self.endpoint("auth/v1/logout")?;
        let response = self
            .http
            .post(url)
            .header("apikey", key)
            .bearer_auth(access_token)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }

    pub async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, SupabaseError> {
        let (url, key) = self.endpoint("rest/v1/profiles")?;
        let id_filter = format!("eq.{}", id);
        let response = self
            .http
            .get(url)
            .query(&[("select", "*"), ("id", id_filter.as_str())])
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await?;
        let rows: Vec<Profile> = decode_response(response).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool, SupabaseError> {
        let (url, key) = self.endpoint("rest/v1/profiles")?;
        let username_filter = format!("eq.{}", username);
        let response = self
            .http
            .get(url)
            .query(&[("select", "username"), ("username", username_filter.as_str())])
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await?;
        let rows: Vec<Value> = decode_response(response).await?;
        Ok(!rows.is_empty())
    }

    /// Fallback row for auth users that somehow have no profile yet.
    pub async fn insert_profile(&self, id: Uuid, email: &str) -> Result<(), SupabaseError> {
        let (url, key) = self.endpoint("rest/v1/profiles")?;
        let response = self
            .http
            .post(url)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=minimal")
            .json(&json!({ "id": id, "email": email, "status": STATUS_PENDING }))
            .send()
            .await?;
        expect_success(response).await
    }

    pub async fn upsert_profile(
        &self,
        id: Uuid,
        email: &str,
        full_name: &str,
        username: &str,
    ) -> Result<(), SupabaseError> {
        let (url, key) = self.endpoint("rest/v1/profiles")?;
        let response = self
            .http
            .post(url)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&json!({
                "id": id,
                "email": email,
                "status": STATUS_PENDING,
                "full_name": full_name,
                "username": username
            }))
            .send()
            .await?;
        expect_success(response).await
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>, SupabaseError> {
        let (url, key) = self.endpoint("rest/v1/profiles")?;
        let response = self
            .http
            .get(url)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await?;
        decode_response(response).await
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        status: &str,
        roles: &[String],
    ) -> Result<(), SupabaseError> {
        let (url, key) = self.endpoint("rest/v1/profiles")?;
        let id_filter = format!("eq.{}", id);
        let response = self
            .http
            .patch(url)
            .query(&[("id", id_filter.as_str())])
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=minimal")
            .json(&json!({ "status": status, "roles": roles }))
            .send()
            .await?;
        expect_success(response).await
    }
}

async fn decode_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SupabaseError> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(api_error(response).await)
    }
}

async fn expect_success(response: reqwest::Response) -> Result<(), SupabaseError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: reqwest::Response) -> SupabaseError {
    let status = response.status();
    let message = match response.json::<Value>().await {
        Ok(body) => extract_error_message(&body),
        Err(_) => status.to_string(),
    };
    SupabaseError::Api { status, message }
}

/// GoTrue and PostgREST disagree on the error field name.
fn extract_error_message(body: &Value) -> String {
    for field in ["error_description", "msg", "message", "error"] {
        if let Some(text) = body.get(field).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    body.to_string()
}
