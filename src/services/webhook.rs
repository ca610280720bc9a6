use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::middleware::AuthUser;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook URL {0} not configured")]
    NotConfigured(&'static str),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
}

/// Forwards form submissions to n8n, stamping who sent them.
#[derive(Clone)]
pub struct WebhookForwarder {
    http: reqwest::Client,
}

impl WebhookForwarder {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Post the payload as-is, plus a `metadata` block identifying the
    /// submitter. Any 2xx from the workflow engine counts as delivered.
    pub async fn forward(
        &self,
        url: &str,
        mut payload: Map<String, Value>,
        user: &AuthUser,
        source: &str,
    ) -> Result<(), WebhookError> {
        inject_metadata(&mut payload, user, source);

        let response = self.http.post(url).json(&payload).send().await?;
        let status = response.status();
        tracing::debug!("webhook response status: {}", status);

        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("webhook error body: {}", body);
            Err(WebhookError::Upstream {
                status,
                body: truncate(&body, 100),
            })
        }
    }
}

pub fn inject_metadata(payload: &mut Map<String, Value>, user: &AuthUser, source: &str) {
    payload.insert(
        "metadata".to_string(),
        json!({
            "generated_by": user.email,
            "username": user.username.as_deref().unwrap_or("N/A"),
            "roles": user.roles,
            "source": source
        }),
    );
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_user() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "ops@example.com".into(),
            username: None,
            roles: vec!["Logistica".into()],
        }
    }

    #[test]
    fn metadata_is_stamped_without_touching_payload() {
        let mut payload = Map::new();
        payload.insert("material".into(), json!("acero"));

        inject_metadata(&mut payload, &test_user(), "AutoIntelli Web App - Logística");

        assert_eq!(payload["material"], json!("acero"));
        let meta = &payload["metadata"];
        assert_eq!(meta["generated_by"], json!("ops@example.com"));
        assert_eq!(meta["username"], json!("N/A"));
        assert_eq!(meta["roles"], json!(["Logistica"]));
        assert_eq!(meta["source"], json!("AutoIntelli Web App - Logística"));
    }

    #[tokio::test]
    async fn any_2xx_counts_as_delivered() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "material": "acero",
                "metadata": { "generated_by": "ops@example.com" }
            })))
            .with_status(202)
            .create_async()
            .await;

        let forwarder = WebhookForwarder::new(5);
        let mut payload = Map::new();
        payload.insert("material".into(), json!("acero"));

        forwarder
            .forward(
                &format!("{}/hook", server.url()),
                payload,
                &test_user(),
                "AutoIntelli Web App",
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_failure_is_truncated() {
        let mut server = mockito::Server::new_async().await;
        let long_body = "x".repeat(500);
        let _m = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body(long_body)
            .create_async()
            .await;

        let forwarder = WebhookForwarder::new(5);
        let err = forwarder
            .forward(
                &format!("{}/hook", server.url()),
                Map::new(),
                &test_user(),
                "AutoIntelli Web App",
            )
            .await
            .unwrap_err();

        match err {
            WebhookError::Upstream { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body.len(), 100);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
