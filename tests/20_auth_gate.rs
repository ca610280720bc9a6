mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn protected_routes_reject_missing_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in [
        "/auth/whoami",
        "/api/modules",
        "/api/logistics/items",
        "/api/production/planning",
        "/api/admin/users",
    ] {
        let res = client
            .get(format!("{}{}", server.base_url, path))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "path: {}", path);

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["error"], true, "path: {}", path);
        assert_eq!(body["code"], "UNAUTHORIZED", "path: {}", path);
    }
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_garbage_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/modules", server.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_without_supabase_is_unavailable() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": "user@example.com", "password": "secret" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}

#[tokio::test]
async fn register_validates_passwords_before_calling_out() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Mismatched confirmation fails locally even with Supabase unconfigured
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "email": "new@example.com",
            "password": "Abcdef123!x",
            "confirm_password": "Different1!x",
            "full_name": "New User",
            "username": "newuser"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Weak password is rejected by the complexity rule
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "email": "new@example.com",
            "password": "short",
            "confirm_password": "short",
            "full_name": "New User",
            "username": "newuser"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(
        body["message"],
        "La contraseña no cumple con los requisitos de seguridad."
    );
    Ok(())
}
