mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

async fn signed_up_token(server: &TestServer, email: &str) -> Result<String> {
    server
        .post("/sign_up", json!({"name": "Niaj", "email": email, "password": "pw"}))
        .await?;
    let (status, body) = server
        .post("/sign_in", json!({"email": email, "password": "pw"}))
        .await?;
    anyhow::ensure!(status == StatusCode::OK, "sign in failed: {}", body);
    Ok(body["data"]["token"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn bearer_token_reaches_protected_endpoint() -> Result<()> {
    let server = TestServer::spawn_jwt().await?;
    let token = signed_up_token(&server, "niaj@example.com").await?;

    let res = server
        .client
        .get(format!("{}/get_user_info", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["email"], "niaj@example.com");
    Ok(())
}

#[tokio::test]
async fn identity_header_is_ignored_in_jwt_mode() -> Result<()> {
    let server = TestServer::spawn_jwt().await?;
    let user = server.seed(authgate::types::Role::Admin, false).await;

    let (status, body) = server.get_as(&user, "/get_user_info").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    Ok(())
}

#[tokio::test]
async fn tampered_token_is_forbidden() -> Result<()> {
    let server = TestServer::spawn_jwt().await?;
    let mut token = signed_up_token(&server, "olivia@example.com").await?;
    token.push('x');

    let res = server
        .client
        .get(format!("{}/get_user_info", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn default_token_cannot_reach_admin_endpoints() -> Result<()> {
    let server = TestServer::spawn_jwt().await?;
    let token = signed_up_token(&server, "peggy@example.com").await?;

    let res = server
        .client
        .post(format!("{}/admin/block_user", server.base_url))
        .bearer_auth(&token)
        .json(&json!({"user_id": uuid::Uuid::new_v4().to_string(), "block": true}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
