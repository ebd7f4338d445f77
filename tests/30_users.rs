mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{authorized, TestServer};
use marketplace_api::database::Store;

#[tokio::test]
async fn show_renders_user_with_product_ids() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.create_user().await?;
    let first = server.create_product(&user).await?;
    let second = server.create_product(&user).await?;

    let res = server.client.get(server.api(&format!("/users/{}", user.id))).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["user"]["email"], json!(user.email));
    assert_eq!(body["user"]["product_ids"], json!([first.id, second.id]));
    assert!(body["user"].get("auth_token").is_none());
    assert!(body["user"].get("password_digest").is_none());
    Ok(())
}

#[tokio::test]
async fn show_missing_user_is_404() -> Result<()> {
    let server = TestServer::start().await?;
    let res = server.client.get(server.api("/users/42")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?, json!({ "errors": "Couldn't find User" }));
    Ok(())
}

#[tokio::test]
async fn create_signs_up_and_returns_token() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.api("/users"))
        .json(&json!({ "user": {
            "email": "New.Seller@Example.com",
            "password": "12345678",
            "password_confirmation": "12345678"
        }}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["user"]["email"], "new.seller@example.com");
    assert_eq!(body["user"]["product_ids"], json!([]));
    let token = body["user"]["auth_token"].as_str().expect("auth token");

    let stored = server.store.find_user_by_token(token).await?.expect("user");
    assert_eq!(stored.email, "new.seller@example.com");
    assert!(stored.password_digest.starts_with("$2"), "not a bcrypt digest");

    // the stored digest verifies on login
    let res = server
        .client
        .post(server.api("/sessions"))
        .json(&json!({ "session": { "email": "new.seller@example.com", "password": "12345678" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn show_with_non_numeric_id_is_json_bad_request() -> Result<()> {
    let server = TestServer::start().await?;
    let res = server.client.get(server.api("/users/me")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.json::<Value>().await?["errors"].is_string());
    Ok(())
}

#[tokio::test]
async fn create_with_malformed_json_is_json_bad_request() -> Result<()> {
    let server = TestServer::start().await?;
    let res = server
        .client
        .post(server.api("/users"))
        .header("Content-Type", "application/json")
        .body("not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.json::<Value>().await?["errors"].is_string());
    Ok(())
}

#[tokio::test]
async fn create_reports_every_invalid_field() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.api("/users"))
        .json(&json!({ "user": {
            "email": "not-an-email",
            "password": "123",
            "password_confirmation": "456"
        }}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = res.json::<Value>().await?;
    assert!(body["errors"]["email"].as_array().expect("email errors").contains(&json!("is invalid")));
    assert!(body["errors"]["password"].is_array());
    assert!(body["errors"]["password_confirmation"].is_array());
    Ok(())
}

#[tokio::test]
async fn create_with_taken_email_is_unprocessable() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.create_user().await?;

    let res = server
        .client
        .post(server.api("/users"))
        .json(&json!({ "user": { "email": user.email.to_uppercase(), "password": "12345678" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = res.json::<Value>().await?;
    assert_eq!(body["errors"]["email"], json!(["has already been taken"]));
    Ok(())
}

#[tokio::test]
async fn update_changes_own_email() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.create_user().await?;

    let res = authorized(server.client.patch(server.api(&format!("/users/{}", user.id))), &user.auth_token)
        .json(&json!({ "user": { "email": "renamed@example.com" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["user"]["email"], "renamed@example.com");
    assert_eq!(body["user"]["auth_token"], json!(user.auth_token));
    Ok(())
}

#[tokio::test]
async fn update_with_invalid_email_is_unprocessable() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.create_user().await?;

    let res = authorized(server.client.put(server.api(&format!("/users/{}", user.id))), &user.auth_token)
        .json(&json!({ "user": { "email": "bademail.com" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let stored = server.store.find_user(user.id).await?.expect("user");
    assert_eq!(stored.email, user.email);
    Ok(())
}

#[tokio::test]
async fn update_requires_token_and_ownership() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.create_user().await?;
    let other = server.create_user().await?;

    let res = server
        .client
        .patch(server.api(&format!("/users/{}", user.id)))
        .json(&json!({ "user": { "email": "anon@example.com" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = authorized(server.client.patch(server.api(&format!("/users/{}", user.id))), &other.auth_token)
        .json(&json!({ "user": { "email": "hijack@example.com" } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let stored = server.store.find_user(user.id).await?.expect("user");
    assert_eq!(stored.email, user.email);
    Ok(())
}

#[tokio::test]
async fn destroy_removes_user_and_products() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.create_user().await?;
    let product = server.create_product(&user).await?;

    let res = authorized(server.client.delete(server.api(&format!("/users/{}", user.id))), &user.auth_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    assert!(server.store.find_user(user.id).await?.is_none());
    assert!(server.store.find_product(product.id).await?.is_none());

    // the token died with the account
    let res = authorized(server.client.delete(server.api(&format!("/users/{}", user.id))), &user.auth_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
