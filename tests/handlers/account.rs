use axum::http::StatusCode;
use serde_json::json;

use crate::common::*;

const MEMBER_ID: &str = "11111111-1111-1111-1111-111111111111";
const MEMBER_EMAIL: &str = "member@example.com";

fn purchase(email: &str, package: &str, session: &str) -> serde_json::Value {
    json!({
        "email": email,
        "package_name": package,
        "amount": 2500,
        "currency": "gbp",
        "status": "completed",
        "stripe_session_id": session
    })
}

#[tokio::test]
async fn test_profile_read_and_rename() {
    let app = spawn_app().await;
    app.upstream.add_user(MEMBER_ID, MEMBER_EMAIL, "Member One");
    let token = mint_token(MEMBER_ID, MEMBER_EMAIL);

    let (status, body) = app.request("GET", "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], MEMBER_ID);
    assert_eq!(body["user"]["email"], MEMBER_EMAIL);
    assert_eq!(body["user"]["name"], "Member One");
    assert_eq!(body["user"]["providers"], json!(["email"]));

    let (status, body) = app
        .request(
            "PUT",
            "/api/profile",
            Some(&token),
            Some(json!({ "full_name": "  Member Renamed " })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Member Renamed");

    let (_, body) = app.request("GET", "/api/profile", Some(&token), None).await;
    assert_eq!(body["user"]["name"], "Member Renamed");
}

#[tokio::test]
async fn test_profile_rename_requires_full_name() {
    let app = spawn_app().await;
    app.upstream.add_user(MEMBER_ID, MEMBER_EMAIL, "Member One");
    let token = mint_token(MEMBER_ID, MEMBER_EMAIL);

    let (status, body) = app
        .request("PUT", "/api/profile", Some(&token), Some(json!({ "full_name": " " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: full_name");
}

#[tokio::test]
async fn test_purchases_are_matched_by_email() {
    let app = spawn_app().await;
    app.upstream
        .insert_row("purchases", purchase(MEMBER_EMAIL, "Lean Bulk", "cs_1"));
    app.upstream
        .insert_row("purchases", purchase(MEMBER_EMAIL, "Cut", "cs_2"));
    app.upstream
        .insert_row("purchases", purchase("someone@example.com", "Cut", "cs_3"));

    let token = mint_token(MEMBER_ID, "Member@Example.com");
    let (status, body) = app.request("GET", "/api/purchases", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let purchases = body["purchases"].as_array().unwrap();
    assert_eq!(purchases.len(), 2);
    // newest first
    assert_eq!(purchases[0]["package_name"], "Cut");
    assert_eq!(purchases[1]["package_name"], "Lean Bulk");

    let admin = admin_token();
    let (status, body) = app
        .request("GET", "/api/admin/purchases", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchases"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_suggestions_attach_caller_when_signed_in() {
    let app = spawn_app().await;

    let (status, body) = app
        .request(
            "POST",
            "/api/suggestions",
            None,
            Some(json!({ "package_id": "pkg-1", "content": "More mobility work" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestion"]["package_id"], "pkg-1");
    assert!(body["suggestion"]["user_id"].is_null());

    let token = mint_token(MEMBER_ID, MEMBER_EMAIL);
    let (status, body) = app
        .request(
            "POST",
            "/api/suggestions",
            Some(&token),
            Some(json!({ "package_id": "pkg-1", "content": "Add a deload week" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestion"]["user_id"], MEMBER_ID);

    let (status, body) = app
        .request(
            "POST",
            "/api/suggestions",
            None,
            Some(json!({ "package_id": "pkg-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: content");

    let admin = admin_token();
    let (status, body) = app
        .request("GET", "/api/admin/suggestions", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0]["content"], "Add a deload week");
}

#[tokio::test]
async fn test_admin_lists_users() {
    let app = spawn_app().await;
    app.upstream.add_user(MEMBER_ID, MEMBER_EMAIL, "Member One");

    let admin = admin_token();
    let (status, body) = app.request("GET", "/api/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1]["email"], MEMBER_EMAIL);
    assert_eq!(users[1]["name"], "Member One");
    assert_eq!(users[1]["last_sign_in_at"], "2024-06-01T12:00:00Z");
}
