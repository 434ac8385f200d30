use axum::http::StatusCode;
use serde_json::json;

use crate::common::*;

fn recipients(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("member{}@example.com", i)).collect()
}

#[tokio::test]
async fn test_recipients_are_sent_in_batches_of_fifty() {
    let app = spawn_app().await;
    let token = admin_token();
    let (status, body) = app
        .request(
            "POST",
            "/api/admin/send-email",
            Some(&token),
            Some(json!({
                "subject": "New programs",
                "html": "<p>Hello</p>",
                "recipients": recipients(120)
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body, json!({ "sent": 120, "batches": 3 }));

    let state = app.upstream.state();
    let sizes: Vec<usize> = state.email_batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![50, 50, 20]);
    let first = &state.email_batches[0][0];
    assert_eq!(first["from"], "team@fitstore.test");
    assert_eq!(first["to"], json!(["member0@example.com"]));
    assert_eq!(first["subject"], "New programs");
    assert_eq!(first["html"], "<p>Hello</p>");
}

#[tokio::test]
async fn test_default_recipients_are_all_users() {
    let app = spawn_app().await;
    app.upstream.add_user("u-1", "one@example.com", "One");
    app.upstream.add_user("u-2", "two@example.com", "Two");

    let token = admin_token();
    let (status, body) = app
        .request(
            "POST",
            "/api/admin/send-email",
            Some(&token),
            Some(json!({ "subject": "Hi", "html": "<p>Hi</p>" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], 3);
    assert_eq!(body["batches"], 1);

    let state = app.upstream.state();
    let to: Vec<&str> = state.email_batches[0]
        .iter()
        .map(|m| m["to"][0].as_str().unwrap())
        .collect();
    assert_eq!(to, vec![ADMIN_EMAIL, "one@example.com", "two@example.com"]);
}

#[tokio::test]
async fn test_failed_batch_aborts_and_reports_progress() {
    let app = spawn_app().await;
    app.upstream.state().fail_email_call = Some(2);

    let token = admin_token();
    let (status, body) = app
        .request(
            "POST",
            "/api/admin/send-email",
            Some(&token),
            Some(json!({ "subject": "s", "html": "<p>h</p>", "recipients": recipients(120) })),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Failed to send batch 2 of 3 (50 recipients already sent)"
    );

    let state = app.upstream.state();
    assert_eq!(state.email_calls, 2);
    assert_eq!(state.email_batches.len(), 1);
}

#[tokio::test]
async fn test_send_email_validation() {
    let app = spawn_app().await;
    let token = admin_token();

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/send-email",
            Some(&token),
            Some(json!({ "html": "<p>h</p>", "recipients": ["a@example.com"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: subject");

    let (status, _) = app
        .request(
            "POST",
            "/api/admin/send-email",
            Some(&token),
            Some(json!({ "subject": "s", "recipients": ["a@example.com"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.upstream.state().email_calls, 0);
}

#[tokio::test]
async fn test_unconfigured_provider_is_reported() {
    let app = spawn_app_with(|config| config.resend_api_key = None).await;
    let token = admin_token();
    let (status, body) = app
        .request(
            "POST",
            "/api/admin/send-email",
            Some(&token),
            Some(json!({ "subject": "s", "html": "<p>h</p>", "recipients": ["a@example.com"] })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Email sending is not configured");
    assert_eq!(app.upstream.state().email_calls, 0);
}
