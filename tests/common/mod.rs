//! Shared test harness.
//!
//! `FakeUpstream` is an axum server on a random local port standing in for
//! every collaborator the service talks to: PostgREST rows, GoTrue auth,
//! Storage, Stripe and Resend. Tables are plain JSON rows behind a mutex.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Form, Json, Router,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use jwt_simple::prelude::{Claims, Duration as JwtDuration, HS256Key, MACLike};
use serde_json::{Value, json};
use sha2::Sha256;
use tower::ServiceExt;

use fitstore::config::Config;
use fitstore::db::AppState;
use fitstore::handlers;
use fitstore::payments::StripeConfig;
use fitstore::supabase::{SessionClaims, SupabaseConfig};

pub const JWT_SECRET: &str = "test-jwt-secret-with-enough-entropy";
pub const ANON_KEY: &str = "anon-test-key";
pub const SERVICE_KEY: &str = "service-role-test-key";
pub const WEBHOOK_SECRET: &str = "whsec_test123secret456";
pub const ADMIN_EMAIL: &str = "coach@fitstore.test";
pub const ADMIN_ID: &str = "00000000-0000-0000-0000-0000000000ad";
pub const GOOD_AUTH_CODE: &str = "good-auth-code";
pub const BUCKET: &str = "package-images";

type Shared = Arc<Mutex<FakeState>>;

#[derive(Default)]
pub struct FakeState {
    pub tables: HashMap<String, Vec<Value>>,
    pub users: Vec<Value>,
    pub sessions: HashMap<String, Value>,
    pub line_items: HashMap<String, Vec<Value>>,
    pub checkout_forms: Vec<HashMap<String, String>>,
    pub email_batches: Vec<Vec<Value>>,
    pub email_calls: usize,
    /// 1-based provider call that answers 500
    pub fail_email_call: Option<usize>,
    pub uploads: Vec<(String, String, usize)>,
    pub deleted_objects: Vec<String>,
    pub code_verifiers: Vec<String>,
    /// (table, column, value): single-row inserts matching this are refused
    pub reject_inserts: Vec<(String, String, String)>,
    pub rest_writes: usize,
    seq: i64,
}

#[derive(Clone)]
pub struct FakeUpstream {
    pub base_url: String,
    state: Shared,
}

impl FakeUpstream {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn writes(&self) -> usize {
        self.state().rest_writes
    }

    /// Seed a row without counting it as a service write.
    pub fn insert_row(&self, table: &str, row: Value) -> Value {
        let mut state = self.state();
        let row = stamp(&mut state, row);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    pub fn add_user(&self, id: &str, email: &str, full_name: &str) {
        self.state().users.push(json!({
            "id": id,
            "email": email,
            "user_metadata": { "full_name": full_name },
            "app_metadata": { "provider": "email", "providers": ["email"] },
            "created_at": "2024-01-01T00:00:00Z",
            "last_sign_in_at": "2024-06-01T12:00:00Z",
        }));
    }

    pub fn add_session(&self, session: Value) {
        let id = session["id"].as_str().unwrap().to_string();
        self.state().sessions.insert(id, session);
    }

    pub fn add_line_items(&self, session_id: &str, items: Vec<Value>) {
        self.state()
            .line_items
            .insert(session_id.to_string(), items);
    }
}

fn stamp(state: &mut FakeState, mut row: Value) -> Value {
    state.seq += 1;
    let created = Utc::now() + chrono::Duration::milliseconds(state.seq);
    if let Some(obj) = row.as_object_mut() {
        obj.entry("id")
            .or_insert_with(|| json!(uuid::Uuid::new_v4().to_string()));
        obj.entry("created_at")
            .or_insert_with(|| json!(created.to_rfc3339_opts(SecondsFormat::Micros, true)));
    }
    row
}

// ============ PostgREST ============

fn cell(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

fn row_matches(row: &Value, params: &[(String, String)]) -> bool {
    params
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "select" | "order" | "limit"))
        .all(|(column, expr)| {
            let actual = cell(row.get(column));
            if let Some(v) = expr.strip_prefix("eq.") {
                actual == v
            } else if let Some(list) = expr.strip_prefix("in.(").and_then(|l| l.strip_suffix(')')) {
                list.split(',').any(|v| v == actual)
            } else {
                false
            }
        })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => cell(a).cmp(&cell(b)),
    }
}

fn apply_query(rows: Vec<Value>, params: &[(String, String)]) -> Vec<Value> {
    let mut rows: Vec<Value> = rows.into_iter().filter(|r| row_matches(r, params)).collect();
    if let Some((_, order)) = params.iter().find(|(k, _)| k == "order") {
        let (column, dir) = order.rsplit_once('.').unwrap_or((order.as_str(), "asc"));
        rows.sort_by(|a, b| compare(a.get(column), b.get(column)));
        if dir == "desc" {
            rows.reverse();
        }
    }
    if let Some(limit) = params
        .iter()
        .find(|(k, _)| k == "limit")
        .and_then(|(_, v)| v.parse::<usize>().ok())
    {
        rows.truncate(limit);
    }
    rows
}

async fn rest_select(
    State(shared): State<Shared>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<Value>> {
    let state = shared.lock().unwrap();
    let rows = state.tables.get(&table).cloned().unwrap_or_default();
    Json(apply_query(rows, &params))
}

async fn rest_insert(
    State(shared): State<Shared>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut guard = shared.lock().unwrap();
    let state = &mut *guard;
    let rows = match body {
        Value::Array(rows) => rows,
        other => vec![other],
    };

    let rejected = rows.len() == 1
        && state
            .reject_inserts
            .iter()
            .any(|(t, col, val)| *t == table && cell(rows[0].get(col)) == *val);
    if rejected {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "insert rejected" })),
        )
            .into_response();
    }

    state.rest_writes += 1;
    let mut stored = Vec::new();
    for row in rows {
        let row = stamp(state, row);
        state
            .tables
            .entry(table.clone())
            .or_default()
            .push(row.clone());
        stored.push(row);
    }
    (StatusCode::CREATED, Json(stored)).into_response()
}

async fn rest_update(
    State(shared): State<Shared>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    Json(patch): Json<Value>,
) -> Json<Vec<Value>> {
    let mut guard = shared.lock().unwrap();
    let state = &mut *guard;
    state.rest_writes += 1;
    let mut updated = Vec::new();
    for row in state.tables.entry(table).or_default().iter_mut() {
        if !row_matches(row, &params) {
            continue;
        }
        if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        updated.push(row.clone());
    }
    Json(updated)
}

async fn rest_delete(
    State(shared): State<Shared>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<Value>> {
    let mut guard = shared.lock().unwrap();
    let state = &mut *guard;
    state.rest_writes += 1;
    let rows = state.tables.entry(table).or_default();
    let (removed, kept): (Vec<Value>, Vec<Value>) =
        rows.drain(..).partition(|r| row_matches(r, &params));
    *rows = kept;
    Json(removed)
}

// ============ GoTrue ============

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn user_for_token(state: &FakeState, headers: &HeaderMap) -> Option<usize> {
    let token = bearer(headers)?;
    let key = HS256Key::from_bytes(JWT_SECRET.as_bytes());
    let claims = key.verify_token::<SessionClaims>(&token, None).ok()?;
    let subject = claims.subject?;
    state
        .users
        .iter()
        .position(|u| u["id"].as_str() == Some(subject.as_str()))
}

async fn auth_get_user(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.lock().unwrap();
    match user_for_token(&state, &headers) {
        Some(i) => Json(state.users[i].clone()).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn auth_update_user(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = shared.lock().unwrap();
    let Some(i) = user_for_token(&state, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if let (Some(meta), Some(data)) = (
        state.users[i]["user_metadata"].as_object_mut(),
        body["data"].as_object(),
    ) {
        for (k, v) in data {
            meta.insert(k.clone(), v.clone());
        }
    }
    Json(state.users[i].clone()).into_response()
}

async fn auth_list_users(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, usize>>,
) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(SERVICE_KEY) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let state = shared.lock().unwrap();
    let page = params.get("page").copied().unwrap_or(1).max(1);
    let per_page = params.get("per_page").copied().unwrap_or(50);
    let users: Vec<Value> = state
        .users
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Json(json!({ "users": users })).into_response()
}

async fn auth_token(State(shared): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = shared.lock().unwrap();
    state
        .code_verifiers
        .push(body["code_verifier"].as_str().unwrap_or_default().to_string());
    if body["auth_code"].as_str() != Some(GOOD_AUTH_CODE) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }
    let user = state.users.first().cloned().unwrap_or(Value::Null);
    let id = user["id"].as_str().unwrap_or("u-callback");
    let email = user["email"].as_str().unwrap_or("callback@example.com");
    Json(json!({
        "access_token": mint_token(id, email),
        "refresh_token": "refresh-token-abc",
        "expires_in": 3600,
        "user": user,
    }))
    .into_response()
}

// ============ Storage ============

async fn storage_upload(
    State(shared): State<Shared>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if bucket != BUCKET {
        return StatusCode::NOT_FOUND.into_response();
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    shared
        .lock()
        .unwrap()
        .uploads
        .push((path.clone(), content_type, body.len()));
    Json(json!({ "Key": format!("{}/{}", bucket, path) })).into_response()
}

async fn storage_delete(State(shared): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let prefixes: Vec<String> = body["prefixes"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    shared
        .lock()
        .unwrap()
        .deleted_objects
        .extend(prefixes.iter().cloned());
    Json(json!(prefixes.iter().map(|p| json!({ "name": p })).collect::<Vec<_>>()))
}

// ============ Stripe ============

async fn stripe_create_session(
    State(shared): State<Shared>,
    Form(form): Form<Vec<(String, String)>>,
) -> Response {
    let form: HashMap<String, String> = form.into_iter().collect();
    let negative = form
        .iter()
        .filter(|(k, _)| k.ends_with("[unit_amount]"))
        .any(|(_, v)| v.parse::<i64>().map(|n| n < 0).unwrap_or(true));
    if negative {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "message": "Invalid unit_amount" } })),
        )
            .into_response();
    }

    let mut state = shared.lock().unwrap();
    state.checkout_forms.push(form);
    let id = format!("cs_test_{}", state.checkout_forms.len());
    let session = json!({
        "id": id,
        "payment_status": "unpaid",
        "url": format!("https://checkout.stripe.test/c/pay/{}", id),
    });
    state.sessions.insert(id, session.clone());
    Json(session).into_response()
}

async fn stripe_get_session(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    match shared.lock().unwrap().sessions.get(&id) {
        Some(session) => Json(session.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "message": "No such checkout session" } })),
        )
            .into_response(),
    }
}

async fn stripe_line_items(State(shared): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    let items = shared
        .lock()
        .unwrap()
        .line_items
        .get(&id)
        .cloned()
        .unwrap_or_default();
    Json(json!({ "object": "list", "data": items, "has_more": false }))
}

// ============ Resend ============

async fn resend_batch(State(shared): State<Shared>, Json(messages): Json<Vec<Value>>) -> Response {
    let mut state = shared.lock().unwrap();
    state.email_calls += 1;
    if state.fail_email_call == Some(state.email_calls) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "provider unavailable" })),
        )
            .into_response();
    }
    let ids: Vec<Value> = messages
        .iter()
        .map(|_| json!({ "id": uuid::Uuid::new_v4().to_string() }))
        .collect();
    state.email_batches.push(messages);
    Json(json!({ "data": ids })).into_response()
}

pub async fn spawn_upstream() -> FakeUpstream {
    let shared: Shared = Arc::new(Mutex::new(FakeState::default()));
    let router = Router::new()
        .route(
            "/rest/v1/{table}",
            get(rest_select)
                .post(rest_insert)
                .patch(rest_update)
                .delete(rest_delete),
        )
        .route("/auth/v1/user", get(auth_get_user).put(auth_update_user))
        .route("/auth/v1/admin/users", get(auth_list_users))
        .route("/auth/v1/token", post(auth_token))
        .route("/storage/v1/object/{bucket}/{*path}", post(storage_upload))
        .route("/storage/v1/object/{bucket}", axum::routing::delete(storage_delete))
        .route("/v1/checkout/sessions", post(stripe_create_session))
        .route("/v1/checkout/sessions/{id}", get(stripe_get_session))
        .route("/v1/checkout/sessions/{id}/line_items", get(stripe_line_items))
        .route("/emails/batch", post(resend_batch))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    FakeUpstream {
        base_url: format!("http://{}", addr),
        state: shared,
    }
}

// ============ Service under test ============

pub fn test_config(upstream_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        base_url: "http://shop.test".to_string(),
        production: false,
        supabase: SupabaseConfig {
            url: upstream_url.to_string(),
            anon_key: ANON_KEY.to_string(),
            service_role_key: SERVICE_KEY.to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            storage_bucket: BUCKET.to_string(),
        },
        stripe: StripeConfig {
            secret_key: "sk_test_xxx".to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            api_base: upstream_url.to_string(),
        },
        resend_api_key: Some("re_test_key".to_string()),
        resend_api_base: upstream_url.to_string(),
        email_from: "team@fitstore.test".to_string(),
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        default_currency: "gbp".to_string(),
        static_dir: None,
        log_json: false,
    }
}

pub struct TestApp {
    pub upstream: FakeUpstream,
    pub state: AppState,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let upstream = spawn_upstream().await;
    let mut config = test_config(&upstream.base_url);
    configure(&mut config);
    upstream.add_user(ADMIN_ID, ADMIN_EMAIL, "Head Coach");
    TestApp {
        upstream,
        state: AppState::new(config),
    }
}

impl TestApp {
    pub fn router(&self) -> Router {
        handlers::app(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router().oneshot(request).await.unwrap()
    }

    /// JSON request with an optional bearer token; returns status and parsed body.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

// ============ Credentials ============

fn token_with_key(key: &HS256Key, user_id: &str, email: &str) -> String {
    let claims = Claims::with_custom_claims(
        SessionClaims {
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
        },
        JwtDuration::from_hours(1),
    )
    .with_subject(user_id);
    key.authenticate(claims).unwrap()
}

pub fn mint_token(user_id: &str, email: &str) -> String {
    token_with_key(&HS256Key::from_bytes(JWT_SECRET.as_bytes()), user_id, email)
}

/// Well-formed token signed with the wrong secret.
pub fn forged_token(user_id: &str, email: &str) -> String {
    token_with_key(&HS256Key::from_bytes(b"some-other-secret"), user_id, email)
}

pub fn admin_token() -> String {
    mint_token(ADMIN_ID, ADMIN_EMAIL)
}

/// `stripe-signature` header value for `payload` signed now.
pub fn stripe_signature(payload: &[u8], secret: &str) -> String {
    let timestamp = Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
