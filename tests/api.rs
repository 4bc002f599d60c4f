use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use maranatha_rs::{
    auth::credentials::{AdminUser, CredentialProvider, Role, StaticCredentials},
    entities::sea_orm_active_enums::Gender,
    qr::QrPayload,
    router::{AppState, create_router},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{SqlxSqliteConnector, sqlx::sqlite::SqlitePoolOptions};
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

const ADMIN: (&str, &str) = ("admin@maranatha.com", "admin123");
const ORGANIZER: (&str, &str) = ("organizador@maranatha.com", "org2024");

async fn test_app(max_attendees: u64) -> Router {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
    Migrator::up(&db, None).await.unwrap();

    let state = AppState::new(Some(db), max_attendees);
    create_router(
        state,
        Arc::new(StaticCredentials::default()),
        MemoryStore::default(),
    )
}

fn unconfigured_app() -> Router {
    create_router(
        AppState::new(None, 500),
        Arc::new(StaticCredentials::default()),
        MemoryStore::default(),
    )
}

struct Reply {
    status: StatusCode,
    body: Value,
    cookie: Option<String>,
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<String>,
    cookie: Option<&str>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body)),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    Reply {
        status,
        body,
        cookie,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Reply {
    send_raw(app, method, uri, body.map(|b| b.to_string()), cookie).await
}

async fn login(app: &Router, (email, password): (&str, &str)) -> String {
    let reply = send(
        app,
        Method::POST,
        "/login",
        Some(json!({ "email": email, "password": password })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.cookie.expect("login should set a session cookie")
}

fn registration_body() -> Value {
    json!({
        "firstName": "Juan",
        "lastName": "Pérez",
        "phone": "+591 70012345",
        "gender": "male",
        "address": "Calle Sucre 12",
        "hasChildren": true,
        "children": [
            { "name": "Sofía", "gender": "female", "age": 6 },
            { "name": "Tomás", "gender": "male", "age": "9" }
        ]
    })
}

async fn create(app: &Router, body: Value) -> Value {
    let reply = send(app, Method::POST, "/registrations", Some(body), None).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body
}

#[tokio::test]
async fn created_registration_is_unattended_with_all_children() {
    let app = test_app(500).await;
    let created = create(&app, registration_body()).await;

    assert_eq!(created["attended"], false);
    assert_eq!(created["gender"], "male");
    assert_eq!(created["children"].as_array().unwrap().len(), 2);
    assert_eq!(created["children"][0]["name"], "Sofía");
    assert_eq!(created["children"][1]["age"], 9);
    assert!(created["timestamp"].as_i64().unwrap() > 0);
    assert!(
        created["qrCode"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );

    let id = created["id"].as_str().unwrap();
    let fetched = send(&app, Method::GET, &format!("/registrations/{id}"), None, None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, created);
}

#[tokio::test]
async fn missing_phone_is_rejected_without_a_partial_write() {
    let app = test_app(500).await;
    let mut body = registration_body();
    body.as_object_mut().unwrap().remove("phone");

    let reply = send(&app, Method::POST, "/registrations", Some(body), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["fields"], json!(["phone"]));

    let list = send(&app, Method::GET, "/registrations", None, None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn unknown_gender_is_stored_as_other() {
    let app = test_app(500).await;
    let mut body = registration_body();
    body["gender"] = json!("klingon");

    let created = create(&app, body).await;
    assert_eq!(created["gender"], "other");
}

#[tokio::test]
async fn has_children_without_children_is_tolerated() {
    let app = test_app(500).await;
    let mut body = registration_body();
    body["children"] = json!([]);

    let created = create(&app, body).await;
    assert_eq!(created["hasChildren"], true);
    assert_eq!(created["children"], json!([]));
}

#[tokio::test]
async fn list_is_most_recent_first() {
    let app = test_app(500).await;
    let first = create(&app, registration_body()).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let mut body = registration_body();
    body["firstName"] = json!("Rosa");
    let second = create(&app, body).await;

    let list = send(&app, Method::GET, "/registrations", None, None).await;
    let ids: Vec<&str> = list
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![second["id"].as_str().unwrap(), first["id"].as_str().unwrap()]
    );
    assert_eq!(list.body[1]["children"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn marking_attendance_twice_is_idempotent() {
    let app = test_app(500).await;
    let created = create(&app, registration_body()).await;
    let uri = format!("/registrations/{}", created["id"].as_str().unwrap());

    for _ in 0..2 {
        let reply = send(
            &app,
            Method::PATCH,
            &uri,
            Some(json!({ "attended": true })),
            None,
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["attended"], true);
        assert_eq!(reply.body["children"].as_array().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn attendance_must_be_a_boolean() {
    let app = test_app(500).await;
    let created = create(&app, registration_body()).await;
    let uri = format!("/registrations/{}", created["id"].as_str().unwrap());

    for body in [json!({ "attended": "yes" }), json!({ "attended": 1 }), json!({})] {
        let reply = send(&app, Method::PATCH, &uri, Some(body), None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }
    let malformed = send_raw(&app, Method::PATCH, &uri, Some("{".to_string()), None).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let unchanged = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(unchanged.body["attended"], false);
}

#[tokio::test]
async fn attendance_on_unknown_registration_is_not_found() {
    let app = test_app(500).await;
    let reply = send(
        &app,
        Method::PATCH,
        "/registrations/does-not-exist",
        Some(json!({ "attended": true })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn id_and_qr_lookups_are_not_interchangeable() {
    let app = test_app(500).await;
    let mut body = registration_body();
    body["qrCode"] = json!("QR-abc123");
    let created = create(&app, body).await;
    assert_eq!(created["qrCode"], "QR-abc123");
    let id = created["id"].as_str().unwrap();

    let by_id_as_qr = send(
        &app,
        Method::GET,
        &format!("/registrations/{id}?qr=true"),
        None,
        None,
    )
    .await;
    assert_eq!(by_id_as_qr.status, StatusCode::NOT_FOUND);

    let by_qr = send(&app, Method::GET, "/registrations/QR-abc123?qr=true", None, None).await;
    assert_eq!(by_qr.status, StatusCode::OK);
    assert_eq!(by_qr.body["id"], id);

    let by_qr_as_id = send(&app, Method::GET, "/registrations/QR-abc123?qr=false", None, None).await;
    assert_eq!(by_qr_as_id.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unconfigured_storage_is_reported_distinctly() {
    let app = unconfigured_app();

    let list = send(&app, Method::GET, "/registrations", None, None).await;
    assert_eq!(list.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(list.body["code"], "STORAGE_UNAVAILABLE");

    let created = send(
        &app,
        Method::POST,
        "/registrations",
        Some(registration_body()),
        None,
    )
    .await;
    assert_eq!(created.status, StatusCode::SERVICE_UNAVAILABLE);

    let fetched = send(&app, Method::GET, "/registrations/anything", None, None).await;
    assert_eq!(fetched.status, StatusCode::SERVICE_UNAVAILABLE);

    let health = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(health.body["storage"], "unconfigured");
}

#[tokio::test]
async fn full_event_rejects_new_registrations() {
    let app = test_app(1).await;
    create(&app, registration_body()).await;

    let reply = send(
        &app,
        Method::POST,
        "/registrations",
        Some(registration_body()),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let list = send(&app, Method::GET, "/registrations", None, None).await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn login_checks_credentials_and_reports_role() {
    let app = test_app(500).await;

    let wrong = send(
        &app,
        Method::POST,
        "/login",
        Some(json!({ "email": ADMIN.0, "password": "wrong" })),
        None,
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let malformed = send(
        &app,
        Method::POST,
        "/login",
        Some(json!({ "email": "admin", "password": "admin123" })),
        None,
    )
    .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let cookie = login(&app, ORGANIZER).await;
    let me = send(&app, Method::GET, "/me", None, Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], ORGANIZER.0);
    assert_eq!(me.body["role"], "organizer");
    assert_eq!(me.body["isAdmin"], false);
    assert!(me.body["loggedInAt"].as_i64().is_some());
}

#[tokio::test]
async fn only_admins_see_the_dashboard() {
    let app = test_app(500).await;
    let mut body = registration_body();
    create(&app, body.clone()).await;
    body["hasChildren"] = json!(false);
    body["children"] = json!([]);
    create(&app, body).await;

    let anonymous = send(&app, Method::GET, "/dashboard", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let organizer = login(&app, ORGANIZER).await;
    let forbidden = send(&app, Method::GET, "/dashboard", None, Some(&organizer)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let admin = login(&app, ADMIN).await;
    let dashboard = send(&app, Method::GET, "/dashboard", None, Some(&admin)).await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.body["total"], 2);
    assert_eq!(dashboard.body["withChildren"], 1);
    assert_eq!(dashboard.body["attended"], 0);
    assert_eq!(dashboard.body["remaining"], 498);
    assert_eq!(dashboard.body["registrations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = test_app(500).await;
    let cookie = login(&app, ADMIN).await;

    let logout = send(&app, Method::GET, "/logout", None, Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let me = send(&app, Method::GET, "/me", None, Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

/// Account list that can change while sessions are live.
#[derive(Debug)]
struct RevocableCredentials {
    users: Mutex<Vec<AdminUser>>,
}

impl RevocableCredentials {
    fn revoke(&self, email: &str) {
        self.users.lock().unwrap().retain(|user| user.email != email);
    }

    fn current(&self) -> StaticCredentials {
        StaticCredentials::new(self.users.lock().unwrap().clone())
    }
}

impl CredentialProvider for RevocableCredentials {
    fn validate(&self, email: &str, password: &str) -> Option<AdminUser> {
        self.current().validate(email, password)
    }

    fn lookup(&self, email: &str) -> Option<AdminUser> {
        self.current().lookup(email)
    }
}

#[tokio::test]
async fn removing_an_account_ends_its_open_session() {
    let credentials = Arc::new(RevocableCredentials {
        users: Mutex::new(vec![
            AdminUser::new(ADMIN.0, ADMIN.1, Role::Admin),
            AdminUser::new(ORGANIZER.0, ORGANIZER.1, Role::Organizer),
        ]),
    });
    let app = create_router(
        AppState::new(None, 500),
        credentials.clone(),
        MemoryStore::default(),
    );
    let organizer = login(&app, ORGANIZER).await;
    let admin = login(&app, ADMIN).await;

    let me = send(&app, Method::GET, "/me", None, Some(&organizer)).await;
    assert_eq!(me.status, StatusCode::OK);

    credentials.revoke(ORGANIZER.0);

    let me = send(&app, Method::GET, "/me", None, Some(&organizer)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    let me = send(&app, Method::GET, "/me", None, Some(&admin)).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn scanning_a_payload_checks_the_attendee_in_once() {
    let app = test_app(500).await;
    let created = create(&app, registration_body()).await;
    let id = created["id"].as_str().unwrap();

    let qr = send(&app, Method::GET, &format!("/registrations/{id}/qr"), None, None).await;
    assert_eq!(qr.status, StatusCode::OK);
    let payload = qr.body["payload"].as_str().unwrap().to_string();
    let decoded = QrPayload::decode(&payload).unwrap();
    assert_eq!(decoded.id, id);
    assert_eq!(decoded.first_name, "Juan");
    assert_eq!(decoded.gender, Gender::Male);
    assert_eq!(decoded.timestamp, created["timestamp"].as_i64().unwrap());

    let anonymous = send(
        &app,
        Method::POST,
        "/scan",
        Some(json!({ "code": payload })),
        None,
    )
    .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let cookie = login(&app, ORGANIZER).await;
    let first = send(
        &app,
        Method::POST,
        "/scan",
        Some(json!({ "code": payload })),
        Some(&cookie),
    )
    .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["registration"]["attended"], true);
    assert_eq!(first.body["alreadyAttended"], false);

    let second = send(
        &app,
        Method::POST,
        "/scan",
        Some(json!({ "code": payload })),
        Some(&cookie),
    )
    .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["alreadyAttended"], true);
}

#[tokio::test]
async fn bad_scans_change_nothing() {
    let app = test_app(500).await;
    let created = create(&app, registration_body()).await;
    let id = created["id"].as_str().unwrap();
    let cookie = login(&app, ORGANIZER).await;

    let garbage = send(
        &app,
        Method::POST,
        "/scan",
        Some(json!({ "code": "definitely not a payload" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(garbage.status, StatusCode::BAD_REQUEST);

    let qr = send(&app, Method::GET, &format!("/registrations/{id}/qr"), None, None).await;
    let mut stranger = QrPayload::decode(qr.body["payload"].as_str().unwrap()).unwrap();
    stranger.id = "someone-else".to_string();
    let unknown = send(
        &app,
        Method::POST,
        "/scan",
        Some(json!({ "code": stranger.encode().unwrap() })),
        Some(&cookie),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let fetched = send(&app, Method::GET, &format!("/registrations/{id}"), None, None).await;
    assert_eq!(fetched.body["attended"], false);
}
