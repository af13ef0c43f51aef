use serde_json::{json, Value};
use sewa_portal_model::District;
use sewa_portal_server::auth::{generate_salt, hash_password};
use sewa_portal_server::config::{NotifyConfig, RateRule, ServerConfig};
use sewa_portal_server::notify::Dispatcher;
use sewa_portal_server::{build_router, AppState};
use sewa_portal_store::{AdminCredential, PortalStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const ADMIN_PASSWORD: &str = "correct-horse-battery";

fn test_config() -> ServerConfig {
    ServerConfig::default()
}

async fn spawn_server(config: ServerConfig) -> SocketAddr {
    let store = Arc::new(PortalStore::open_in_memory().expect("store"));
    let salt = generate_salt();
    store
        .upsert_admin(&AdminCredential {
            username: "admin".to_string(),
            password_salt: salt.clone(),
            password_hash: hash_password(&salt, ADMIN_PASSWORD),
        })
        .expect("seed admin");

    let notifier = Arc::new(Dispatcher::from_config(&config.notify));
    let state = AppState::new(config, store, notifier);
    let app = build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("serve app");
    });
    addr
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&Value>,
) -> (u16, Value) {
    let mut stream = TcpStream::connect(addr).await.expect("connect server");
    let payload = body.map(Value::to_string).unwrap_or_default();
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    if body.is_some() {
        request.push_str("Content-Type: application/json\r\n");
        request.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    request.push_str("\r\n");
    request.push_str(&payload);

    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, raw_body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    let json_body = if raw_body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(raw_body.trim()).unwrap_or(Value::Null)
    };
    (status, json_body)
}

fn valid_submission() -> Value {
    json!({
        "name": "A B",
        "email": "a@b.com",
        "phone": "9812345670",
        "district": "Gangtok",
        "location": "Ward 3",
        "amenities": ["Water Supply"],
        "description": "No water for 2 weeks",
        "priority": "High"
    })
}

async fn login(addr: SocketAddr) -> String {
    let (status, body) = send_raw(
        addr,
        "POST",
        "/api/admin/login",
        &[],
        Some(&json!({ "username": "admin", "password": ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(status, 200, "login failed: {body}");
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn submit_track_and_district_overview_end_to_end() {
    let addr = spawn_server(test_config()).await;

    let (status, body) = send_raw(addr, "POST", "/api/requests", &[], Some(&valid_submission())).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    let reference = body["referenceId"].as_str().expect("referenceId");
    assert_eq!(reference.len(), 12);
    assert!(reference.starts_with("SKM"));
    assert!(reference[3..].bytes().all(|b| b.is_ascii_digit()));

    // Tracking is case-insensitive and withholds contact details.
    let lower = reference.to_ascii_lowercase();
    let (status, body) = send_raw(addr, "GET", &format!("/api/track/{lower}"), &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body["request"]["status"], json!("Pending"));
    assert_eq!(body["request"]["updatedAt"], json!(null));
    assert!(body["request"].get("email").is_none());
    assert!(body["request"].get("phone").is_none());

    let (status, body) = send_raw(
        addr,
        "GET",
        "/api/districts/Gangtok/requests",
        &[],
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["stats"]["total"].as_i64().expect("total") >= 1);
    let listed = body["requests"].as_array().expect("requests");
    assert!(listed
        .iter()
        .any(|r| r["referenceId"].as_str() == Some(reference)));
    // Public rows carry a redacted submitter, never an email.
    assert_eq!(listed[0]["submitter"], json!("A B."));
    assert!(listed[0].get("email").is_none());

    let (status, _) = send_raw(addr, "GET", "/api/track/SKM000000000", &[], None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn invalid_submissions_report_every_field_error_and_persist_nothing() {
    let addr = spawn_server(test_config()).await;

    let (status, body) = send_raw(
        addr,
        "POST",
        "/api/requests",
        &[],
        Some(&json!({
            "name": "A B",
            "email": "not-an-email",
            "phone": "12345",
            "district": "Unknown",
            "location": "Ward 3",
            "amenities": ["Water Supply"],
            "description": "No water for 2 weeks",
            "priority": "High"
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], json!(false));
    let field_errors = body["error"]["details"]["field_errors"]
        .as_array()
        .expect("field errors");
    let fields: Vec<&str> = field_errors
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"phone"));
    assert!(fields.contains(&"district"));

    let token = login(addr).await;
    let (_, body) = send_raw(
        addr,
        "GET",
        "/api/requests",
        &[("Authorization", &format!("Bearer {token}"))],
        None,
    )
    .await;
    assert_eq!(body["requests"].as_array().expect("requests").len(), 0);
}

#[tokio::test]
async fn admin_update_and_delete_lifecycle() {
    let addr = spawn_server(test_config()).await;
    let (_, body) = send_raw(addr, "POST", "/api/requests", &[], Some(&valid_submission())).await;
    let id = body["id"].as_i64().expect("id");

    // Admin routes reject missing and garbage tokens alike.
    for headers in [vec![], vec![("Authorization", "Bearer bogus")]] {
        let (status, _) =
            send_raw(addr, "GET", &format!("/api/requests/{id}"), &headers, None).await;
        assert_eq!(status, 401);
    }

    let token = login(addr).await;
    let auth_header = format!("Bearer {token}");
    let auth = [("Authorization", auth_header.as_str())];

    let (status, body) = send_raw(
        addr,
        "PUT",
        &format!("/api/requests/{id}"),
        &auth,
        Some(&json!({ "status": "Approved", "adminNotes": "Work order issued" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["request"]["status"], json!("Approved"));
    assert_eq!(body["request"]["admin_notes"], json!("Work order issued"));
    assert!(body["request"]["updated_at"].is_string());

    let (status, _) = send_raw(
        addr,
        "PUT",
        &format!("/api/requests/{id}"),
        &auth,
        Some(&json!({ "status": "Half Done" })),
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = send_raw(addr, "GET", "/api/stats", &auth, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["stats"]["approved"], json!(1));

    let (status, _) = send_raw(addr, "DELETE", &format!("/api/requests/{id}"), &auth, None).await;
    assert_eq!(status, 200);
    let (status, _) = send_raw(addr, "DELETE", &format!("/api/requests/{id}"), &auth, None).await;
    assert_eq!(status, 404);
    let (status, _) = send_raw(addr, "GET", &format!("/api/requests/{id}"), &auth, None).await;
    assert_eq!(status, 404);

    // Logout invalidates the token for subsequent admin calls.
    let (status, _) = send_raw(addr, "POST", "/api/admin/logout", &auth, None).await;
    assert_eq!(status, 200);
    let (status, _) = send_raw(addr, "GET", "/api/stats", &auth, None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn the_twenty_first_submission_from_one_client_is_rate_limited() {
    let addr = spawn_server(test_config()).await;

    for i in 0..20 {
        let (status, _) =
            send_raw(addr, "POST", "/api/requests", &[], Some(&valid_submission())).await;
        assert_eq!(status, 200, "submission {i} should pass");
    }
    let (status, body) =
        send_raw(addr, "POST", "/api/requests", &[], Some(&valid_submission())).await;
    assert_eq!(status, 429);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"]["details"]["retry_after_secs"].as_u64().expect("hint") > 0);

    // A different client (per trusted proxy header) still has budget.
    let (status, _) = send_raw(
        addr,
        "POST",
        "/api/requests",
        &[("x-forwarded-for", "203.0.113.9")],
        Some(&valid_submission()),
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn repeated_login_failures_lock_the_client_out_but_not_successes() {
    let addr = spawn_server(test_config()).await;

    for _ in 0..5 {
        let (status, _) = send_raw(
            addr,
            "POST",
            "/api/admin/login",
            &[],
            Some(&json!({ "username": "admin", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, 401);
    }
    // Five failures exhaust the window; even a correct password is now gated.
    let (status, _) = send_raw(
        addr,
        "POST",
        "/api/admin/login",
        &[],
        Some(&json!({ "username": "admin", "password": ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(status, 429);

    // Another client is unaffected and successful logins never consume budget.
    for _ in 0..3 {
        let (status, _) = send_raw(
            addr,
            "POST",
            "/api/admin/login",
            &[("x-forwarded-for", "198.51.100.7")],
            Some(&json!({ "username": "admin", "password": ADMIN_PASSWORD })),
        )
        .await;
        assert_eq!(status, 200);
    }
}

#[tokio::test]
async fn feedback_round_trip_with_its_own_reference_space() {
    let addr = spawn_server(test_config()).await;

    let (status, body) = send_raw(
        addr,
        "POST",
        "/api/feedback",
        &[],
        Some(&json!({
            "name": "Pema Sherpa",
            "email": "pema@example.com",
            "feedbackType": "Suggestion",
            "message": "Please add evening bus service."
        })),
    )
    .await;
    assert_eq!(status, 200);
    let reference = body["referenceId"].as_str().expect("referenceId").to_string();
    let id = body["id"].as_i64().expect("id");
    assert!(reference.starts_with("FB"));

    let (status, body) = send_raw(addr, "GET", &format!("/api/track/{reference}"), &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body["feedback"]["status"], json!("New"));
    assert!(body["feedback"].get("email").is_none());

    let token = login(addr).await;
    let auth_header = format!("Bearer {token}");
    let auth = [("Authorization", auth_header.as_str())];

    let (status, body) = send_raw(
        addr,
        "PUT",
        &format!("/api/feedback/{id}"),
        &auth,
        Some(&json!({ "status": "Reviewed", "adminNotes": "Forwarded to transport cell" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["feedback"]["status"], json!("Reviewed"));

    let (status, body) = send_raw(addr, "GET", "/api/feedback?type=Suggestion", &auth, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["feedback"].as_array().expect("feedback").len(), 1);

    let (status, _) = send_raw(addr, "DELETE", &format!("/api/feedback/{id}"), &auth, None).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn chat_notifications_reach_the_district_group_after_the_response() {
    // A local stand-in for the bot API: accepts one request, replies 200,
    // and hands the raw request back for inspection.
    let fake_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake");
    let fake_addr = fake_listener.local_addr().expect("fake addr");
    let received = tokio::spawn(async move {
        let (mut socket, _) = fake_listener.accept().await.expect("accept");
        let mut buf = vec![0u8; 8192];
        let mut collected = Vec::new();
        loop {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            collected.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&collected).to_string();
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let expected: usize = head
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(str::trim).map(str::to_string))
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                if body.len() >= expected {
                    socket
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 17\r\nContent-Type: application/json\r\n\r\n{\"ok\":true,\"r\":1}")
                        .await
                        .expect("reply");
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&collected).to_string()
    });

    let mut config = test_config();
    config.notify = NotifyConfig {
        telegram_bot_token: Some("test-token".to_string()),
        telegram_api_base: format!("http://{fake_addr}"),
        district_chats: [(District::Gangtok, "-100123".to_string())]
            .into_iter()
            .collect(),
        ..NotifyConfig::disabled()
    };
    let addr = spawn_server(config).await;

    let (status, _) = send_raw(addr, "POST", "/api/requests", &[], Some(&valid_submission())).await;
    assert_eq!(status, 200);

    let request_text = tokio::time::timeout(Duration::from_secs(5), received)
        .await
        .expect("notification within deadline")
        .expect("fake server task");
    assert!(request_text.contains("/bottest-token/sendMessage"));
    assert!(request_text.contains("-100123"));
    assert!(request_text.contains("98XXXXX670"));
    assert!(!request_text.contains("9812345670"));
}

#[tokio::test]
async fn read_traffic_has_its_own_window() {
    let mut config = test_config();
    config.rate_limits.read = RateRule {
        max: 3,
        window: Duration::from_secs(60),
    };
    let addr = spawn_server(config).await;

    for _ in 0..3 {
        let (status, _) =
            send_raw(addr, "GET", "/api/requests/public/recent?limit=5", &[], None).await;
        assert_eq!(status, 200);
    }
    let (status, _) = send_raw(addr, "GET", "/api/requests/public/recent", &[], None).await;
    assert_eq!(status, 429);

    // Submission budget is untouched by read-bucket exhaustion.
    let (status, _) =
        send_raw(addr, "POST", "/api/requests", &[], Some(&valid_submission())).await;
    assert_eq!(status, 200);
}
