//! HTTP-level tests against the full router with an in-memory database.
//! The in-memory store starts with the demo student (wallet 500, 100 points)
//! and the default five-item menu.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use canteen_connect::config::{Config, Storage};
use canteen_connect::routes;
use canteen_connect::state::AppState;

fn server() -> TestServer {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.storage = Storage::Memory;

    let state = AppState::new(config).unwrap();
    TestServer::new(routes::router(state)).unwrap()
}

async fn place(server: &TestServer, user_id: &str, items: Value, method: &str) -> Value {
    let response = server
        .post("/api/orders")
        .json(&json!({
            "userId": user_id,
            "items": items,
            "paymentMethod": method,
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["order"].clone()
}

#[tokio::test]
async fn test_health_check() {
    let server = server();

    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "API is Running...");
}

#[tokio::test]
async fn test_login_outcomes() {
    let server = server();

    let ok = server
        .post("/api/auth/login")
        .json(&json!({ "id": "student", "pass": "123" }))
        .await;
    ok.assert_status_ok();
    let body = ok.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["wallet"], 500.0);
    assert_eq!(body["user"]["loyalty"]["badge"], "Bronze");

    let wrong = server
        .post("/api/auth/login")
        .json(&json!({ "id": "student", "pass": "nope" }))
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    let body = wrong.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid Credentials");

    let unknown = server
        .post("/api/auth/login")
        .json(&json!({ "id": "ghost", "pass": "123" }))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);

    let admin = server
        .post("/api/auth/login")
        .json(&json!({ "id": "admin", "pass": "admin123" }))
        .await;
    admin.assert_status_ok();
    assert_eq!(admin.json::<Value>()["user"]["role"], "admin");
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let server = server();

    let created = server
        .post("/api/auth/register")
        .json(&json!({ "id": "bob", "name": "Bob", "pass": "pw" }))
        .await;
    created.assert_status_ok();
    assert_eq!(created.json::<Value>()["user"]["id"], "bob");

    let duplicate = server
        .post("/api/auth/register")
        .json(&json!({ "id": "bob", "name": "Bobby", "pass": "pw" }))
        .await;
    duplicate.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        duplicate.json::<Value>()["message"],
        "User ID already exists"
    );
}

#[tokio::test]
async fn test_menu_filters() {
    let server = server();

    let snacks = server
        .get("/api/items")
        .add_query_param("category", "Snacks")
        .await;
    snacks.assert_status_ok();
    assert_eq!(snacks.json::<Vec<Value>>().len(), 2);

    let missing = server.get("/api/items/99").await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_order_lifecycle_over_http() {
    let server = server();

    let order = place(
        &server,
        "student",
        json!([
            { "id": 1, "name": "Veg Burger", "price": 1, "qty": 2 },
            { "id": 3, "qty": 1 }
        ]),
        "Wallet",
    )
    .await;
    assert_eq!(order["total"], 140.0);
    assert_eq!(order["status"], "Pending");
    let id = order["id"].as_i64().unwrap();
    let otp = order["otp"].as_str().unwrap().to_string();

    let skip = server
        .put(&format!("/api/orders/{id}/status"))
        .json(&json!({ "status": "Ready" }))
        .await;
    skip.assert_status(StatusCode::CONFLICT);

    for status in ["Cooking", "Ready"] {
        server
            .put(&format!("/api/orders/{id}/status"))
            .json(&json!({ "status": status }))
            .await
            .assert_status_ok();
    }

    let done = server
        .post(&format!("/api/orders/{id}/verify"))
        .json(&json!({ "otp": otp }))
        .await;
    done.assert_status_ok();
    assert_eq!(done.json::<Value>()["order"]["status"], "Completed");

    let review = server
        .post(&format!("/api/orders/{id}/review"))
        .json(&json!({ "userId": "student", "rating": 5 }))
        .await;
    review.assert_status(StatusCode::CREATED);

    let user = server.get("/api/users/student").await.json::<Value>();
    assert_eq!(user["wallet"], 360.0);
    assert_eq!(user["loyalty"]["points"], 114);

    let ledger = server
        .get("/api/wallet/transactions")
        .add_query_param("userId", "student")
        .await
        .json::<Vec<Value>>();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0]["type"], "Debit");
    assert_eq!(ledger[0]["desc"], format!("Order Payment #{id}"));
}

#[tokio::test]
async fn test_insufficient_balance() {
    let server = server();

    let response = server
        .post("/api/orders")
        .json(&json!({
            "userId": "student",
            "items": [{ "id": 5, "qty": 6 }],
            "paymentMethod": "Wallet",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Insufficient Balance");

    let orders = server.get("/api/orders").await.json::<Vec<Value>>();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_cancel_permissions_and_refund() {
    let server = server();
    server
        .post("/api/auth/register")
        .json(&json!({ "id": "mallory", "name": "Mallory", "pass": "pw" }))
        .await
        .assert_status_ok();

    let order = place(&server, "student", json!([{ "id": 2, "qty": 1 }]), "Wallet").await;
    let id = order["id"].as_i64().unwrap();

    let stranger = server
        .post(&format!("/api/orders/{id}/cancel"))
        .json(&json!({ "requestedBy": "mallory" }))
        .await;
    stranger.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(stranger.json::<Value>()["message"], "Unauthorized");

    let cancelled = server
        .post(&format!("/api/orders/{id}/cancel"))
        .json(&json!({ "requestedBy": "Admin" }))
        .await;
    cancelled.assert_status_ok();
    assert_eq!(cancelled.json::<Value>()["order"]["status"], "Cancelled");

    let user = server.get("/api/users/student").await.json::<Value>();
    assert_eq!(user["wallet"], 500.0);

    let item = server.get("/api/items/2").await.json::<Value>();
    assert_eq!(item["stock"], 50);
}

#[tokio::test]
async fn test_pay_later_and_settle() {
    let server = server();

    let order = place(&server, "student", json!([{ "id": 5, "qty": 6 }]), "Pay Later").await;
    let id = order["id"].as_i64().unwrap();
    assert_eq!(order["paymentMethod"], "Pay Later");
    assert_eq!(order["paymentCollected"], false);

    let user = server.get("/api/users/student").await.json::<Value>();
    assert_eq!(user["wallet"], -40.0);

    let settled = server.post(&format!("/api/orders/{id}/settle")).await;
    settled.assert_status_ok();
    assert_eq!(settled.json::<Value>()["order"]["paymentCollected"], true);

    let user = server.get("/api/users/student").await.json::<Value>();
    assert_eq!(user["wallet"], 500.0);
}

#[tokio::test]
async fn test_top_up_and_announcements() {
    let server = server();

    let topped = server
        .post("/api/wallet/student/topup")
        .json(&json!({ "amount": 100 }))
        .await;
    topped.assert_status_ok();
    assert_eq!(topped.json::<Value>()["wallet"], 600.0);

    server
        .post("/api/wallet/student/topup")
        .json(&json!({ "amount": -5 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let created = server
        .post("/api/announcements")
        .json(&json!({ "message": "Kitchen closes at 4pm", "type": "warning" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let id = created.json::<Value>()["id"].as_i64().unwrap();

    let listed = server.get("/api/announcements").await.json::<Vec<Value>>();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["type"], "warning");

    server
        .delete(&format!("/api/announcements/{id}"))
        .await
        .assert_status_ok();
    server
        .delete(&format!("/api/announcements/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reports() {
    let server = server();

    let order = place(&server, "student", json!([{ "id": 4, "qty": 2 }]), "Wallet").await;
    let id = order["id"].as_i64().unwrap();
    server
        .put(&format!("/api/orders/{id}/status"))
        .json(&json!({ "status": "Cooking" }))
        .await
        .assert_status_ok();

    let summary = server.get("/api/reports/summary").await;
    summary.assert_status_ok();
    let body = summary.json::<Value>();
    assert_eq!(body["totalOrders"], 1);
    assert_eq!(body["totalRevenue"], 120.0);
    assert_eq!(body["topItems"][0]["name"], "Masala Dosa");

    server
        .get("/api/reports/summary")
        .add_query_param("date", "not-a-date")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let alerts = server
        .get("/api/reports/alerts")
        .add_query_param("threshold", 49)
        .await
        .json::<Value>();
    assert_eq!(alerts["lowStock"].as_array().unwrap().len(), 1);
    assert_eq!(alerts["lowStock"][0]["id"], 4);
    assert!(alerts["delayedOrders"].as_array().unwrap().is_empty());
}
