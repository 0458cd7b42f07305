mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{PartSeed, TestApp};

#[tokio::test]
async fn probes_are_public_and_business_routes_need_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/v1/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["environment"], "test");

    let (status, body) = app.send(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["status"], "up");

    let (status, body) = app
        .send(Method::GET, "/api/v1/sales-orders", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_MISSING");

    let (status, _) = app
        .send(Method::GET, "/api/v1/parts", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_duplicate_emails() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "ADMIN@scm.test", "password": "admin-password" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert!(body["data"]["user"]["last_login_at"].is_string());

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "admin@scm.test", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({ "name": "Again", "email": "admin@scm.test", "password": "x" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn later_accounts_are_users_without_admin_permissions() {
    let app = TestApp::new().await;
    let clerk = app
        .register_user("Stores Clerk", "clerk@scm.test", "clerk-password")
        .await;

    let (status, me) = app
        .send(Method::GET, "/api/v1/auth/me", None, Some(&clerk))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["role"], "user");
    assert_eq!(me["data"]["email"], "clerk@scm.test");

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/settings",
            Some(json!({ "so_prefix": "X-" })),
            Some(&clerk),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTH_INSUFFICIENT_PERMISSIONS");

    let (status, _) = app
        .send(Method::GET, "/api/v1/users", None, Some(&clerk))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::GET, "/api/v1/settings", None, Some(&clerk))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/processes",
            Some(json!({ "name": "Deburring" })),
            Some(&clerk),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, users) = app.get("/api/v1/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["data"].as_array().map(Vec::len), Some(2));
    assert!(users["data"][0].get("password_hash").is_none());
}

#[tokio::test]
async fn logout_revokes_the_presented_token() {
    let app = TestApp::new().await;
    let token = app
        .register_user("Night Shift", "night@scm.test", "night-password")
        .await;

    let (status, _) = app
        .send(Method::GET, "/api/v1/processes", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/logout", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send(Method::GET, "/api/v1/processes", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_REVOKED_TOKEN");

    let (status, _) = app.get("/api/v1/processes").await;
    assert_eq!(status, StatusCode::OK, "other sessions stay valid");
}

#[tokio::test]
async fn settings_drive_document_numbering() {
    let app = TestApp::new().await;

    let (status, settings) = app.get("/api/v1/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["data"]["so_prefix"], "SO-GK-");
    assert_eq!(settings["data"]["so_next_number"], 1001);
    assert_eq!(settings["data"]["base_currency"], "INR");

    let (status, _) = app
        .put("/api/v1/settings", json!({ "so_prefix": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .put("/api/v1/settings", json!({ "so_next_number": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .put(
            "/api/v1/settings",
            json!({ "so_prefix": "SO/24-", "so_next_number": 500 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["so_prefix"], "SO/24-");

    let customer_id = app.seed_customer("Delta Hydraulics").await;
    let supplier_id = app.seed_supplier("Konkan Castings", &[]).await;
    let part_id = app
        .seed_part(PartSeed {
            drawing_number: "DRG-DH-3",
            customer_id,
            supplier_id,
            cost_price: "7.00",
            selling_price: "12.00",
            stock: 0,
            processes: vec![],
        })
        .await;

    let first = app.seed_sales_order(customer_id, &[(part_id, 2)]).await;
    assert_eq!(first["number"], "SO/24-500");
    let second = app.seed_sales_order(customer_id, &[(part_id, 3)]).await;
    assert_eq!(second["number"], "SO/24-501");

    let (_, settings) = app.get("/api/v1/settings").await;
    assert_eq!(settings["data"]["so_next_number"], 502);
}
