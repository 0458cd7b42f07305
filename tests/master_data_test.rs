mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use common::{dec as decimal, id_of, PartSeed, TestApp};

#[tokio::test]
async fn customers_get_sequential_codes_and_address_defaults() {
    let app = TestApp::new().await;

    let first = app
        .create(
            "/api/v1/customers",
            json!({
                "name": "  Vega Compressors ",
                "email": "buyer@vega.test",
                "billing_address": "Survey 41, Hosur",
                "country": "India",
                "currency": "inr"
            }),
        )
        .await;
    assert_eq!(first["code"], "CUST-0001");
    assert_eq!(first["name"], "Vega Compressors");
    assert_eq!(first["currency"], "INR");
    assert_eq!(first["credit_period"], 30);
    assert_eq!(first["shipping_address"], "Survey 41, Hosur");
    assert_eq!(first["delivery_address"], "Survey 41, Hosur");
    assert_eq!(first["advance_terms"], "No Advance");

    let second_id = app.seed_customer("Lumen Drives").await;
    let (_, second) = app.get(&format!("/api/v1/customers/{second_id}")).await;
    assert_eq!(second["data"]["code"], "CUST-0002");

    let (status, _) = app
        .post(
            "/api/v1/customers",
            json!({
                "name": "Bad Currency",
                "email": "ops@bad.test",
                "billing_address": "Nowhere",
                "country": "India",
                "currency": "RUPEE"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = app.get("/api/v1/customers?active=true").await;
    assert_eq!(list["data"]["total"], 2);
}

#[tokio::test]
async fn customer_with_open_sales_order_cannot_be_deactivated() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Helix Gears").await;
    let supplier_id = app.seed_supplier("Bharat Alloys", &[]).await;
    let part_id = app
        .seed_part(PartSeed {
            drawing_number: "DRG-HX-9",
            customer_id,
            supplier_id,
            cost_price: "18.00",
            selling_price: "30.00",
            stock: 0,
            processes: vec![],
        })
        .await;
    app.seed_sales_order(customer_id, &[(part_id, 12)]).await;

    let (status, _) = app
        .put(
            &format!("/api/v1/customers/{customer_id}"),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(
            &format!("/api/v1/customers/{customer_id}"),
            json!({ "credit_period": 60, "contact_person": "R. Iyer" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["credit_period"], 60);
    assert_eq!(body["data"]["is_active"], true);

    let idle = app.seed_customer("Quiet Buyer").await;
    let (status, body) = app
        .put(&format!("/api/v1/customers/{idle}"), json!({ "is_active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, _) = app
        .post(
            "/api/v1/sales-orders",
            json!({ "customer_id": idle, "items": [{ "part_id": part_id, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "inactive customers take no orders");
}

#[tokio::test]
async fn supplier_pricing_is_validated_and_replaced_on_update() {
    let app = TestApp::new().await;
    let milling = app.seed_process("Milling").await;
    let anodizing = app.seed_process("Anodizing").await;

    let (status, _) = app
        .post(
            "/api/v1/suppliers",
            json!({
                "name": "Twin Rates",
                "email": "rates@twin.test",
                "address": "Ambattur",
                "process_pricing": [
                    { "process_id": milling, "price": "5.00" },
                    { "process_id": milling, "price": "6.00" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "duplicate process");

    let (status, _) = app
        .post(
            "/api/v1/suppliers",
            json!({
                "name": "Negative Rates",
                "email": "rates@negative.test",
                "address": "Ambattur",
                "process_pricing": [{ "process_id": milling, "price": "-1.00" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "negative price");

    let (status, _) = app
        .post(
            "/api/v1/suppliers",
            json!({
                "name": "Ghost Rates",
                "email": "rates@ghost.test",
                "address": "Ambattur",
                "process_pricing": [{ "process_id": Uuid::new_v4(), "price": "3.00" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "unknown process");

    let supplier = app
        .create(
            "/api/v1/suppliers",
            json!({
                "name": "Precision Mills",
                "email": "sales@mills.test",
                "address": "Peenya",
                "process_pricing": [{ "process_id": milling, "price": "7.75" }]
            }),
        )
        .await;
    assert_eq!(supplier["code"], "V-0001", "rejected suppliers consume no codes");
    assert_eq!(supplier["credit_period"], 30);
    assert_eq!(supplier["process_pricing"].as_array().map(Vec::len), Some(1));
    let supplier_id = id_of(&supplier);

    let (status, body) = app
        .put(
            &format!("/api/v1/suppliers/{supplier_id}"),
            json!({
                "process_pricing": [
                    { "process_id": milling, "price": "8.25" },
                    { "process_id": anodizing, "price": "3.10" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let pricing = body["data"]["process_pricing"].as_array().cloned().unwrap_or_default();
    assert_eq!(pricing.len(), 2);
    let milling_rate = pricing
        .iter()
        .find(|p| p["process_id"] == milling.to_string())
        .expect("milling rate");
    assert_eq!(decimal(&milling_rate["price"]), dec!(8.25));

    let suppliers = &app.state.services.suppliers;
    let rate = suppliers
        .process_price(supplier_id, anodizing)
        .await
        .expect("price lookup");
    assert_eq!(rate, Some(dec!(3.10)));
    let unknown = app.seed_process("Lapping").await;
    let rate = suppliers
        .process_price(supplier_id, unknown)
        .await
        .expect("price lookup");
    assert_eq!(rate, None);

    let (status, body) = app
        .put(&format!("/api/v1/suppliers/{supplier_id}"), json!({ "name": "Precision Mills Pvt" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["process_pricing"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn parts_track_routes_and_price_history() {
    let app = TestApp::new().await;
    let grinding = app.seed_process("Grinding").await;
    let customer_id = app.seed_customer("Atlas Cranes").await;
    let supplier_id = app.seed_supplier("Sahyadri Machining", &[]).await;

    let (status, _) = app
        .post(
            "/api/v1/parts",
            json!({
                "drawing_number": "DRG-PIN-1",
                "name": "Pivot pin",
                "revision": "B",
                "customer_id": customer_id,
                "primary_supplier_id": supplier_id,
                "cost_price": "3.00",
                "selling_price": "5.00",
                "is_job_work": true,
                "manufacturing_condition": "Heat Treated"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "job-work part without a route");

    let (status, _) = app
        .post(
            "/api/v1/parts",
            json!({
                "drawing_number": "DRG-PIN-1",
                "name": "Pivot pin",
                "revision": "B",
                "customer_id": customer_id,
                "primary_supplier_id": supplier_id,
                "cost_price": "-3.00",
                "selling_price": "5.00",
                "manufacturing_condition": "Casting"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "negative cost");

    let part = app
        .create(
            "/api/v1/parts",
            json!({
                "drawing_number": "DRG-PIN-1",
                "name": "Pivot pin",
                "revision": "B",
                "customer_id": customer_id,
                "primary_supplier_id": supplier_id,
                "cost_price": "3.00",
                "selling_price": "5.00",
                "is_job_work": true,
                "required_processes": [grinding],
                "manufacturing_condition": "Heat Treated"
            }),
        )
        .await;
    assert_eq!(part["sku"], "GKP-000001");
    assert_eq!(part["uom"], "Nos");
    assert_eq!(part["moq"], 1);
    assert_eq!(part["required_processes"], json!([grinding]));
    assert_eq!(part["price_history"].as_array().map(Vec::len), Some(1));
    let part_id = id_of(&part);

    let (status, body) = app
        .put(&format!("/api/v1/parts/{part_id}"), json!({ "lead_time_days": 14 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price_history"].as_array().map(Vec::len), Some(1));

    let (status, body) = app
        .put(&format!("/api/v1/parts/{part_id}"), json!({ "selling_price": "5.60" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["selling_price"]), dec!(5.60));

    let (_, history) = app
        .get(&format!("/api/v1/parts/{part_id}/price-history"))
        .await;
    let history = history["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(history.len(), 2);
    assert_eq!(decimal(&history[0]["selling_price"]), dec!(5.60));
    assert_eq!(decimal(&history[0]["cost_price"]), dec!(3.00));

    let (status, _) = app
        .put(
            &format!("/api/v1/parts/{part_id}"),
            json!({ "required_processes": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "job-work route cannot be emptied");

    let (_, jobs) = app.get("/api/v1/parts?job_work=true").await;
    assert_eq!(jobs["data"]["total"], 1);
    let (status, _) = app.get(&format!("/api/v1/parts/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn processes_are_unique_by_name() {
    let app = TestApp::new().await;
    app.seed_process("Broaching").await;

    let (status, _) = app
        .post("/api/v1/processes", json!({ "name": " Broaching " }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, list) = app.get("/api/v1/processes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn tooling_onboarding_usage_and_retirement() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Crest Auto").await;
    let supplier_id = app.seed_supplier("Die Makers", &[]).await;
    let part_id = app
        .seed_part(PartSeed {
            drawing_number: "DRG-CR-5",
            customer_id,
            supplier_id,
            cost_price: "11.00",
            selling_price: "19.00",
            stock: 0,
            processes: vec![],
        })
        .await;

    let assets = app
        .create(
            "/api/v1/tooling",
            json!({
                "customer_id": customer_id,
                "part_id": part_id,
                "supplier_id": supplier_id,
                "assets": [
                    { "asset_number": "DIE-001", "name": "Trim die", "customer_value": "150000", "expected_life_cycles": 8000 },
                    { "asset_number": "FIX-001", "name": "Drill fixture" }
                ]
            }),
        )
        .await;
    let assets = assets.as_array().cloned().unwrap_or_default();
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0]["status"], "Active");
    assert_eq!(assets[1]["expected_life_cycles"], 100_000);
    let die_id = id_of(&assets[0]);

    let (status, _) = app
        .post(
            "/api/v1/tooling",
            json!({
                "customer_id": customer_id,
                "part_id": part_id,
                "assets": [{ "asset_number": "DIE-001", "name": "Copy" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            "/api/v1/tooling",
            json!({
                "customer_id": customer_id,
                "part_id": part_id,
                "assets": [
                    { "asset_number": "JIG-7", "name": "Weld jig" },
                    { "asset_number": "JIG-7", "name": "Weld jig" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(&format!("/api/v1/tooling/{die_id}/cycles"), json!({ "cycles": 2000 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_cycles"], 2000);
    assert_eq!(decimal(&body["data"]["usage_percent"]), dec!(25));

    let (status, _) = app
        .post(&format!("/api/v1/tooling/{die_id}/cycles"), json!({ "cycles": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(&format!("/api/v1/tooling/{die_id}"), json!({ "status": "Retired" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Retired");

    let (status, _) = app
        .post(&format!("/api/v1/tooling/{die_id}/cycles"), json!({ "cycles": 10 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "retired tooling records no usage");

    let (_, list) = app
        .get(&format!("/api/v1/tooling?part_id={part_id}&status=Active"))
        .await;
    assert_eq!(list["data"]["total"], 1);
}

#[tokio::test]
async fn tooling_rejects_unknown_suppliers_and_counter_overflow() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Crest Auto").await;
    let supplier_id = app.seed_supplier("Die Makers", &[]).await;
    let part_id = app
        .seed_part(PartSeed {
            drawing_number: "DRG-CR-9",
            customer_id,
            supplier_id,
            cost_price: "11.00",
            selling_price: "19.00",
            stock: 0,
            processes: vec![],
        })
        .await;
    let assets = app
        .create(
            "/api/v1/tooling",
            json!({
                "customer_id": customer_id,
                "part_id": part_id,
                "supplier_id": supplier_id,
                "assets": [{ "asset_number": "MLD-3", "name": "Injection mould" }]
            }),
        )
        .await;
    let mould_id = id_of(&assets[0]);

    let (status, _) = app
        .put(
            &format!("/api/v1/tooling/{mould_id}"),
            json!({ "supplier_id": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.get(&format!("/api/v1/tooling/{mould_id}")).await;
    assert_eq!(body["data"]["supplier_id"], supplier_id.to_string());

    let (status, body) = app
        .post(
            &format!("/api/v1/tooling/{mould_id}/cycles"),
            json!({ "cycles": i64::MAX }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_cycles"], i64::MAX);

    let (status, _) = app
        .post(&format!("/api/v1/tooling/{mould_id}/cycles"), json!({ "cycles": 5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = app.get(&format!("/api/v1/tooling/{mould_id}")).await;
    assert_eq!(body["data"]["current_cycles"], i64::MAX, "counter left untouched");
}
