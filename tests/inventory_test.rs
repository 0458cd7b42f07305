mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use common::{dec as decimal, PartSeed, TestApp};

struct Stock {
    customer_id: Uuid,
    bushing: Uuid,
    washer: Uuid,
}

async fn stocked_parts(app: &TestApp) -> Stock {
    let customer_id = app.seed_customer("Nimbus Valves").await;
    let supplier_id = app.seed_supplier("Tapi Forgings", &[]).await;
    let bushing = app
        .seed_part(PartSeed {
            drawing_number: "DRG-BU-11",
            customer_id,
            supplier_id,
            cost_price: "10.00",
            selling_price: "25.00",
            stock: 40,
            processes: vec![],
        })
        .await;
    let washer = app
        .seed_part(PartSeed {
            drawing_number: "DRG-WA-02",
            customer_id,
            supplier_id,
            cost_price: "2.50",
            selling_price: "4.00",
            stock: 3,
            processes: vec![],
        })
        .await;
    Stock {
        customer_id,
        bushing,
        washer,
    }
}

#[tokio::test]
async fn adjustments_move_stock_and_refuse_to_go_negative() {
    let app = TestApp::new().await;
    let s = stocked_parts(&app).await;

    let adjustment = app
        .create(
            "/api/v1/inventory/adjustments",
            json!({
                "part_id": s.bushing,
                "quantity": 10,
                "reason": "Cycle count surplus",
                "adjustment_date": "2024-05-02"
            }),
        )
        .await;
    assert_eq!(adjustment["adjustment_qty"], 10);
    assert_eq!(app.part_stock(s.bushing).await, 50);

    let (status, _) = app
        .post(
            "/api/v1/inventory/adjustments",
            json!({ "part_id": s.washer, "quantity": -5, "reason": "Scrap" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.part_stock(s.washer).await, 3, "failed correction leaves stock alone");

    let (status, _) = app
        .post(
            "/api/v1/inventory/adjustments",
            json!({ "part_id": s.washer, "quantity": 0, "reason": "Nothing" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/v1/inventory/adjustments",
            json!({ "part_id": Uuid::new_v4(), "quantity": 1, "reason": "Found" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.create(
        "/api/v1/inventory/adjustments",
        json!({ "part_id": s.washer, "quantity": -3, "reason": "Scrap", "adjustment_date": "2024-05-03" }),
    )
    .await;
    assert_eq!(app.part_stock(s.washer).await, 0);

    let (status, list) = app
        .get(&format!("/api/v1/inventory/adjustments?part_id={}", s.bushing))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"]["total"], 1);
    let (_, all) = app.get("/api/v1/inventory/adjustments").await;
    assert_eq!(all["data"]["total"], 2);
}

#[tokio::test]
async fn overview_values_stock_and_flags_parts_below_threshold() {
    let app = TestApp::new().await;
    let s = stocked_parts(&app).await;

    let (status, overview) = app.get("/api/v1/inventory?threshold=5").await;
    assert_eq!(status, StatusCode::OK);
    let overview = &overview["data"];
    assert_eq!(overview["threshold"], 5);
    assert_eq!(decimal(&overview["total_valuation"]), dec!(407.50));
    assert_eq!(overview["low_stock_count"], 1);
    let flagged: Vec<&str> = overview["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter(|line| line["low_stock"] == true)
        .filter_map(|line| line["part_id"].as_str())
        .collect();
    assert_eq!(flagged, vec![s.washer.to_string().as_str()]);

    let (_, low) = app.get("/api/v1/inventory/low-stock?threshold=50").await;
    let low = low["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(low.len(), 2);
    assert_eq!(low[0]["part_id"], s.washer.to_string(), "lowest stock first");
    assert_eq!(decimal(&low[1]["stock_value"]), dec!(400.00));

    let (_, low) = app.get("/api/v1/inventory/low-stock?threshold=1").await;
    assert_eq!(low["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn movements_list_receipts_shipments_and_corrections() {
    let app = TestApp::new().await;
    let s = stocked_parts(&app).await;

    app.create(
        "/api/v1/inventory/adjustments",
        json!({ "part_id": s.bushing, "quantity": 6, "reason": "Recount", "adjustment_date": "2024-05-02" }),
    )
    .await;
    app.create(
        "/api/v1/inventory/adjustments",
        json!({ "part_id": s.bushing, "quantity": -2, "reason": "Damaged", "adjustment_date": "2024-05-02" }),
    )
    .await;
    app.create(
        "/api/v1/inventory/adjustments",
        json!({ "part_id": s.bushing, "quantity": 1, "reason": "Found", "adjustment_date": "2024-04-20" }),
    )
    .await;

    let (status, body) = app
        .get(&format!("/api/v1/parts/{}/movements", s.bushing))
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = &body["data"];
    assert_eq!(history["current_stock"], 45);
    let movements = history["movements"].as_array().expect("movements");
    assert_eq!(movements.len(), 3);
    assert!(movements.iter().all(|m| m["kind"] == "correction"));
    assert_eq!(movements[2]["date"], "2024-04-20");
    assert_eq!(
        history["daily_summary"],
        json!([
            { "date": "2024-05-02", "inward": 6, "outward": 2 },
            { "date": "2024-04-20", "inward": 1, "outward": 0 }
        ])
    );

    let (status, _) = app
        .get(&format!("/api/v1/parts/{}/movements", Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_and_summary_report_reflect_orders() {
    let app = TestApp::new().await;
    let s = stocked_parts(&app).await;

    let order = app
        .seed_sales_order(s.customer_id, &[(s.bushing, 4), (s.washer, 10)])
        .await;
    assert_eq!(decimal(&order["total_amount"]), dec!(140.00));
    let (status, _) = app
        .post(
            &format!("/api/v1/sales-orders/{}/purchase-orders", order["id"].as_str().unwrap_or_default()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, dashboard) = app.get("/api/v1/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    let dashboard = &dashboard["data"];
    assert_eq!(dashboard["sales_order_count"], 1);
    assert_eq!(dashboard["purchase_order_count"], 1);
    assert_eq!(dashboard["goods_receipt_count"], 0);
    assert_eq!(dashboard["recent_sales_orders"].as_array().map(Vec::len), Some(1));
    assert_eq!(dashboard["open_purchase_orders"].as_array().map(Vec::len), Some(1));

    let (status, report) = app.get("/api/v1/reports/summary").await;
    assert_eq!(status, StatusCode::OK);
    let report = &report["data"];
    assert_eq!(decimal(&report["total_sales"]), dec!(140.00));
    assert_eq!(decimal(&report["total_purchases"]), dec!(65.00));
    assert_eq!(decimal(&report["net_position"]), dec!(75.00));
    assert_eq!(report["top_customers"][0]["id"], s.customer_id.to_string());
    assert_eq!(report["top_suppliers"].as_array().map(Vec::len), Some(1));
}
