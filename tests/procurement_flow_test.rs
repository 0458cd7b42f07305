mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{dec as decimal, id_of, PartSeed, TestApp};

struct Catalog {
    customer_id: uuid::Uuid,
    supplier_a: uuid::Uuid,
    supplier_b: uuid::Uuid,
    bracket: uuid::Uuid,
    housing: uuid::Uuid,
    flange: uuid::Uuid,
}

async fn catalog(app: &TestApp) -> Catalog {
    let customer_id = app.seed_customer("Apex Motors").await;
    let supplier_a = app.seed_supplier("Sharada Castings", &[]).await;
    let supplier_b = app.seed_supplier("Vega Forge", &[]).await;
    let bracket = app
        .seed_part(PartSeed {
            drawing_number: "DRG-100",
            customer_id,
            supplier_id: supplier_a,
            cost_price: "40.00",
            selling_price: "55.00",
            stock: 0,
            processes: vec![],
        })
        .await;
    let housing = app
        .seed_part(PartSeed {
            drawing_number: "DRG-200",
            customer_id,
            supplier_id: supplier_b,
            cost_price: "120.00",
            selling_price: "150.00",
            stock: 0,
            processes: vec![],
        })
        .await;
    let flange = app
        .seed_part(PartSeed {
            drawing_number: "DRG-300",
            customer_id,
            supplier_id: supplier_a,
            cost_price: "10.00",
            selling_price: "14.50",
            stock: 0,
            processes: vec![],
        })
        .await;
    Catalog {
        customer_id,
        supplier_a,
        supplier_b,
        bracket,
        housing,
        flange,
    }
}

#[tokio::test]
async fn sales_order_through_purchase_receipt_and_invoices() {
    let app = TestApp::new().await;
    let c = catalog(&app).await;

    let order = app
        .seed_sales_order(c.customer_id, &[(c.bracket, 10), (c.housing, 4), (c.flange, 20)])
        .await;
    let so_id = id_of(&order);
    assert_eq!(order["number"], "SO-GK-1001");
    assert_eq!(order["status"], "Confirmed");
    assert_eq!(order["currency"], "INR");
    assert_eq!(
        decimal(&order["total_amount"]),
        dec!(550.00) + dec!(600.00) + dec!(290.00)
    );

    // Invoicing a confirmed order is refused
    let (status, _) = app
        .post(
            "/api/v1/customer-invoices",
            json!({ "sales_order_id": so_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(&format!("/api/v1/sales-orders/{so_id}/purchase-orders"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let pos = body["data"].as_array().expect("purchase orders").clone();
    assert_eq!(pos.len(), 2, "one purchase order per primary supplier");
    assert_eq!(pos[0]["number"], "PO-GK-1001");
    assert_eq!(pos[0]["supplier_id"], c.supplier_a.to_string());
    assert_eq!(pos[0]["status"], "Pending Approval");
    assert_eq!(pos[0]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(decimal(&pos[0]["total_amount"]), dec!(600.00));
    assert_eq!(pos[1]["number"], "PO-GK-1002");
    assert_eq!(pos[1]["supplier_id"], c.supplier_b.to_string());

    let (_, so) = app.get(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(so["data"]["status"], "PO Released");

    // Raising purchase orders twice is refused
    let (status, _) = app
        .post(&format!("/api/v1/sales-orders/{so_id}/purchase-orders"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let po_a = id_of(&pos[0]);
    let po_b = id_of(&pos[1]);

    // Receiving before approval is refused
    let (status, _) = app
        .post(
            "/api/v1/receipts",
            json!({
                "purchase_order_id": po_a,
                "supplier_invoice_number": "SC/1",
                "items": [{ "part_id": c.bracket, "quantity": 10 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for po in [po_a, po_b] {
        let (status, body) = app
            .post(&format!("/api/v1/purchase-orders/{po}/approve"), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["status"], "PO Released");
    }
    let (status, _) = app
        .post(&format!("/api/v1/purchase-orders/{po_a}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "approval is one-shot");

    // Partial receipt; the over-delivered flange line is capped at its balance
    let grn = app
        .create(
            "/api/v1/receipts",
            json!({
                "purchase_order_id": po_a,
                "supplier_invoice_number": "SC/1",
                "items": [
                    { "part_id": c.bracket, "quantity": 6 },
                    { "part_id": c.flange, "quantity": 25 }
                ]
            }),
        )
        .await;
    assert_eq!(grn["number"], "GRN-000001");
    let received: Vec<i64> = grn["items"]
        .as_array()
        .expect("grn items")
        .iter()
        .map(|i| i["quantity"].as_i64().unwrap_or_default())
        .collect();
    assert_eq!(received, vec![6, 20]);
    assert_eq!(app.part_stock(c.bracket).await, 6);
    assert_eq!(app.part_stock(c.flange).await, 20);

    let (_, po) = app.get(&format!("/api/v1/purchase-orders/{po_a}")).await;
    assert_eq!(po["data"]["status"], "Partially Received");
    let bracket_line = po["data"]["items"]
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .find(|i| i["part_id"] == c.bracket.to_string())
                .cloned()
        })
        .expect("bracket line");
    assert_eq!(bracket_line["received_quantity"], 6);
    assert_eq!(bracket_line["balance_quantity"], 4);

    // Invoiceable quantities follow receipts
    let (_, lines) = app
        .get(&format!("/api/v1/sales-orders/{so_id}/invoiceable"))
        .await;
    let available: Vec<(String, i64)> = lines["data"]
        .as_array()
        .expect("invoiceable lines")
        .iter()
        .map(|l| {
            (
                l["part_id"].as_str().unwrap_or_default().to_string(),
                l["available_quantity"].as_i64().unwrap_or_default(),
            )
        })
        .collect();
    assert!(available.contains(&(c.bracket.to_string(), 6)));
    assert!(available.contains(&(c.housing.to_string(), 0)));
    assert!(available.contains(&(c.flange.to_string(), 20)));

    app.create(
        "/api/v1/receipts",
        json!({
            "purchase_order_id": po_a,
            "supplier_invoice_number": "SC/2",
            "items": [{ "part_id": c.bracket, "quantity": 4 }]
        }),
    )
    .await;
    let (status, _) = app
        .post(
            "/api/v1/receipts",
            json!({
                "purchase_order_id": po_a,
                "supplier_invoice_number": "SC/3",
                "items": [{ "part_id": c.bracket, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "received orders take no more goods");

    app.create(
        "/api/v1/receipts",
        json!({
            "purchase_order_id": po_b,
            "supplier_invoice_number": "VF/88",
            "items": [{ "part_id": c.housing, "quantity": 4 }]
        }),
    )
    .await;

    let (_, so) = app.get(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(so["data"]["status"], "Received");

    // Supplier bill
    let bill = app
        .create(
            "/api/v1/supplier-invoices",
            json!({
                "purchase_order_id": po_a,
                "invoice_number": "SC-INV-9",
                "invoice_date": "2024-03-01"
            }),
        )
        .await;
    assert_eq!(decimal(&bill["amount"]), dec!(600.00));
    assert_eq!(bill["due_date"], "2024-03-31");
    let (status, _) = app
        .post(
            "/api/v1/supplier-invoices",
            json!({ "purchase_order_id": po_a, "invoice_number": "SC-INV-10" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "one bill per purchase order");
    let (_, po) = app.get(&format!("/api/v1/purchase-orders/{po_a}")).await;
    assert_eq!(po["data"]["status"], "Invoiced");

    // Partial customer invoice, then the remainder
    let first = app
        .create(
            "/api/v1/customer-invoices",
            json!({
                "sales_order_id": so_id,
                "invoice_date": "2024-03-05",
                "items": [{ "part_id": c.bracket, "quantity": 5 }]
            }),
        )
        .await;
    assert_eq!(first["number"], "INV-GK-1001");
    assert_eq!(decimal(&first["amount"]), dec!(275.00));
    assert_eq!(first["due_date"], "2024-04-19");
    assert_eq!(app.part_stock(c.bracket).await, 5);

    let (_, so) = app.get(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(so["data"]["status"], "Invoiced");

    let second = app
        .create(
            "/api/v1/customer-invoices",
            json!({ "sales_order_id": so_id }),
        )
        .await;
    assert_eq!(second["number"], "INV-GK-1002");
    assert_eq!(
        decimal(&second["amount"]),
        dec!(275.00) + dec!(600.00) + dec!(290.00)
    );
    assert_eq!(app.part_stock(c.bracket).await, 0);
    assert_eq!(app.part_stock(c.housing).await, 0);
    assert_eq!(app.part_stock(c.flange).await, 0);

    let (_, so) = app.get(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(so["data"]["status"], "Completed");

    let (status, _) = app
        .post(
            "/api/v1/customer-invoices",
            json!({ "sales_order_id": so_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "completed orders are closed");

    let (_, invoices) = app
        .get(&format!("/api/v1/customer-invoices?sales_order_id={so_id}"))
        .await;
    assert_eq!(invoices["data"]["total"], 2);
}

#[tokio::test]
async fn completed_sales_order_can_be_deleted_only_without_open_purchase_orders() {
    let app = TestApp::new().await;
    let c = catalog(&app).await;

    let order = app.seed_sales_order(c.customer_id, &[(c.housing, 2)]).await;
    let so_id = id_of(&order);

    let (status, _) = app.delete(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "only completed orders go");

    let (_, body) = app
        .post(&format!("/api/v1/sales-orders/{so_id}/purchase-orders"), json!({}))
        .await;
    let po_id = id_of(&body["data"][0]);
    app.post(&format!("/api/v1/purchase-orders/{po_id}/approve"), json!({}))
        .await;
    app.create(
        "/api/v1/receipts",
        json!({
            "purchase_order_id": po_id,
            "supplier_invoice_number": "VF/1",
            "items": [{ "part_id": c.housing, "quantity": 2 }]
        }),
    )
    .await;
    app.create(
        "/api/v1/customer-invoices",
        json!({ "sales_order_id": so_id }),
    )
    .await;

    // Purchase order is still Received, not billed
    let (status, _) = app.delete(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.create(
        "/api/v1/supplier-invoices",
        json!({ "purchase_order_id": po_id, "invoice_number": "VF-INV-1" }),
    )
    .await;

    let (status, _) = app.delete(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Settled documents outlive the order and keep its id
    let (_, invoices) = app
        .get(&format!("/api/v1/customer-invoices?sales_order_id={so_id}"))
        .await;
    assert_eq!(invoices["data"]["total"], 1);
    let (status, po) = app.get(&format!("/api/v1/purchase-orders/{po_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(po["data"]["sales_order_id"], so_id.to_string());
}

#[tokio::test]
async fn manual_purchase_order_needs_an_active_supplier() {
    let app = TestApp::new().await;
    let c = catalog(&app).await;

    let po = app
        .create(
            "/api/v1/purchase-orders",
            json!({
                "supplier_id": c.supplier_b,
                "items": [{ "part_id": c.housing, "quantity": 3, "unit_price": "118.00" }]
            }),
        )
        .await;
    assert_eq!(po["status"], "Pending Approval");
    assert_eq!(decimal(&po["total_amount"]), dec!(354.00));
    assert!(po["sales_order_id"].is_null());

    let (status, _) = app
        .post(
            "/api/v1/purchase-orders",
            json!({
                "supplier_id": uuid::Uuid::new_v4(),
                "items": [{ "part_id": c.housing, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/v1/purchase-orders",
            json!({ "supplier_id": c.supplier_b, "items": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn job_work_parts_are_left_out_of_raised_purchase_orders() {
    let app = TestApp::new().await;
    let c = catalog(&app).await;
    let turning = app.seed_process("CNC Turning").await;
    let spindle = app
        .seed_part(PartSeed {
            drawing_number: "DRG-400",
            customer_id: c.customer_id,
            supplier_id: c.supplier_b,
            cost_price: "30.00",
            selling_price: "70.00",
            stock: 0,
            processes: vec![turning],
        })
        .await;

    let mixed = app
        .seed_sales_order(c.customer_id, &[(c.bracket, 3), (spindle, 6)])
        .await;
    let mixed_id = id_of(&mixed);
    let (status, body) = app
        .post(&format!("/api/v1/sales-orders/{mixed_id}/purchase-orders"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let pos = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(pos.len(), 1, "job-work supplier gets no purchase order");
    assert_eq!(pos[0]["supplier_id"], c.supplier_a.to_string());
    let items = pos[0]["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["part_id"], c.bracket.to_string());
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(decimal(&pos[0]["total_amount"]), dec!(120.00));
    let (_, so) = app.get(&format!("/api/v1/sales-orders/{mixed_id}")).await;
    assert_eq!(so["data"]["status"], "PO Released");

    let job_work_only = app.seed_sales_order(c.customer_id, &[(spindle, 4)]).await;
    let job_work_only_id = id_of(&job_work_only);
    let (status, body) = app
        .post(
            &format!("/api/v1/sales-orders/{job_work_only_id}/purchase-orders"),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
    let (_, so) = app
        .get(&format!("/api/v1/sales-orders/{job_work_only_id}"))
        .await;
    assert_eq!(so["data"]["status"], "PO Released");

    let (status, all) = app.get("/api/v1/purchase-orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["data"]["total"], 1);
}
