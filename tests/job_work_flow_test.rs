mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{dec as decimal, id_of, PartSeed, TestApp};

struct Route {
    customer_id: Uuid,
    plater: Uuid,
    spare_vendor: Uuid,
    turning: Uuid,
    plating: Uuid,
    shaft: Uuid,
}

async fn two_stage_route(app: &TestApp) -> Route {
    let turning = app.seed_process("CNC Turning").await;
    let plating = app.seed_process("Zinc Plating").await;
    let customer_id = app.seed_customer("Orbit Pumps").await;
    let plater = app
        .seed_supplier("Deccan Surface", &[(turning, "12.50"), (plating, "8.00")])
        .await;
    let spare_vendor = app.seed_supplier("Kaveri Works", &[]).await;
    let shaft = app
        .seed_part(PartSeed {
            drawing_number: "DRG-SH-40",
            customer_id,
            supplier_id: plater,
            cost_price: "40.00",
            selling_price: "95.00",
            stock: 0,
            processes: vec![turning, plating],
        })
        .await;
    Route {
        customer_id,
        plater,
        spare_vendor,
        turning,
        plating,
        shaft,
    }
}

async fn pending(app: &TestApp) -> Vec<Value> {
    let (status, body) = app.get("/api/v1/job-work/pending").await;
    assert_eq!(status, StatusCode::OK);
    body["data"].as_array().cloned().unwrap_or_default()
}

#[tokio::test]
async fn stages_are_issued_and_inwarded_in_route_order() {
    let app = TestApp::new().await;
    let r = two_stage_route(&app).await;
    let order = app.seed_sales_order(r.customer_id, &[(r.shaft, 50)]).await;
    let so_id = id_of(&order);

    let queue = pending(&app).await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["process_index"], 0);
    assert_eq!(queue[0]["total_stages"], 2);
    assert_eq!(queue[0]["process_id"], r.turning.to_string());
    let suggested = queue[0]["suggested_suppliers"].as_array().expect("suppliers");
    assert_eq!(suggested.len(), 1);
    assert_eq!(suggested[0]["supplier_id"], r.plater.to_string());
    assert_eq!(decimal(&suggested[0]["price"]), dec!(12.50));

    let (status, _) = app
        .post(
            "/api/v1/job-work",
            json!({ "sales_order_id": so_id, "part_id": r.shaft, "supplier_id": r.plater, "process_index": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "stage 2 before stage 1");

    let (status, _) = app
        .post(
            "/api/v1/job-work",
            json!({ "sales_order_id": so_id, "part_id": r.shaft, "supplier_id": r.spare_vendor }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no rate and no unit price");

    let first = app
        .create(
            "/api/v1/job-work",
            json!({
                "sales_order_id": so_id,
                "part_id": r.shaft,
                "supplier_id": r.plater,
                "challan_number": "DC-118"
            }),
        )
        .await;
    assert_eq!(first["number"], "JW-000001");
    assert_eq!(first["linked_po_number"], "JW-PO-000001");
    assert_eq!(first["process_index"], 0);
    assert_eq!(first["status"], "Issued");
    assert_eq!(decimal(&first["total_price"]), dec!(625.00));
    let first_id = id_of(&first);

    let (status, _) = app
        .post(
            "/api/v1/job-work",
            json!({ "sales_order_id": so_id, "part_id": r.shaft, "supplier_id": r.plater }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "stage already out");
    assert!(pending(&app).await.is_empty());

    let (status, body) = app
        .put(
            &format!("/api/v1/job-work/{first_id}/status"),
            json!({ "status": "In Process" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "In Process");

    let (status, _) = app
        .put(
            &format!("/api/v1/job-work/{first_id}/status"),
            json!({ "status": "Inwarded" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            &format!("/api/v1/job-work/{first_id}/inward"),
            json!({ "inward_reference": "RC-5521" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "Inwarded");
    assert_eq!(app.part_stock(r.shaft).await, 0, "intermediate stage adds no stock");

    let (status, _) = app
        .post(
            &format!("/api/v1/job-work/{first_id}/inward"),
            json!({ "inward_reference": "RC-5521" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let queue = pending(&app).await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["process_index"], 1);
    assert_eq!(queue[0]["process_id"], r.plating.to_string());

    let second = app
        .create(
            "/api/v1/job-work",
            json!({ "sales_order_id": so_id, "part_id": r.shaft, "supplier_id": r.plater }),
        )
        .await;
    assert_eq!(second["number"], "JW-000002");
    assert_eq!(second["process_index"], 1);
    assert_eq!(decimal(&second["unit_price"]), dec!(8.00));

    let (status, _) = app
        .post(
            &format!("/api/v1/job-work/{}/inward", id_of(&second)),
            json!({ "inward_reference": "RC-5530", "inwarded_date": "2024-02-10" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.part_stock(r.shaft).await, 50);

    let (_, so) = app.get(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(so["data"]["status"], "Received");
    assert!(pending(&app).await.is_empty());

    let (_, orders) = app
        .get(&format!("/api/v1/job-work?sales_order_id={so_id}"))
        .await;
    assert_eq!(orders["data"]["total"], 2);
}

#[tokio::test]
async fn inwarded_job_work_is_billed_once_and_unlocks_customer_invoice() {
    let app = TestApp::new().await;
    let r = two_stage_route(&app).await;
    let order = app.seed_sales_order(r.customer_id, &[(r.shaft, 20)]).await;
    let so_id = id_of(&order);

    let stage_one = app
        .create(
            "/api/v1/job-work",
            json!({ "sales_order_id": so_id, "part_id": r.shaft, "supplier_id": r.plater }),
        )
        .await;
    let stage_one_id = id_of(&stage_one);

    let (status, _) = app
        .post(
            "/api/v1/supplier-invoices/job-work",
            json!({ "job_work_order_id": stage_one_id, "invoice_number": "DS-77" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "not inwarded yet");

    let (status, _) = app
        .post(
            &format!("/api/v1/job-work/{stage_one_id}/inward"),
            json!({ "inward_reference": "RC-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/v1/customer-invoices", json!({ "sales_order_id": so_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "half-processed parts are not billable");

    let stage_two = app
        .create(
            "/api/v1/job-work",
            json!({ "sales_order_id": so_id, "part_id": r.shaft, "supplier_id": r.plater, "unit_price": "9.25" }),
        )
        .await;
    assert_eq!(decimal(&stage_two["total_price"]), dec!(185.00));
    let (status, _) = app
        .post(
            &format!("/api/v1/job-work/{}/inward", id_of(&stage_two)),
            json!({ "inward_reference": "RC-2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, waiting) = app.get("/api/v1/supplier-invoices/job-work/pending").await;
    assert_eq!(waiting["data"].as_array().map(Vec::len), Some(2));

    let bill = app
        .create(
            "/api/v1/supplier-invoices/job-work",
            json!({
                "job_work_order_id": stage_one_id,
                "invoice_number": "DS-77",
                "invoice_date": "2024-01-15"
            }),
        )
        .await;
    assert_eq!(decimal(&bill["amount"]), dec!(250.00));
    assert_eq!(bill["due_date"], "2024-02-14");

    let (status, _) = app
        .post(
            "/api/v1/supplier-invoices/job-work",
            json!({ "job_work_order_id": stage_one_id, "invoice_number": "DS-78" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "one bill per job work order");

    let (_, waiting) = app.get("/api/v1/supplier-invoices/job-work/pending").await;
    let waiting = waiting["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0]["id"], stage_two["id"]);

    let invoice = app
        .create("/api/v1/customer-invoices", json!({ "sales_order_id": so_id }))
        .await;
    assert_eq!(decimal(&invoice["amount"]), dec!(1900.00));

    let (_, so) = app.get(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(so["data"]["status"], "Completed");
}

#[tokio::test]
async fn repeated_lines_of_one_part_move_through_the_route_together() {
    let app = TestApp::new().await;
    let r = two_stage_route(&app).await;
    let pin = app
        .seed_part(PartSeed {
            drawing_number: "DRG-PN-08",
            customer_id: r.customer_id,
            supplier_id: r.plater,
            cost_price: "3.00",
            selling_price: "7.00",
            stock: 0,
            processes: vec![r.turning],
        })
        .await;
    let order = app
        .seed_sales_order(r.customer_id, &[(pin, 5), (pin, 7)])
        .await;
    let so_id = id_of(&order);

    let queue = pending(&app).await;
    assert_eq!(queue.len(), 1, "one queue entry per part");
    assert_eq!(queue[0]["quantity"], 12);

    let batch = app
        .create(
            "/api/v1/job-work",
            json!({ "sales_order_id": so_id, "part_id": pin, "supplier_id": r.plater }),
        )
        .await;
    assert_eq!(batch["quantity"], 12);
    assert_eq!(decimal(&batch["total_price"]), dec!(150.00));
    assert!(pending(&app).await.is_empty());

    let (status, _) = app
        .post(
            &format!("/api/v1/job-work/{}/inward", id_of(&batch)),
            json!({ "inward_reference": "RC-900" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.part_stock(pin).await, 12);
    assert!(pending(&app).await.is_empty(), "both lines are finished");

    let (status, _) = app
        .post(
            "/api/v1/job-work",
            json!({ "sales_order_id": so_id, "part_id": pin, "supplier_id": r.plater }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "route already complete");

    let (_, so) = app.get(&format!("/api/v1/sales-orders/{so_id}")).await;
    assert_eq!(so["data"]["status"], "Received");
}
