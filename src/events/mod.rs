use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Domain events emitted by services after a successful commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    UserRegistered(Uuid),
    SettingsUpdated,

    ProcessCreated(Uuid),
    PartCreated(Uuid),
    PartUpdated(Uuid),
    PartPriceRevised {
        part_id: Uuid,
        cost_price: Decimal,
        selling_price: Decimal,
    },
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),

    ToolingOnboarded {
        customer_id: Uuid,
        part_id: Uuid,
        asset_ids: Vec<Uuid>,
    },
    ToolingUpdated(Uuid),
    ToolingCyclesRecorded {
        tooling_id: Uuid,
        cycles: i64,
        current_cycles: i64,
    },

    SalesOrderCreated(Uuid),
    SalesOrderDeleted(Uuid),
    SalesOrderStatusChanged {
        sales_order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    PurchaseOrderCreated(Uuid),
    PurchaseOrdersReleased {
        sales_order_id: Uuid,
        purchase_order_ids: Vec<Uuid>,
    },
    PurchaseOrderApproved(Uuid),

    GoodsReceived {
        receipt_id: Uuid,
        purchase_order_id: Uuid,
        total_quantity: i32,
    },

    SupplierInvoiceRecorded {
        invoice_id: Uuid,
        amount: Decimal,
    },
    CustomerInvoiceIssued {
        invoice_id: Uuid,
        sales_order_id: Uuid,
        amount: Decimal,
    },

    JobWorkIssued {
        job_work_order_id: Uuid,
        sales_order_id: Uuid,
        process_index: i32,
    },
    JobWorkStatusChanged {
        job_work_order_id: Uuid,
        new_status: String,
    },
    JobWorkInwarded {
        job_work_order_id: Uuid,
        final_stage: bool,
    },

    StockAdjusted {
        part_id: Uuid,
        adjustment: i32,
        new_stock: i32,
    },
}

impl Event {
    /// Stable label used for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserRegistered(_) => "user_registered",
            Event::SettingsUpdated => "settings_updated",
            Event::ProcessCreated(_) => "process_created",
            Event::PartCreated(_) => "part_created",
            Event::PartUpdated(_) => "part_updated",
            Event::PartPriceRevised { .. } => "part_price_revised",
            Event::CustomerCreated(_) => "customer_created",
            Event::CustomerUpdated(_) => "customer_updated",
            Event::SupplierCreated(_) => "supplier_created",
            Event::SupplierUpdated(_) => "supplier_updated",
            Event::ToolingOnboarded { .. } => "tooling_onboarded",
            Event::ToolingUpdated(_) => "tooling_updated",
            Event::ToolingCyclesRecorded { .. } => "tooling_cycles_recorded",
            Event::SalesOrderCreated(_) => "sales_order_created",
            Event::SalesOrderDeleted(_) => "sales_order_deleted",
            Event::SalesOrderStatusChanged { .. } => "sales_order_status_changed",
            Event::PurchaseOrderCreated(_) => "purchase_order_created",
            Event::PurchaseOrdersReleased { .. } => "purchase_orders_released",
            Event::PurchaseOrderApproved(_) => "purchase_order_approved",
            Event::GoodsReceived { .. } => "goods_received",
            Event::SupplierInvoiceRecorded { .. } => "supplier_invoice_recorded",
            Event::CustomerInvoiceIssued { .. } => "customer_invoice_issued",
            Event::JobWorkIssued { .. } => "job_work_issued",
            Event::JobWorkStatusChanged { .. } => "job_work_status_changed",
            Event::JobWorkInwarded { .. } => "job_work_inwarded",
            Event::StockAdjusted { .. } => "stock_adjusted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Queues an event for the background processor
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel until every sender is dropped
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        let name = event.name();
        counter!("scm.events.processed", 1, "event" => name);

        match &event {
            Event::GoodsReceived {
                receipt_id,
                purchase_order_id,
                total_quantity,
            } => {
                info!(%receipt_id, %purchase_order_id, total_quantity, "goods received");
            }
            Event::JobWorkInwarded {
                job_work_order_id,
                final_stage,
            } => {
                info!(%job_work_order_id, final_stage, "job work inwarded");
            }
            Event::StockAdjusted {
                part_id,
                adjustment,
                new_stock,
            } => {
                info!(%part_id, adjustment, new_stock, "stock adjusted");
            }
            other => debug!(event = name, payload = ?other, "event processed"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::SalesOrderCreated(id)).await.unwrap();
        sender.send(Event::SettingsUpdated).await.unwrap();

        assert_eq!(rx.recv().await, Some(Event::SalesOrderCreated(id)));
        assert_eq!(rx.recv().await, Some(Event::SettingsUpdated));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::SettingsUpdated).await.is_err());
    }

    #[tokio::test]
    async fn processor_exits_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(process_events(rx));
        tx.send(Event::PartCreated(Uuid::new_v4())).await.unwrap();
        drop(tx);
        handle.await.unwrap();
    }
}
