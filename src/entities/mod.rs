pub mod company_settings;
pub mod customer;
pub mod customer_invoice;
pub mod customer_invoice_item;
pub mod goods_receipt;
pub mod goods_receipt_item;
pub mod job_work_order;
pub mod order_status;
pub mod part;
pub mod part_price_history;
pub mod part_process;
pub mod process;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod sales_order;
pub mod sales_order_item;
pub mod stock_adjustment;
pub mod supplier;
pub mod supplier_invoice;
pub mod supplier_process_price;
pub mod tooling;
pub mod user;

pub use job_work_order::JobWorkStatus;
pub use order_status::OrderStatus;
pub use part::ManufacturingCondition;
pub use tooling::ToolingStatus;
pub use user::UserRole;
