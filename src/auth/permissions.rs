//! Permission strings checked by the route guards.
//!
//! Permissions are `resource:action` pairs. Admins bypass every check;
//! regular users receive [`user_role_permissions`].

pub mod consts {
    pub const SETTINGS_READ: &str = "settings:read";
    pub const SETTINGS_UPDATE: &str = "settings:update";
    pub const USERS_MANAGE: &str = "users:manage";

    pub const PROCESSES_READ: &str = "processes:read";
    pub const PROCESSES_CREATE: &str = "processes:create";

    pub const PARTS_READ: &str = "parts:read";
    pub const PARTS_CREATE: &str = "parts:create";
    pub const PARTS_UPDATE: &str = "parts:update";

    pub const CUSTOMERS_READ: &str = "customers:read";
    pub const CUSTOMERS_CREATE: &str = "customers:create";
    pub const CUSTOMERS_UPDATE: &str = "customers:update";

    pub const SUPPLIERS_READ: &str = "suppliers:read";
    pub const SUPPLIERS_CREATE: &str = "suppliers:create";
    pub const SUPPLIERS_UPDATE: &str = "suppliers:update";

    pub const TOOLING_READ: &str = "tooling:read";
    pub const TOOLING_CREATE: &str = "tooling:create";
    pub const TOOLING_UPDATE: &str = "tooling:update";

    pub const SALES_ORDERS_READ: &str = "salesorders:read";
    pub const SALES_ORDERS_CREATE: &str = "salesorders:create";
    pub const SALES_ORDERS_DELETE: &str = "salesorders:delete";

    pub const PURCHASE_ORDERS_READ: &str = "purchaseorders:read";
    pub const PURCHASE_ORDERS_CREATE: &str = "purchaseorders:create";
    pub const PURCHASE_ORDERS_APPROVE: &str = "purchaseorders:approve";

    pub const RECEIPTS_READ: &str = "receipts:read";
    pub const RECEIPTS_CREATE: &str = "receipts:create";

    pub const INVOICES_READ: &str = "invoices:read";
    pub const INVOICES_CREATE: &str = "invoices:create";

    pub const JOB_WORK_READ: &str = "jobwork:read";
    pub const JOB_WORK_CREATE: &str = "jobwork:create";
    pub const JOB_WORK_UPDATE: &str = "jobwork:update";

    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_ADJUST: &str = "inventory:adjust";

    pub const REPORTS_READ: &str = "reports:read";
}

use consts::*;

/// Every permission known to the service
pub const ALL_PERMISSIONS: &[&str] = &[
    SETTINGS_READ,
    SETTINGS_UPDATE,
    USERS_MANAGE,
    PROCESSES_READ,
    PROCESSES_CREATE,
    PARTS_READ,
    PARTS_CREATE,
    PARTS_UPDATE,
    CUSTOMERS_READ,
    CUSTOMERS_CREATE,
    CUSTOMERS_UPDATE,
    SUPPLIERS_READ,
    SUPPLIERS_CREATE,
    SUPPLIERS_UPDATE,
    TOOLING_READ,
    TOOLING_CREATE,
    TOOLING_UPDATE,
    SALES_ORDERS_READ,
    SALES_ORDERS_CREATE,
    SALES_ORDERS_DELETE,
    PURCHASE_ORDERS_READ,
    PURCHASE_ORDERS_CREATE,
    PURCHASE_ORDERS_APPROVE,
    RECEIPTS_READ,
    RECEIPTS_CREATE,
    INVOICES_READ,
    INVOICES_CREATE,
    JOB_WORK_READ,
    JOB_WORK_CREATE,
    JOB_WORK_UPDATE,
    INVENTORY_READ,
    INVENTORY_ADJUST,
    REPORTS_READ,
];

const ADMIN_ONLY: &[&str] = &[SETTINGS_UPDATE, USERS_MANAGE];

/// Permissions granted to the `user` role
pub fn user_role_permissions() -> Vec<String> {
    ALL_PERMISSIONS
        .iter()
        .filter(|p| !ADMIN_ONLY.contains(p))
        .map(|p| p.to_string())
        .collect()
}

/// Permissions granted to the `admin` role
pub fn admin_role_permissions() -> Vec<String> {
    ALL_PERMISSIONS.iter().map(|p| p.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_role_excludes_admin_only_permissions() {
        let perms = user_role_permissions();
        assert!(!perms.iter().any(|p| p == SETTINGS_UPDATE));
        assert!(!perms.iter().any(|p| p == USERS_MANAGE));
        assert!(perms.iter().any(|p| p == SALES_ORDERS_CREATE));
        assert_eq!(perms.len(), ALL_PERMISSIONS.len() - 2);
    }
}
