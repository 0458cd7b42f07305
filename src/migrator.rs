use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_settings_and_users::Migration),
            Box::new(m20240101_000002_create_master_data_tables::Migration),
            Box::new(m20240101_000003_create_sales_order_tables::Migration),
            Box::new(m20240101_000004_create_procurement_tables::Migration),
            Box::new(m20240101_000005_create_invoicing_tables::Migration),
            Box::new(m20240101_000006_create_job_work_and_inventory_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_settings_and_users {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_settings_and_users"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CompanySettings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CompanySettings::Id)
                                .integer()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CompanySettings::Name).string().not_null())
                        .col(ColumnDef::new(CompanySettings::Address).string().not_null())
                        .col(ColumnDef::new(CompanySettings::TaxIdentifier).string().null())
                        .col(
                            ColumnDef::new(CompanySettings::BaseCurrency)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CompanySettings::Country).string().not_null())
                        .col(ColumnDef::new(CompanySettings::SoPrefix).string().not_null())
                        .col(ColumnDef::new(CompanySettings::PoPrefix).string().not_null())
                        .col(ColumnDef::new(CompanySettings::InvPrefix).string().not_null())
                        .col(
                            ColumnDef::new(CompanySettings::SoNextNumber)
                                .integer()
                                .not_null()
                                .default(1001),
                        )
                        .col(
                            ColumnDef::new(CompanySettings::PoNextNumber)
                                .integer()
                                .not_null()
                                .default(1001),
                        )
                        .col(
                            ColumnDef::new(CompanySettings::InvNextNumber)
                                .integer()
                                .not_null()
                                .default(1001),
                        )
                        .col(
                            ColumnDef::new(CompanySettings::IncludeCustomerInPo)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(CompanySettings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::LastLoginAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CompanySettings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CompanySettings {
        Table,
        Id,
        Name,
        Address,
        TaxIdentifier,
        BaseCurrency,
        Country,
        SoPrefix,
        PoPrefix,
        InvPrefix,
        SoNextNumber,
        PoNextNumber,
        InvNextNumber,
        IncludeCustomerInPo,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Name,
        Email,
        PasswordHash,
        Role,
        IsActive,
        CreatedAt,
        LastLoginAt,
    }
}

mod m20240101_000002_create_master_data_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_master_data_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Processes::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Processes::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Processes::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Processes::Description).string().null())
                        .col(
                            ColumnDef::new(Processes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Customers::Code)
                                .string_len(16)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().not_null())
                        .col(ColumnDef::new(Customers::ContactPerson).string().null())
                        .col(ColumnDef::new(Customers::PhoneNumber).string().null())
                        .col(ColumnDef::new(Customers::BillingAddress).string().not_null())
                        .col(ColumnDef::new(Customers::ShippingAddress).string().not_null())
                        .col(ColumnDef::new(Customers::DeliveryAddress).string().not_null())
                        .col(ColumnDef::new(Customers::Country).string().not_null())
                        .col(ColumnDef::new(Customers::Currency).string_len(8).not_null())
                        .col(
                            ColumnDef::new(Customers::CreditPeriod)
                                .integer()
                                .not_null()
                                .default(30),
                        )
                        .col(ColumnDef::new(Customers::AdvanceTerms).string().not_null())
                        .col(
                            ColumnDef::new(Customers::AdvanceBalance)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Customers::TaxIdentifier).string().null())
                        .col(
                            ColumnDef::new(Customers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Suppliers::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Suppliers::Code)
                                .string_len(16)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Email).string().not_null())
                        .col(ColumnDef::new(Suppliers::Address).string().not_null())
                        .col(
                            ColumnDef::new(Suppliers::CreditPeriod)
                                .integer()
                                .not_null()
                                .default(30),
                        )
                        .col(
                            ColumnDef::new(Suppliers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Suppliers::ContactPerson).string().null())
                        .col(ColumnDef::new(Suppliers::PhoneNumber).string().null())
                        .col(ColumnDef::new(Suppliers::TaxIdentifier).string().null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierProcessPrices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierProcessPrices::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(SupplierProcessPrices::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProcessPrices::ProcessId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProcessPrices::Price)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_process_prices_supplier")
                                .from(SupplierProcessPrices::Table, SupplierProcessPrices::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supplier_process_prices_unique")
                        .table(SupplierProcessPrices::Table)
                        .col(SupplierProcessPrices::SupplierId)
                        .col(SupplierProcessPrices::ProcessId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Parts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Parts::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Parts::Sku)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Parts::DrawingNumber).string().not_null())
                        .col(ColumnDef::new(Parts::Name).string().not_null())
                        .col(ColumnDef::new(Parts::Revision).string().not_null())
                        .col(ColumnDef::new(Parts::Description).string().null())
                        .col(ColumnDef::new(Parts::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Parts::PrimarySupplierId).uuid().not_null())
                        .col(ColumnDef::new(Parts::SecondarySupplierId).uuid().null())
                        .col(
                            ColumnDef::new(Parts::CostPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Parts::SellingPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Parts::Stock).integer().not_null().default(0))
                        .col(
                            ColumnDef::new(Parts::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Parts::IsJobWork)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Parts::ManufacturingCondition)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Parts::LeadTimeDays)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Parts::Moq).integer().not_null().default(1))
                        .col(ColumnDef::new(Parts::Uom).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Parts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Parts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_parts_customer_id")
                        .table(Parts::Table)
                        .col(Parts::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PartProcesses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PartProcesses::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PartProcesses::PartId).uuid().not_null())
                        .col(ColumnDef::new(PartProcesses::Position).integer().not_null())
                        .col(ColumnDef::new(PartProcesses::ProcessId).uuid().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_part_processes_part")
                                .from(PartProcesses::Table, PartProcesses::PartId)
                                .to(Parts::Table, Parts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_part_processes_position")
                        .table(PartProcesses::Table)
                        .col(PartProcesses::PartId)
                        .col(PartProcesses::Position)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PartPriceHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PartPriceHistory::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PartPriceHistory::PartId).uuid().not_null())
                        .col(
                            ColumnDef::new(PartPriceHistory::EffectiveDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartPriceHistory::CostPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartPriceHistory::SellingPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartPriceHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_part_price_history_part")
                                .from(PartPriceHistory::Table, PartPriceHistory::PartId)
                                .to(Parts::Table, Parts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Tooling::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Tooling::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Tooling::AssetNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Tooling::Name).string().not_null())
                        .col(ColumnDef::new(Tooling::PartId).uuid().not_null())
                        .col(ColumnDef::new(Tooling::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Tooling::SupplierId).uuid().null())
                        .col(ColumnDef::new(Tooling::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Tooling::CustomerValue)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tooling::SupplierValue)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tooling::ExpectedLifeCycles)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tooling::CurrentCycles)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Tooling::LastMaintenanceDate).date().null())
                        .col(
                            ColumnDef::new(Tooling::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tooling::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                Tooling::Table.into_iden(),
                PartPriceHistory::Table.into_iden(),
                PartProcesses::Table.into_iden(),
                Parts::Table.into_iden(),
                SupplierProcessPrices::Table.into_iden(),
                Suppliers::Table.into_iden(),
                Customers::Table.into_iden(),
                Processes::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Processes {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        Code,
        Name,
        Email,
        ContactPerson,
        PhoneNumber,
        BillingAddress,
        ShippingAddress,
        DeliveryAddress,
        Country,
        Currency,
        CreditPeriod,
        AdvanceTerms,
        AdvanceBalance,
        TaxIdentifier,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Code,
        Name,
        Email,
        Address,
        CreditPeriod,
        IsActive,
        ContactPerson,
        PhoneNumber,
        TaxIdentifier,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplierProcessPrices {
        Table,
        Id,
        SupplierId,
        ProcessId,
        Price,
    }

    #[derive(DeriveIden)]
    enum Parts {
        Table,
        Id,
        Sku,
        DrawingNumber,
        Name,
        Revision,
        Description,
        CustomerId,
        PrimarySupplierId,
        SecondarySupplierId,
        CostPrice,
        SellingPrice,
        Stock,
        IsActive,
        IsJobWork,
        ManufacturingCondition,
        LeadTimeDays,
        Moq,
        Uom,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PartProcesses {
        Table,
        Id,
        PartId,
        Position,
        ProcessId,
    }

    #[derive(DeriveIden)]
    enum PartPriceHistory {
        Table,
        Id,
        PartId,
        EffectiveDate,
        CostPrice,
        SellingPrice,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Tooling {
        Table,
        Id,
        AssetNumber,
        Name,
        PartId,
        CustomerId,
        SupplierId,
        Status,
        CustomerValue,
        SupplierValue,
        ExpectedLifeCycles,
        CurrentCycles,
        LastMaintenanceDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_sales_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_sales_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SalesOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SalesOrders::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(SalesOrders::Number)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SalesOrders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrders::CustomerPoNumber).string().not_null())
                        .col(ColumnDef::new(SalesOrders::OrderDate).date().not_null())
                        .col(ColumnDef::new(SalesOrders::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(SalesOrders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(SalesOrders::Currency).string_len(8).not_null())
                        .col(
                            ColumnDef::new(SalesOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_orders_customer_id")
                        .table(SalesOrders::Table)
                        .col(SalesOrders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_orders_status")
                        .table(SalesOrders::Table)
                        .col(SalesOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOrderItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SalesOrderItems::SalesOrderId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrderItems::PartId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(SalesOrderItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderItems::InvoicedQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrderItems::CompletedProcessIndex)
                                .integer()
                                .not_null()
                                .default(-1),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_order_items_order")
                                .from(SalesOrderItems::Table, SalesOrderItems::SalesOrderId)
                                .to(SalesOrders::Table, SalesOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SalesOrders {
        Table,
        Id,
        Number,
        CustomerId,
        CustomerPoNumber,
        OrderDate,
        Status,
        TotalAmount,
        Currency,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SalesOrderItems {
        Table,
        Id,
        SalesOrderId,
        PartId,
        Quantity,
        UnitPrice,
        InvoicedQuantity,
        CompletedProcessIndex,
    }
}

mod m20240101_000004_create_procurement_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_procurement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Number)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::SalesOrderId).uuid().null())
                        .col(ColumnDef::new(PurchaseOrders::OrderDate).date().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Currency).string_len(8).not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_sales_order_id")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::SalesOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_supplier_id")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::SupplierId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::PartId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_order")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceipts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceipts::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::Number)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(GoodsReceipts::PurchaseOrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(GoodsReceipts::SupplierInvoiceNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceipts::ReceivedDate).date().not_null())
                        .col(
                            ColumnDef::new(GoodsReceipts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_goods_receipts_purchase_order_id")
                        .table(GoodsReceipts::Table)
                        .col(GoodsReceipts::PurchaseOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceiptItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceiptItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptItems::GoodsReceiptId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceiptItems::PartId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceiptItems::Quantity).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_goods_receipt_items_receipt")
                                .from(GoodsReceiptItems::Table, GoodsReceiptItems::GoodsReceiptId)
                                .to(GoodsReceipts::Table, GoodsReceipts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                GoodsReceiptItems::Table.into_iden(),
                GoodsReceipts::Table.into_iden(),
                PurchaseOrderItems::Table.into_iden(),
                PurchaseOrders::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        Number,
        SupplierId,
        SalesOrderId,
        OrderDate,
        Status,
        TotalAmount,
        Currency,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderItems {
        Table,
        Id,
        PurchaseOrderId,
        PartId,
        Quantity,
        UnitPrice,
    }

    #[derive(DeriveIden)]
    enum GoodsReceipts {
        Table,
        Id,
        Number,
        PurchaseOrderId,
        SupplierInvoiceNumber,
        ReceivedDate,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum GoodsReceiptItems {
        Table,
        Id,
        GoodsReceiptId,
        PartId,
        Quantity,
    }
}

mod m20240101_000005_create_invoicing_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_invoicing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SupplierInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierInvoices::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SupplierInvoices::InvoiceNumber).string().not_null())
                        .col(ColumnDef::new(SupplierInvoices::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(SupplierInvoices::PurchaseOrderId).uuid().null())
                        .col(ColumnDef::new(SupplierInvoices::JobWorkOrderId).uuid().null())
                        .col(
                            ColumnDef::new(SupplierInvoices::Amount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierInvoices::Currency)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierInvoices::InvoiceDate).date().not_null())
                        .col(ColumnDef::new(SupplierInvoices::DueDate).date().not_null())
                        .col(
                            ColumnDef::new(SupplierInvoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerInvoices::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoices::Number)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(CustomerInvoices::SalesOrderId).uuid().not_null())
                        .col(ColumnDef::new(CustomerInvoices::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(CustomerInvoices::Amount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoices::Currency)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerInvoices::InvoiceDate).date().not_null())
                        .col(ColumnDef::new(CustomerInvoices::DueDate).date().not_null())
                        .col(
                            ColumnDef::new(CustomerInvoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerInvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerInvoiceItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoiceItems::CustomerInvoiceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerInvoiceItems::PartId).uuid().not_null())
                        .col(
                            ColumnDef::new(CustomerInvoiceItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerInvoiceItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_invoice_items_invoice")
                                .from(
                                    CustomerInvoiceItems::Table,
                                    CustomerInvoiceItems::CustomerInvoiceId,
                                )
                                .to(CustomerInvoices::Table, CustomerInvoices::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                CustomerInvoiceItems::Table.into_iden(),
                CustomerInvoices::Table.into_iden(),
                SupplierInvoices::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum SupplierInvoices {
        Table,
        Id,
        InvoiceNumber,
        SupplierId,
        PurchaseOrderId,
        JobWorkOrderId,
        Amount,
        Currency,
        InvoiceDate,
        DueDate,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CustomerInvoices {
        Table,
        Id,
        Number,
        SalesOrderId,
        CustomerId,
        Amount,
        Currency,
        InvoiceDate,
        DueDate,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CustomerInvoiceItems {
        Table,
        Id,
        CustomerInvoiceId,
        PartId,
        Quantity,
        UnitPrice,
    }
}

mod m20240101_000006_create_job_work_and_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_job_work_and_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(JobWorkOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JobWorkOrders::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(JobWorkOrders::Number)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(JobWorkOrders::LinkedPoNumber).string().not_null())
                        .col(ColumnDef::new(JobWorkOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(JobWorkOrders::PartId).uuid().not_null())
                        .col(ColumnDef::new(JobWorkOrders::ProcessId).uuid().not_null())
                        .col(ColumnDef::new(JobWorkOrders::SalesOrderId).uuid().not_null())
                        .col(ColumnDef::new(JobWorkOrders::ProcessIndex).integer().not_null())
                        .col(ColumnDef::new(JobWorkOrders::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(JobWorkOrders::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobWorkOrders::TotalPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobWorkOrders::Currency).string_len(8).not_null())
                        .col(ColumnDef::new(JobWorkOrders::OrderDate).date().not_null())
                        .col(ColumnDef::new(JobWorkOrders::ExpectedDate).date().null())
                        .col(ColumnDef::new(JobWorkOrders::ChallanNumber).string().null())
                        .col(ColumnDef::new(JobWorkOrders::InwardReference).string().null())
                        .col(ColumnDef::new(JobWorkOrders::InwardedDate).date().null())
                        .col(ColumnDef::new(JobWorkOrders::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(JobWorkOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobWorkOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_work_orders_stage")
                        .table(JobWorkOrders::Table)
                        .col(JobWorkOrders::SalesOrderId)
                        .col(JobWorkOrders::PartId)
                        .col(JobWorkOrders::ProcessIndex)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockAdjustments::PartId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::AdjustmentQty)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Reason).string().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::AdjustmentDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_adjustments_part_id")
                        .table(StockAdjustments::Table)
                        .col(StockAdjustments::PartId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockAdjustments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(JobWorkOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum JobWorkOrders {
        Table,
        Id,
        Number,
        LinkedPoNumber,
        SupplierId,
        PartId,
        ProcessId,
        SalesOrderId,
        ProcessIndex,
        Quantity,
        UnitPrice,
        TotalPrice,
        Currency,
        OrderDate,
        ExpectedDate,
        ChallanNumber,
        InwardReference,
        InwardedDate,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockAdjustments {
        Table,
        Id,
        PartId,
        AdjustmentQty,
        Reason,
        AdjustmentDate,
        CreatedAt,
    }
}
