use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_catalog_tables::Migration),
            Box::new(m20250901_000002_create_purchase_order_tables::Migration),
            Box::new(m20250901_000003_create_inventory_movements_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250901_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string_len(150).not_null())
                        .col(
                            ColumnDef::new(Products::UnitOfMeasure)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::StandardCost)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::SuggestedPrice)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::Barcode)
                                .string_len(50)
                                .null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::Code)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Warehouses::Address).string_len(200).null())
                        .col(
                            ColumnDef::new(Warehouses::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::UpdatedAt)
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
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string_len(150).not_null())
                        .col(
                            ColumnDef::new(Suppliers::TaxId)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Email).string_len(150).null())
                        .col(
                            ColumnDef::new(Suppliers::LeadTimeDays)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Suppliers::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
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

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        Sku,
        Name,
        UnitOfMeasure,
        StandardCost,
        SuggestedPrice,
        Barcode,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Warehouses {
        Table,
        Id,
        Code,
        Name,
        Address,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Suppliers {
        Table,
        Id,
        Name,
        TaxId,
        Email,
        LeadTimeDays,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250901_000002_create_purchase_order_tables {
    use sea_orm_migration::prelude::*;

    use super::m20250901_000001_create_catalog_tables::{Products, Suppliers, Warehouses};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000002_create_purchase_order_tables"
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
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderNumber)
                                .string_len(30)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::IssueDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::ExpectedDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Status)
                                .small_integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(PurchaseOrders::Status).between(0, 4)),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Currency)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Notes).string_len(500).null())
                        .col(
                            ColumnDef::new(PurchaseOrders::ReceivingWarehouseId)
                                .big_integer()
                                .null(),
                        )
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
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_supplier")
                                .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_receiving_warehouse")
                                .from(PurchaseOrders::Table, PurchaseOrders::ReceivingWarehouseId)
                                .to(Warehouses::Table, Warehouses::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::QuantityOrdered)
                                .decimal_len(16, 2)
                                .not_null()
                                .check(Expr::col(PurchaseOrderLines::QuantityOrdered).gt(0)),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::QuantityReceived)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0)
                                .check(Expr::col(PurchaseOrderLines::QuantityReceived).gte(0)),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UnitCost)
                                .decimal_len(16, 2)
                                .not_null()
                                .check(Expr::col(PurchaseOrderLines::UnitCost).gte(0)),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::TaxPct)
                                .decimal_len(5, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::DiscountPct)
                                .decimal_len(5, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_lines_order")
                                .from(
                                    PurchaseOrderLines::Table,
                                    PurchaseOrderLines::PurchaseOrderId,
                                )
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_lines_product")
                                .from(PurchaseOrderLines::Table, PurchaseOrderLines::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_order_lines_order")
                        .table(PurchaseOrderLines::Table)
                        .col(PurchaseOrderLines::PurchaseOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_order_lines_product")
                        .table(PurchaseOrderLines::Table)
                        .col(PurchaseOrderLines::ProductId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrders {
        Table,
        Id,
        OrderNumber,
        SupplierId,
        IssueDate,
        ExpectedDate,
        Status,
        Currency,
        Notes,
        ReceivingWarehouseId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        ProductId,
        QuantityOrdered,
        QuantityReceived,
        UnitCost,
        TaxPct,
        DiscountPct,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250901_000003_create_inventory_movements_table {
    use sea_orm_migration::prelude::*;

    use super::m20250901_000001_create_catalog_tables::{Products, Warehouses};
    use super::m20250901_000002_create_purchase_order_tables::PurchaseOrderLines;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000003_create_inventory_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::WarehouseId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Direction)
                                .string_len(3)
                                .not_null()
                                .check(
                                    Expr::col(InventoryMovements::Direction)
                                        .is_in(["IN", "OUT"]),
                                ),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Reason)
                                .small_integer()
                                .not_null()
                                .check(Expr::col(InventoryMovements::Reason).between(1, 8)),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Quantity)
                                .decimal_len(16, 2)
                                .not_null()
                                .check(Expr::col(InventoryMovements::Quantity).gt(0)),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::UnitCost)
                                .decimal_len(16, 2)
                                .null()
                                .check(Expr::col(InventoryMovements::UnitCost).gte(0)),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::PurchaseOrderLineId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::OccurredAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::OperatorId)
                                .string_len(450)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Reference)
                                .string_len(60)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Notes)
                                .string_len(400)
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_movements_product")
                                .from(InventoryMovements::Table, InventoryMovements::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_movements_warehouse")
                                .from(InventoryMovements::Table, InventoryMovements::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_movements_po_line")
                                .from(
                                    InventoryMovements::Table,
                                    InventoryMovements::PurchaseOrderLineId,
                                )
                                .to(PurchaseOrderLines::Table, PurchaseOrderLines::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_movements_product_warehouse")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::ProductId)
                        .col(InventoryMovements::WarehouseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_movements_occurred_at")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::OccurredAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_movements_po_line")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::PurchaseOrderLineId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum InventoryMovements {
        Table,
        Id,
        ProductId,
        WarehouseId,
        Direction,
        Reason,
        Quantity,
        UnitCost,
        PurchaseOrderLineId,
        OccurredAt,
        OperatorId,
        Reference,
        Notes,
    }
}
