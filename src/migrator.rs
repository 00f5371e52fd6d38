use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_unit_types_table::Migration),
            Box::new(m20240301_000002_create_products_table::Migration),
            Box::new(m20240301_000003_create_config_tables::Migration),
            Box::new(m20240301_000004_create_relations_table::Migration),
            Box::new(m20240301_000005_create_inventory_tables::Migration),
            Box::new(m20240301_000006_create_inventory_movements_table::Migration),
            Box::new(m20240301_000007_create_supply_consumption_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_unit_types_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_unit_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(UnitTypes::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(UnitTypes::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(UnitTypes::TenantId).uuid().null())
                        .col(ColumnDef::new(UnitTypes::Name).string().not_null())
                        .col(ColumnDef::new(UnitTypes::Description).string().null())
                        .col(ColumnDef::new(UnitTypes::Category).string().not_null())
                        .col(ColumnDef::new(UnitTypes::BaseUnit).json_binary().not_null())
                        .col(
                            ColumnDef::new(UnitTypes::Conversions)
                                .json_binary()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitTypes::IsSystemDefined)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(UnitTypes::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(UnitTypes::CreatedBy).uuid().null())
                        .col(ColumnDef::new(UnitTypes::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(UnitTypes::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_unit_types_tenant_name")
                        .table(UnitTypes::Table)
                        .col(UnitTypes::TenantId)
                        .col(UnitTypes::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_unit_types_category")
                        .table(UnitTypes::Table)
                        .col(UnitTypes::Category)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UnitTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum UnitTypes {
        Table,
        Id,
        TenantId,
        Name,
        Description,
        Category,
        BaseUnit,
        Conversions,
        IsSystemDefined,
        IsActive,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_products_table"
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
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::TenantId).uuid().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::ProductType).string().not_null())
                        .col(ColumnDef::new(Products::UnitOfMeasure).string().null())
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_tenant_sku")
                        .table(Products::Table)
                        .col(Products::TenantId)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        TenantId,
        Sku,
        Name,
        ProductType,
        UnitOfMeasure,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_config_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_config_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ConsumableConfigs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ConsumableConfigs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ConsumableConfigs::TenantId).uuid().not_null())
                        .col(
                            ColumnDef::new(ConsumableConfigs::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumableConfigs::ConsumableType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumableConfigs::IsReusable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ConsumableConfigs::IsAutoDeducted)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ConsumableConfigs::DefaultQuantityPerUse)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(ConsumableConfigs::UnitTypeId).uuid().null())
                        .col(
                            ColumnDef::new(ConsumableConfigs::DefaultUnit)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ConsumableConfigs::CustomConversions)
                                .json_binary()
                                .null(),
                        )
                        .col(ColumnDef::new(ConsumableConfigs::Notes).string().null())
                        .col(
                            ColumnDef::new(ConsumableConfigs::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(ConsumableConfigs::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(ConsumableConfigs::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumableConfigs::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_consumable_configs_tenant_product")
                        .table(ConsumableConfigs::Table)
                        .col(ConsumableConfigs::TenantId)
                        .col(ConsumableConfigs::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplyConfigs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplyConfigs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplyConfigs::TenantId).uuid().not_null())
                        .col(ColumnDef::new(SupplyConfigs::ProductId).uuid().not_null())
                        .col(ColumnDef::new(SupplyConfigs::SupplyType).string().not_null())
                        .col(ColumnDef::new(SupplyConfigs::UnitTypeId).uuid().null())
                        .col(ColumnDef::new(SupplyConfigs::DefaultUnit).string().null())
                        .col(ColumnDef::new(SupplyConfigs::PurchaseUnit).string().null())
                        .col(ColumnDef::new(SupplyConfigs::StockUnit).string().null())
                        .col(
                            ColumnDef::new(SupplyConfigs::ConsumptionUnit)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConfigs::CustomConversions)
                                .json_binary()
                                .null(),
                        )
                        .col(ColumnDef::new(SupplyConfigs::Notes).string().null())
                        .col(
                            ColumnDef::new(SupplyConfigs::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(SupplyConfigs::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(SupplyConfigs::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConfigs::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supply_configs_tenant_product")
                        .table(SupplyConfigs::Table)
                        .col(SupplyConfigs::TenantId)
                        .col(SupplyConfigs::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplyConfigs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ConsumableConfigs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ConsumableConfigs {
        Table,
        Id,
        TenantId,
        ProductId,
        ConsumableType,
        IsReusable,
        IsAutoDeducted,
        DefaultQuantityPerUse,
        UnitTypeId,
        DefaultUnit,
        CustomConversions,
        Notes,
        IsActive,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplyConfigs {
        Table,
        Id,
        TenantId,
        ProductId,
        SupplyType,
        UnitTypeId,
        DefaultUnit,
        PurchaseUnit,
        StockUnit,
        ConsumptionUnit,
        CustomConversions,
        Notes,
        IsActive,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000004_create_relations_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_relations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductConsumableRelations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductConsumableRelations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::TenantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::ConsumableId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::QuantityRequired)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::IsRequired)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::IsAutoDeducted)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::Priority)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::ApplicableContext)
                                .string()
                                .not_null()
                                .default("always"),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::Notes)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::CreatedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductConsumableRelations::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_relations_tenant_product_consumable")
                        .table(ProductConsumableRelations::Table)
                        .col(ProductConsumableRelations::TenantId)
                        .col(ProductConsumableRelations::ProductId)
                        .col(ProductConsumableRelations::ConsumableId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_relations_tenant_product")
                        .table(ProductConsumableRelations::Table)
                        .col(ProductConsumableRelations::TenantId)
                        .col(ProductConsumableRelations::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(ProductConsumableRelations::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductConsumableRelations {
        Table,
        Id,
        TenantId,
        ProductId,
        ConsumableId,
        QuantityRequired,
        IsRequired,
        IsAutoDeducted,
        Priority,
        ApplicableContext,
        Notes,
        IsActive,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000005_create_inventory_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Inventories::TenantId).uuid().not_null())
                        .col(ColumnDef::new(Inventories::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Inventories::ProductSku).string().not_null())
                        .col(
                            ColumnDef::new(Inventories::TotalQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Inventories::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Inventories::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventories_tenant_product")
                        .table(Inventories::Table)
                        .col(Inventories::TenantId)
                        .col(Inventories::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryLots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryLots::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryLots::InventoryId).uuid().not_null())
                        .col(ColumnDef::new(InventoryLots::LotNumber).string().not_null())
                        .col(
                            ColumnDef::new(InventoryLots::AvailableQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryLots::ReceivedDate).date().not_null())
                        .col(ColumnDef::new(InventoryLots::ExpirationDate).date().null())
                        .col(
                            ColumnDef::new(InventoryLots::CostPrice)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_lots_inventory_lot_number")
                        .table(InventoryLots::Table)
                        .col(InventoryLots::InventoryId)
                        .col(InventoryLots::LotNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_lots_expiration")
                        .table(InventoryLots::Table)
                        .col(InventoryLots::ExpirationDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLots::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Inventories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Inventories {
        Table,
        Id,
        TenantId,
        ProductId,
        ProductSku,
        TotalQuantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryLots {
        Table,
        Id,
        InventoryId,
        LotNumber,
        AvailableQuantity,
        ReceivedDate,
        ExpirationDate,
        CostPrice,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_inventory_movements_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_inventory_movements_table"
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
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::TenantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::InventoryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ProductSku)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::LotNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::UnitCost)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::TotalCost)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryMovements::Reason).string().not_null())
                        .col(
                            ColumnDef::new(InventoryMovements::Reference)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::OrderId).uuid().null())
                        .col(ColumnDef::new(InventoryMovements::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_order")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_inventory")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::InventoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_type")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::MovementType)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryMovements {
        Table,
        Id,
        TenantId,
        InventoryId,
        ProductId,
        ProductSku,
        LotNumber,
        MovementType,
        Quantity,
        UnitCost,
        TotalCost,
        Reason,
        Reference,
        OrderId,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240301_000007_create_supply_consumption_logs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000007_create_supply_consumption_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SupplyConsumptionLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::TenantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::SupplyId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::QuantityConsumed)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::UnitOfMeasure)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::ConsumptionType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::Department)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::ConsumedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::RelatedOrderId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(SupplyConsumptionLogs::Reason).string().null())
                        .col(ColumnDef::new(SupplyConsumptionLogs::Notes).string().null())
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::CostInfo)
                                .json_binary()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::ConsumedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::CreatedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SupplyConsumptionLogs::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supply_logs_tenant_supply")
                        .table(SupplyConsumptionLogs::Table)
                        .col(SupplyConsumptionLogs::TenantId)
                        .col(SupplyConsumptionLogs::SupplyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supply_logs_consumed_at")
                        .table(SupplyConsumptionLogs::Table)
                        .col(SupplyConsumptionLogs::ConsumedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplyConsumptionLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SupplyConsumptionLogs {
        Table,
        Id,
        TenantId,
        SupplyId,
        QuantityConsumed,
        UnitOfMeasure,
        ConsumptionType,
        Department,
        ConsumedBy,
        RelatedOrderId,
        Reason,
        Notes,
        CostInfo,
        ConsumedAt,
        CreatedBy,
        CreatedAt,
    }
}
