use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::CurrentQuantity)
                            .decimal_len(12, 3)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::Unit)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryItems::Concentration).string_len(100))
                    .col(
                        ColumnDef::new(InventoryItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InventoryUsages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryUsages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryUsages::InventoryItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryUsages::GreenhouseId).uuid())
                    .col(
                        ColumnDef::new(InventoryUsages::QuantityUsed)
                            .decimal_len(12, 3)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryUsages::PurposeNote).text())
                    .col(
                        ColumnDef::new(InventoryUsages::UsedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_usages_inventory_item_id")
                            .from(InventoryUsages::Table, InventoryUsages::InventoryItemId)
                            .to(InventoryItems::Table, InventoryItems::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_usages_greenhouse_id")
                            .from(InventoryUsages::Table, InventoryUsages::GreenhouseId)
                            .to(Greenhouses::Table, Greenhouses::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_usages_inventory_item_id")
                    .table(InventoryUsages::Table)
                    .col(InventoryUsages::InventoryItemId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryUsages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InventoryItems {
    Table,
    Id,
    Name,
    CurrentQuantity,
    Unit,
    Concentration,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum InventoryUsages {
    Table,
    Id,
    InventoryItemId,
    GreenhouseId,
    QuantityUsed,
    PurposeNote,
    UsedAt,
}

#[derive(DeriveIden)]
enum Greenhouses {
    Table,
    Id,
}
