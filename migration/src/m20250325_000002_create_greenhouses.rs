use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Greenhouses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Greenhouses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Greenhouses::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Greenhouses::Location).text())
                    .col(
                        ColumnDef::new(Greenhouses::Size)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Greenhouses::Status)
                            .string_len(32)
                            .not_null()
                            .default("inactive"),
                    )
                    .col(
                        ColumnDef::new(Greenhouses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Greenhouses::LastUpdated)
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
                    .table(GrowingCycles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GrowingCycles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GrowingCycles::GreenhouseId).uuid().not_null())
                    .col(
                        ColumnDef::new(GrowingCycles::CropName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GrowingCycles::SeedType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(GrowingCycles::PlantingDate).date().not_null())
                    .col(
                        ColumnDef::new(GrowingCycles::ExpectedHarvestDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GrowingCycles::ActualHarvestDate).date())
                    .col(
                        ColumnDef::new(GrowingCycles::Status)
                            .string_len(32)
                            .not_null()
                            .default("germination"),
                    )
                    .col(
                        ColumnDef::new(GrowingCycles::Stage)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(GrowingCycles::StageName)
                            .string_len(50)
                            .not_null()
                            .default("Germination"),
                    )
                    .col(ColumnDef::new(GrowingCycles::TerminationReason).string_len(32))
                    .col(ColumnDef::new(GrowingCycles::Notes).text())
                    .col(
                        ColumnDef::new(GrowingCycles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(GrowingCycles::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_growing_cycles_greenhouse_id")
                            .from(GrowingCycles::Table, GrowingCycles::GreenhouseId)
                            .to(Greenhouses::Table, Greenhouses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_growing_cycles_greenhouse_id")
                    .table(GrowingCycles::Table)
                    .col(GrowingCycles::GreenhouseId)
                    .to_owned(),
            )
            .await?;

        // Partial unique index: both PostgreSQL and SQLite accept this form
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_growing_cycles_one_open_per_greenhouse \
                 ON growing_cycles (greenhouse_id) \
                 WHERE status NOT IN ('completed', 'terminated')",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WeeklyHarvests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeeklyHarvests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WeeklyHarvests::GrowingCycleId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyHarvests::WeekNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WeeklyHarvests::HarvestDate).date().not_null())
                    .col(
                        ColumnDef::new(WeeklyHarvests::Weight)
                            .decimal_len(12, 3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyHarvests::Quality)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WeeklyHarvests::Notes).text())
                    .col(
                        ColumnDef::new(WeeklyHarvests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WeeklyHarvests::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weekly_harvests_growing_cycle_id")
                            .from(WeeklyHarvests::Table, WeeklyHarvests::GrowingCycleId)
                            .to(GrowingCycles::Table, GrowingCycles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MaintenanceActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaintenanceActivities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceActivities::GreenhouseId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceActivities::ActivityType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceActivities::Schedule)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceActivities::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(MaintenanceActivities::ScheduledDate).date())
                    .col(ColumnDef::new(MaintenanceActivities::Description).text())
                    .col(
                        ColumnDef::new(MaintenanceActivities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MaintenanceActivities::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_activities_greenhouse_id")
                            .from(
                                MaintenanceActivities::Table,
                                MaintenanceActivities::GreenhouseId,
                            )
                            .to(Greenhouses::Table, Greenhouses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MaintenanceActivities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeeklyHarvests::Table).to_owned())
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS idx_growing_cycles_one_open_per_greenhouse")
            .await?;
        manager
            .drop_table(Table::drop().table(GrowingCycles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Greenhouses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Greenhouses {
    Table,
    Id,
    Name,
    Location,
    Size,
    Status,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum GrowingCycles {
    Table,
    Id,
    GreenhouseId,
    CropName,
    SeedType,
    PlantingDate,
    ExpectedHarvestDate,
    ActualHarvestDate,
    Status,
    Stage,
    StageName,
    TerminationReason,
    Notes,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum WeeklyHarvests {
    Table,
    Id,
    GrowingCycleId,
    WeekNumber,
    HarvestDate,
    Weight,
    Quality,
    Notes,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum MaintenanceActivities {
    Table,
    Id,
    GreenhouseId,
    ActivityType,
    Schedule,
    Status,
    ScheduledDate,
    Description,
    CreatedAt,
    LastUpdated,
}
