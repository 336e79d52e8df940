//! Create charging_sessions table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChargingSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChargingSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChargingSessions::StartPercentage)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChargingSessions::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChargingSessions::EndPercentage).integer())
                    .col(ColumnDef::new(ChargingSessions::EndTime).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Listing and open-session lookup both order by start time
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_charging_sessions_start_time")
                    .table(ChargingSessions::Table)
                    .col(ChargingSessions::StartTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChargingSessions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ChargingSessions {
    Table,
    Id,
    StartPercentage,
    StartTime,
    EndPercentage,
    EndTime,
}
