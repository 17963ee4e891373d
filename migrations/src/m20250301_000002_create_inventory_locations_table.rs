use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryLocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryLocations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryLocations::Name)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(InventoryLocations::Description).text().null())
                    .col(
                        ColumnDef::new(InventoryLocations::LocationType)
                            .string_len(50)
                            .not_null()
                            .default("warehouse"),
                    )
                    .col(
                        ColumnDef::new(InventoryLocations::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(InventoryLocations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLocations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryLocations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InventoryLocations {
    Table,
    Id,
    Name,
    Description,
    LocationType,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
