use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Products::Sku)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Products::Description).text().null())
                    .col(ColumnDef::new(Products::Category).string_len(100).null())
                    .col(
                        ColumnDef::new(Products::UnitOfMeasure)
                            .string_len(50)
                            .not_null()
                            .default("unit"),
                    )
                    .col(
                        ColumnDef::new(Products::CurrentStock)
                            .decimal_len(12, 3)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::MinStockLevel)
                            .decimal_len(12, 3)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Products::MaxStockLevel)
                            .decimal_len(12, 3)
                            .null(),
                    )
                    .col(ColumnDef::new(Products::UnitCost).decimal_len(12, 2).null())
                    .col(ColumnDef::new(Products::Supplier).string_len(255).null())
                    .col(ColumnDef::new(Products::Location).string_len(255).null())
                    .col(
                        ColumnDef::new(Products::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Products::CreatedBy).string_len(255).null())
                    .col(ColumnDef::new(Products::CreatedById).uuid().null())
                    .col(
                        ColumnDef::new(Products::CreatedByEmail)
                            .string_len(255)
                            .null(),
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
            .create_index(
                Index::create()
                    .name("idx_products_is_active")
                    .table(Products::Table)
                    .col(Products::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_category")
                    .table(Products::Table)
                    .col(Products::Category)
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
    Sku,
    Name,
    Description,
    Category,
    UnitOfMeasure,
    CurrentStock,
    MinStockLevel,
    MaxStockLevel,
    UnitCost,
    Supplier,
    Location,
    IsActive,
    CreatedBy,
    CreatedById,
    CreatedByEmail,
    CreatedAt,
    UpdatedAt,
}
