use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::TransactionNumber)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::TransactionType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::Status)
                            .string_len(20)
                            .not_null()
                            .default("completed"),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::ProductId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::Quantity)
                            .decimal_len(12, 3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::UnitCost)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::TotalValue)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::FromLocationId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::FromLocationName)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(StockTransactions::ToLocationId).uuid().null())
                    .col(
                        ColumnDef::new(StockTransactions::ToLocationName)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(StockTransactions::ProjectId).uuid().null())
                    .col(
                        ColumnDef::new(StockTransactions::ProjectName)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::TransactionDoneBy)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::TransactionDoneById)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::TransactionDoneByEmail)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::ApprovalRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::ApprovedBy)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(StockTransactions::ApprovedById).uuid().null())
                    .col(
                        ColumnDef::new(StockTransactions::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::StockBefore)
                            .decimal_len(12, 3)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::StockAfter)
                            .decimal_len(12, 3)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::ReferenceNumber)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::BatchNumber)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::SerialNumbers)
                            .json_binary()
                            .null(),
                    )
                    .col(ColumnDef::new(StockTransactions::ExpiryDate).date().null())
                    .col(ColumnDef::new(StockTransactions::Notes).text().null())
                    .col(ColumnDef::new(StockTransactions::Reason).text().null())
                    .col(
                        ColumnDef::new(StockTransactions::Attachments)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::ExternalSystemId)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::ExternalSystemName)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::ReversedByTransactionId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::TransactionDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockTransactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_transactions_product")
                            .from(StockTransactions::Table, StockTransactions::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_transactions_from_location")
                            .from(StockTransactions::Table, StockTransactions::FromLocationId)
                            .to(InventoryLocations::Table, InventoryLocations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_transactions_to_location")
                            .from(StockTransactions::Table, StockTransactions::ToLocationId)
                            .to(InventoryLocations::Table, InventoryLocations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_transactions_product_id")
                    .table(StockTransactions::Table)
                    .col(StockTransactions::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_transactions_number")
                    .table(StockTransactions::Table)
                    .col(StockTransactions::TransactionNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_transactions_type")
                    .table(StockTransactions::Table)
                    .col(StockTransactions::TransactionType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_transactions_status")
                    .table(StockTransactions::Table)
                    .col(StockTransactions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_transactions_date")
                    .table(StockTransactions::Table)
                    .col(StockTransactions::TransactionDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_transactions_project_id")
                    .table(StockTransactions::Table)
                    .col(StockTransactions::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_transactions_product_date")
                    .table(StockTransactions::Table)
                    .col(StockTransactions::ProductId)
                    .col(StockTransactions::TransactionDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockTransactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StockTransactions {
    Table,
    Id,
    TransactionNumber,
    TransactionType,
    Status,
    ProductId,
    Quantity,
    UnitCost,
    TotalValue,
    FromLocationId,
    FromLocationName,
    ToLocationId,
    ToLocationName,
    ProjectId,
    ProjectName,
    TransactionDoneBy,
    TransactionDoneById,
    TransactionDoneByEmail,
    ApprovalRequired,
    ApprovedBy,
    ApprovedById,
    ApprovedAt,
    StockBefore,
    StockAfter,
    ReferenceNumber,
    BatchNumber,
    SerialNumbers,
    ExpiryDate,
    Notes,
    Reason,
    Attachments,
    ExternalSystemId,
    ExternalSystemName,
    ReversedByTransactionId,
    TransactionDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum InventoryLocations {
    Table,
    Id,
}
