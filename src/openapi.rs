use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StockLedger API",
        version = "1.0.0",
        description = r#"
# StockLedger Inventory Ledger API

An append-only stock transaction ledger with a derived stock-level
projection per product.

## Concepts

- **Stock transactions**: Every stock movement is an immutable ledger
  entry (IN, OUT, RETURN, ADJUSTMENT, TRANSFER, DAMAGED, EXPIRED) with
  before/after stock snapshots and a human-readable `TXN-YYYY-MM-NNNN`
  number.
- **Projection**: A product's `current_stock` is maintained by completed
  ledger entries only; it is never edited directly.
- **Corrections**: Mistakes are never edited in place. A reversal appends
  a compensating entry that links back to the original.
- **Approval flow**: Entries flagged `approval_required` stay pending and
  apply their stock effect at approval time, against the stock level of
  that moment.

## Actor identity

The service records, but never authenticates, the acting user. Supply the
actor in the request body or through the `x-actor-name`, `x-actor-id` and
`x-actor-email` headers resolved by the upstream gateway.

## Error handling

Errors use a consistent envelope with appropriate HTTP status codes:

```json
{
  "error": "Insufficient stock: available 40, requested 1000",
  "status": 422
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "stock-transactions", description = "Stock transaction ledger endpoints"),
        (name = "products", description = "Product registry endpoints"),
        (name = "locations", description = "Inventory location endpoints")
    ),
    paths(
        // Stock transactions
        crate::handlers::stock_transactions::create_stock_transaction,
        crate::handlers::stock_transactions::get_recent_transactions,
        crate::handlers::stock_transactions::get_transactions_by_date_range,
        crate::handlers::stock_transactions::get_transaction_stats,
        crate::handlers::stock_transactions::get_stock_transaction,
        crate::handlers::stock_transactions::reverse_stock_transaction,
        crate::handlers::stock_transactions::approve_stock_transaction,
        crate::handlers::stock_transactions::cancel_stock_transaction,
        crate::handlers::stock_transactions::get_product_transaction_history,
        crate::handlers::stock_transactions::verify_product_stock,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::get_low_stock_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,

        // Locations
        crate::handlers::locations::create_location,
        crate::handlers::locations::list_locations,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,

            // Ledger types
            crate::entities::stock_transaction::TransactionType,
            crate::entities::stock_transaction::TransactionStatus,
            crate::handlers::stock_transactions::CreateStockTransactionRequest,
            crate::handlers::stock_transactions::ReverseTransactionRequest,
            crate::handlers::stock_transactions::ApproveTransactionRequest,
            crate::handlers::stock_transactions::CancelTransactionRequest,
            crate::handlers::stock_transactions::TransactionOutcomeBody,
            crate::handlers::stock_transactions::TransactionListBody,
            crate::handlers::stock_transactions::TransactionHistoryBody,
            crate::handlers::stock_transactions::TransactionStatsBody,

            // Registry types
            crate::entities::inventory_location::LocationType,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::handlers::locations::CreateLocationRequest,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_the_ledger_surface() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).expect("document serializes");
        assert!(json.contains("StockLedger API"));
        assert!(json.contains("/api/v1/stock-transactions"));
        assert!(json.contains("/api/v1/products/{id}/stock/verify"));
    }
}
