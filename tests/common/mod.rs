#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use stockledger_api::{
    db::{establish_connection_with_config, run_migrations, DbConfig, DbPool},
    entities::product,
    events::{process_events, EventSender},
    handlers::AppServices,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Fresh in-memory SQLite database with the production migrations applied.
/// A single connection keeps every query on the same in-memory database.
pub async fn setup_db() -> Arc<DbPool> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = establish_connection_with_config(&config)
        .await
        .expect("failed to connect to in-memory sqlite");
    run_migrations(&db).await.expect("failed to run migrations");
    Arc::new(db)
}

/// Event sender with a live drain task so publishes succeed.
pub fn test_event_sender() -> Arc<EventSender> {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));
    Arc::new(EventSender::new(tx))
}

pub fn build_services(db: Arc<DbPool>) -> AppServices {
    AppServices::new(db, test_event_sender())
}

pub async fn seed_product(db: &DbPool, sku: &str, current_stock: Decimal) -> product::Model {
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(sku.to_string()),
        name: Set(format!("{} test product", sku)),
        current_stock: Set(current_stock),
        description: Set(None),
        category: Set(None),
        min_stock_level: Set(None),
        max_stock_level: Set(None),
        unit_cost: Set(None),
        supplier: Set(None),
        location: Set(None),
        created_by: Set(None),
        created_by_id: Set(None),
        created_by_email: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed product")
}
