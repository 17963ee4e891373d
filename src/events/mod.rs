use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// The events emitted by the ledger and registry services. Emission is
// post-commit and best effort: failures are logged at the call site and
// never fail the command that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Product registry events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    LocationCreated(Uuid),

    // Ledger events
    TransactionRecorded {
        transaction_id: Uuid,
        transaction_number: String,
        product_id: Uuid,
        transaction_type: String,
        status: String,
        quantity: Decimal,
    },
    TransactionApproved {
        transaction_id: Uuid,
        approved_by: String,
    },
    TransactionCancelled {
        transaction_id: Uuid,
    },
    TransactionReversed {
        original_transaction_id: Uuid,
        reversal_transaction_id: Uuid,
    },

    // Stock projection events
    StockLevelChanged {
        product_id: Uuid,
        transaction_id: Uuid,
        stock_before: Decimal,
        stock_after: Decimal,
    },
    LowStockDetected {
        product_id: Uuid,
        current_stock: Decimal,
        min_stock_level: Decimal,
    },

    // Catch-all for ad-hoc notifications
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

// Function to process incoming events. Runs until the sending side closes.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::TransactionRecorded {
                transaction_id,
                ref transaction_number,
                product_id,
                ref transaction_type,
                ref status,
                quantity,
            } => {
                info!(
                    transaction_id = %transaction_id,
                    transaction_number = %transaction_number,
                    product_id = %product_id,
                    transaction_type = %transaction_type,
                    status = %status,
                    quantity = %quantity,
                    "Stock transaction recorded"
                );
            }
            Event::TransactionApproved {
                transaction_id,
                ref approved_by,
            } => {
                info!(
                    transaction_id = %transaction_id,
                    approved_by = %approved_by,
                    "Stock transaction approved"
                );
            }
            Event::TransactionCancelled { transaction_id } => {
                info!(transaction_id = %transaction_id, "Stock transaction cancelled");
            }
            Event::TransactionReversed {
                original_transaction_id,
                reversal_transaction_id,
            } => {
                info!(
                    original_transaction_id = %original_transaction_id,
                    reversal_transaction_id = %reversal_transaction_id,
                    "Stock transaction reversed"
                );
            }
            Event::StockLevelChanged {
                product_id,
                transaction_id,
                stock_before,
                stock_after,
            } => {
                info!(
                    product_id = %product_id,
                    transaction_id = %transaction_id,
                    stock_before = %stock_before,
                    stock_after = %stock_after,
                    "Stock level changed"
                );
            }
            Event::LowStockDetected {
                product_id,
                current_stock,
                min_stock_level,
            } => {
                if let Err(e) =
                    handle_low_stock(product_id, current_stock, min_stock_level).await
                {
                    error!(
                        "Failed to handle low stock event: product_id={}, error={}",
                        product_id, e
                    );
                }
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}

async fn handle_low_stock(
    product_id: Uuid,
    current_stock: Decimal,
    min_stock_level: Decimal,
) -> Result<(), String> {
    warn!(
        product_id = %product_id,
        current_stock = %current_stock,
        min_stock_level = %min_stock_level,
        "Product stock is at or below its minimum level"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_fails_when_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        let sender = EventSender::new(tx);
        let result = sender.send(Event::ProductCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn processing_loop_drains_and_stops_on_close() {
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let worker = tokio::spawn(process_events(rx));

        sender
            .send(Event::StockLevelChanged {
                product_id: Uuid::new_v4(),
                transaction_id: Uuid::new_v4(),
                stock_before: dec!(50),
                stock_after: dec!(70),
            })
            .await
            .unwrap();
        sender
            .send(Event::LowStockDetected {
                product_id: Uuid::new_v4(),
                current_stock: dec!(2),
                min_stock_level: dec!(10),
            })
            .await
            .unwrap();

        drop(sender);
        worker.await.expect("event loop should stop cleanly");
    }
}
