mod common;

use assert_matches::assert_matches;
use chrono::{Datelike, Utc};
use rust_decimal_macros::dec;
use stockledger_api::{
    entities::stock_transaction::{TransactionStatus, TransactionType},
    errors::ServiceError,
    services::transactions::NewStockTransaction,
};
use uuid::Uuid;

#[tokio::test]
async fn site_consumption_flow_moves_the_projection_with_the_ledger() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "CEMENT-50KG", dec!(0)).await;

    // Initial stocking: 0 -> 50
    let initial = services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::In,
            dec!(50),
            "Dana Mason",
        ))
        .await
        .expect("initial stocking succeeds");
    assert!(initial.stock_updated);
    assert_eq!(initial.new_stock_level, Some(dec!(50)));
    assert_eq!(initial.transaction.stock_before, dec!(0));
    assert_eq!(initial.transaction.stock_after, dec!(50));
    assert_eq!(
        initial.transaction.status,
        TransactionStatus::Completed.as_str()
    );

    // Delivery: 50 -> 70
    let delivery = services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::In,
            dec!(20),
            "Dana Mason",
        ))
        .await
        .expect("delivery succeeds");
    assert_eq!(delivery.new_stock_level, Some(dec!(70)));

    // Site consumption: 70 -> 40
    let consumption = services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::Out,
            dec!(30),
            "Site Crew",
        ))
        .await
        .expect("consumption succeeds");
    assert_eq!(consumption.transaction.stock_before, dec!(70));
    assert_eq!(consumption.transaction.stock_after, dec!(40));
    assert_eq!(consumption.new_stock_level, Some(dec!(40)));

    // Overdraw is rejected with both figures and leaves no trace
    let err = services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::Out,
            dec!(1000),
            "Site Crew",
        ))
        .await
        .expect_err("overdraw must fail");
    assert_matches!(
        err,
        ServiceError::InsufficientStock { available, requested } => {
            assert_eq!(available, dec!(40));
            assert_eq!(requested, dec!(1000));
        }
    );
    let after_rejection = services
        .products
        .get_product(product.id)
        .await
        .expect("product still readable");
    assert_eq!(after_rejection.current_stock, dec!(40));

    // Reversing the consumption puts the 30 back: 40 -> 70
    let reversal = services
        .transactions
        .reverse_transaction(
            consumption.transaction.id,
            "Dana Mason".to_string(),
            None,
            Some("logged against the wrong site".to_string()),
        )
        .await
        .expect("reversal succeeds");
    assert_eq!(reversal.new_stock_level, Some(dec!(70)));
    assert_eq!(reversal.transaction.quantity, dec!(-30));
    assert_eq!(
        reversal.transaction.transaction_type,
        TransactionType::Out.as_str()
    );
    assert_eq!(
        reversal.transaction.reference_number.as_deref(),
        Some(format!("REV-{}", consumption.transaction.transaction_number).as_str())
    );

    // The original is marked reversed and linked to the compensating entry
    let original = services
        .ledger
        .get_transaction(consumption.transaction.id)
        .await
        .expect("original still readable");
    assert_eq!(original.status, TransactionStatus::Reversed.as_str());
    assert_eq!(
        original.reversed_by_transaction_id,
        Some(reversal.transaction.id)
    );

    // Replaying the ledger agrees with the stored projection
    let verification = services
        .ledger
        .verify_product_stock(product.id)
        .await
        .expect("verification succeeds");
    assert!(verification.consistent);
    assert_eq!(verification.stored_stock, dec!(70));
    assert_eq!(verification.replayed_stock, dec!(70));
    assert_eq!(verification.entries_replayed, 4);
}

#[tokio::test]
async fn transaction_numbers_count_up_within_the_month() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "REBAR-12MM", dec!(0)).await;

    let now = Utc::now();
    let prefix = format!("TXN-{:04}-{:02}-", now.year(), now.month());

    for expected in ["0001", "0002", "0003"] {
        let outcome = services
            .transactions
            .create_transaction(NewStockTransaction::new(
                product.id,
                TransactionType::In,
                dec!(5),
                "Dana Mason",
            ))
            .await
            .expect("write succeeds");
        assert_eq!(
            outcome.transaction.transaction_number,
            format!("{}{}", prefix, expected)
        );
    }
}

#[tokio::test]
async fn transfers_record_without_moving_stock() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "GENERATOR-5KW", dec!(8)).await;

    let transfer = services
        .transactions
        .create_transaction(NewStockTransaction {
            from_location_name: Some("Main Warehouse".to_string()),
            to_location_name: Some("Site B".to_string()),
            ..NewStockTransaction::new(product.id, TransactionType::Transfer, dec!(3), "Driver")
        })
        .await
        .expect("transfer succeeds");

    assert!(!transfer.stock_updated);
    assert_eq!(transfer.new_stock_level, None);
    assert_eq!(transfer.transaction.stock_before, dec!(8));
    assert_eq!(transfer.transaction.stock_after, dec!(8));

    let product = services
        .products
        .get_product(product.id)
        .await
        .expect("product readable");
    assert_eq!(product.current_stock, dec!(8));
}

#[tokio::test]
async fn damaged_write_offs_may_push_stock_negative() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "PLYWOOD-18MM", dec!(10)).await;

    let write_off = services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::Damaged,
            dec!(15),
            "Dana Mason",
        ))
        .await
        .expect("write-offs are not guarded");

    assert_eq!(write_off.new_stock_level, Some(dec!(-5)));
}

#[tokio::test]
async fn writes_against_unknown_products_are_rejected() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());

    let err = services
        .transactions
        .create_transaction(NewStockTransaction::new(
            Uuid::new_v4(),
            TransactionType::In,
            dec!(1),
            "Dana Mason",
        ))
        .await
        .expect_err("unknown product must fail");
    assert_matches!(err, ServiceError::NotFound(_));
}
