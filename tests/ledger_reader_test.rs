mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use stockledger_api::{
    entities::product,
    entities::stock_transaction::{TransactionStatus, TransactionType},
    errors::ServiceError,
    services::transactions::NewStockTransaction,
};
use uuid::Uuid;

#[tokio::test]
async fn history_is_newest_first_scoped_and_paginated() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let cement = common::seed_product(&db, "CEMENT-50KG", dec!(0)).await;
    let rebar = common::seed_product(&db, "REBAR-12MM", dec!(0)).await;

    for quantity in [dec!(10), dec!(20), dec!(30)] {
        services
            .transactions
            .create_transaction(NewStockTransaction::new(
                cement.id,
                TransactionType::In,
                quantity,
                "Dana Mason",
            ))
            .await
            .expect("write succeeds");
    }
    services
        .transactions
        .create_transaction(NewStockTransaction::new(
            rebar.id,
            TransactionType::In,
            dec!(99),
            "Dana Mason",
        ))
        .await
        .expect("write succeeds");

    let page = services
        .ledger
        .get_product_transaction_history(cement.id, Some(2), Some(0))
        .await;
    assert!(page.error.is_none());
    assert_eq!(page.total, 3);
    assert_eq!(page.transactions.len(), 2);
    // Newest first: the 30 landed last
    assert_eq!(page.transactions[0].quantity, dec!(30));
    assert!(page
        .transactions
        .iter()
        .all(|row| row.product_id == cement.id));

    let second_page = services
        .ledger
        .get_product_transaction_history(cement.id, Some(2), Some(2))
        .await;
    assert_eq!(second_page.transactions.len(), 1);
    assert_eq!(second_page.transactions[0].quantity, dec!(10));
}

#[tokio::test]
async fn recent_transactions_respect_the_type_filter() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "PAINT-20L", dec!(0)).await;

    services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::In,
            dec!(40),
            "Dana Mason",
        ))
        .await
        .expect("write succeeds");
    services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::Out,
            dec!(5),
            "Site Crew",
        ))
        .await
        .expect("write succeeds");

    let unfiltered = services.ledger.get_recent_transactions(None, None).await;
    assert!(unfiltered.error.is_none());
    assert_eq!(unfiltered.transactions.len(), 2);

    let only_out = services
        .ledger
        .get_recent_transactions(None, Some(vec![TransactionType::Out]))
        .await;
    assert_eq!(only_out.transactions.len(), 1);
    assert_eq!(
        only_out.transactions[0].transaction_type,
        TransactionType::Out.as_str()
    );
}

#[tokio::test]
async fn date_range_reads_use_the_business_timestamp() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "GRAVEL-TON", dec!(0)).await;

    let last_week = Utc::now() - Duration::days(7);
    services
        .transactions
        .create_transaction(NewStockTransaction {
            transaction_date: Some(last_week),
            ..NewStockTransaction::new(product.id, TransactionType::In, dec!(10), "Dana Mason")
        })
        .await
        .expect("backdated write succeeds");
    services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::In,
            dec!(20),
            "Dana Mason",
        ))
        .await
        .expect("write succeeds");

    let whole_window = services
        .ledger
        .get_transactions_by_date_range(
            Utc::now() - Duration::days(30),
            Utc::now() + Duration::days(1),
            None,
            None,
        )
        .await;
    assert_eq!(whole_window.transactions.len(), 2);

    let old_window = services
        .ledger
        .get_transactions_by_date_range(
            Utc::now() - Duration::days(30),
            Utc::now() - Duration::days(2),
            None,
            None,
        )
        .await;
    assert_eq!(old_window.transactions.len(), 1);
    assert_eq!(old_window.transactions[0].quantity, dec!(10));
}

#[tokio::test]
async fn stats_bucket_by_type_and_status() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "TIMBER-4M", dec!(0)).await;

    services
        .transactions
        .create_transaction(NewStockTransaction {
            unit_cost: Some(dec!(2.50)),
            ..NewStockTransaction::new(product.id, TransactionType::In, dec!(100), "Dana Mason")
        })
        .await
        .expect("write succeeds");
    services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::Out,
            dec!(10),
            "Site Crew",
        ))
        .await
        .expect("write succeeds");
    services
        .transactions
        .create_transaction(NewStockTransaction {
            approval_required: true,
            ..NewStockTransaction::new(product.id, TransactionType::Out, dec!(5), "Site Crew")
        })
        .await
        .expect("pending write succeeds");

    let result = services
        .ledger
        .get_transaction_stats(None, None, Some(product.id))
        .await;
    assert!(result.error.is_none());
    let stats = result.stats;

    assert_eq!(stats.total_transactions, 3);
    // Only the stocking entry carried a unit cost: 100 * 2.50
    assert_eq!(stats.total_value, dec!(250.00));

    let in_bucket = stats
        .by_type
        .iter()
        .find(|bucket| bucket.transaction_type == TransactionType::In.as_str())
        .expect("IN bucket present");
    assert_eq!(in_bucket.count, 1);
    let out_bucket = stats
        .by_type
        .iter()
        .find(|bucket| bucket.transaction_type == TransactionType::Out.as_str())
        .expect("OUT bucket present");
    assert_eq!(out_bucket.count, 2);

    let pending_bucket = stats
        .by_status
        .iter()
        .find(|bucket| bucket.status == TransactionStatus::Pending.as_str())
        .expect("pending bucket present");
    assert_eq!(pending_bucket.count, 1);
    let completed_bucket = stats
        .by_status
        .iter()
        .find(|bucket| bucket.status == TransactionStatus::Completed.as_str())
        .expect("completed bucket present");
    assert_eq!(completed_bucket.count, 2);
}

#[tokio::test]
async fn list_reads_fail_closed_with_an_empty_result() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());

    // Sabotage the schema so every ledger read fails
    db.execute_unprepared("DROP TABLE stock_transactions")
        .await
        .expect("drop succeeds");

    let recent = services.ledger.get_recent_transactions(None, None).await;
    assert!(recent.transactions.is_empty());
    assert!(recent.error.is_some());

    let history = services
        .ledger
        .get_product_transaction_history(Uuid::new_v4(), None, None)
        .await;
    assert!(history.transactions.is_empty());
    assert_eq!(history.total, 0);
    assert!(history.error.is_some());

    let stats = services.ledger.get_transaction_stats(None, None, None).await;
    assert_eq!(stats.stats.total_transactions, 0);
    assert!(stats.error.is_some());
}

#[tokio::test]
async fn verification_spots_a_tampered_projection() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "SAND-TON", dec!(0)).await;

    services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::In,
            dec!(25),
            "Dana Mason",
        ))
        .await
        .expect("write succeeds");

    let clean = services
        .ledger
        .verify_product_stock(product.id)
        .await
        .expect("verification succeeds");
    assert!(clean.consistent);

    // Corrupt the projection behind the ledger's back
    let mut tampered: product::ActiveModel = services
        .products
        .get_product(product.id)
        .await
        .expect("product readable")
        .into();
    tampered.current_stock = Set(dec!(999));
    tampered.update(db.as_ref()).await.expect("tamper succeeds");

    let tampered = services
        .ledger
        .verify_product_stock(product.id)
        .await
        .expect("verification still succeeds");
    assert!(!tampered.consistent);
    assert_eq!(tampered.stored_stock, dec!(999));
    assert_eq!(tampered.replayed_stock, dec!(25));
}

#[tokio::test]
async fn single_row_reads_return_typed_errors() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());

    assert_matches!(
        services.ledger.get_transaction(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        services.ledger.verify_product_stock(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
}
