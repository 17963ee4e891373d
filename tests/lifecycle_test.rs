mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use stockledger_api::{
    entities::stock_transaction::{TransactionStatus, TransactionType},
    errors::ServiceError,
    services::transactions::NewStockTransaction,
};

#[tokio::test]
async fn pending_entries_apply_their_effect_at_approval_time() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "SCAFFOLD-SET", dec!(10)).await;

    // Requires approval: recorded pending, stock untouched
    let pending = services
        .transactions
        .create_transaction(NewStockTransaction {
            approval_required: true,
            ..NewStockTransaction::new(product.id, TransactionType::Out, dec!(8), "Site Crew")
        })
        .await
        .expect("pending write succeeds");
    assert_eq!(
        pending.transaction.status,
        TransactionStatus::Pending.as_str()
    );
    assert!(!pending.stock_updated);
    assert_eq!(
        services
            .products
            .get_product(product.id)
            .await
            .expect("product readable")
            .current_stock,
        dec!(10)
    );

    // Stock drains to 5 while the entry waits
    services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::Out,
            dec!(5),
            "Site Crew",
        ))
        .await
        .expect("interleaved write succeeds");

    // Approval recomputes from the current level: 8 from 5 must fail
    let err = services
        .transactions
        .approve_transaction(pending.transaction.id, "Dana Mason".to_string(), None)
        .await
        .expect_err("approval against drained stock must fail");
    assert_matches!(
        err,
        ServiceError::InsufficientStock { available, requested } => {
            assert_eq!(available, dec!(5));
            assert_eq!(requested, dec!(8));
        }
    );
    let still_pending = services
        .ledger
        .get_transaction(pending.transaction.id)
        .await
        .expect("entry readable");
    assert_eq!(still_pending.status, TransactionStatus::Pending.as_str());

    // Restock, then the approval goes through against the fresh level
    services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::In,
            dec!(10),
            "Dana Mason",
        ))
        .await
        .expect("restock succeeds");

    let approved = services
        .transactions
        .approve_transaction(pending.transaction.id, "Dana Mason".to_string(), None)
        .await
        .expect("approval succeeds");
    assert_eq!(
        approved.transaction.status,
        TransactionStatus::Completed.as_str()
    );
    assert_eq!(approved.transaction.approved_by.as_deref(), Some("Dana Mason"));
    assert!(approved.transaction.approved_at.is_some());
    assert_eq!(approved.new_stock_level, Some(dec!(7)));
}

#[tokio::test]
async fn pre_approved_entries_complete_immediately() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "DRILL-SET", dec!(4)).await;

    let outcome = services
        .transactions
        .create_transaction(NewStockTransaction {
            approval_required: true,
            approved_by: Some("Dana Mason".to_string()),
            ..NewStockTransaction::new(product.id, TransactionType::Out, dec!(1), "Site Crew")
        })
        .await
        .expect("pre-approved write succeeds");

    assert_eq!(
        outcome.transaction.status,
        TransactionStatus::Completed.as_str()
    );
    assert!(outcome.transaction.approved_at.is_some());
    assert_eq!(outcome.new_stock_level, Some(dec!(3)));
}

#[tokio::test]
async fn cancellation_is_terminal_and_never_touches_stock() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "HARD-HATS", dec!(20)).await;

    let pending = services
        .transactions
        .create_transaction(NewStockTransaction {
            approval_required: true,
            ..NewStockTransaction::new(product.id, TransactionType::Out, dec!(6), "Site Crew")
        })
        .await
        .expect("pending write succeeds");

    let cancelled = services
        .transactions
        .cancel_transaction(pending.transaction.id, Some("duplicate request".to_string()))
        .await
        .expect("cancellation succeeds");
    assert_eq!(cancelled.status, TransactionStatus::Cancelled.as_str());
    assert_eq!(
        cancelled.reason.as_deref(),
        Some("Cancelled: duplicate request")
    );
    assert_eq!(
        services
            .products
            .get_product(product.id)
            .await
            .expect("product readable")
            .current_stock,
        dec!(20)
    );

    // Terminal: a second cancellation is refused
    let err = services
        .transactions
        .cancel_transaction(pending.transaction.id, None)
        .await
        .expect_err("cancelling twice must fail");
    assert_matches!(err, ServiceError::InvalidStatus(_));

    // Completed entries cannot be cancelled either
    let completed = services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::Out,
            dec!(2),
            "Site Crew",
        ))
        .await
        .expect("write succeeds");
    let err = services
        .transactions
        .cancel_transaction(completed.transaction.id, None)
        .await
        .expect_err("cancelling a completed entry must fail");
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn reversal_is_limited_to_completed_entries_and_happens_once() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "CABLE-DRUM", dec!(30)).await;

    let pending = services
        .transactions
        .create_transaction(NewStockTransaction {
            approval_required: true,
            ..NewStockTransaction::new(product.id, TransactionType::Out, dec!(5), "Site Crew")
        })
        .await
        .expect("pending write succeeds");
    let err = services
        .transactions
        .reverse_transaction(pending.transaction.id, "Dana Mason".to_string(), None, None)
        .await
        .expect_err("pending entries cannot be reversed");
    assert_matches!(err, ServiceError::InvalidStatus(_));

    let completed = services
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
        .reverse_transaction(
            completed.transaction.id,
            "Dana Mason".to_string(),
            None,
            None,
        )
        .await
        .expect("first reversal succeeds");

    let err = services
        .transactions
        .reverse_transaction(
            completed.transaction.id,
            "Dana Mason".to_string(),
            None,
            None,
        )
        .await
        .expect_err("second reversal must fail");
    assert_matches!(err, ServiceError::AlreadyReversed(id) => {
        assert_eq!(id, completed.transaction.id);
    });
}

#[tokio::test]
async fn blank_actors_are_rejected_on_every_lifecycle_operation() {
    let db = common::setup_db().await;
    let services = common::build_services(db.clone());
    let product = common::seed_product(&db, "SAFETY-VESTS", dec!(5)).await;

    let completed = services
        .transactions
        .create_transaction(NewStockTransaction::new(
            product.id,
            TransactionType::Out,
            dec!(1),
            "Site Crew",
        ))
        .await
        .expect("write succeeds");

    assert_matches!(
        services
            .transactions
            .reverse_transaction(completed.transaction.id, "  ".to_string(), None, None)
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        services
            .transactions
            .approve_transaction(completed.transaction.id, String::new(), None)
            .await,
        Err(ServiceError::ValidationError(_))
    );
}
