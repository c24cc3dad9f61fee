//! Lending workflow integration tests: borrow/return/renew invariants, the
//! overdue sweep, and race arbitration on the last copy.

mod common;

use common::*;
use libman_business::LendingError;
use libman_core::{LoanStatus, FINE_RATE_PER_DAY, MAX_RENEWALS};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn borrow_creates_resolved_loan_and_takes_a_copy() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 2).await;
    let patron = add_patron(&ctx, "Alice").await;

    let detail = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();

    assert_eq!(detail.loan.status, LoanStatus::Borrowed);
    assert_eq!(detail.loan.renewal_count, 0);
    assert_eq!(detail.loan.fine_amount, Decimal::ZERO);
    assert_eq!(
        detail.loan.due_date - detail.loan.borrow_date,
        chrono::Duration::days(14)
    );
    assert_eq!(detail.book.title, "Dune");
    assert_eq!(detail.patron.name, "Alice");
    assert_eq!(available_copies(&ctx, &book.id).await, 1);
}

#[tokio::test]
async fn borrow_then_return_restores_availability_with_no_fine() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 2).await;
    let patron = add_patron(&ctx, "Alice").await;

    let detail = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();
    let returned = ctx.lending.return_loan(&detail.loan.id).await.unwrap();

    assert_eq!(returned.loan.status, LoanStatus::Returned);
    assert_eq!(returned.loan.fine_amount, Decimal::ZERO);
    assert!(returned.loan.return_date.is_some());
    assert_eq!(available_copies(&ctx, &book.id).await, 2);
}

#[tokio::test]
async fn borrow_missing_book_or_patron_is_not_found() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let patron = add_patron(&ctx, "Alice").await;

    let err = ctx.lending.borrow("no-such-book", &patron.id, 14).await.unwrap_err();
    assert!(matches!(err, LendingError::NotFound { .. }));

    let err = ctx.lending.borrow(&book.id, "no-such-user", 14).await.unwrap_err();
    assert!(matches!(err, LendingError::NotFound { .. }));

    // The failed borrow must not have consumed a copy
    assert_eq!(available_copies(&ctx, &book.id).await, 1);
}

#[tokio::test]
async fn borrow_with_no_copies_is_unavailable() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let alice = add_patron(&ctx, "Alice").await;
    let bob = add_patron(&ctx, "Bob").await;

    ctx.lending.borrow(&book.id, &alice.id, 14).await.unwrap();
    let err = ctx.lending.borrow(&book.id, &bob.id, 14).await.unwrap_err();

    assert!(matches!(err, LendingError::Unavailable { .. }));
    assert_eq!(available_copies(&ctx, &book.id).await, 0);
}

#[tokio::test]
async fn borrow_by_inactive_patron_is_rejected() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let patron = add_patron(&ctx, "Alice").await;
    ctx.patrons.deactivate(&patron.id).await.unwrap();

    let err = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap_err();

    assert!(matches!(err, LendingError::InactivePatron { .. }));
    // Rolled back: the decremented copy came back
    assert_eq!(available_copies(&ctx, &book.id).await, 1);
}

#[tokio::test]
async fn borrow_same_book_twice_is_duplicate() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 3).await;
    let patron = add_patron(&ctx, "Alice").await;

    ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();
    let err = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap_err();

    assert!(matches!(err, LendingError::DuplicateBorrow { .. }));
    assert_eq!(available_copies(&ctx, &book.id).await, 2);
}

#[tokio::test]
async fn borrow_again_after_return_is_allowed() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let patron = add_patron(&ctx, "Alice").await;

    let first = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();
    ctx.lending.return_loan(&first.loan.id).await.unwrap();

    let second = ctx.lending.borrow(&book.id, &patron.id, 7).await.unwrap();
    assert_ne!(first.loan.id, second.loan.id);
}

#[tokio::test]
async fn borrow_validation_collects_every_violation() {
    let ctx = setup().await;

    let err = ctx.lending.borrow("", "", 0).await.unwrap_err();
    match err {
        LendingError::Validation(violations) => assert_eq!(violations.0.len(), 3),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn return_twice_fails_without_side_effects() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let patron = add_patron(&ctx, "Alice").await;

    let detail = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();
    let first = ctx.lending.return_loan(&detail.loan.id).await.unwrap();

    let err = ctx.lending.return_loan(&detail.loan.id).await.unwrap_err();
    assert!(matches!(err, LendingError::AlreadyReturned { .. }));

    // No double-increment, no re-charged fine
    assert_eq!(available_copies(&ctx, &book.id).await, 1);
    let row = libman_persistence::LoanRepo::find(ctx.db.pool(), &detail.loan.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.fine_amount, first.loan.fine_amount.to_string());
    assert_eq!(row.return_date, first.loan.return_date);
}

#[tokio::test]
async fn return_of_unknown_transaction_is_not_found() {
    let ctx = setup().await;
    let err = ctx.lending.return_loan("no-such-loan").await.unwrap_err();
    assert!(matches!(err, LendingError::NotFound { .. }));
}

#[tokio::test]
async fn late_return_charges_per_started_day() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let patron = add_patron(&ctx, "Alice").await;

    let detail = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();
    // 71 hours past due: the return lands in the third started overdue day
    backdate_due_hours(&ctx, &detail.loan.id, 71).await;

    let returned = ctx.lending.return_loan(&detail.loan.id).await.unwrap();

    assert_eq!(returned.loan.fine_amount, FINE_RATE_PER_DAY * dec!(3));
    assert_eq!(returned.loan.status, LoanStatus::Returned);
    assert_eq!(available_copies(&ctx, &book.id).await, 1);
}

#[tokio::test]
async fn renewal_extends_due_date_and_counts() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let patron = add_patron(&ctx, "Alice").await;

    let detail = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();
    let renewed = ctx.lending.renew(&detail.loan.id, 7).await.unwrap();

    assert_eq!(
        renewed.loan.due_date,
        detail.loan.due_date + chrono::Duration::days(7)
    );
    assert_eq!(renewed.loan.renewal_count, 1);
    // Copy counts untouched by renewal
    assert_eq!(available_copies(&ctx, &book.id).await, 0);
}

#[tokio::test]
async fn third_renewal_is_rejected_and_count_stays_at_limit() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let patron = add_patron(&ctx, "Alice").await;

    let detail = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();
    ctx.lending.renew(&detail.loan.id, 7).await.unwrap();
    let second = ctx.lending.renew(&detail.loan.id, 7).await.unwrap();
    assert_eq!(second.loan.renewal_count, MAX_RENEWALS);

    let err = ctx.lending.renew(&detail.loan.id, 7).await.unwrap_err();
    assert!(matches!(err, LendingError::RenewalLimitExceeded { .. }));

    let row = libman_persistence::LoanRepo::find(ctx.db.pool(), &detail.loan.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.renewal_count, MAX_RENEWALS);
}

#[tokio::test]
async fn renew_rejected_for_returned_and_overdue_loans() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 2).await;
    let alice = add_patron(&ctx, "Alice").await;
    let bob = add_patron(&ctx, "Bob").await;

    // Returned loan cannot be renewed
    let returned = ctx.lending.borrow(&book.id, &alice.id, 14).await.unwrap();
    ctx.lending.return_loan(&returned.loan.id).await.unwrap();
    let err = ctx.lending.renew(&returned.loan.id, 7).await.unwrap_err();
    assert!(matches!(err, LendingError::InvalidState { .. }));

    // Overdue loan cannot be renewed either
    let stale = ctx.lending.borrow(&book.id, &bob.id, 14).await.unwrap();
    backdate_due(&ctx, &stale.loan.id, 1).await;
    ctx.sweeper.sweep().await.unwrap();
    let err = ctx.lending.renew(&stale.loan.id, 7).await.unwrap_err();
    assert!(matches!(err, LendingError::InvalidState { .. }));
}

#[tokio::test]
async fn sweep_flips_only_stale_borrowed_entries() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 3).await;
    let alice = add_patron(&ctx, "Alice").await;
    let bob = add_patron(&ctx, "Bob").await;
    let carol = add_patron(&ctx, "Carol").await;

    let stale = ctx.lending.borrow(&book.id, &alice.id, 14).await.unwrap();
    let fresh = ctx.lending.borrow(&book.id, &bob.id, 14).await.unwrap();
    let closed = ctx.lending.borrow(&book.id, &carol.id, 14).await.unwrap();

    backdate_due(&ctx, &stale.loan.id, 2).await;
    backdate_due(&ctx, &closed.loan.id, 2).await;
    ctx.lending.return_loan(&closed.loan.id).await.unwrap();

    let updated = ctx.sweeper.sweep().await.unwrap();
    assert_eq!(updated, 1);
    assert_eq!(loan_status(&ctx, &stale.loan.id).await, "overdue");
    assert_eq!(loan_status(&ctx, &fresh.loan.id).await, "borrowed");
    assert_eq!(loan_status(&ctx, &closed.loan.id).await, "returned");

    // Second sweep finds nothing new
    assert_eq!(ctx.sweeper.sweep().await.unwrap(), 0);
}

#[tokio::test]
async fn return_after_sweep_charges_same_fine_as_without_sweep() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 2).await;
    let alice = add_patron(&ctx, "Alice").await;
    let bob = add_patron(&ctx, "Bob").await;

    let swept = ctx.lending.borrow(&book.id, &alice.id, 14).await.unwrap();
    let unswept = ctx.lending.borrow(&book.id, &bob.id, 14).await.unwrap();
    backdate_due(&ctx, &swept.loan.id, 2).await;
    backdate_due(&ctx, &unswept.loan.id, 2).await;

    ctx.sweeper.sweep().await.unwrap();
    assert_eq!(loan_status(&ctx, &swept.loan.id).await, "overdue");

    let a = ctx.lending.return_loan(&swept.loan.id).await.unwrap();
    let b = ctx.lending.return_loan(&unswept.loan.id).await.unwrap();
    assert_eq!(a.loan.fine_amount, b.loan.fine_amount);
    assert!(a.loan.fine_amount > Decimal::ZERO);
}

#[tokio::test]
async fn borrow_renew_sweep_late_return_scenario() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;
    let patron = add_patron(&ctx, "Alice").await;

    // Borrow for 14 days, renew for 7 more
    let detail = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();
    let renewed = ctx.lending.renew(&detail.loan.id, 7).await.unwrap();
    assert_eq!(
        renewed.loan.due_date,
        detail.loan.due_date + chrono::Duration::days(7)
    );
    assert_eq!(renewed.loan.renewal_count, 1);

    // Clock passes the renewed due date; the sweeper flips the entry
    backdate_due_hours(&ctx, &detail.loan.id, 71).await;
    assert_eq!(ctx.sweeper.sweep().await.unwrap(), 1);
    assert_eq!(loan_status(&ctx, &detail.loan.id).await, "overdue");

    // Returned in the third started overdue day: 3 x 5 units
    let returned = ctx.lending.return_loan(&detail.loan.id).await.unwrap();
    assert_eq!(returned.loan.status, LoanStatus::Returned);
    assert_eq!(returned.loan.fine_amount, FINE_RATE_PER_DAY * dec!(3));
    assert_eq!(available_copies(&ctx, &book.id).await, 1);
}

#[tokio::test]
async fn concurrent_borrows_of_last_copy_admit_exactly_one() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 1).await;

    let mut patrons = Vec::new();
    for name in ["Alice", "Bob", "Carol", "Dave"] {
        patrons.push(add_patron(&ctx, name).await);
    }

    let mut handles = Vec::new();
    for patron in &patrons {
        let lending = ctx.lending.clone();
        let book_id = book.id.clone();
        let patron_id = patron.id.clone();
        handles.push(tokio::spawn(async move {
            lending.borrow(&book_id, &patron_id, 14).await
        }));
    }

    let mut successes = 0;
    let mut unavailable = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(LendingError::Unavailable { .. }) => unavailable += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(unavailable, patrons.len() - 1);
    assert_eq!(available_copies(&ctx, &book.id).await, 0);
}

#[tokio::test]
async fn shrunk_catalog_clamps_restored_copy() {
    let ctx = setup().await;
    let book = add_book(&ctx, "Dune", 2).await;
    let patron = add_patron(&ctx, "Alice").await;

    let detail = ctx.lending.borrow(&book.id, &patron.id, 14).await.unwrap();

    // Catalog shrinks to a single copy while one is out
    ctx.catalog
        .update(
            &book.id,
            libman_business::BookUpdate {
                total_copies: Some(1),
                available_copies: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // The returned copy must not push availability past the new total
    ctx.lending.return_loan(&detail.loan.id).await.unwrap();
    assert_eq!(available_copies(&ctx, &book.id).await, 1);
}
