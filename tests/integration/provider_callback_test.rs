// Provider callbacks resolving pending ledger entries

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::*;
use tuition_ledger::core::AppError;
use tuition_ledger::fee_plans::EnrollmentStatus;
use tuition_ledger::ledger::PaymentStatus;
use tuition_ledger::payments::{
    AllocationResult, CallbackOutcome, CallbackStatus, PaymentAllocator, ProviderCallback,
    SubmissionOutcome,
};

fn callback(reference: &str, status: CallbackStatus) -> ProviderCallback {
    ProviderCallback {
        enrollment_id: ENROLLMENT_ID.to_string(),
        reference: reference.to_string(),
        status,
        reason: None,
    }
}

async fn submit_pending(app: &TestApp, reference: &str, amount: i64) -> AllocationResult {
    let result = accepted(
        app.services
            .payments
            .submit_payment(ENROLLMENT_ID, global(reference, amount))
            .await
            .unwrap(),
    );
    assert_eq!(result.status, PaymentStatus::Pending);
    result
}

#[tokio::test]
async fn test_complete_callback_settles_and_issues_receipt() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    let pending = submit_pending(&app, "PAY-001", 120).await;

    let outcome = app
        .services
        .payments
        .handle_provider_callback(callback("PAY-001", CallbackStatus::Complete))
        .await
        .unwrap();

    assert!(matches!(outcome, CallbackOutcome::Applied(_)));
    assert_eq!(outcome.result().payment_id, pending.payment_id);
    assert_eq!(outcome.result().status, PaymentStatus::Complete);

    let receipt = app.services.payments.receipt(&pending.payment_id).await.unwrap();
    assert_eq!(receipt.amount_applied, 120);

    let summary = app.services.reconciliation.summary(ENROLLMENT_ID).await.unwrap();
    assert_eq!(summary.paid, 120);
    assert_eq!(summary.pending_payments, 0);
}

#[tokio::test]
async fn test_pending_payment_is_not_paid_yet() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    let pending = submit_pending(&app, "PAY-001", 250).await;

    let summary = app.services.reconciliation.summary(ENROLLMENT_ID).await.unwrap();
    assert_eq!(summary.paid, 0);
    assert_eq!(summary.remaining, 250);
    assert_eq!(summary.pending_payments, 1);
    assert_eq!(summary.reserved, 250);
    assert_eq!(summary.payable, 0);

    let err = app.services.payments.receipt(&pending.payment_id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Balance is reserved while the verdict is outstanding
    let outcome = app
        .services
        .payments
        .submit_payment(ENROLLMENT_ID, global("PAY-002", 10))
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::AlreadySettled);
}

#[tokio::test]
async fn test_summary_payable_matches_allocator_while_deferred() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    submit_pending(&app, "PAY-001", 120).await;

    let summary = app.services.reconciliation.summary(ENROLLMENT_ID).await.unwrap();
    assert_eq!(summary.paid, 0);
    assert_eq!(summary.reserved, 120);
    assert_eq!(summary.payable, 130);
    assert_eq!(summary.per_tranche[0].payable, 0);
    assert_eq!(summary.per_tranche[1].reserved, 20);
    assert_eq!(summary.per_tranche[1].payable, 130);

    let history = app.services.payments.history(ENROLLMENT_ID).await.unwrap();
    let outstanding = PaymentAllocator::outstanding(&standard_plan(), &history);
    let per_tranche: Vec<i64> = summary.per_tranche.iter().map(|row| row.payable).collect();
    let allocatable: Vec<i64> = outstanding.iter().map(|row| row.outstanding).collect();
    assert_eq!(per_tranche, allocatable);

    // Tranche 0 is fully held by the pending payment
    let outcome = app
        .services
        .payments
        .submit_payment(ENROLLMENT_ID, targeted("PAY-002", 10, 0))
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::AlreadySettled);

    // Exactly the payable amount is accepted
    submit_pending(&app, "PAY-003", summary.payable).await;
    let summary = app.services.reconciliation.summary(ENROLLMENT_ID).await.unwrap();
    assert_eq!(summary.payable, 0);
    assert_eq!(summary.reserved, 250);
}

#[tokio::test]
async fn test_failed_callback_releases_reserved_balance() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    submit_pending(&app, "PAY-001", 250).await;

    let mut failure = callback("PAY-001", CallbackStatus::Failed);
    failure.reason = Some("timeout at operator".into());
    let outcome = app
        .services
        .payments
        .handle_provider_callback(failure)
        .await
        .unwrap();

    assert_eq!(outcome.result().status, PaymentStatus::Failed);
    assert_eq!(
        outcome.result().failure_reason.as_deref(),
        Some("timeout at operator")
    );

    // The failed entry stays in history; a new reference can pay again
    let retry = submit_pending(&app, "PAY-002", 250).await;
    assert_ne!(retry.payment_id, outcome.result().payment_id);

    let history = app.services.payments.history(ENROLLMENT_ID).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, PaymentStatus::Failed);
}

#[tokio::test]
async fn test_failed_callback_without_reason_gets_default() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    submit_pending(&app, "PAY-001", 100).await;

    let outcome = app
        .services
        .payments
        .handle_provider_callback(callback("PAY-001", CallbackStatus::Failed))
        .await
        .unwrap();
    assert!(outcome.result().failure_reason.is_some());
}

#[tokio::test]
async fn test_duplicate_callback_is_a_no_op() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    submit_pending(&app, "PAY-001", 100).await;
    let payments = &app.services.payments;

    let first = payments
        .handle_provider_callback(callback("PAY-001", CallbackStatus::Complete))
        .await
        .unwrap();
    let second = payments
        .handle_provider_callback(callback("PAY-001", CallbackStatus::Complete))
        .await
        .unwrap();

    assert!(matches!(first, CallbackOutcome::Applied(_)));
    assert!(matches!(second, CallbackOutcome::Duplicate(_)));
    assert_eq!(first.result(), second.result());

    let summary = app.services.reconciliation.summary(ENROLLMENT_ID).await.unwrap();
    assert_eq!(summary.paid, 100);
}

#[tokio::test]
async fn test_contradicting_callback_conflicts() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    submit_pending(&app, "PAY-001", 100).await;
    let payments = &app.services.payments;

    payments
        .handle_provider_callback(callback("PAY-001", CallbackStatus::Complete))
        .await
        .unwrap();

    let err = payments
        .handle_provider_callback(callback("PAY-001", CallbackStatus::Failed))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let history = payments.history(ENROLLMENT_ID).await.unwrap();
    assert_eq!(history[0].status, PaymentStatus::Complete);
}

#[tokio::test]
async fn test_callback_for_unknown_reference() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());

    let err = app
        .services
        .payments
        .handle_provider_callback(callback("PAY-404", CallbackStatus::Complete))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_callback_lands_after_withdrawal() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    let pending = submit_pending(&app, "PAY-001", 100).await;

    app.catalog
        .set_enrollment_status(ENROLLMENT_ID, EnrollmentStatus::Withdrawn)
        .unwrap();

    // Accepted while active, so the verdict still applies
    let outcome = app
        .services
        .payments
        .handle_provider_callback(callback("PAY-001", CallbackStatus::Complete))
        .await
        .unwrap();
    assert_eq!(outcome.result().status, PaymentStatus::Complete);
    assert!(app.services.payments.receipt(&pending.payment_id).await.is_ok());
}

#[tokio::test]
async fn test_partial_settlement_via_callback() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    let payments = &app.services.payments;

    accepted(
        payments
            .submit_payment(ENROLLMENT_ID, targeted("PAY-001", 120, 1))
            .await
            .unwrap(),
    );
    let clamped = accepted(
        payments
            .submit_payment(ENROLLMENT_ID, targeted("PAY-002", 100, 1))
            .await
            .unwrap(),
    );
    assert_eq!(clamped.applied_amount, 30);

    let outcome = payments
        .handle_provider_callback(callback("PAY-002", CallbackStatus::Complete))
        .await
        .unwrap();
    assert_eq!(outcome.result().status, PaymentStatus::Partial);

    let receipt = payments.receipt(&clamped.payment_id).await.unwrap();
    assert_eq!(receipt.status, PaymentStatus::Partial);
    assert_eq!(receipt.amount_paid, 100);
    assert_eq!(receipt.amount_applied, 30);
}
