mod common;

use bank_core::error::AppError;
use banking_service::models::{LoanApplication, LoanStatus};
use banking_service::repositories::LoanRepository;
use chrono::Duration;
use common::TestBank;
use rust_decimal::Decimal;

fn application(amount: i64, term: i32) -> LoanApplication {
    LoanApplication {
        amount: Decimal::from(amount),
        term,
    }
}

#[tokio::test]
async fn application_fixes_the_rate_from_the_term() {
    let bank = TestBank::new();
    let owner = bank
        .seed_account("alice@example.com", "1000000001", Decimal::ZERO)
        .await;

    let loan = bank
        .loan_service
        .apply(&owner.id, application(1200, 24))
        .await
        .unwrap();

    assert_eq!(loan.status, LoanStatus::Pending);
    assert_eq!(loan.interest_rate, 7.0);
    assert!(loan.approval_date.is_none());
    assert!(loan.due_date.is_none());
}

#[tokio::test]
async fn invalid_applications_are_rejected() {
    let bank = TestBank::new();
    let owner = bank
        .seed_account("alice@example.com", "1000000001", Decimal::ZERO)
        .await;

    let err = bank
        .loan_service
        .apply(&owner.id, application(1200, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = bank
        .loan_service
        .apply(&owner.id, application(-5, 12))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn approval_disburses_to_the_owner() {
    let bank = TestBank::new();
    let owner = bank
        .seed_account("alice@example.com", "1000000001", Decimal::from(100))
        .await;
    let loan = bank
        .loan_service
        .apply(&owner.id, application(1200, 12))
        .await
        .unwrap();

    let approved = bank.loan_service.approve(&loan.id).await.unwrap();

    assert_eq!(approved.status, LoanStatus::Approved);
    assert_eq!(bank.balance_of(&owner.id).await, Decimal::from(1300));

    let approval_date = approved.approval_date.unwrap().to_chrono();
    let due_date = approved.due_date.unwrap().to_chrono();
    assert_eq!(due_date - approval_date, Duration::days(360));
}

#[tokio::test]
async fn second_approval_is_invalid_state_and_credits_once() {
    let bank = TestBank::new();
    let owner = bank
        .seed_account("alice@example.com", "1000000001", Decimal::ZERO)
        .await;
    let loan = bank
        .loan_service
        .apply(&owner.id, application(500, 6))
        .await
        .unwrap();

    bank.loan_service.approve(&loan.id).await.unwrap();
    let err = bank.loan_service.approve(&loan.id).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(bank.balance_of(&owner.id).await, Decimal::from(500));
}

#[tokio::test]
async fn rejection_is_terminal_and_moves_no_money() {
    let bank = TestBank::new();
    let owner = bank
        .seed_account("alice@example.com", "1000000001", Decimal::from(100))
        .await;
    let loan = bank
        .loan_service
        .apply(&owner.id, application(500, 6))
        .await
        .unwrap();

    let rejected = bank.loan_service.reject(&loan.id).await.unwrap();
    assert_eq!(rejected.status, LoanStatus::Rejected);
    assert_eq!(bank.balance_of(&owner.id).await, Decimal::from(100));

    let err = bank.loan_service.approve(&loan.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(bank.balance_of(&owner.id).await, Decimal::from(100));
}

#[tokio::test]
async fn approving_a_missing_loan_is_not_found() {
    let bank = TestBank::new();
    let err = bank.loan_service.approve("no-such-loan").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn approval_without_an_owner_account_leaves_the_loan_pending() {
    let bank = TestBank::new();
    let loan = bank
        .loan_service
        .apply("ghost-user", application(500, 6))
        .await
        .unwrap();

    let err = bank.loan_service.approve(&loan.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let current = bank.loans.get_by_id(&loan.id).await.unwrap().unwrap();
    assert_eq!(current.status, LoanStatus::Pending);
}

#[tokio::test]
async fn failed_disbursement_reverts_the_approval() {
    let bank = TestBank::new();
    let owner = bank
        .seed_account("alice@example.com", "1000000001", Decimal::from(100))
        .await;
    let loan = bank
        .loan_service
        .apply(&owner.id, application(500, 6))
        .await
        .unwrap();

    bank.accounts.fail_nth_balance_write(1);

    let err = bank.loan_service.approve(&loan.id).await.unwrap_err();
    assert!(matches!(err, AppError::StorageUnavailable(_)));
    assert_eq!(bank.balance_of(&owner.id).await, Decimal::from(100));

    let current = bank.loans.get_by_id(&loan.id).await.unwrap().unwrap();
    assert_eq!(current.status, LoanStatus::Pending);
    assert!(current.approval_date.is_none());
    assert!(current.due_date.is_none());
}

#[tokio::test]
async fn listing_joins_owner_details_and_filters_by_status() {
    let bank = TestBank::new();
    let owner = bank
        .seed_account("alice@example.com", "1000000001", Decimal::ZERO)
        .await;

    let approved = bank
        .loan_service
        .apply(&owner.id, application(500, 6))
        .await
        .unwrap();
    bank.loan_service.approve(&approved.id).await.unwrap();
    bank.loan_service
        .apply(&owner.id, application(300, 12))
        .await
        .unwrap();
    bank.loan_service
        .apply("ghost-user", application(700, 12))
        .await
        .unwrap();

    let pending = bank
        .loan_service
        .list_all(10, 0, Some(LoanStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.total, 2);
    assert!(pending
        .items
        .iter()
        .all(|l| l.loan.status == LoanStatus::Pending));

    let all = bank.loan_service.list_all(10, 0, None).await.unwrap();
    assert_eq!(all.total, 3);

    let owned = all.items.iter().find(|l| l.loan.user_id == owner.id).unwrap();
    assert_eq!(owned.account_number, owner.account_number);
    assert_eq!(owned.user_name, "Test User");

    let orphan = all
        .items
        .iter()
        .find(|l| l.loan.user_id == "ghost-user")
        .unwrap();
    assert_eq!(orphan.account_number, "Unknown");
    assert_eq!(orphan.user_name, "Unknown User");
}

#[tokio::test]
async fn loans_for_user_only_returns_their_loans() {
    let bank = TestBank::new();
    let alice = bank
        .seed_account("alice@example.com", "1000000001", Decimal::ZERO)
        .await;
    let bob = bank
        .seed_account("bob@example.com", "1000000002", Decimal::ZERO)
        .await;

    bank.loan_service
        .apply(&alice.id, application(500, 6))
        .await
        .unwrap();
    bank.loan_service
        .apply(&bob.id, application(300, 6))
        .await
        .unwrap();

    let loans = bank.loan_service.loans_for_user(&alice.id).await.unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].amount, Decimal::from(500));
}
