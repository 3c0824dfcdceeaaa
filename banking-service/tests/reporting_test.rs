mod common;

use banking_service::models::{LoanApplication, LoanStatus, TransactionType};
use banking_service::services::reporting::ActivityKind;
use chrono::{Datelike, Utc};
use common::{deposit, transfer, withdrawal, TestBank};
use rust_decimal::Decimal;
use std::time::Duration;

#[tokio::test]
async fn dashboard_stats_aggregate_across_stores() {
    let bank = TestBank::new();
    let alice = bank
        .seed_account("alice@example.com", "1000000001", Decimal::from(100))
        .await;
    let bob = bank
        .seed_account("bob@example.com", "1000000002", Decimal::ZERO)
        .await;

    bank.transaction_service
        .create_transaction(&alice.id, deposit(Decimal::from(100)))
        .await
        .unwrap();
    bank.transaction_service
        .create_transaction(&alice.id, transfer(Decimal::from(30), &bob.account_number))
        .await
        .unwrap();

    let approved = bank
        .loan_service
        .apply(&bob.id, LoanApplication {
            amount: Decimal::from(500),
            term: 6,
        })
        .await
        .unwrap();
    bank.loan_service.approve(&approved.id).await.unwrap();
    bank.loan_service
        .apply(&alice.id, LoanApplication {
            amount: Decimal::from(300),
            term: 12,
        })
        .await
        .unwrap();

    let stats = bank.reporting.dashboard_stats().await.unwrap();

    assert_eq!(stats.total_accounts, 2);
    assert_eq!(stats.active_accounts, 1);
    assert_eq!(stats.total_transactions, 2);
    assert_eq!(stats.transaction_volume, Decimal::from(130));
    assert_eq!(stats.total_loans, 2);
    assert_eq!(stats.pending_loans, 1);
    assert_eq!(stats.approved_loans, 1);
    assert_eq!(stats.total_loan_amount, Decimal::from(800));
}

#[tokio::test]
async fn distribution_counts_transactions_by_type() {
    let bank = TestBank::new();
    let alice = bank
        .seed_account("alice@example.com", "1000000001", Decimal::from(100))
        .await;
    let bob = bank
        .seed_account("bob@example.com", "1000000002", Decimal::ZERO)
        .await;

    for _ in 0..2 {
        bank.transaction_service
            .create_transaction(&alice.id, deposit(Decimal::from(10)))
            .await
            .unwrap();
    }
    bank.transaction_service
        .create_transaction(&alice.id, withdrawal(Decimal::from(5)))
        .await
        .unwrap();
    bank.transaction_service
        .create_transaction(&alice.id, transfer(Decimal::from(20), &bob.account_number))
        .await
        .unwrap();

    let distribution = bank.reporting.transaction_distribution().await.unwrap();

    let count_of = |kind: TransactionType| {
        distribution
            .iter()
            .find(|entry| entry.transaction_type == kind)
            .unwrap()
            .count
    };
    assert_eq!(count_of(TransactionType::Deposit), 2);
    assert_eq!(count_of(TransactionType::Withdrawal), 1);
    assert_eq!(count_of(TransactionType::Transfer), 1);
}

#[tokio::test]
async fn recent_activity_merges_newest_first() {
    let bank = TestBank::new();
    let alice = bank
        .seed_account("alice@example.com", "1000000001", Decimal::from(100))
        .await;

    bank.transaction_service
        .create_transaction(&alice.id, deposit(Decimal::from(50)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    bank.loan_service
        .apply(&alice.id, LoanApplication {
            amount: Decimal::from(500),
            term: 6,
        })
        .await
        .unwrap();

    let activity = bank.reporting.recent_activity(10).await.unwrap();

    assert_eq!(activity.len(), 2);
    assert!(matches!(activity[0].kind, ActivityKind::Loan));
    assert_eq!(activity[0].description, "Loan application for 500");
    assert_eq!(activity[0].user_name, "Test User");
    assert!(matches!(activity[1].kind, ActivityKind::Transaction));
    assert_eq!(activity[1].description, "Deposit of 50");

    let truncated = bank.reporting.recent_activity(1).await.unwrap();
    assert_eq!(truncated.len(), 1);
    assert!(matches!(truncated[0].kind, ActivityKind::Loan));
}

#[tokio::test]
async fn transaction_chart_buckets_by_day() {
    let bank = TestBank::new();
    let alice = bank
        .seed_account("alice@example.com", "1000000001", Decimal::ZERO)
        .await;

    bank.transaction_service
        .create_transaction(&alice.id, deposit(Decimal::from(50)))
        .await
        .unwrap();
    bank.transaction_service
        .create_transaction(&alice.id, deposit(Decimal::from(20)))
        .await
        .unwrap();

    let chart = bank.reporting.transaction_chart(7).await.unwrap();

    assert_eq!(chart.len(), 7);
    let today = chart.last().unwrap();
    assert_eq!(today.date, Utc::now().date_naive());
    assert_eq!(today.count, 2);
    assert_eq!(today.volume, Decimal::from(70));
    assert!(chart[..6].iter().all(|bucket| bucket.count == 0));
}

#[tokio::test]
async fn account_growth_buckets_by_month() {
    let bank = TestBank::new();
    for i in 0..3 {
        bank.seed_account(
            &format!("user{}@example.com", i),
            &format!("100000000{}", i),
            Decimal::ZERO,
        )
        .await;
    }

    let growth = bank.reporting.account_growth(3).await.unwrap();

    let now = Utc::now();
    let current_month = format!("{:04}-{:02}", now.year(), now.month());
    assert_eq!(growth.last().unwrap().month, current_month);
    assert_eq!(growth.last().unwrap().count, 3);
    assert_eq!(growth.iter().map(|m| m.count).sum::<u64>(), 3);
}

#[tokio::test]
async fn loan_status_distribution_covers_every_status() {
    let bank = TestBank::new();
    let alice = bank
        .seed_account("alice@example.com", "1000000001", Decimal::ZERO)
        .await;

    let approved = bank
        .loan_service
        .apply(&alice.id, LoanApplication {
            amount: Decimal::from(500),
            term: 6,
        })
        .await
        .unwrap();
    bank.loan_service.approve(&approved.id).await.unwrap();
    bank.loan_service
        .apply(&alice.id, LoanApplication {
            amount: Decimal::from(300),
            term: 6,
        })
        .await
        .unwrap();

    let distribution = bank.reporting.loan_status_distribution().await.unwrap();

    assert_eq!(distribution.len(), LoanStatus::ALL.len());
    let count_of = |status: LoanStatus| {
        distribution
            .iter()
            .find(|entry| entry.status == status)
            .unwrap()
            .count
    };
    assert_eq!(count_of(LoanStatus::Pending), 1);
    assert_eq!(count_of(LoanStatus::Approved), 1);
    assert_eq!(count_of(LoanStatus::Rejected), 0);
    assert_eq!(count_of(LoanStatus::Paid), 0);
}
