//! Read-only reporting projections for the back-office dashboard.
//!
//! These run without the per-account locks and tolerate snapshot
//! consistency; none of them participate in the ledger's correctness
//! contract. Scans are capped at the repository level.

use crate::models::{LoanStatus, TransactionType};
use crate::repositories::{
    AccountRepository, LoanRepository, TransactionRepository, SCAN_CAP,
};
use bank_core::error::AppError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_accounts: u64,
    pub active_accounts: u64,
    pub total_transactions: u64,
    pub transaction_volume: Decimal,
    pub total_loans: u64,
    pub pending_loans: u64,
    pub approved_loans: u64,
    pub total_loan_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: u64,
    pub volume: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyCount {
    /// `YYYY-MM` label.
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: LoanStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Transaction,
    Loan,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub id: String,
    pub kind: ActivityKind,
    pub description: String,
    pub amount: Decimal,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub account: Option<String>,
    pub user_name: String,
}

#[derive(Clone)]
pub struct ReportingService {
    accounts: Arc<dyn AccountRepository>,
    transactions: Arc<dyn TransactionRepository>,
    loans: Arc<dyn LoanRepository>,
}

impl ReportingService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        transactions: Arc<dyn TransactionRepository>,
        loans: Arc<dyn LoanRepository>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            loans,
        }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let total_accounts = self.accounts.count().await?;
        // Placeholder heuristic carried over from the dashboard: assume 80%
        // of accounts are active until login activity is tracked.
        let active_accounts = (total_accounts as f64 * 0.8) as u64;

        Ok(DashboardStats {
            total_accounts,
            active_accounts,
            total_transactions: self.transactions.count(None).await?,
            transaction_volume: self.transactions.total_volume().await?,
            total_loans: self.loans.count(None).await?,
            pending_loans: self.loans.count(Some(LoanStatus::Pending)).await?,
            approved_loans: self.loans.count(Some(LoanStatus::Approved)).await?,
            total_loan_amount: self.loans.total_amount().await?,
        })
    }

    /// Transactions bucketed per day over the trailing `days`-day window,
    /// oldest bucket first.
    pub async fn transaction_chart(&self, days: i64) -> Result<Vec<DailyActivity>, AppError> {
        let end = Utc::now();
        let start = end - Duration::days(days);
        let transactions = self.transactions.in_date_range(start, end).await?;

        let mut buckets: Vec<DailyActivity> = (0..days)
            .map(|i| DailyActivity {
                date: (end - Duration::days(days - i - 1)).date_naive(),
                count: 0,
                volume: Decimal::ZERO,
            })
            .collect();
        let index: HashMap<NaiveDate, usize> = buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| (bucket.date, i))
            .collect();

        for transaction in transactions {
            if let Some(&i) = index.get(&transaction.timestamp.date_naive()) {
                buckets[i].count += 1;
                buckets[i].volume += transaction.amount;
            }
        }

        Ok(buckets)
    }

    /// Distribution of transactions by type over a capped scan.
    pub async fn transaction_distribution(&self) -> Result<Vec<TypeCount>, AppError> {
        let transactions = self.transactions.list_all(SCAN_CAP, 0, None).await?;

        let kinds = [
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::Transfer,
        ];
        Ok(kinds
            .into_iter()
            .map(|kind| TypeCount {
                transaction_type: kind,
                count: transactions
                    .iter()
                    .filter(|t| t.transaction_type == kind)
                    .count() as u64,
            })
            .collect())
    }

    /// Accounts opened per calendar month over the trailing `months`-month
    /// window (30-day month approximation for the window start).
    pub async fn account_growth(&self, months: u32) -> Result<Vec<MonthlyCount>, AppError> {
        let end = Utc::now();
        let start = end - Duration::days(30 * months as i64);
        let accounts = self.accounts.created_in_range(start, end).await?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for account in &accounts {
            let label = month_label(account.created_at.year(), account.created_at.month());
            *counts.entry(label).or_default() += 1;
        }

        Ok(month_labels(start, end)
            .into_iter()
            .map(|month| MonthlyCount {
                count: counts.get(&month).copied().unwrap_or(0),
                month,
            })
            .collect())
    }

    pub async fn loan_status_distribution(&self) -> Result<Vec<StatusCount>, AppError> {
        let mut distribution = Vec::with_capacity(LoanStatus::ALL.len());
        for status in LoanStatus::ALL {
            distribution.push(StatusCount {
                status,
                count: self.loans.count(Some(status)).await?,
            });
        }
        Ok(distribution)
    }

    /// Merged feed of the most recent transactions and loan applications,
    /// newest first.
    pub async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityItem>, AppError> {
        let transactions = self.transactions.recent(limit).await?;
        let loans = self.loans.recent(limit).await?;

        let mut activities = Vec::with_capacity(transactions.len() + loans.len());

        for transaction in transactions {
            let account = transaction
                .from_account
                .clone()
                .or_else(|| transaction.to_account.clone());
            activities.push(ActivityItem {
                id: transaction.id.clone(),
                kind: ActivityKind::Transaction,
                description: format!(
                    "{} of {}",
                    type_label(transaction.transaction_type),
                    transaction.amount
                ),
                amount: transaction.amount,
                status: transaction.status.as_str().to_string(),
                timestamp: transaction.timestamp,
                user_name: match &account {
                    Some(number) => format!("Account {}", number),
                    None => "System".to_string(),
                },
                account,
            });
        }

        for loan in loans {
            let owner = self.accounts.get_by_id(&loan.user_id).await?;
            activities.push(ActivityItem {
                id: loan.id.clone(),
                kind: ActivityKind::Loan,
                description: format!("Loan application for {}", loan.amount),
                amount: loan.amount,
                status: loan.status.as_str().to_string(),
                timestamp: loan.request_date,
                account: owner.as_ref().map(|a| a.account_number.clone()),
                user_name: owner
                    .as_ref()
                    .map(|a| a.display_name())
                    .unwrap_or_else(|| "Unknown User".to_string()),
            });
        }

        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities.truncate(limit.max(0) as usize);
        Ok(activities)
    }
}

fn type_label(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Transfer => "Transfer",
        TransactionType::Deposit => "Deposit",
        TransactionType::Withdrawal => "Withdrawal",
    }
}

fn month_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// `YYYY-MM` labels for every calendar month between `start` and `end`.
fn month_labels(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<String> {
    let mut labels = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    loop {
        labels.push(month_label(year, month));
        if year == end.year() && month == end.month() {
            break;
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_labels_span_year_boundaries() {
        let start = Utc.with_ymd_and_hms(2025, 11, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            month_labels(start, end),
            vec!["2025-11", "2025-12", "2026-01", "2026-02"]
        );
    }
}
