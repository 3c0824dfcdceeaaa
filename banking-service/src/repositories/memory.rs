//! In-memory repositories for tests and local development.
//!
//! Same contracts as the MongoDB implementations, backed by `RwLock`ed
//! vectors. The account and transaction stores carry failure-injection
//! switches so the engines' compensation paths can be exercised.

use super::{
    AccountRepository, LoanRepository, TransactionRepository, LOAN_SCAN_CAP, SCAN_CAP,
};
use crate::models::{
    Account, Loan, LoanStatus, ProfileUpdate, Transaction, TransactionType,
};
use async_trait::async_trait;
use bank_core::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::RwLock;

fn storage_down() -> AppError {
    AppError::StorageUnavailable(anyhow::anyhow!("injected storage failure"))
}

fn page<T: Clone>(items: &[T], limit: i64, offset: u64) -> Vec<T> {
    items
        .iter()
        .skip(offset as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<Vec<Account>>,
    /// Countdown to a one-shot balance-write failure: when it reaches 1 the
    /// write fails and the switch disarms.
    fail_balance_write_in: AtomicU32,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`-th subsequent balance write fail with `StorageUnavailable`
    /// (1 = the very next write). One-shot.
    pub fn fail_nth_balance_write(&self, n: u32) {
        self.fail_balance_write_in.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn get_by_account_number(&self, number: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.account_number == number).cloned())
    }

    async fn create(&self, account: Account) -> Result<Account, AppError> {
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|a| a.account_number == account.account_number) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Account number {} already exists",
                account.account_number
            )));
        }
        accounts.push(account.clone());
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Account>, AppError> {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(first_name) = &update.first_name {
            account.first_name = first_name.clone();
        }
        if let Some(last_name) = &update.last_name {
            account.last_name = last_name.clone();
        }
        if let Some(email) = &update.email {
            account.email = email.clone();
        }
        Ok(Some(account.clone()))
    }

    async fn update_balance(&self, id: &str, new_balance: Decimal) -> Result<bool, AppError> {
        let armed = self.fail_balance_write_in.load(Ordering::SeqCst);
        if armed > 0 && self.fail_balance_write_in.fetch_sub(1, Ordering::SeqCst) == 1 {
            return Err(storage_down());
        }

        let mut accounts = self.accounts.write().await;
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.balance = new_balance;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, limit: i64, offset: u64) -> Result<Vec<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(page(&accounts, limit, offset))
    }

    async fn count(&self) -> Result<u64, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.len() as u64)
    }

    async fn created_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Account>, AppError> {
        let accounts = self.accounts.read().await;
        let mut matched: Vec<Account> = accounts
            .iter()
            .filter(|a| a.created_at >= start && a.created_at <= end)
            .cloned()
            .collect();
        matched.sort_by_key(|a| a.created_at);
        Ok(matched)
    }
}

#[derive(Default)]
pub struct InMemoryTransactionRepository {
    transactions: RwLock<Vec<Transaction>>,
    fail_create_in: AtomicU32,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`-th subsequent record insert fail with
    /// `StorageUnavailable` (1 = the very next insert). One-shot.
    pub fn fail_nth_create(&self, n: u32) {
        self.fail_create_in.store(n, Ordering::SeqCst);
    }

    fn touches(transaction: &Transaction, account_number: &str) -> bool {
        transaction.from_account.as_deref() == Some(account_number)
            || transaction.to_account.as_deref() == Some(account_number)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, AppError> {
        let armed = self.fail_create_in.load(Ordering::SeqCst);
        if armed > 0 && self.fail_create_in.fetch_sub(1, Ordering::SeqCst) == 1 {
            return Err(storage_down());
        }
        let mut transactions = self.transactions.write().await;
        transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_account(
        &self,
        account_number: &str,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        let mut matched: Vec<Transaction> = transactions
            .iter()
            .filter(|t| Self::touches(t, account_number))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(page(&matched, limit, offset))
    }

    async fn count_by_account(&self, account_number: &str) -> Result<u64, AppError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|t| Self::touches(t, account_number))
            .count() as u64)
    }

    async fn list_all(
        &self,
        limit: i64,
        offset: u64,
        transaction_type: Option<TransactionType>,
    ) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        let mut matched: Vec<Transaction> = transactions
            .iter()
            .filter(|t| transaction_type.map_or(true, |ty| t.transaction_type == ty))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(page(&matched, limit, offset))
    }

    async fn count(&self, transaction_type: Option<TransactionType>) -> Result<u64, AppError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|t| transaction_type.map_or(true, |ty| t.transaction_type == ty))
            .count() as u64)
    }

    async fn total_volume(&self) -> Result<Decimal, AppError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().map(|t| t.amount).sum())
    }

    async fn in_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.transactions.read().await;
        let mut matched: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.timestamp >= start && t.timestamp <= end)
            .cloned()
            .collect();
        matched.sort_by_key(|t| t.timestamp);
        matched.truncate(SCAN_CAP as usize);
        Ok(matched)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Transaction>, AppError> {
        self.list_all(limit, 0, None).await
    }
}

#[derive(Default)]
pub struct InMemoryLoanRepository {
    loans: RwLock<Vec<Loan>>,
}

impl InMemoryLoanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanRepository for InMemoryLoanRepository {
    async fn create(&self, loan: Loan) -> Result<Loan, AppError> {
        let mut loans = self.loans.write().await;
        loans.push(loan.clone());
        Ok(loan)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Loan>, AppError> {
        let loans = self.loans.read().await;
        Ok(loans.iter().find(|l| l.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Loan>, AppError> {
        let loans = self.loans.read().await;
        Ok(loans
            .iter()
            .filter(|l| l.user_id == user_id)
            .take(LOAN_SCAN_CAP as usize)
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        id: &str,
        from: LoanStatus,
        to: LoanStatus,
        approval_date: Option<DateTime<Utc>>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Option<Loan>, AppError> {
        let mut loans = self.loans.write().await;
        let Some(loan) = loans.iter_mut().find(|l| l.id == id && l.status == from) else {
            return Ok(None);
        };
        loan.status = to;
        loan.approval_date = approval_date.map(bson::DateTime::from_chrono);
        loan.due_date = due_date.map(bson::DateTime::from_chrono);
        Ok(Some(loan.clone()))
    }

    async fn list_all(
        &self,
        limit: i64,
        offset: u64,
        status: Option<LoanStatus>,
    ) -> Result<Vec<Loan>, AppError> {
        let loans = self.loans.read().await;
        let matched: Vec<Loan> = loans
            .iter()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .cloned()
            .collect();
        Ok(page(&matched, limit, offset))
    }

    async fn count(&self, status: Option<LoanStatus>) -> Result<u64, AppError> {
        let loans = self.loans.read().await;
        Ok(loans
            .iter()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .count() as u64)
    }

    async fn total_amount(&self) -> Result<Decimal, AppError> {
        let loans = self.loans.read().await;
        Ok(loans.iter().map(|l| l.amount).sum())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Loan>, AppError> {
        let loans = self.loans.read().await;
        let mut matched: Vec<Loan> = loans.to_vec();
        matched.sort_by(|a, b| b.request_date.cmp(&a.request_date));
        matched.truncate(limit.max(0) as usize);
        Ok(matched)
    }
}
