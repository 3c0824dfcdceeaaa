//! Repository interfaces over the account, transaction, and loan stores.
//!
//! The engines consume these traits only; the concrete store (MongoDB in
//! production, in-memory for tests) is injected at construction. None of the
//! stores provide compare-and-swap on balances: callers of `update_balance`
//! must hold the account's serialization lock from read to write.

mod memory;
mod mongo;

pub use memory::{InMemoryAccountRepository, InMemoryLoanRepository, InMemoryTransactionRepository};
pub use mongo::{MongoAccountRepository, MongoDb, MongoLoanRepository, MongoTransactionRepository};

use crate::models::{
    Account, Loan, LoanStatus, ProfileUpdate, Transaction, TransactionType,
};
use async_trait::async_trait;
use bank_core::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Cap for unpaginated scans backing reporting projections.
pub const SCAN_CAP: i64 = 1000;

/// Cap for per-user and per-status loan listings.
pub const LOAN_SCAN_CAP: i64 = 100;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<Account>, AppError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn get_by_account_number(&self, number: &str) -> Result<Option<Account>, AppError>;

    async fn create(&self, account: Account) -> Result<Account, AppError>;

    /// Apply the `Some` fields of `update` and return the updated account, or
    /// `None` when the account does not exist.
    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Account>, AppError>;

    /// Unconditionally set the account's balance. Returns `false` when no
    /// account matched.
    async fn update_balance(&self, id: &str, new_balance: Decimal) -> Result<bool, AppError>;

    async fn list(&self, limit: i64, offset: u64) -> Result<Vec<Account>, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    /// Accounts created in `[start, end]`, oldest first.
    async fn created_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Account>, AppError>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Transaction>, AppError>;

    /// Transactions touching the account (either side), newest first.
    async fn list_by_account(
        &self,
        account_number: &str,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<Transaction>, AppError>;

    async fn count_by_account(&self, account_number: &str) -> Result<u64, AppError>;

    /// All transactions, newest first, optionally filtered by type.
    async fn list_all(
        &self,
        limit: i64,
        offset: u64,
        transaction_type: Option<TransactionType>,
    ) -> Result<Vec<Transaction>, AppError>;

    async fn count(&self, transaction_type: Option<TransactionType>) -> Result<u64, AppError>;

    /// Sum of all transaction amounts.
    async fn total_volume(&self) -> Result<Decimal, AppError>;

    /// Transactions in `[start, end]`, oldest first, capped at [`SCAN_CAP`].
    async fn in_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AppError>;

    /// Most recent transactions, newest first.
    async fn recent(&self, limit: i64) -> Result<Vec<Transaction>, AppError>;
}

#[async_trait]
pub trait LoanRepository: Send + Sync {
    async fn create(&self, loan: Loan) -> Result<Loan, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Loan>, AppError>;

    /// Loans owned by the user, capped at [`LOAN_SCAN_CAP`].
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Loan>, AppError>;

    /// Conditionally move a loan from `from` to `to`, setting or clearing the
    /// approval and due dates. Returns the updated loan, or `None` when the
    /// loan is absent or no longer in `from` (the caller lost a race).
    async fn transition(
        &self,
        id: &str,
        from: LoanStatus,
        to: LoanStatus,
        approval_date: Option<DateTime<Utc>>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Option<Loan>, AppError>;

    async fn list_all(
        &self,
        limit: i64,
        offset: u64,
        status: Option<LoanStatus>,
    ) -> Result<Vec<Loan>, AppError>;

    async fn count(&self, status: Option<LoanStatus>) -> Result<u64, AppError>;

    /// Sum of all loan amounts regardless of status.
    async fn total_amount(&self) -> Result<Decimal, AppError>;

    /// Most recently requested loans, newest first.
    async fn recent(&self, limit: i64) -> Result<Vec<Loan>, AppError>;
}
