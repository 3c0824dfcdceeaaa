//! Ledger engine: validates and applies balance-changing operations.
//!
//! Contract per call: either every balance mutation and the transaction
//! record are committed, or none are. The store offers no multi-document
//! transaction, so writes after the first are compensated on failure while
//! the per-account locks keep the intermediate state unobservable.

use crate::models::{CreateTransaction, Page, Transaction, TransactionType};
use crate::repositories::{AccountRepository, TransactionRepository};
use crate::services::locks::AccountLocks;
use bank_core::error::AppError;
use bank_core::retry::{retry_storage_read, RetryConfig};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::Account;

#[derive(Clone)]
pub struct TransactionService {
    accounts: Arc<dyn AccountRepository>,
    transactions: Arc<dyn TransactionRepository>,
    locks: Arc<AccountLocks>,
    retry: RetryConfig,
}

impl TransactionService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        transactions: Arc<dyn TransactionRepository>,
        locks: Arc<AccountLocks>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            locks,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Apply a balance-changing operation initiated by `user_id`.
    #[instrument(
        skip(self, request),
        fields(
            user_id = %user_id,
            transaction_type = %request.transaction_type,
            amount = %request.amount,
        )
    )]
    pub async fn create_transaction(
        &self,
        user_id: &str,
        request: CreateTransaction,
    ) -> Result<Transaction, AppError> {
        if request.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Transaction amount must be positive"
            )));
        }

        match request.transaction_type {
            TransactionType::Transfer => self.transfer(user_id, request).await,
            TransactionType::Deposit => self.deposit(user_id, request).await,
            TransactionType::Withdrawal => self.withdrawal(user_id, request).await,
        }
    }

    async fn transfer(
        &self,
        user_id: &str,
        request: CreateTransaction,
    ) -> Result<Transaction, AppError> {
        let to_number = request.to_account.as_deref().ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Recipient account number is required for transfers"
            ))
        })?;

        // Resolve both parties to learn their lock keys; balances are
        // re-read under the locks.
        let sender = self.require_account(user_id, "Sender").await?;
        let recipient = retry_storage_read(&self.retry, "accounts.get_by_account_number", || {
            self.accounts.get_by_account_number(to_number)
        })
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Recipient account not found")))?;

        if sender.id == recipient.id {
            return Err(AppError::SameAccount);
        }

        let _guards = self.locks.acquire_pair(&sender.id, &recipient.id).await;

        let sender = self.require_account(&sender.id, "Sender").await?;
        let recipient = self.require_account(&recipient.id, "Recipient").await?;

        if sender.balance < request.amount {
            return Err(AppError::InsufficientFunds);
        }

        self.write_balance(&sender.id, sender.balance - request.amount)
            .await?;

        if let Err(err) = self
            .write_balance(&recipient.id, recipient.balance + request.amount)
            .await
        {
            self.compensate_balance(&sender.id, sender.balance).await;
            return Err(err);
        }

        let record = Transaction::transfer(
            sender.account_number.clone(),
            recipient.account_number.clone(),
            request.amount,
            request.description,
        );
        match self.transactions.create(record).await {
            Ok(record) => {
                info!(
                    transaction_id = %record.id,
                    from = %sender.account_number,
                    to = %recipient.account_number,
                    "Transfer completed"
                );
                Ok(record)
            }
            Err(err) => {
                self.compensate_balance(&recipient.id, recipient.balance)
                    .await;
                self.compensate_balance(&sender.id, sender.balance).await;
                Err(err)
            }
        }
    }

    async fn deposit(
        &self,
        user_id: &str,
        request: CreateTransaction,
    ) -> Result<Transaction, AppError> {
        let _guard = self.locks.acquire(user_id).await;

        let account = self.require_account(user_id, "Account").await?;

        self.write_balance(&account.id, account.balance + request.amount)
            .await?;

        let record = Transaction::deposit(
            account.account_number.clone(),
            request.amount,
            request.description,
        );
        match self.transactions.create(record).await {
            Ok(record) => {
                info!(transaction_id = %record.id, to = %account.account_number, "Deposit completed");
                Ok(record)
            }
            Err(err) => {
                self.compensate_balance(&account.id, account.balance).await;
                Err(err)
            }
        }
    }

    async fn withdrawal(
        &self,
        user_id: &str,
        request: CreateTransaction,
    ) -> Result<Transaction, AppError> {
        let _guard = self.locks.acquire(user_id).await;

        let account = self.require_account(user_id, "Account").await?;

        if account.balance < request.amount {
            return Err(AppError::InsufficientFunds);
        }

        self.write_balance(&account.id, account.balance - request.amount)
            .await?;

        let record = Transaction::withdrawal(
            account.account_number.clone(),
            request.amount,
            request.description,
        );
        match self.transactions.create(record).await {
            Ok(record) => {
                info!(transaction_id = %record.id, from = %account.account_number, "Withdrawal completed");
                Ok(record)
            }
            Err(err) => {
                self.compensate_balance(&account.id, account.balance).await;
                Err(err)
            }
        }
    }

    async fn require_account(&self, account_id: &str, label: &str) -> Result<Account, AppError> {
        retry_storage_read(&self.retry, "accounts.get_by_id", || {
            self.accounts.get_by_id(account_id)
        })
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("{} account not found", label)))
    }

    async fn write_balance(&self, account_id: &str, new_balance: Decimal) -> Result<(), AppError> {
        if self.accounts.update_balance(account_id, new_balance).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(anyhow::anyhow!(
                "Account {} disappeared during balance update",
                account_id
            )))
        }
    }

    /// Best-effort rollback of an already-committed balance write. A failure
    /// here leaves the account inconsistent and is logged for reconciliation.
    async fn compensate_balance(&self, account_id: &str, balance: Decimal) {
        if let Err(err) = self.accounts.update_balance(account_id, balance).await {
            error!(
                account_id = %account_id,
                error = %err,
                "Failed to roll back balance write; account requires reconciliation"
            );
        }
    }

    // -------------------------------------------------------------------------
    // Read-only queries (no locks taken; snapshot consistency)
    // -------------------------------------------------------------------------

    /// Transactions touching the account, newest first.
    pub async fn transactions_for_account(
        &self,
        account_number: &str,
        limit: i64,
        offset: u64,
    ) -> Result<Page<Transaction>, AppError> {
        let items = self
            .transactions
            .list_by_account(account_number, limit, offset)
            .await?;
        let total = self.transactions.count_by_account(account_number).await?;
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    /// All transactions, newest first, optionally filtered by type.
    pub async fn all_transactions(
        &self,
        limit: i64,
        offset: u64,
        transaction_type: Option<TransactionType>,
    ) -> Result<Page<Transaction>, AppError> {
        let items = self
            .transactions
            .list_all(limit, offset, transaction_type)
            .await?;
        let total = self.transactions.count(transaction_type).await?;
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    /// Sum of all transaction amounts.
    pub async fn total_volume(&self) -> Result<Decimal, AppError> {
        self.transactions.total_volume().await
    }

    /// Transactions in `[start, end]`, oldest first.
    pub async fn transactions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AppError> {
        self.transactions.in_date_range(start, end).await
    }
}
