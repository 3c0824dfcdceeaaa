//! Account lifecycle: opening, profile reads and updates, listings.

use crate::models::{Account, CreateAccount, Page, ProfileUpdate};
use crate::repositories::AccountRepository;
use bank_core::error::AppError;
use bank_core::retry::{retry_storage_read, RetryConfig};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Attempts at drawing an unused account number before giving up with
/// `ResourceExhausted`.
const ACCOUNT_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    retry: RetryConfig,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self {
            accounts,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Open a new account with a zero balance and a fresh account number.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn open_account(&self, input: CreateAccount) -> Result<Account, AppError> {
        input.validate()?;

        if self.accounts.get_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Email {} is already registered",
                input.email
            )));
        }

        let account_number = self.generate_account_number().await?;
        let account = self.accounts.create(Account::new(input, account_number)).await?;

        info!(
            account_id = %account.id,
            account_number = %account.account_number,
            "Account opened"
        );
        Ok(account)
    }

    /// Draw random 10-digit numbers until one is unused, up to a bound.
    async fn generate_account_number(&self) -> Result<String, AppError> {
        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            let candidate = random_account_number();
            let existing = retry_storage_read(&self.retry, "accounts.get_by_account_number", || {
                self.accounts.get_by_account_number(&candidate)
            })
            .await?;
            if existing.is_none() {
                return Ok(candidate);
            }
        }
        Err(AppError::ResourceExhausted(anyhow::anyhow!(
            "Could not allocate a unique account number after {} attempts",
            ACCOUNT_NUMBER_ATTEMPTS
        )))
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Account, AppError> {
        retry_storage_read(&self.retry, "accounts.get_by_id", || {
            self.accounts.get_by_id(user_id)
        })
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))
    }

    /// Apply a partial profile update. An email already used by a different
    /// account is rejected with `Conflict`.
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Account, AppError> {
        update.validate()?;

        if let Some(email) = &update.email {
            if let Some(existing) = self.accounts.get_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "Email {} is already in use",
                        email
                    )));
                }
            }
        }

        self.accounts
            .update_profile(user_id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))
    }

    pub async fn list(&self, limit: i64, offset: u64) -> Result<Page<Account>, AppError> {
        let items = self.accounts.list(limit, offset).await?;
        let total = self.accounts.count().await?;
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }
}

fn random_account_number() -> String {
    rand::thread_rng()
        .gen_range(1_000_000_000u64..=9_999_999_999u64)
        .to_string()
}
