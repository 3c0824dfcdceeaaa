//! Loan engine: application, approval, rejection, and disbursement.
//!
//! State machine: pending -> approved | rejected; both are terminal ("paid"
//! is reserved). The transition itself is a conditional update keyed on the
//! current status, so a lost race surfaces as `InvalidState` rather than a
//! double transition.

use crate::models::{Loan, LoanApplication, LoanStatus, LoanWithOwner, Page};
use crate::repositories::{AccountRepository, LoanRepository};
use crate::services::locks::AccountLocks;
use bank_core::error::AppError;
use bank_core::retry::{retry_storage_read, RetryConfig};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct LoanService {
    loans: Arc<dyn LoanRepository>,
    accounts: Arc<dyn AccountRepository>,
    locks: Arc<AccountLocks>,
    retry: RetryConfig,
}

impl LoanService {
    pub fn new(
        loans: Arc<dyn LoanRepository>,
        accounts: Arc<dyn AccountRepository>,
        locks: Arc<AccountLocks>,
    ) -> Self {
        Self {
            loans,
            accounts,
            locks,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Apply for a loan. The interest rate (`5 + term/12` percent) is fixed
    /// here and never recomputed.
    #[instrument(skip(self, application), fields(user_id = %user_id, amount = %application.amount, term = application.term))]
    pub async fn apply(
        &self,
        user_id: &str,
        application: LoanApplication,
    ) -> Result<Loan, AppError> {
        use validator::Validate;
        application.validate()?;
        if application.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Loan amount must be positive"
            )));
        }

        let loan = Loan::new(user_id.to_string(), application.amount, application.term);
        let loan = self.loans.create(loan).await?;
        info!(loan_id = %loan.id, interest_rate = loan.interest_rate, "Loan application created");
        Ok(loan)
    }

    /// Approve a pending loan and disburse its amount to the owner's balance.
    /// The status flip and the credit succeed or fail together: a failed
    /// credit reverts the loan to pending.
    #[instrument(skip(self), fields(loan_id = %loan_id))]
    pub async fn approve(&self, loan_id: &str) -> Result<Loan, AppError> {
        let loan = self.require_loan(loan_id).await?;
        if loan.status != LoanStatus::Pending {
            return Err(AppError::InvalidState(anyhow::anyhow!(
                "Loan is already {}",
                loan.status
            )));
        }

        // Resolve the borrower before flipping status: approving a loan with
        // no owner account would disburse nothing.
        let owner = retry_storage_read(&self.retry, "accounts.get_by_id", || {
            self.accounts.get_by_id(&loan.user_id)
        })
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Loan owner account not found")))?;

        let _guard = self.locks.acquire(&owner.id).await;

        // Balance must be re-read under the lock.
        let owner = retry_storage_read(&self.retry, "accounts.get_by_id", || {
            self.accounts.get_by_id(&owner.id)
        })
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Loan owner account not found")))?;

        let approval_date = Utc::now();
        let due_date = loan.due_date_from(approval_date);

        let Some(approved) = self
            .loans
            .transition(
                loan_id,
                LoanStatus::Pending,
                LoanStatus::Approved,
                Some(approval_date),
                Some(due_date),
            )
            .await?
        else {
            // Lost the race; report whichever status won.
            let current = self.require_loan(loan_id).await?;
            return Err(AppError::InvalidState(anyhow::anyhow!(
                "Loan is already {}",
                current.status
            )));
        };

        match self
            .accounts
            .update_balance(&owner.id, owner.balance + loan.amount)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                self.revert_approval(loan_id).await;
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Loan owner account not found"
                )));
            }
            Err(err) => {
                self.revert_approval(loan_id).await;
                return Err(err);
            }
        }

        info!(
            user_id = %owner.id,
            amount = %loan.amount,
            due_date = %due_date,
            "Loan approved and disbursed"
        );
        Ok(approved)
    }

    /// Reject a pending loan. No balance effect.
    #[instrument(skip(self), fields(loan_id = %loan_id))]
    pub async fn reject(&self, loan_id: &str) -> Result<Loan, AppError> {
        let loan = self.require_loan(loan_id).await?;
        if loan.status != LoanStatus::Pending {
            return Err(AppError::InvalidState(anyhow::anyhow!(
                "Loan is already {}",
                loan.status
            )));
        }

        match self
            .loans
            .transition(loan_id, LoanStatus::Pending, LoanStatus::Rejected, None, None)
            .await?
        {
            Some(rejected) => {
                info!("Loan rejected");
                Ok(rejected)
            }
            None => {
                let current = self.require_loan(loan_id).await?;
                Err(AppError::InvalidState(anyhow::anyhow!(
                    "Loan is already {}",
                    current.status
                )))
            }
        }
    }

    pub async fn loans_for_user(&self, user_id: &str) -> Result<Vec<Loan>, AppError> {
        self.loans.list_by_user(user_id).await
    }

    /// Back-office listing: loans joined with owner account details.
    pub async fn list_all(
        &self,
        limit: i64,
        offset: u64,
        status: Option<LoanStatus>,
    ) -> Result<Page<LoanWithOwner>, AppError> {
        let loans = self.loans.list_all(limit, offset, status).await?;
        let total = self.loans.count(status).await?;

        let mut items = Vec::with_capacity(loans.len());
        for loan in loans {
            let owner = self.accounts.get_by_id(&loan.user_id).await?;
            items.push(LoanWithOwner::new(loan, owner.as_ref()));
        }

        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    pub async fn count(&self, status: Option<LoanStatus>) -> Result<u64, AppError> {
        self.loans.count(status).await
    }

    async fn require_loan(&self, loan_id: &str) -> Result<Loan, AppError> {
        retry_storage_read(&self.retry, "loans.get_by_id", || {
            self.loans.get_by_id(loan_id)
        })
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Loan not found")))
    }

    /// Best-effort rollback of an approval whose disbursement failed. A
    /// failure here leaves the loan approved-but-uncredited and is logged
    /// for reconciliation.
    async fn revert_approval(&self, loan_id: &str) {
        match self
            .loans
            .transition(loan_id, LoanStatus::Approved, LoanStatus::Pending, None, None)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => {
                error!("Loan vanished or changed state while reverting a failed approval");
            }
            Err(err) => {
                error!(error = %err, "Failed to revert loan approval after disbursement failure");
            }
        }
    }
}
