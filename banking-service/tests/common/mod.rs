#![allow(dead_code)]

use banking_service::models::{Account, CreateAccount, CreateTransaction, TransactionType};
use banking_service::repositories::{
    AccountRepository, InMemoryAccountRepository, InMemoryLoanRepository,
    InMemoryTransactionRepository, LoanRepository, TransactionRepository,
};
use banking_service::services::{
    AccountLocks, AccountService, LoanService, ReportingService, TransactionService,
};
use rust_decimal::Decimal;
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Full engine stack wired over in-memory stores. The raw repositories stay
/// reachable for seeding and failure injection.
pub struct TestBank {
    pub accounts: Arc<InMemoryAccountRepository>,
    pub transactions: Arc<InMemoryTransactionRepository>,
    pub loans: Arc<InMemoryLoanRepository>,
    pub transaction_service: TransactionService,
    pub loan_service: LoanService,
    pub account_service: AccountService,
    pub reporting: ReportingService,
}

impl TestBank {
    pub fn new() -> Self {
        init_tracing();

        let accounts = Arc::new(InMemoryAccountRepository::new());
        let transactions = Arc::new(InMemoryTransactionRepository::new());
        let loans = Arc::new(InMemoryLoanRepository::new());
        let locks = Arc::new(AccountLocks::new());

        let account_repo: Arc<dyn AccountRepository> = accounts.clone();
        let transaction_repo: Arc<dyn TransactionRepository> = transactions.clone();
        let loan_repo: Arc<dyn LoanRepository> = loans.clone();

        Self {
            transaction_service: TransactionService::new(
                account_repo.clone(),
                transaction_repo.clone(),
                locks.clone(),
            ),
            loan_service: LoanService::new(loan_repo.clone(), account_repo.clone(), locks),
            account_service: AccountService::new(account_repo.clone()),
            reporting: ReportingService::new(account_repo, transaction_repo, loan_repo),
            accounts,
            transactions,
            loans,
        }
    }

    /// Insert an account with the given number and opening balance.
    pub async fn seed_account(&self, email: &str, number: &str, balance: Decimal) -> Account {
        let account = Account::new(
            CreateAccount {
                email: email.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
            },
            number.to_string(),
        );
        let account = self.accounts.create(account).await.unwrap();
        self.accounts
            .update_balance(&account.id, balance)
            .await
            .unwrap();
        self.accounts.get_by_id(&account.id).await.unwrap().unwrap()
    }

    pub async fn balance_of(&self, account_id: &str) -> Decimal {
        self.accounts
            .get_by_id(account_id)
            .await
            .unwrap()
            .unwrap()
            .balance
    }
}

pub fn deposit(amount: Decimal) -> CreateTransaction {
    CreateTransaction {
        transaction_type: TransactionType::Deposit,
        amount,
        to_account: None,
        description: None,
    }
}

pub fn withdrawal(amount: Decimal) -> CreateTransaction {
    CreateTransaction {
        transaction_type: TransactionType::Withdrawal,
        amount,
        to_account: None,
        description: None,
    }
}

pub fn transfer(amount: Decimal, to_account: &str) -> CreateTransaction {
    CreateTransaction {
        transaction_type: TransactionType::Transfer,
        amount,
        to_account: Some(to_account.to_string()),
        description: None,
    }
}
