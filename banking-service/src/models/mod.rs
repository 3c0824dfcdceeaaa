//! Domain models for banking-service.

mod account;
mod loan;
pub mod money;
mod response;
mod transaction;

pub use account::{Account, CreateAccount, ProfileUpdate, Role};
pub use loan::{Loan, LoanApplication, LoanStatus, LoanWithOwner};
pub use response::{LoanResponse, Page, TransactionResponse};
pub use transaction::{CreateTransaction, Transaction, TransactionStatus, TransactionType};
