//! Engines and projections over the repositories.

pub mod accounts;
pub mod loans;
pub mod locks;
pub mod reporting;
pub mod transactions;

pub use accounts::AccountService;
pub use loans::LoanService;
pub use locks::AccountLocks;
pub use reporting::ReportingService;
pub use transactions::TransactionService;
