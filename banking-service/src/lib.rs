//! Banking ledger core: applies balance-changing operations (deposits,
//! withdrawals, transfers) and the loan application/approval lifecycle on top
//! of an abstract account/transaction/loan store.

pub mod config;
pub mod models;
pub mod repositories;
pub mod services;
