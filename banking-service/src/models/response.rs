//! Caller-facing envelopes: every mutating operation answers with an explicit
//! success flag and a human-readable message; list operations answer with a
//! page and its total. Consumed by the API layer sitting above this crate.

use super::{Loan, Transaction};
use bank_core::error::AppError;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub success: bool,
    pub message: String,
    pub transaction: Option<Transaction>,
}

impl TransactionResponse {
    pub fn from_result(result: Result<Transaction, AppError>) -> Self {
        match result {
            Ok(transaction) => Self {
                success: true,
                message: "Transaction completed successfully".to_string(),
                transaction: Some(transaction),
            },
            Err(err) => Self {
                success: false,
                message: err.to_string(),
                transaction: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoanResponse {
    pub success: bool,
    pub message: String,
    pub loan: Option<Loan>,
}

impl LoanResponse {
    pub fn ok(message: impl Into<String>, loan: Loan) -> Self {
        Self {
            success: true,
            message: message.into(),
            loan: Some(loan),
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            loan: None,
        }
    }
}

/// One page of a list query plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: i64,
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn failure_envelope_carries_readable_message() {
        let response = TransactionResponse::from_result(Err(AppError::InsufficientFunds));
        assert!(!response.success);
        assert_eq!(response.message, "Insufficient funds");
        assert!(response.transaction.is_none());
    }

    #[test]
    fn success_envelope_carries_payload() {
        let tx = Transaction::deposit("1234567890".to_string(), Decimal::from(50), None);
        let response = TransactionResponse::from_result(Ok(tx));
        assert!(response.success);
        assert_eq!(response.message, "Transaction completed successfully");
        assert!(response.transaction.is_some());
    }
}
