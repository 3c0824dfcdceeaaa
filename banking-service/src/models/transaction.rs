use super::money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Transfer,
    Deposit,
    Withdrawal,
}

impl TransactionType {
    /// Get string representation for database filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

/// Completed balance movement. Append-only: records are never updated once
/// written. Exactly one of `from_account`/`to_account` is set for withdrawals
/// and deposits; transfers carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    #[serde(with = "money::as_minor_units")]
    pub amount: Decimal,
    pub description: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    fn record(
        from_account: Option<String>,
        to_account: Option<String>,
        amount: Decimal,
        description: String,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from_account,
            to_account,
            amount,
            description,
            transaction_type,
            status: TransactionStatus::Completed,
            timestamp: Utc::now(),
        }
    }

    pub fn transfer(
        from_account: String,
        to_account: String,
        amount: Decimal,
        description: Option<String>,
    ) -> Self {
        Self::record(
            Some(from_account),
            Some(to_account),
            amount,
            description.unwrap_or_else(|| "Transfer".to_string()),
            TransactionType::Transfer,
        )
    }

    pub fn deposit(to_account: String, amount: Decimal, description: Option<String>) -> Self {
        Self::record(
            None,
            Some(to_account),
            amount,
            description.unwrap_or_else(|| "Deposit".to_string()),
            TransactionType::Deposit,
        )
    }

    pub fn withdrawal(from_account: String, amount: Decimal, description: Option<String>) -> Self {
        Self::record(
            Some(from_account),
            None,
            amount,
            description.unwrap_or_else(|| "Withdrawal".to_string()),
            TransactionType::Withdrawal,
        )
    }
}

/// Input for the ledger engine's apply-transaction operation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransaction {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    /// Recipient account number; required for transfers, ignored otherwise.
    pub to_account: Option<String>,
    pub description: Option<String>,
}
