use super::money;
use super::Account;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Base interest rate in percent; the term adjustment adds `term / 12` on top.
const BASE_INTEREST_RATE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    /// Reserved terminal state for repayment; no transition into it is
    /// implemented yet.
    Paid,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Paid];

    /// Get string representation for database filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loan application and its lifecycle state.
///
/// `interest_rate` is fixed at application time and never recomputed. The due
/// date uses the documented `term * 30` days approximation of months rather
/// than calendar months.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(with = "money::as_minor_units")]
    pub amount: Decimal,
    /// Term in months.
    pub term: i32,
    /// Percent per annum.
    pub interest_rate: f64,
    pub status: LoanStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub request_date: DateTime<Utc>,
    pub approval_date: Option<bson::DateTime>,
    pub due_date: Option<bson::DateTime>,
}

impl Loan {
    pub fn new(user_id: String, amount: Decimal, term: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            amount,
            term,
            interest_rate: BASE_INTEREST_RATE + term as f64 / 12.0,
            status: LoanStatus::Pending,
            request_date: Utc::now(),
            approval_date: None,
            due_date: None,
        }
    }

    /// Due date for an approval at `approval_date`: `term * 30` days out.
    pub fn due_date_from(&self, approval_date: DateTime<Utc>) -> DateTime<Utc> {
        approval_date + Duration::days(self.term as i64 * 30)
    }
}

/// Input for applying for a loan.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoanApplication {
    pub amount: Decimal,
    /// Term in months.
    #[validate(range(min = 1, message = "Loan term must be at least one month"))]
    pub term: i32,
}

/// Loan joined with its owner's account details, for back-office listings.
#[derive(Debug, Clone, Serialize)]
pub struct LoanWithOwner {
    #[serde(flatten)]
    pub loan: Loan,
    pub account_number: String,
    pub user_name: String,
}

impl LoanWithOwner {
    pub fn new(loan: Loan, owner: Option<&Account>) -> Self {
        match owner {
            Some(account) => Self {
                account_number: account.account_number.clone(),
                user_name: account.display_name(),
                loan,
            },
            None => Self {
                account_number: "Unknown".to_string(),
                user_name: "Unknown User".to_string(),
                loan,
            },
        }
    }
}
