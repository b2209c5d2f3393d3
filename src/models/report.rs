//! Report payloads

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Library-wide counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneralReport {
    pub total_books: i64,
    pub total_members: i64,
    pub total_loans: i64,
    /// Loans in ACTIVE status (renewed loans are not counted)
    pub active_loans: i64,
    pub overdue_loans: i64,
    /// Fines the open overdue loans would incur if returned today
    pub accumulated_fines: Decimal,
    /// Active books with no copy on the shelf
    pub unavailable_books: i64,
    pub generated_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookLoanCount {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub loan_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MemberLoanCount {
    pub member_id: i64,
    pub name: String,
    pub email: String,
    pub loan_count: i64,
}

/// Outcome of the loans due within a date range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PeriodReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_loans: i64,
    pub returned_on_time: i64,
    pub returned_late: i64,
    pub still_open: i64,
    pub total_fines: Decimal,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LimitQuery {
    /// Number of entries (default 10)
    pub limit: Option<i64>,
}

impl LimitQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DueSoonQuery {
    /// Look-ahead window in days (default 7)
    pub days: Option<i64>,
}
