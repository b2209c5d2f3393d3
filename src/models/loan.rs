//! Loan model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::LoanStatus;

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    /// Book fine rate captured at checkout
    pub daily_fine_rate: Option<Decimal>,
    pub fine_amount: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// Not returned and past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.return_date.is_none() && today > self.due_date
    }

    pub fn days_late(&self, today: NaiveDate) -> i64 {
        if self.is_overdue(today) {
            (today - self.due_date).num_days()
        } else {
            0
        }
    }
}

/// Loan about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub book_id: i64,
    pub member_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub daily_fine_rate: Option<Decimal>,
    pub notes: Option<String>,
}

/// Facts about a member's open loans, read under the same lock as the checkout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BorrowerStanding {
    /// Loans with no return date
    pub open_loans: i64,
    /// Whether one of the open loans is for the requested book
    pub holds_book: bool,
    /// Open loans whose due date has passed
    pub overdue_loans: i64,
}

/// Loan joined with book and member for display
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    #[sqlx(flatten)]
    pub loan: Loan,
    pub book_title: String,
    pub book_isbn: String,
    pub member_name: String,
    pub member_email: String,
}

impl LoanRow {
    pub fn into_details(self, today: NaiveDate) -> LoanDetails {
        let is_overdue = self.loan.is_overdue(today);
        let days_late = self.loan.days_late(today);
        let loan = self.loan;
        LoanDetails {
            id: loan.id,
            book_id: loan.book_id,
            book_title: self.book_title,
            book_isbn: self.book_isbn,
            member_id: loan.member_id,
            member_name: self.member_name,
            member_email: self.member_email,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            return_date: loan.return_date,
            status: loan.status,
            fine_amount: loan.fine_amount,
            notes: loan.notes,
            days_late,
            is_overdue,
            created_at: loan.created_at,
        }
    }
}

/// Loan snapshot returned to callers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub book_isbn: String,
    pub member_id: i64,
    pub member_name: String,
    pub member_email: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub fine_amount: Option<Decimal>,
    pub notes: Option<String>,
    /// Days past the due date as of today (0 when not overdue)
    pub days_late: i64,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
}

/// Create loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    pub book_id: i64,
    pub member_id: i64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Renewal parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RenewQuery {
    /// Days to extend the due date by (1-30)
    pub days: Option<i64>,
}

/// Pagination parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    /// Rows to skip; saturates so an absurd page yields an empty result
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(due_date: NaiveDate, return_date: Option<NaiveDate>) -> Loan {
        Loan {
            id: 1,
            book_id: 1,
            member_id: 1,
            loan_date: due_date - chrono::Duration::days(14),
            due_date,
            return_date,
            status: if return_date.is_some() {
                LoanStatus::Returned
            } else {
                LoanStatus::Active
            },
            daily_fine_rate: None,
            fine_amount: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        let today = date(2025, 3, 10);
        let l = loan(today, None);
        assert!(!l.is_overdue(today));
        assert_eq!(l.days_late(today), 0);
    }

    #[test]
    fn test_days_late_counts_from_due_date() {
        let l = loan(date(2025, 3, 10), None);
        let today = date(2025, 3, 14);
        assert!(l.is_overdue(today));
        assert_eq!(l.days_late(today), 4);
    }

    #[test]
    fn test_returned_loan_is_never_overdue() {
        let l = loan(date(2025, 3, 10), Some(date(2025, 3, 20)));
        assert!(!l.is_overdue(date(2025, 4, 1)));
        assert_eq!(l.days_late(date(2025, 4, 1)), 0);
    }

    #[test]
    fn test_page_query_bounds() {
        let q = PageQuery {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), 100);
        assert_eq!(q.offset(), 0);

        let q = PageQuery {
            page: Some(3),
            per_page: None,
        };
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn test_huge_page_offset_saturates() {
        let q = PageQuery {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        assert_eq!(q.page(), i64::MAX);
        assert_eq!(q.offset(), i64::MAX);

        let q = PageQuery {
            page: Some(i64::MAX),
            per_page: None,
        };
        assert!(q.offset() > 0);
    }
}
