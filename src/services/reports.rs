//! Reporting service

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanDetails},
        report::{BookLoanCount, GeneralReport, MemberLoanCount, PeriodReport},
    },
    repository::Repository,
};

pub const DEFAULT_DUE_SOON_DAYS: i64 = 7;
const MAX_DUE_SOON_DAYS: i64 = 365;

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn general(&self) -> AppResult<GeneralReport> {
        self.repository.reports.general(Self::today()).await
    }

    pub async fn most_borrowed_books(&self, limit: i64) -> AppResult<Vec<BookLoanCount>> {
        self.repository.reports.most_borrowed_books(limit).await
    }

    pub async fn most_active_members(&self, limit: i64) -> AppResult<Vec<MemberLoanCount>> {
        self.repository.reports.most_active_members(limit).await
    }

    /// Outcome of the loans whose due date falls in [start, end]
    pub async fn period(&self, start: NaiveDate, end: NaiveDate) -> AppResult<PeriodReport> {
        if start > end {
            return Err(AppError::Validation(
                "Start date must not be after end date".to_string(),
            ));
        }
        let loans = self
            .repository
            .loans
            .list_by_due_period(start, end)
            .await?;
        Ok(summarize_period(start, end, &loans))
    }

    /// Open loans due between today and today + `days`
    pub async fn due_soon(&self, days: Option<i64>) -> AppResult<Vec<LoanDetails>> {
        let days = days.unwrap_or(DEFAULT_DUE_SOON_DAYS);
        if !(0..=MAX_DUE_SOON_DAYS).contains(&days) {
            return Err(AppError::Validation(format!(
                "Days must be between 0 and {}",
                MAX_DUE_SOON_DAYS
            )));
        }
        let today = Self::today();
        let rows = self
            .repository
            .loans
            .list_due_between(today, today + Duration::days(days))
            .await?;
        Ok(rows.into_iter().map(|row| row.into_details(today)).collect())
    }

    pub async fn books_by_category(&self) -> AppResult<BTreeMap<String, i64>> {
        self.repository.reports.books_by_category().await
    }
}

/// Tally returned and open loans of a period
pub fn summarize_period(start: NaiveDate, end: NaiveDate, loans: &[Loan]) -> PeriodReport {
    let mut report = PeriodReport {
        start,
        end,
        total_fines: Decimal::ZERO,
        ..Default::default()
    };

    for loan in loans {
        report.total_loans += 1;
        match loan.return_date {
            None => report.still_open += 1,
            Some(returned) if returned > loan.due_date => report.returned_late += 1,
            Some(_) => report.returned_on_time += 1,
        }
        if let Some(fine) = loan.fine_amount {
            report.total_fines += fine;
        }
    }
    report
}
