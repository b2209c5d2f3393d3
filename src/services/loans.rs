//! Loan management service
//!
//! Each mutation opens a transaction, locks the rows it validates, runs the
//! matching rule from [`circulation`] and applies the resulting copy effects
//! before committing.

use chrono::{NaiveDate, Utc};
use sqlx::PgConnection;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::LoanStatus,
        loan::{CreateLoan, LoanDetails, LoanRow, PageQuery},
    },
    repository::Repository,
};

use super::circulation::{self, CopyEffect};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    default_renewal_days: i64,
}

impl LoansService {
    pub fn new(repository: Repository, default_renewal_days: i64) -> Self {
        Self {
            repository,
            default_renewal_days,
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Lend a book to a member
    pub async fn create_loan(&self, request: CreateLoan) -> AppResult<LoanDetails> {
        request.validate()?;
        let today = Self::today();

        let mut tx = self.repository.pool.begin().await?;

        let book = self.repository.books.lock(&mut tx, request.book_id).await?;
        circulation::ensure_lendable(&book)
            .inspect_err(|e| tracing::warn!("Loan refused for book {}: {}", book.id, e))?;
        let member = self.repository.members.lock(&mut tx, request.member_id).await?;
        let standing = self
            .repository
            .loans
            .standing(&mut tx, member.id, book.id, today)
            .await?;

        let transition = circulation::check_out(&book, &member, &standing, request.notes, today)
            .inspect_err(|e| {
                tracing::warn!(
                    "Loan refused for member {} on book {}: {}",
                    member.id,
                    book.id,
                    e
                )
            })?;

        self.apply(&mut tx, &transition.effects).await?;
        let loan_id = self.repository.loans.insert(&mut tx, &transition.loan).await?;
        let row = self.repository.loans.get_row_in(&mut tx, loan_id).await?;

        tx.commit().await?;

        tracing::info!(
            "Loan {} created: book {} to member {}, due {}",
            loan_id,
            book.id,
            member.id,
            row.loan.due_date
        );
        Ok(row.into_details(today))
    }

    /// Return a borrowed book, charging a fine when late
    pub async fn return_loan(&self, loan_id: i64) -> AppResult<LoanDetails> {
        let today = Self::today();
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock(&mut tx, loan_id).await?;
        let book = self.repository.books.lock(&mut tx, loan.book_id).await?;

        let transition = circulation::check_in(&loan, &book, today)
            .inspect_err(|e| tracing::warn!("Return of loan {} refused: {}", loan_id, e))?;

        self.apply(&mut tx, &transition.effects).await?;
        self.repository.loans.save(&mut tx, &transition.loan).await?;
        let row = self.repository.loans.get_row_in(&mut tx, loan_id).await?;

        tx.commit().await?;

        match transition.loan.fine_amount {
            Some(fine) => tracing::info!("Loan {} returned late, fine {}", loan_id, fine),
            None => tracing::info!("Loan {} returned", loan_id),
        }
        Ok(row.into_details(today))
    }

    /// Extend the due date of an open loan.
    ///
    /// `days` defaults to the configured renewal period and is checked
    /// before the loan is looked up.
    pub async fn renew_loan(&self, loan_id: i64, days: Option<i64>) -> AppResult<LoanDetails> {
        let days = days.unwrap_or(self.default_renewal_days);
        circulation::validate_renewal_days(days)?;

        let today = Self::today();
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock(&mut tx, loan_id).await?;
        let transition = circulation::renew(&loan, days, today)
            .inspect_err(|e| tracing::warn!("Renewal of loan {} refused: {}", loan_id, e))?;

        self.repository.loans.save(&mut tx, &transition.loan).await?;
        let row = self.repository.loans.get_row_in(&mut tx, loan_id).await?;

        tx.commit().await?;

        tracing::info!(
            "Loan {} renewed by {} days, now due {}",
            loan_id,
            days,
            transition.loan.due_date
        );
        Ok(row.into_details(today))
    }

    /// Get a single loan
    pub async fn get_loan(&self, loan_id: i64) -> AppResult<LoanDetails> {
        let row = self.repository.loans.get_row(loan_id).await?;
        Ok(row.into_details(Self::today()))
    }

    /// All loans, newest first
    pub async fn list_loans(&self, page: &PageQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        let (rows, total) = self
            .repository
            .loans
            .list(page.per_page(), page.offset())
            .await?;
        Ok((Self::details(rows), total))
    }

    pub async fn list_by_status(
        &self,
        status: LoanStatus,
        page: &PageQuery,
    ) -> AppResult<(Vec<LoanDetails>, i64)> {
        let (rows, total) = self
            .repository
            .loans
            .list_by_status(status, page.per_page(), page.offset())
            .await?;
        Ok((Self::details(rows), total))
    }

    /// Loan history of a member
    pub async fn list_member_loans(
        &self,
        member_id: i64,
        page: &PageQuery,
    ) -> AppResult<(Vec<LoanDetails>, i64)> {
        if !self.repository.members.exists(member_id).await? {
            return Err(AppError::NotFound(format!(
                "Member with id {} not found",
                member_id
            )));
        }
        let (rows, total) = self
            .repository
            .loans
            .list_by_member(member_id, page.per_page(), page.offset())
            .await?;
        Ok((Self::details(rows), total))
    }

    /// Every open loan past its due date
    pub async fn list_overdue(&self) -> AppResult<Vec<LoanDetails>> {
        let rows = self.repository.loans.list_overdue(Self::today()).await?;
        tracing::debug!("{} overdue loans", rows.len());
        Ok(Self::details(rows))
    }

    async fn apply(&self, conn: &mut PgConnection, effects: &[CopyEffect]) -> AppResult<()> {
        for effect in effects {
            match *effect {
                CopyEffect::Reserve { book_id } => {
                    self.repository.books.reserve_copy(conn, book_id).await?
                }
                CopyEffect::Release { book_id } => {
                    self.repository.books.release_copy(conn, book_id).await?
                }
            }
        }
        Ok(())
    }

    fn details(rows: Vec<LoanRow>) -> Vec<LoanDetails> {
        let today = Self::today();
        rows.into_iter().map(|row| row.into_details(today)).collect()
    }
}
