//! Loans repository for database operations

use chrono::NaiveDate;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::LoanStatus,
        loan::{BorrowerStanding, Loan, LoanRow, NewLoan},
    },
};

const SELECT_LOAN_ROW: &str = r#"
    SELECT l.*,
           b.title AS book_title, b.isbn AS book_isbn,
           m.name AS member_name, m.email AS member_email
    FROM loans l
    JOIN books b ON b.id = l.book_id
    JOIN members m ON m.id = l.member_id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID, locking its row until the transaction ends
    pub async fn lock(&self, conn: &mut PgConnection, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Open-loan figures used to decide whether a member may borrow `book_id`
    pub async fn standing(
        &self,
        conn: &mut PgConnection,
        member_id: i64,
        book_id: i64,
        today: NaiveDate,
    ) -> AppResult<BorrowerStanding> {
        let (open_loans, holds_book, overdue_loans): (i64, bool, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(BOOL_OR(book_id = $2), FALSE),
                   COUNT(*) FILTER (WHERE due_date < $3)
            FROM loans
            WHERE member_id = $1 AND return_date IS NULL
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .bind(today)
        .fetch_one(&mut *conn)
        .await?;

        Ok(BorrowerStanding {
            open_loans,
            holds_book,
            overdue_loans,
        })
    }

    /// Insert a new loan, returning its ID
    pub async fn insert(&self, conn: &mut PgConnection, loan: &NewLoan) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO loans (book_id, member_id, loan_date, due_date, status, daily_fine_rate, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(loan.book_id)
        .bind(loan.member_id)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .bind(LoanStatus::Active)
        .bind(loan.daily_fine_rate)
        .bind(&loan.notes)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    /// Persist the mutable fields of a loan
    pub async fn save(&self, conn: &mut PgConnection, loan: &Loan) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE loans SET due_date = $2, return_date = $3, status = $4, fine_amount = $5
            WHERE id = $1
            "#,
        )
        .bind(loan.id)
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(loan.status)
        .bind(loan.fine_amount)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Loan joined with book and member, read inside the current transaction
    pub async fn get_row_in(&self, conn: &mut PgConnection, id: i64) -> AppResult<LoanRow> {
        sqlx::query_as::<_, LoanRow>(&format!("{} WHERE l.id = $1", SELECT_LOAN_ROW))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Loan joined with book and member
    pub async fn get_row(&self, id: i64) -> AppResult<LoanRow> {
        sqlx::query_as::<_, LoanRow>(&format!("{} WHERE l.id = $1", SELECT_LOAN_ROW))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// All loans, newest first
    pub async fn list(&self, per_page: i64, offset: i64) -> AppResult<(Vec<LoanRow>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} ORDER BY l.loan_date DESC, l.id DESC LIMIT $1 OFFSET $2",
            SELECT_LOAN_ROW
        ))
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Loans in a given status
    pub async fn list_by_status(
        &self,
        status: LoanStatus,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<LoanRow>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.status = $1 ORDER BY l.loan_date DESC, l.id DESC LIMIT $2 OFFSET $3",
            SELECT_LOAN_ROW
        ))
        .bind(status)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Full loan history of a member, newest first
    pub async fn list_by_member(
        &self,
        member_id: i64,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<LoanRow>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE member_id = $1")
            .bind(member_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.member_id = $1 ORDER BY l.loan_date DESC, l.id DESC LIMIT $2 OFFSET $3",
            SELECT_LOAN_ROW
        ))
        .bind(member_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Open loans past their due date
    pub async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<LoanRow>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.return_date IS NULL AND l.due_date < $1 ORDER BY l.due_date",
            SELECT_LOAN_ROW
        ))
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Open loans due within [from, to]
    pub async fn list_due_between(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<LoanRow>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "{} WHERE l.return_date IS NULL AND l.due_date BETWEEN $1 AND $2 ORDER BY l.due_date",
            SELECT_LOAN_ROW
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Loans whose due date falls within [from, to]
    pub async fn list_by_due_period(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE due_date BETWEEN $1 AND $2 ORDER BY due_date",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Count open loans of a member
    pub async fn count_open_for_member(&self, conn: &mut PgConnection, member_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE member_id = $1 AND return_date IS NULL",
        )
        .bind(member_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }
}
