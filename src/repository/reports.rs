//! Read-only aggregate queries

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::report::{BookLoanCount, GeneralReport, MemberLoanCount},
};

#[derive(Clone)]
pub struct ReportsRepository {
    pool: Pool<Postgres>,
}

impl ReportsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn general(&self, today: NaiveDate) -> AppResult<GeneralReport> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS total_books,
                (SELECT COUNT(*) FROM members) AS total_members,
                (SELECT COUNT(*) FROM loans) AS total_loans,
                (SELECT COUNT(*) FROM loans WHERE status = 'ACTIVE') AS active_loans,
                (SELECT COUNT(*) FROM loans
                  WHERE return_date IS NULL AND due_date < $1) AS overdue_loans,
                (SELECT COALESCE(ROUND(SUM(daily_fine_rate * ($1 - due_date)), 2), 0)
                   FROM loans
                  WHERE return_date IS NULL AND due_date < $1
                    AND daily_fine_rate IS NOT NULL) AS accumulated_fines,
                (SELECT COUNT(*) FROM books
                  WHERE active = TRUE AND available_copies = 0) AS unavailable_books
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(GeneralReport {
            total_books: row.get("total_books"),
            total_members: row.get("total_members"),
            total_loans: row.get("total_loans"),
            active_loans: row.get("active_loans"),
            overdue_loans: row.get("overdue_loans"),
            accumulated_fines: row.get::<Decimal, _>("accumulated_fines"),
            unavailable_books: row.get("unavailable_books"),
            generated_on: today,
        })
    }

    /// Books ordered by how many times they were lent
    pub async fn most_borrowed_books(&self, limit: i64) -> AppResult<Vec<BookLoanCount>> {
        let rows = sqlx::query_as::<_, BookLoanCount>(
            r#"
            SELECT b.id AS book_id, b.title, b.author, b.isbn, COUNT(l.id) AS loan_count
            FROM books b
            JOIN loans l ON l.book_id = b.id
            GROUP BY b.id, b.title, b.author, b.isbn
            ORDER BY loan_count DESC, b.title
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Members ordered by how many loans they took
    pub async fn most_active_members(&self, limit: i64) -> AppResult<Vec<MemberLoanCount>> {
        let rows = sqlx::query_as::<_, MemberLoanCount>(
            r#"
            SELECT m.id AS member_id, m.name, m.email, COUNT(l.id) AS loan_count
            FROM members m
            JOIN loans l ON l.member_id = m.id
            GROUP BY m.id, m.name, m.email
            ORDER BY loan_count DESC, m.name
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active book count per category name
    pub async fn books_by_category(&self) -> AppResult<BTreeMap<String, i64>> {
        let rows = sqlx::query(
            r#"
            SELECT c.name, COUNT(b.id) AS book_count
            FROM categories c
            LEFT JOIN books b ON b.category_id = c.id AND b.active = TRUE
            GROUP BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("name"), row.get::<i64, _>("book_count")))
            .collect())
    }
}
