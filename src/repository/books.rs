//! Books repository for database operations

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookRequest},
};

const SELECT_BOOK: &str = r#"
    SELECT b.*, c.name AS category_name
    FROM books b
    LEFT JOIN categories c ON c.id = b.category_id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1", SELECT_BOOK))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book by ID, locking its row until the transaction ends
    pub async fn lock(&self, conn: &mut PgConnection, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1 FOR UPDATE OF b", SELECT_BOOK))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Take one copy off the shelf
    pub async fn reserve_copy(&self, conn: &mut PgConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies - 1, updated_at = $2
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BusinessRule(
                "No copies of this book are available".to_string(),
            ));
        }
        Ok(())
    }

    /// Put one copy back on the shelf
    pub async fn release_copy(&self, conn: &mut PgConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies + 1, updated_at = $2
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(format!(
                "Book {} already has all copies available",
                id
            )));
        }
        Ok(())
    }

    /// Check if an ISBN is already used by another book
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::bigint IS NULL OR id != $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new book with every copy available
    pub async fn create(&self, book: &BookRequest) -> AppResult<Book> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO books (
                isbn, title, author, publisher, publication_year,
                total_copies, available_copies, daily_fine_rate, category_id,
                active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, TRUE, $9, $9)
            RETURNING id
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(book.publication_year)
        .bind(book.total_copies)
        .bind(book.daily_fine_rate)
        .bind(book.category_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Overwrite a locked book's fields
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: i64,
        book: &BookRequest,
        available_copies: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE books SET
                isbn = $2, title = $3, author = $4, publisher = $5, publication_year = $6,
                total_copies = $7, available_copies = $8, daily_fine_rate = $9,
                category_id = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(book.publication_year)
        .bind(book.total_copies)
        .bind(available_copies)
        .bind(book.daily_fine_rate)
        .bind(book.category_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Soft delete
    pub async fn deactivate(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET active = FALSE, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// List active books with pagination
    pub async fn list_active(&self, per_page: i64, offset: i64) -> AppResult<(Vec<Book>, i64)> {
        self.page("b.active = TRUE", None, per_page, offset).await
    }

    /// Active books with at least one copy on the shelf
    pub async fn list_available(&self, per_page: i64, offset: i64) -> AppResult<(Vec<Book>, i64)> {
        self.page("b.active = TRUE AND b.available_copies > 0", None, per_page, offset)
            .await
    }

    /// Case-insensitive search on title, author and ISBN
    pub async fn search(&self, term: &str, per_page: i64, offset: i64) -> AppResult<(Vec<Book>, i64)> {
        let pattern = super::contains_pattern(term);
        self.page(
            "b.active = TRUE AND (LOWER(b.title) LIKE $1 OR LOWER(b.author) LIKE $1 OR b.isbn LIKE $1)",
            Some(pattern),
            per_page,
            offset,
        )
        .await
    }

    /// Active books in a category
    pub async fn list_by_category(
        &self,
        category_id: i64,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Book>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE active = TRUE AND category_id = $1",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        let books = sqlx::query_as::<_, Book>(&format!(
            "{} WHERE b.active = TRUE AND b.category_id = $1 ORDER BY b.title LIMIT $2 OFFSET $3",
            SELECT_BOOK
        ))
        .bind(category_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Active books whose author contains `author`
    pub async fn list_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{} WHERE b.active = TRUE AND LOWER(b.author) LIKE $1 ORDER BY b.title",
            SELECT_BOOK
        ))
        .bind(super::contains_pattern(author))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn page(
        &self,
        where_clause: &str,
        param: Option<String>,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Book>, i64)> {
        let count_query = format!("SELECT COUNT(*) FROM books b WHERE {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref p) = param {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} WHERE {} ORDER BY b.title LIMIT {} OFFSET {}",
            SELECT_BOOK, where_clause, per_page, offset
        );
        let mut select_builder = sqlx::query_as::<_, Book>(&select_query);
        if let Some(ref p) = param {
            select_builder = select_builder.bind(p);
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }
}
