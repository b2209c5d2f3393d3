//! Catalog service: books and categories

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookAvailability, BookRequest},
        category::{Category, CreateCategory},
        loan::PageQuery,
    },
    repository::Repository,
};

use super::circulation;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog with every copy available
    pub async fn create_book(&self, book: BookRequest) -> AppResult<Book> {
        book.check()?;

        if self.repository.books.isbn_exists(&book.isbn, None).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                book.isbn
            )));
        }
        self.ensure_category(book.category_id).await?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Book {} created ({} copies)", created.id, created.total_copies);
        Ok(created)
    }

    /// Update a book; a change of total copies shifts available copies by the same amount
    pub async fn update_book(&self, id: i64, book: BookRequest) -> AppResult<Book> {
        book.check()?;

        if self.repository.books.isbn_exists(&book.isbn, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                book.isbn
            )));
        }
        self.ensure_category(book.category_id).await?;

        let mut tx = self.repository.pool.begin().await?;
        let current = self.repository.books.lock(&mut tx, id).await?;
        let available = circulation::resize_stock(&current, book.total_copies)?;
        self.repository
            .books
            .update(&mut tx, id, &book, available)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Book {} updated: {} of {} copies available",
            id,
            available,
            book.total_copies
        );
        self.repository.books.get_by_id(id).await
    }

    /// Soft delete a book
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.deactivate(id).await?;
        tracing::info!("Book {} deactivated", id);
        Ok(())
    }

    pub async fn list_books(&self, page: &PageQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository
            .books
            .list_active(page.per_page(), page.offset())
            .await
    }

    pub async fn list_available(&self, page: &PageQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository
            .books
            .list_available(page.per_page(), page.offset())
            .await
    }

    pub async fn search_books(&self, term: &str, page: &PageQuery) -> AppResult<(Vec<Book>, i64)> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_books(page).await;
        }
        tracing::debug!("Book search: {}", term);
        self.repository
            .books
            .search(term, page.per_page(), page.offset())
            .await
    }

    pub async fn list_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        self.repository.books.list_by_author(author.trim()).await
    }

    pub async fn list_by_category(
        &self,
        category_id: i64,
        page: &PageQuery,
    ) -> AppResult<(Vec<Book>, i64)> {
        if !self.repository.categories.exists(category_id).await? {
            return Err(AppError::NotFound(format!(
                "Category with id {} not found",
                category_id
            )));
        }
        self.repository
            .books
            .list_by_category(category_id, page.per_page(), page.offset())
            .await
    }

    pub async fn availability(&self, id: i64) -> AppResult<BookAvailability> {
        let book = self.repository.books.get_by_id(id).await?;
        Ok(BookAvailability {
            book_id: book.id,
            available: book.is_available(),
            available_copies: book.available_copies,
        })
    }

    pub async fn create_category(&self, category: CreateCategory) -> AppResult<Category> {
        category.validate()?;
        if self.repository.categories.name_exists(category.name.trim()).await? {
            return Err(AppError::Conflict(format!(
                "Category {} already exists",
                category.name.trim()
            )));
        }
        let created = self.repository.categories.create(&category).await?;
        tracing::info!("Category {} created", created.name);
        Ok(created)
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories.list().await
    }

    async fn ensure_category(&self, category_id: Option<i64>) -> AppResult<()> {
        match category_id {
            Some(id) if !self.repository.categories.exists(id).await? => Err(AppError::NotFound(
                format!("Category with id {} not found", id),
            )),
            _ => Ok(()),
        }
    }
}
