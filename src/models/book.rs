//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

static ISBN_13: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{13}$").unwrap());

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    /// Fine charged per day of late return
    pub daily_fine_rate: Option<Decimal>,
    pub category_id: Option<i64>,
    #[sqlx(default)]
    pub category_name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Create/update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    /// 13-digit ISBN, digits only
    #[validate(regex(path = *ISBN_13, message = "ISBN must contain 13 digits"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(max = 100))]
    pub publisher: Option<String>,
    #[validate(range(min = 1000, max = 2100, message = "Year must be between 1000 and 2100"))]
    pub publication_year: Option<i32>,
    #[validate(range(min = 1, message = "Total copies must be at least 1"))]
    pub total_copies: i32,
    pub daily_fine_rate: Option<Decimal>,
    pub category_id: Option<i64>,
}

impl BookRequest {
    /// Full validation, including the fine rate which `validator` cannot range-check
    pub fn check(&self) -> Result<(), crate::error::AppError> {
        self.validate()?;
        if self.daily_fine_rate.is_some_and(|rate| rate.is_sign_negative()) {
            return Err(crate::error::AppError::Validation(
                "Daily fine rate cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Book search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookSearchQuery {
    /// Matched against title, author and ISBN
    pub term: String,
}

/// Author lookup parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AuthorQuery {
    pub author: String,
}

/// Availability answer for a single book
#[derive(Debug, Serialize, ToSchema)]
pub struct BookAvailability {
    pub book_id: i64,
    pub available: bool,
    pub available_copies: i32,
}
