//! Member (borrower) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::MemberType;

static NATIONAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{11}$").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10,11}$").unwrap());

/// Member model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub member_type: MemberType,
    pub active: bool,
    pub borrow_limit: i32,
    /// Loans not yet returned
    #[sqlx(default)]
    pub active_loans: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn can_borrow(&self) -> bool {
        self.active && self.active_loans < i64::from(self.borrow_limit)
    }
}

/// Create/update member request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MemberRequest {
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// 11-digit national identification number
    #[validate(regex(path = *NATIONAL_ID, message = "National ID must contain 11 digits"))]
    pub national_id: String,
    #[validate(regex(path = *PHONE, message = "Phone must contain 10 or 11 digits"))]
    pub phone: Option<String>,
    pub member_type: MemberType,
}

/// Member search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MemberSearchQuery {
    /// Matched against name, email and national ID
    pub term: String,
}

/// Eligibility answer for a single member
#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowEligibility {
    pub member_id: i64,
    pub can_borrow: bool,
    pub active_loans: i64,
    pub borrow_limit: i32,
}
