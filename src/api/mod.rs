//! API handlers for Biblioteca REST endpoints

pub mod books;
pub mod categories;
pub mod health;
pub mod loans;
pub mod members;
pub mod openapi;
pub mod reports;

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::loan::PageQuery;

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new((items, total): (Vec<T>, i64), query: &PageQuery) -> Self {
        Self {
            items,
            total,
            page: query.page(),
            per_page: query.per_page(),
        }
    }
}
