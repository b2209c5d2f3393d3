//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, categories, health, loans, members, reports};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblioteca API",
        version = "1.0.0",
        description = "Library loan management REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::create_loan,
        loans::list_loans,
        loans::get_loan,
        loans::list_overdue,
        loans::list_by_status,
        loans::return_loan,
        loans::renew_loan,
        loans::list_member_loans,
        // Books
        books::list_books,
        books::create_book,
        books::search_books,
        books::list_available,
        books::list_by_author,
        books::list_by_category,
        books::get_book,
        books::update_book,
        books::delete_book,
        books::availability,
        // Categories
        categories::list_categories,
        categories::create_category,
        // Members
        members::list_members,
        members::create_member,
        members::search_members,
        members::list_by_type,
        members::get_member,
        members::update_member,
        members::delete_member,
        members::can_borrow,
        // Reports
        reports::general,
        reports::most_borrowed_books,
        reports::most_active_members,
        reports::period,
        reports::due_soon,
        reports::books_by_category,
    ),
    components(
        schemas(
            // Enums
            crate::models::enums::MemberType,
            crate::models::enums::LoanStatus,
            // Books
            crate::models::book::Book,
            crate::models::book::BookRequest,
            crate::models::book::BookAvailability,
            crate::models::category::Category,
            crate::models::category::CreateCategory,
            // Members
            crate::models::member::Member,
            crate::models::member::MemberRequest,
            crate::models::member::BorrowEligibility,
            // Loans
            crate::models::loan::CreateLoan,
            crate::models::loan::LoanDetails,
            // Reports
            crate::models::report::GeneralReport,
            crate::models::report::BookLoanCount,
            crate::models::report::MemberLoanCount,
            crate::models::report::PeriodReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Loan lifecycle"),
        (name = "books", description = "Book catalog"),
        (name = "categories", description = "Book categories"),
        (name = "members", description = "Member management"),
        (name = "reports", description = "Read-only reports")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
