//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::LoanStatus,
        loan::{CreateLoan, LoanDetails, PageQuery, RenewQuery},
    },
};

use super::PaginatedResponse;

/// Lend a book to a member
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanDetails),
        (status = 400, description = "Invalid request or loan rule violated"),
        (status = 404, description = "Book or member not found")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    let loan = state.services.loans.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// List all loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(PageQuery),
    responses(
        (status = 200, description = "Loans, newest first", body = PaginatedResponse<LoanDetails>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    let page = state.services.loans.list_loans(&query).await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Get loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get_loan(id).await?;
    Ok(Json(loan))
}

/// Open loans past their due date
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Overdue loans", body = Vec<LoanDetails>)
    )
)]
pub async fn list_overdue(State(state): State<crate::AppState>) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.list_overdue().await?;
    Ok(Json(loans))
}

/// List loans in a given status
#[utoipa::path(
    get,
    path = "/loans/status/{status}",
    tag = "loans",
    params(
        ("status" = String, Path, description = "ACTIVE, RENEWED or RETURNED"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Loans in that status", body = PaginatedResponse<LoanDetails>),
        (status = 400, description = "Unknown status")
    )
)]
pub async fn list_by_status(
    State(state): State<crate::AppState>,
    Path(status): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    let status: LoanStatus = status.parse().map_err(AppError::Validation)?;
    let page = state.services.loans.list_by_status(status, &query).await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Return a borrowed book
#[utoipa::path(
    patch,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned, fine computed when late", body = LoanDetails),
        (status = 400, description = "Loan already returned"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.return_loan(id).await?;
    Ok(Json(loan))
}

/// Renew a loan
#[utoipa::path(
    patch,
    path = "/loans/{id}/renew",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID"),
        RenewQuery
    ),
    responses(
        (status = 200, description = "Loan renewed", body = LoanDetails),
        (status = 400, description = "Invalid days, loan returned or overdue"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn renew_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RenewQuery>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.renew_loan(id, query.days).await?;
    Ok(Json(loan))
}

/// Loan history of a member
#[utoipa::path(
    get,
    path = "/members/{id}/loans",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Member ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Member's loans, newest first", body = PaginatedResponse<LoanDetails>),
        (status = 404, description = "Member not found")
    )
)]
pub async fn list_member_loans(
    State(state): State<crate::AppState>,
    Path(member_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    let page = state.services.loans.list_member_loans(member_id, &query).await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}
