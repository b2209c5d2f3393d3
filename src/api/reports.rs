//! Reporting endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        loan::LoanDetails,
        report::{
            BookLoanCount, DueSoonQuery, GeneralReport, LimitQuery, MemberLoanCount,
            PeriodQuery, PeriodReport,
        },
    },
};

/// Library-wide counters
#[utoipa::path(
    get,
    path = "/reports/general",
    tag = "reports",
    responses(
        (status = 200, description = "General report", body = GeneralReport)
    )
)]
pub async fn general(State(state): State<crate::AppState>) -> AppResult<Json<GeneralReport>> {
    let report = state.services.reports.general().await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/reports/most-borrowed-books",
    tag = "reports",
    params(LimitQuery),
    responses(
        (status = 200, description = "Books ranked by number of loans", body = Vec<BookLoanCount>)
    )
)]
pub async fn most_borrowed_books(
    State(state): State<crate::AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<BookLoanCount>>> {
    let books = state.services.reports.most_borrowed_books(query.limit()).await?;
    Ok(Json(books))
}

#[utoipa::path(
    get,
    path = "/reports/most-active-members",
    tag = "reports",
    params(LimitQuery),
    responses(
        (status = 200, description = "Members ranked by number of loans", body = Vec<MemberLoanCount>)
    )
)]
pub async fn most_active_members(
    State(state): State<crate::AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<MemberLoanCount>>> {
    let members = state.services.reports.most_active_members(query.limit()).await?;
    Ok(Json(members))
}

/// Loans due within a date range
#[utoipa::path(
    get,
    path = "/reports/period",
    tag = "reports",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Period report", body = PeriodReport),
        (status = 400, description = "Start date after end date")
    )
)]
pub async fn period(
    State(state): State<crate::AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PeriodReport>> {
    let report = state.services.reports.period(query.start, query.end).await?;
    Ok(Json(report))
}

/// Open loans coming due
#[utoipa::path(
    get,
    path = "/reports/due-soon",
    tag = "reports",
    params(DueSoonQuery),
    responses(
        (status = 200, description = "Loans due in the next days", body = Vec<LoanDetails>),
        (status = 400, description = "Invalid window")
    )
)]
pub async fn due_soon(
    State(state): State<crate::AppState>,
    Query(query): Query<DueSoonQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.reports.due_soon(query.days).await?;
    Ok(Json(loans))
}

#[utoipa::path(
    get,
    path = "/reports/books-by-category",
    tag = "reports",
    responses(
        (status = 200, description = "Active book count per category name", body = BTreeMap<String, i64>)
    )
)]
pub async fn books_by_category(
    State(state): State<crate::AppState>,
) -> AppResult<Json<BTreeMap<String, i64>>> {
    let counts = state.services.reports.books_by_category().await?;
    Ok(Json(counts))
}
