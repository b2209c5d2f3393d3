//! Member management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::MemberType,
        loan::PageQuery,
        member::{BorrowEligibility, Member, MemberRequest, MemberSearchQuery},
    },
};

use super::PaginatedResponse;

/// List active members
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    params(PageQuery),
    responses(
        (status = 200, description = "Active members", body = PaginatedResponse<Member>)
    )
)]
pub async fn list_members(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Member>>> {
    let page = state.services.members.list_members(&query).await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Register a member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    request_body = MemberRequest,
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Invalid member data"),
        (status = 409, description = "Email or national ID already registered")
    )
)]
pub async fn create_member(
    State(state): State<crate::AppState>,
    Json(request): Json<MemberRequest>,
) -> AppResult<(StatusCode, Json<Member>)> {
    let member = state.services.members.create_member(request).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    get,
    path = "/members/search",
    tag = "members",
    params(MemberSearchQuery, PageQuery),
    responses(
        (status = 200, description = "Matching members", body = PaginatedResponse<Member>)
    )
)]
pub async fn search_members(
    State(state): State<crate::AppState>,
    Query(search): Query<MemberSearchQuery>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Member>>> {
    let page = state.services.members.search_members(&search.term, &query).await?;
    Ok(Json(PaginatedResponse::new(page, &query)))
}

/// Active members of a given type
#[utoipa::path(
    get,
    path = "/members/type/{member_type}",
    tag = "members",
    params(
        ("member_type" = String, Path, description = "STUDENT, TEACHER, STAFF or EXTERNAL")
    ),
    responses(
        (status = 200, description = "Members of that type", body = Vec<Member>),
        (status = 400, description = "Unknown member type")
    )
)]
pub async fn list_by_type(
    State(state): State<crate::AppState>,
    Path(member_type): Path<String>,
) -> AppResult<Json<Vec<Member>>> {
    let member_type: MemberType = member_type.parse().map_err(AppError::Validation)?;
    let members = state.services.members.list_by_type(member_type).await?;
    Ok(Json(members))
}

/// Get member by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member details", body = Member),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Member>> {
    let member = state.services.members.get_member(id).await?;
    Ok(Json(member))
}

/// Update a member
#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    request_body = MemberRequest,
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 400, description = "Invalid member data"),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Email or national ID already registered")
    )
)]
pub async fn update_member(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<MemberRequest>,
) -> AppResult<Json<Member>> {
    let member = state.services.members.update_member(id, request).await?;
    Ok(Json(member))
}

/// Deactivate a member
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    responses(
        (status = 204, description = "Member deactivated"),
        (status = 400, description = "Member still has books on loan"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn delete_member(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.members.delete_member(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Whether a member may take another book
#[utoipa::path(
    get,
    path = "/members/{id}/can-borrow",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Borrowing eligibility", body = BorrowEligibility),
        (status = 404, description = "Member not found")
    )
)]
pub async fn can_borrow(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BorrowEligibility>> {
    let eligibility = state.services.members.can_borrow(id).await?;
    Ok(Json(eligibility))
}
