//! Member management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::MemberType,
        loan::PageQuery,
        member::{BorrowEligibility, Member, MemberRequest},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_member(&self, id: i64) -> AppResult<Member> {
        self.repository.members.get_by_id(id).await
    }

    /// Register a member; the borrow limit follows the member type
    pub async fn create_member(&self, member: MemberRequest) -> AppResult<Member> {
        member.validate()?;
        self.ensure_unique(&member, None).await?;

        let created = self.repository.members.create(&member).await?;
        tracing::info!(
            "Member {} created as {} (limit {})",
            created.id,
            created.member_type,
            created.borrow_limit
        );
        Ok(created)
    }

    pub async fn update_member(&self, id: i64, member: MemberRequest) -> AppResult<Member> {
        member.validate()?;
        if !self.repository.members.exists(id).await? {
            return Err(AppError::NotFound(format!("Member with id {} not found", id)));
        }
        self.ensure_unique(&member, Some(id)).await?;

        let updated = self.repository.members.update(id, &member).await?;
        tracing::info!("Member {} updated", id);
        Ok(updated)
    }

    /// Soft delete a member with no book in hand
    pub async fn delete_member(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        self.repository.members.lock(&mut tx, id).await?;
        let open = self
            .repository
            .loans
            .count_open_for_member(&mut tx, id)
            .await?;
        if open > 0 {
            tracing::warn!("Member {} not deactivated: {} open loans", id, open);
            return Err(AppError::BusinessRule(format!(
                "Member has {} loans not yet returned",
                open
            )));
        }
        self.repository.members.deactivate(&mut tx, id).await?;

        tx.commit().await?;
        tracing::info!("Member {} deactivated", id);
        Ok(())
    }

    pub async fn list_members(&self, page: &PageQuery) -> AppResult<(Vec<Member>, i64)> {
        self.repository
            .members
            .list_active(page.per_page(), page.offset())
            .await
    }

    pub async fn search_members(&self, term: &str, page: &PageQuery) -> AppResult<(Vec<Member>, i64)> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_members(page).await;
        }
        self.repository
            .members
            .search(term, page.per_page(), page.offset())
            .await
    }

    pub async fn list_by_type(&self, member_type: MemberType) -> AppResult<Vec<Member>> {
        self.repository.members.list_by_type(member_type).await
    }

    pub async fn can_borrow(&self, id: i64) -> AppResult<BorrowEligibility> {
        let member = self.repository.members.get_by_id(id).await?;
        Ok(BorrowEligibility {
            member_id: member.id,
            can_borrow: member.can_borrow(),
            active_loans: member.active_loans,
            borrow_limit: member.borrow_limit,
        })
    }

    async fn ensure_unique(&self, member: &MemberRequest, exclude_id: Option<i64>) -> AppResult<()> {
        if self
            .repository
            .members
            .email_exists(&member.email, exclude_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                member.email
            )));
        }
        if self
            .repository
            .members
            .national_id_exists(&member.national_id, exclude_id)
            .await?
        {
            return Err(AppError::Conflict(
                "National ID is already registered".to_string(),
            ));
        }
        Ok(())
    }
}
