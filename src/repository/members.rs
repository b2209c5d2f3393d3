//! Members repository for database operations

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::MemberType,
        member::{Member, MemberRequest},
    },
};

const SELECT_MEMBER: &str = r#"
    SELECT m.*,
           (SELECT COUNT(*) FROM loans l
             WHERE l.member_id = m.id AND l.return_date IS NULL) AS active_loans
    FROM members m
"#;

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(&format!("{} WHERE m.id = $1", SELECT_MEMBER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Get member by ID, locking its row until the transaction ends
    pub async fn lock(&self, conn: &mut PgConnection, id: i64) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(&format!("{} WHERE m.id = $1 FOR UPDATE OF m", SELECT_MEMBER))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    pub async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM members WHERE LOWER(email) = LOWER($1) AND ($2::bigint IS NULL OR id != $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Check if national ID already exists
    pub async fn national_id_exists(&self, national_id: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM members WHERE national_id = $1 AND ($2::bigint IS NULL OR id != $2))",
        )
        .bind(national_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new member; the borrow limit comes from the member type
    pub async fn create(&self, member: &MemberRequest) -> AppResult<Member> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO members (
                name, email, national_id, phone, member_type,
                active, borrow_limit, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $7)
            RETURNING id
            "#,
        )
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.national_id)
        .bind(&member.phone)
        .bind(member.member_type)
        .bind(member.member_type.rules().borrow_limit)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Update an existing member
    pub async fn update(&self, id: i64, member: &MemberRequest) -> AppResult<Member> {
        let result = sqlx::query(
            r#"
            UPDATE members SET
                name = $2, email = $3, national_id = $4, phone = $5,
                member_type = $6, borrow_limit = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.national_id)
        .bind(&member.phone)
        .bind(member.member_type)
        .bind(member.member_type.rules().borrow_limit)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Member with id {} not found", id)));
        }
        self.get_by_id(id).await
    }

    /// Soft delete a locked member
    pub async fn deactivate(&self, conn: &mut PgConnection, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE members SET active = FALSE, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// List active members with pagination
    pub async fn list_active(&self, per_page: i64, offset: i64) -> AppResult<(Vec<Member>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE active = TRUE")
            .fetch_one(&self.pool)
            .await?;

        let members = sqlx::query_as::<_, Member>(&format!(
            "{} WHERE m.active = TRUE ORDER BY m.name LIMIT $1 OFFSET $2",
            SELECT_MEMBER
        ))
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((members, total))
    }

    /// Search active members by name, email or national ID
    pub async fn search(&self, term: &str, per_page: i64, offset: i64) -> AppResult<(Vec<Member>, i64)> {
        let pattern = super::contains_pattern(term);
        let condition =
            "m.active = TRUE AND (LOWER(m.name) LIKE $1 OR LOWER(m.email) LIKE $1 OR m.national_id LIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM members m WHERE {}", condition))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let members = sqlx::query_as::<_, Member>(&format!(
            "{} WHERE {} ORDER BY m.name LIMIT $2 OFFSET $3",
            SELECT_MEMBER, condition
        ))
        .bind(&pattern)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((members, total))
    }

    /// Active members of a given type
    pub async fn list_by_type(&self, member_type: MemberType) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "{} WHERE m.active = TRUE AND m.member_type = $1 ORDER BY m.name",
            SELECT_MEMBER
        ))
        .bind(member_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }
}
