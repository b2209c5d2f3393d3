//! Shared domain enums stored as text columns

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Text-backed enum <-> VARCHAR column
macro_rules! impl_pg_text {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: &str = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// MemberType
// ---------------------------------------------------------------------------

/// Borrowing rules attached to a member type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowingRules {
    /// Maximum number of simultaneously open loans
    pub borrow_limit: i32,
    /// Days between checkout and due date
    pub loan_period_days: i64,
}

/// Member category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    Student,
    Teacher,
    Staff,
    External,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberType::Student => "STUDENT",
            MemberType::Teacher => "TEACHER",
            MemberType::Staff => "STAFF",
            MemberType::External => "EXTERNAL",
        }
    }

    pub fn rules(&self) -> BorrowingRules {
        let (borrow_limit, loan_period_days) = match self {
            MemberType::Student => (3, 14),
            MemberType::Teacher => (5, 21),
            MemberType::Staff => (3, 14),
            MemberType::External => (2, 7),
        };
        BorrowingRules {
            borrow_limit,
            loan_period_days,
        }
    }
}

impl std::str::FromStr for MemberType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STUDENT" => Ok(MemberType::Student),
            "TEACHER" => Ok(MemberType::Teacher),
            "STAFF" => Ok(MemberType::Staff),
            "EXTERNAL" => Ok(MemberType::External),
            _ => Err(format!("Invalid member type: {}", s)),
        }
    }
}

impl_pg_text!(MemberType);

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Renewed,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Renewed => "RENEWED",
            LoanStatus::Returned => "RETURNED",
        }
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(LoanStatus::Active),
            "RENEWED" => Ok(LoanStatus::Renewed),
            "RETURNED" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

impl_pg_text!(LoanStatus);
