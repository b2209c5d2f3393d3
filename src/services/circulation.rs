//! Loan lifecycle rules
//!
//! Every function here is pure: it takes the current rows plus today's date
//! and returns the next state, or the rule that was broken. Effects on book
//! stock are returned as [`CopyEffect`] values and applied by
//! [`LoansService`](super::loans::LoansService) inside the same transaction
//! that persists the loan.
//!
//! Loan states:
//!
//! ```text
//! ACTIVE --renew--> RENEWED --renew--> RENEWED
//!    \                 |
//!     +----return------+------> RETURNED (terminal)
//! ```

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        enums::LoanStatus,
        loan::{BorrowerStanding, Loan, NewLoan},
        member::Member,
    },
};

pub const MIN_RENEWAL_DAYS: i64 = 1;
pub const MAX_RENEWAL_DAYS: i64 = 30;

/// Change to a book's available copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyEffect {
    /// One copy leaves the shelf
    Reserve { book_id: i64 },
    /// One copy comes back
    Release { book_id: i64 },
}

/// Result of a lifecycle step
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub loan: T,
    pub effects: Vec<CopyEffect>,
}

/// Book-side checkout preconditions
pub fn ensure_lendable(book: &Book) -> AppResult<()> {
    if !book.active {
        return Err(AppError::BusinessRule(
            "Book is not available for loan".to_string(),
        ));
    }
    if book.available_copies <= 0 {
        return Err(AppError::BusinessRule(
            "No copies of this book are available".to_string(),
        ));
    }
    Ok(())
}

/// Member-side checkout preconditions
pub fn ensure_eligible(member: &Member, standing: &BorrowerStanding) -> AppResult<()> {
    if !member.active {
        return Err(AppError::BusinessRule("Member is not active".to_string()));
    }
    if standing.open_loans >= i64::from(member.borrow_limit) {
        return Err(AppError::BusinessRule(format!(
            "Member reached the limit of simultaneous loans ({})",
            member.borrow_limit
        )));
    }
    if standing.holds_book {
        return Err(AppError::BusinessRule(
            "Member already has this book on loan".to_string(),
        ));
    }
    if standing.overdue_loans > 0 {
        return Err(AppError::BusinessRule(
            "Member has overdue loans. Return them before borrowing again".to_string(),
        ));
    }
    Ok(())
}

/// Open a loan of `book` for `member`
pub fn check_out(
    book: &Book,
    member: &Member,
    standing: &BorrowerStanding,
    notes: Option<String>,
    today: NaiveDate,
) -> AppResult<Transition<NewLoan>> {
    ensure_lendable(book)?;
    ensure_eligible(member, standing)?;

    let period = member.member_type.rules().loan_period_days;
    let loan = NewLoan {
        book_id: book.id,
        member_id: member.id,
        loan_date: today,
        due_date: today + Duration::days(period),
        daily_fine_rate: book.daily_fine_rate,
        notes,
    };

    Ok(Transition {
        loan,
        effects: vec![CopyEffect::Reserve { book_id: book.id }],
    })
}

/// Close a loan, computing the fine owed for a late return
pub fn check_in(loan: &Loan, book: &Book, today: NaiveDate) -> AppResult<Transition<Loan>> {
    if loan.status == LoanStatus::Returned || loan.return_date.is_some() {
        return Err(AppError::BusinessRule(
            "This loan has already been returned".to_string(),
        ));
    }
    if book.id != loan.book_id {
        return Err(AppError::Internal(format!(
            "Loan {} references book {}, got book {}",
            loan.id, loan.book_id, book.id
        )));
    }
    // A return with every copy already on the shelf means stock was miscounted earlier
    if book.available_copies >= book.total_copies {
        return Err(AppError::Internal(format!(
            "Book {} would exceed its total copies on return ({}/{})",
            book.id, book.available_copies, book.total_copies
        )));
    }

    let mut returned = loan.clone();
    returned.return_date = Some(today);
    returned.status = LoanStatus::Returned;
    returned.fine_amount = fine_for(loan.due_date, today, loan.daily_fine_rate);

    Ok(Transition {
        loan: returned,
        effects: vec![CopyEffect::Release {
            book_id: loan.book_id,
        }],
    })
}

/// Push the due date of an open, non-overdue loan forward by `days`
pub fn renew(loan: &Loan, days: i64, today: NaiveDate) -> AppResult<Transition<Loan>> {
    validate_renewal_days(days)?;

    if loan.status == LoanStatus::Returned {
        return Err(AppError::BusinessRule(
            "Only open loans can be renewed".to_string(),
        ));
    }
    if loan.is_overdue(today) {
        return Err(AppError::BusinessRule(
            "Overdue loans cannot be renewed. Return the book first".to_string(),
        ));
    }

    let mut renewed = loan.clone();
    renewed.due_date = loan.due_date + Duration::days(days);
    renewed.status = LoanStatus::Renewed;

    Ok(Transition {
        loan: renewed,
        effects: Vec::new(),
    })
}

pub fn validate_renewal_days(days: i64) -> AppResult<()> {
    if !(MIN_RENEWAL_DAYS..=MAX_RENEWAL_DAYS).contains(&days) {
        return Err(AppError::BusinessRule(format!(
            "Renewal days must be between {} and {}",
            MIN_RENEWAL_DAYS, MAX_RENEWAL_DAYS
        )));
    }
    Ok(())
}

/// Fine for returning on `returned` a loan due on `due`.
///
/// `None` when the return is on time or the book has no fine rate.
pub fn fine_for(due: NaiveDate, returned: NaiveDate, daily_rate: Option<Decimal>) -> Option<Decimal> {
    let days_late = (returned - due).num_days();
    if days_late <= 0 {
        return None;
    }
    daily_rate.map(|rate| (rate * Decimal::from(days_late)).round_dp(2))
}

/// New `available_copies` after changing a book's total to `new_total`
pub fn resize_stock(book: &Book, new_total: i32) -> AppResult<i32> {
    let available = book.available_copies + (new_total - book.total_copies);
    if available < 0 {
        return Err(AppError::BusinessRule(format!(
            "Cannot reduce total copies to {}: {} copies are on loan",
            new_total,
            book.total_copies - book.available_copies
        )));
    }
    Ok(available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use crate::models::enums::MemberType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn days(n: i64) -> Duration {
        Duration::days(n)
    }

    fn book(total: i32, available: i32) -> Book {
        Book {
            id: 10,
            isbn: "9788535902778".to_string(),
            title: "Dom Casmurro".to_string(),
            author: "Machado de Assis".to_string(),
            publisher: None,
            publication_year: Some(1899),
            total_copies: total,
            available_copies: available,
            daily_fine_rate: Some(dec!(2.00)),
            category_id: None,
            category_name: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn member(member_type: MemberType) -> Member {
        Member {
            id: 20,
            name: "Ana Souza".to_string(),
            email: "ana@example.org".to_string(),
            national_id: "12345678901".to_string(),
            phone: None,
            member_type,
            active: true,
            borrow_limit: member_type.rules().borrow_limit,
            active_loans: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn open_loan(due_date: NaiveDate) -> Loan {
        Loan {
            id: 30,
            book_id: 10,
            member_id: 20,
            loan_date: due_date - days(14),
            due_date,
            return_date: None,
            status: LoanStatus::Active,
            daily_fine_rate: Some(dec!(2.00)),
            fine_amount: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn rule_message(result: AppResult<impl std::fmt::Debug>) -> String {
        match result {
            Err(AppError::BusinessRule(msg)) => msg,
            other => panic!("expected a rule violation, got {:?}", other),
        }
    }

    // -- check_out ----------------------------------------------------------

    #[test]
    fn test_check_out_sets_dates_from_member_type() {
        let t = check_out(
            &book(3, 3),
            &member(MemberType::Teacher),
            &BorrowerStanding::default(),
            Some("front desk".to_string()),
            today(),
        )
        .unwrap();

        assert_eq!(t.loan.loan_date, today());
        assert_eq!(t.loan.due_date, today() + days(21));
        assert_eq!(t.loan.daily_fine_rate, Some(dec!(2.00)));
        assert_eq!(t.loan.notes.as_deref(), Some("front desk"));
        assert_eq!(t.effects, vec![CopyEffect::Reserve { book_id: 10 }]);
    }

    #[test]
    fn test_check_out_external_member_gets_seven_days() {
        let t = check_out(
            &book(1, 1),
            &member(MemberType::External),
            &BorrowerStanding::default(),
            None,
            today(),
        )
        .unwrap();
        assert_eq!(t.loan.due_date, today() + days(7));
    }

    #[test]
    fn test_check_out_inactive_book() {
        let mut b = book(2, 2);
        b.active = false;
        let msg = rule_message(check_out(
            &b,
            &member(MemberType::Student),
            &BorrowerStanding::default(),
            None,
            today(),
        ));
        assert!(msg.contains("not available"));
    }

    #[test]
    fn test_check_out_no_copies() {
        let msg = rule_message(check_out(
            &book(1, 0),
            &member(MemberType::Student),
            &BorrowerStanding::default(),
            None,
            today(),
        ));
        assert!(msg.contains("No copies"));
    }

    #[test]
    fn test_check_out_inactive_member() {
        let mut m = member(MemberType::Student);
        m.active = false;
        let msg = rule_message(check_out(
            &book(1, 1),
            &m,
            &BorrowerStanding::default(),
            None,
            today(),
        ));
        assert!(msg.contains("not active"));
    }

    #[test]
    fn test_check_out_limit_reached() {
        let standing = BorrowerStanding {
            open_loans: 3,
            ..Default::default()
        };
        let msg = rule_message(check_out(
            &book(1, 1),
            &member(MemberType::Student),
            &standing,
            None,
            today(),
        ));
        assert!(msg.contains("limit"));

        let standing = BorrowerStanding {
            open_loans: 2,
            ..Default::default()
        };
        assert!(check_out(
            &book(1, 1),
            &member(MemberType::Student),
            &standing,
            None,
            today()
        )
        .is_ok());
    }

    #[test]
    fn test_check_out_same_book_twice() {
        let standing = BorrowerStanding {
            open_loans: 1,
            holds_book: true,
            overdue_loans: 0,
        };
        let msg = rule_message(check_out(
            &book(2, 1),
            &member(MemberType::Student),
            &standing,
            None,
            today(),
        ));
        assert!(msg.contains("already has this book"));
    }

    #[test]
    fn test_check_out_blocked_by_overdue_loan() {
        let standing = BorrowerStanding {
            open_loans: 1,
            holds_book: false,
            overdue_loans: 1,
        };
        let msg = rule_message(check_out(
            &book(2, 2),
            &member(MemberType::Teacher),
            &standing,
            None,
            today(),
        ));
        assert!(msg.contains("overdue"));
    }

    #[test]
    fn test_check_out_first_failure_wins() {
        // Book without copies and member over the limit: the book rule is reported
        let standing = BorrowerStanding {
            open_loans: 10,
            holds_book: true,
            overdue_loans: 2,
        };
        let mut m = member(MemberType::Student);
        m.active = false;
        let msg = rule_message(check_out(&book(1, 0), &m, &standing, None, today()));
        assert!(msg.contains("No copies"));

        let msg = rule_message(check_out(&book(1, 1), &m, &standing, None, today()));
        assert!(msg.contains("not active"));
    }

    #[test]
    fn test_check_out_limit_reported_before_held_book_and_overdue() {
        let m = member(MemberType::Student);
        let standing = BorrowerStanding {
            open_loans: i64::from(m.borrow_limit),
            holds_book: true,
            overdue_loans: 1,
        };
        let msg = rule_message(check_out(&book(2, 1), &m, &standing, None, today()));
        assert!(msg.contains("limit"));
    }

    #[test]
    fn test_check_out_held_book_reported_before_overdue() {
        let standing = BorrowerStanding {
            open_loans: 1,
            holds_book: true,
            overdue_loans: 1,
        };
        let msg = rule_message(check_out(
            &book(2, 1),
            &member(MemberType::Student),
            &standing,
            None,
            today(),
        ));
        assert!(msg.contains("already has this book"));
        assert!(!msg.contains("overdue"));
    }

    #[test]
    fn test_last_copy_goes_to_first_borrower_only() {
        let mut b = book(1, 1);
        let t = check_out(
            &b,
            &member(MemberType::Student),
            &BorrowerStanding::default(),
            None,
            today(),
        )
        .unwrap();
        assert_eq!(t.effects, vec![CopyEffect::Reserve { book_id: b.id }]);
        b.available_copies -= 1;

        let mut other = member(MemberType::Teacher);
        other.id = 21;
        let msg = rule_message(check_out(
            &b,
            &other,
            &BorrowerStanding::default(),
            None,
            today(),
        ));
        assert!(msg.contains("No copies"));
    }

    // -- check_in -----------------------------------------------------------

    #[test]
    fn test_check_in_on_time_has_no_fine() {
        let loan = open_loan(today() + days(2));
        let t = check_in(&loan, &book(2, 1), today()).unwrap();

        assert_eq!(t.loan.status, LoanStatus::Returned);
        assert_eq!(t.loan.return_date, Some(today()));
        assert_eq!(t.loan.fine_amount, None);
        assert_eq!(t.effects, vec![CopyEffect::Release { book_id: 10 }]);
    }

    #[test]
    fn test_check_in_three_days_late() {
        let loan = open_loan(today() - days(3));
        let t = check_in(&loan, &book(2, 1), today()).unwrap();
        assert_eq!(t.loan.fine_amount, Some(dec!(6.00)));
    }

    #[test]
    fn test_check_in_uses_rate_captured_at_checkout() {
        let mut loan = open_loan(today() - days(4));
        loan.daily_fine_rate = Some(dec!(0.75));
        let mut b = book(2, 1);
        b.daily_fine_rate = Some(dec!(5.00));
        let t = check_in(&loan, &b, today()).unwrap();
        assert_eq!(t.loan.fine_amount, Some(dec!(3.00)));
    }

    #[test]
    fn test_check_in_late_without_rate_leaves_fine_null() {
        let mut loan = open_loan(today() - days(10));
        loan.daily_fine_rate = None;
        let t = check_in(&loan, &book(2, 1), today()).unwrap();
        assert_eq!(t.loan.fine_amount, None);
    }

    #[test]
    fn test_check_in_renewed_loan_uses_current_due_date() {
        let loan = open_loan(today() - days(1));
        let renewed = renew(&loan, 7, today() - days(1)).unwrap().loan;
        assert_eq!(renewed.due_date, today() + days(6));

        let t = check_in(&renewed, &book(1, 0), today()).unwrap();
        assert_eq!(t.loan.fine_amount, None);
    }

    #[test]
    fn test_check_in_twice_is_rejected() {
        let loan = open_loan(today());
        let returned = check_in(&loan, &book(1, 0), today()).unwrap().loan;
        let msg = rule_message(check_in(&returned, &book(1, 1), today()));
        assert!(msg.contains("already been returned"));
    }

    #[test]
    fn test_check_in_with_full_shelf_is_internal_error() {
        let loan = open_loan(today());
        match check_in(&loan, &book(2, 2), today()) {
            Err(AppError::Internal(_)) => {}
            other => panic!("expected internal error, got {:?}", other),
        }
    }

    #[test]
    fn test_returned_iff_return_date_set() {
        let loan = open_loan(today() + days(3));
        assert!(loan.return_date.is_none() && loan.status != LoanStatus::Returned);

        let renewed = renew(&loan, 5, today()).unwrap().loan;
        assert!(renewed.return_date.is_none() && renewed.status != LoanStatus::Returned);

        let returned = check_in(&renewed, &book(1, 0), today()).unwrap().loan;
        assert!(returned.return_date.is_some() && returned.status == LoanStatus::Returned);
    }

    // -- renew --------------------------------------------------------------

    #[test]
    fn test_renew_active_loan() {
        let loan = open_loan(today() + days(5));
        let t = renew(&loan, 7, today()).unwrap();
        assert_eq!(t.loan.due_date, today() + days(12));
        assert_eq!(t.loan.status, LoanStatus::Renewed);
        assert!(t.effects.is_empty());
        assert!(t.loan.due_date >= t.loan.loan_date);
    }

    #[test]
    fn test_renew_can_repeat_while_not_overdue() {
        let loan = open_loan(today() + days(1));
        let once = renew(&loan, 3, today()).unwrap().loan;
        let twice = renew(&once, 3, today()).unwrap().loan;
        assert_eq!(twice.due_date, today() + days(7));
        assert_eq!(twice.status, LoanStatus::Renewed);
    }

    #[test]
    fn test_renew_due_today_is_allowed() {
        let loan = open_loan(today());
        assert!(renew(&loan, 1, today()).is_ok());
    }

    #[test]
    fn test_renew_overdue_rejected_for_any_days() {
        let loan = open_loan(today() - days(1));
        for d in [1, 7, 30] {
            let msg = rule_message(renew(&loan, d, today()));
            assert!(msg.contains("Overdue"));
        }
        assert!(renew(&loan, 0, today()).is_err());
        assert!(renew(&loan, 31, today()).is_err());
    }

    #[test]
    fn test_renew_returned_loan_rejected() {
        let loan = open_loan(today() + days(5));
        let returned = check_in(&loan, &book(1, 0), today()).unwrap().loan;
        let msg = rule_message(renew(&returned, 7, today()));
        assert!(msg.contains("open loans"));
    }

    #[test]
    fn test_renewal_days_bounds() {
        assert!(validate_renewal_days(1).is_ok());
        assert!(validate_renewal_days(30).is_ok());
        assert!(validate_renewal_days(0).is_err());
        assert!(validate_renewal_days(-3).is_err());
        assert!(validate_renewal_days(31).is_err());
    }

    // -- fines and stock ----------------------------------------------------

    #[test]
    fn test_fine_for() {
        let due = today();
        assert_eq!(fine_for(due, due, Some(dec!(2.00))), None);
        assert_eq!(fine_for(due, due - days(2), Some(dec!(2.00))), None);
        assert_eq!(fine_for(due, due + days(1), Some(dec!(1.50))), Some(dec!(1.50)));
        assert_eq!(fine_for(due, due + days(10), Some(dec!(0.25))), Some(dec!(2.50)));
        assert_eq!(fine_for(due, due + days(10), None), None);
    }

    #[test]
    fn test_resize_stock() {
        // 5 copies, 2 on loan
        let b = book(5, 3);
        assert_eq!(resize_stock(&b, 8).unwrap(), 6);
        assert_eq!(resize_stock(&b, 2).unwrap(), 0);
        assert!(resize_stock(&b, 1).is_err());
    }
}
