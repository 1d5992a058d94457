mod date;
mod id;

pub use self::{date::*, id::*};
use crate::entity::{BookId, UserId};
use crate::{ErrorDetail, KernelError};
use destructure::{Destructure, Mutation};
use error_stack::Report;
use time::Date;
use vodca::References;

/// One user renting one copy of one book.
///
/// While `actual_return_date` is unset the borrowing is active and holds one
/// unit of the book's inventory.
#[derive(Debug, Clone, Eq, PartialEq, References, Destructure, Mutation)]
pub struct Borrowing {
    id: BorrowingId,
    borrow_date: BorrowDate,
    expected_return_date: ExpectedReturnDate,
    actual_return_date: Option<ActualReturnDate>,
    book_id: BookId,
    user_id: UserId,
}

impl Borrowing {
    pub fn new(
        id: BorrowingId,
        borrow_date: BorrowDate,
        expected_return_date: ExpectedReturnDate,
        actual_return_date: Option<ActualReturnDate>,
        book_id: BookId,
        user_id: UserId,
    ) -> Self {
        Self {
            id,
            borrow_date,
            expected_return_date,
            actual_return_date,
            book_id,
            user_id,
        }
    }

    /// Starts a borrowing on `today`.
    pub fn open(
        id: BorrowingId,
        expected_return_date: ExpectedReturnDate,
        book_id: BookId,
        user_id: UserId,
        today: Date,
    ) -> error_stack::Result<Self, KernelError> {
        Self::validate_date(today, &expected_return_date, None)?;
        Ok(Self::new(
            id,
            BorrowDate::new(today),
            expected_return_date,
            None,
            book_id,
            user_id,
        ))
    }

    pub fn is_active(&self) -> bool {
        self.actual_return_date.is_none()
    }

    /// `expected >= today` and, when given, `expected <= actual`.
    pub fn validate_date(
        today: Date,
        expected_return_date: &ExpectedReturnDate,
        actual_return_date: Option<&ActualReturnDate>,
    ) -> error_stack::Result<(), KernelError> {
        let expected = *expected_return_date.as_ref();
        if expected < today {
            return Err(Report::new(KernelError::InvalidDateRange).attach_printable(
                ErrorDetail::new("Expected return date cannot be earlier than today's date"),
            ));
        }
        if let Some(actual) = actual_return_date {
            if expected > *actual.as_ref() {
                return Err(Report::new(KernelError::InvalidDateRange).attach_printable(
                    ErrorDetail::new(
                        "Expected return date cannot be later than the actual return date",
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Marks the borrowing returned. Works exactly once.
    ///
    /// Early returns are allowed; the return date must fall between the
    /// borrow date and today.
    pub fn close(
        self,
        actual_return_date: Option<ActualReturnDate>,
        today: Date,
    ) -> error_stack::Result<Self, KernelError> {
        if !self.is_active() {
            return Err(Report::new(KernelError::AlreadyReturned)
                .attach_printable(format!("borrowing {} is already returned", self.id)));
        }
        let actual = actual_return_date.unwrap_or_else(|| ActualReturnDate::new(today));
        if actual.as_ref() < self.borrow_date.as_ref() || *actual.as_ref() > today {
            return Err(Report::new(KernelError::InvalidDateRange).attach_printable(
                ErrorDetail::new(
                    "Actual return date must be between the borrow date and today's date",
                ),
            ));
        }
        Ok(self.reconstruct(|borrowing| borrowing.actual_return_date = Some(actual)))
    }

    /// Admin correction of the expected return date.
    pub fn reschedule(
        self,
        expected_return_date: ExpectedReturnDate,
        today: Date,
    ) -> error_stack::Result<Self, KernelError> {
        Self::validate_date(
            today,
            &expected_return_date,
            self.actual_return_date.as_ref(),
        )?;
        Ok(self.reconstruct(|borrowing| borrowing.expected_return_date = expected_return_date))
    }
}
