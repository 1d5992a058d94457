use std::fmt::{Display, Formatter};

use error_stack::Context;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KernelError {
    OutOfStock,
    AlreadyReturned,
    InvalidDateRange,
    PermissionDenied,
    Unauthenticated,
    NotFound,
    ValidationFailed,
    Concurrency,
    Timeout,
    Internal,
}

impl Display for KernelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::OutOfStock => write!(f, "This book is currently out of stock"),
            KernelError::AlreadyReturned => write!(f, "This borrowing has already been returned"),
            KernelError::InvalidDateRange => write!(f, "Invalid date range"),
            KernelError::PermissionDenied => {
                write!(f, "You do not have permission to perform this action")
            }
            KernelError::Unauthenticated => {
                write!(f, "Authentication credentials were not provided or are invalid")
            }
            KernelError::NotFound => write!(f, "Not found"),
            KernelError::ValidationFailed => write!(f, "Validation failed"),
            KernelError::Concurrency => write!(f, "Concurrency error"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}

/// Human readable reason attached to a `Report<KernelError>`.
///
/// The server surfaces the most recent one as the response message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ErrorDetail(String);

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

impl Display for ErrorDetail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ErrorDetail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
