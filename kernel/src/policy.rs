//! Role based access rules.
//!
//! A pure predicate over the caller, the requested operation and, for
//! borrowings, who owns the record. Evaluated once per request.

use error_stack::Report;

use crate::entity::{User, UserId};
use crate::KernelError;

/// Principal of a request.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Caller {
    Anonymous,
    Authenticated(User),
}

impl Caller {
    pub fn user(&self) -> Option<&User> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(user) => Some(user),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(User::is_admin)
    }

    /// Borrowing queries are narrowed to this user; admins see everything.
    pub fn scope(&self) -> Option<&UserId> {
        match self {
            Caller::Authenticated(user) if !user.is_admin() => Some(user.id()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    Return,
}

impl Operation {
    pub fn is_safe(&self) -> bool {
        matches!(self, Operation::Read)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Resource<'a> {
    Catalog,
    Borrowing { owner: Option<&'a UserId> },
    OverdueScan,
    NotificationQueue,
}

pub fn authorize(
    caller: &Caller,
    operation: Operation,
    resource: Resource<'_>,
) -> error_stack::Result<(), KernelError> {
    if is_permitted(caller, operation, resource) {
        return Ok(());
    }
    let context = match caller {
        Caller::Anonymous => KernelError::Unauthenticated,
        Caller::Authenticated(_) => KernelError::PermissionDenied,
    };
    Err(Report::new(context).attach_printable(format!("{operation:?} on {resource:?}")))
}

pub fn is_permitted(caller: &Caller, operation: Operation, resource: Resource<'_>) -> bool {
    let user = match caller {
        Caller::Anonymous => return matches!(resource, Resource::Catalog) && operation.is_safe(),
        Caller::Authenticated(user) => user,
    };
    if user.is_admin() {
        return true;
    }
    match resource {
        Resource::Catalog => operation.is_safe(),
        Resource::OverdueScan | Resource::NotificationQueue => false,
        Resource::Borrowing { owner } => {
            let owns = owner.map_or(true, |owner| owner == user.id());
            match operation {
                Operation::Read | Operation::Create | Operation::Return => owns,
                Operation::Update | Operation::Delete => false,
            }
        }
    }
}
