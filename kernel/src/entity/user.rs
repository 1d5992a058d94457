mod email;
mod id;
mod role;
mod token;

pub use self::{email::*, id::*, role::*, token::*};
use destructure::Destructure;
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, Destructure, References)]
pub struct User {
    id: UserId,
    email: UserEmail,
    role: UserRole,
}

impl User {
    pub fn new(id: UserId, email: UserEmail, role: UserRole) -> Self {
        Self { id, email, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
