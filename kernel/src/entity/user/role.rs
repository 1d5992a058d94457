use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Member,
    Admin,
}

impl UserRole {
    /// Staff accounts are administrators.
    pub fn from_staff_flag(is_staff: bool) -> Self {
        if is_staff {
            UserRole::Admin
        } else {
            UserRole::Member
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}
