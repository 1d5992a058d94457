use error_stack::Report;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

use crate::{ErrorDetail, KernelError};

/// Copies currently available to lend. Never negative.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BookInventory(i32);

impl BookInventory {
    pub fn new(inventory: impl Into<i32>) -> Self {
        Self(inventory.into())
    }

    pub fn parse(inventory: impl Into<i32>) -> error_stack::Result<Self, KernelError> {
        let inventory = inventory.into();
        if inventory < 0 {
            return Err(Report::new(KernelError::ValidationFailed)
                .attach_printable(ErrorDetail::new("inventory must not be negative")));
        }
        Ok(Self(inventory))
    }
}
