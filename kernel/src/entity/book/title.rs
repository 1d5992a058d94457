use error_stack::Report;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use vodca::{AsRefln, Fromln};

use crate::{ErrorDetail, KernelError};

const MAX_TITLE_LENGTH: usize = 255;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BookTitle(String);

impl BookTitle {
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Trims surrounding whitespace and rejects empty or overlong titles.
    pub fn parse(title: impl Into<String>) -> error_stack::Result<Self, KernelError> {
        let title = title.into().trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Report::new(KernelError::ValidationFailed).attach_printable(
                ErrorDetail::new(format!(
                    "title must contain between 1 and {MAX_TITLE_LENGTH} characters"
                )),
            ));
        }
        Ok(Self(title))
    }
}

impl Display for BookTitle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
