use error_stack::Report;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

use crate::{ErrorDetail, KernelError};

const MAX_AUTHOR_LENGTH: usize = 255;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BookAuthor(String);

impl BookAuthor {
    pub fn new(author: impl Into<String>) -> Self {
        Self(author.into())
    }

    pub fn parse(author: impl Into<String>) -> error_stack::Result<Self, KernelError> {
        let author = author.into().trim().to_string();
        if author.is_empty() || author.chars().count() > MAX_AUTHOR_LENGTH {
            return Err(Report::new(KernelError::ValidationFailed).attach_printable(
                ErrorDetail::new(format!(
                    "author must contain between 1 and {MAX_AUTHOR_LENGTH} characters"
                )),
            ));
        }
        Ok(Self(author))
    }
}
