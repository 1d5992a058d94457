use error_stack::Report;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{ErrorDetail, KernelError};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookCover {
    Hard,
    Soft,
}

impl BookCover {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookCover::Hard => "HARD",
            BookCover::Soft => "SOFT",
        }
    }
}

impl Display for BookCover {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookCover {
    type Err = Report<KernelError>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HARD" => Ok(BookCover::Hard),
            "SOFT" => Ok(BookCover::Soft),
            other => Err(Report::new(KernelError::ValidationFailed)
                .attach_printable(ErrorDetail::new(format!(
                    "\"{other}\" is not a valid cover, expected HARD or SOFT"
                )))),
        }
    }
}
