use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use time::Date;
use vodca::{AsRefln, Fromln};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Fromln, AsRefln, Serialize, Deserialize,
)]
pub struct BorrowDate(Date);

impl BorrowDate {
    pub fn new(date: impl Into<Date>) -> Self {
        Self(date.into())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Fromln, AsRefln, Serialize, Deserialize,
)]
pub struct ExpectedReturnDate(Date);

impl ExpectedReturnDate {
    pub fn new(date: impl Into<Date>) -> Self {
        Self(date.into())
    }
}

impl Display for ExpectedReturnDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Fromln, AsRefln, Serialize, Deserialize,
)]
pub struct ActualReturnDate(Date);

impl ActualReturnDate {
    pub fn new(date: impl Into<Date>) -> Self {
        Self(date.into())
    }
}
