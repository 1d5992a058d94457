mod date;
mod operation;

pub use self::{date::*, operation::*};
