mod book;
mod borrowing;
mod overdue;
mod user;

pub use self::{book::*, borrowing::*, overdue::*, user::*};
