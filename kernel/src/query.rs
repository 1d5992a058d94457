mod book;
mod borrowing;
mod user;

pub use self::{book::*, borrowing::*, user::*};
