mod book;
mod borrowing;
mod notification;

pub use self::{book::*, borrowing::*, notification::*};
