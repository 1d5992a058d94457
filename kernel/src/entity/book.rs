mod author;
mod cover;
mod daily_fee;
mod id;
mod inventory;
mod title;

pub use self::{author::*, cover::*, daily_fee::*, id::*, inventory::*, title::*};
use destructure::{Destructure, Mutation};
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure, Mutation)]
pub struct Book {
    id: BookId,
    title: BookTitle,
    author: BookAuthor,
    cover: BookCover,
    inventory: BookInventory,
    daily_fee: DailyFee,
}

impl Book {
    pub fn new(
        id: BookId,
        title: BookTitle,
        author: BookAuthor,
        cover: BookCover,
        inventory: BookInventory,
        daily_fee: DailyFee,
    ) -> Self {
        Self {
            id,
            title,
            author,
            cover,
            inventory,
            daily_fee,
        }
    }
}
