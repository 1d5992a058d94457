use kernel::prelude::entity::{Book, Borrowing, SelectLimit, SelectOffset};
use time::Date;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct GetBorrowingDto {
    pub id: Uuid,
}

/// `user_id` is only honoured for administrators.
#[derive(Debug, Clone, Default)]
pub struct GetAllBorrowingDto {
    pub is_active: Option<bool>,
    pub user_id: Option<Uuid>,
    pub limit: SelectLimit,
    pub offset: SelectOffset,
}

/// A borrowing together with the book it holds.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BorrowingDetailDto {
    pub borrowing: Borrowing,
    pub book: Book,
}

#[derive(Debug, Clone)]
pub struct CreateBorrowingDto {
    pub book_id: Uuid,
    pub expected_return_date: Date,
}

#[derive(Debug, Clone)]
pub struct UpdateBorrowingDto {
    pub id: Uuid,
    pub expected_return_date: Date,
}

#[derive(Debug, Clone)]
pub struct ReturnBorrowingDto {
    pub id: Uuid,
    pub actual_return_date: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct DeleteBorrowingDto {
    pub id: Uuid,
}
