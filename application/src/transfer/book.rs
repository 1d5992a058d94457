use kernel::prelude::entity::{SelectLimit, SelectOffset};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct GetBookDto {
    pub id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct GetAllBookDto {
    pub limit: SelectLimit,
    pub offset: SelectOffset,
}

#[derive(Debug, Clone)]
pub struct CreateBookDto {
    pub title: String,
    pub author: String,
    pub cover: String,
    pub inventory: i32,
    pub daily_fee: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateBookDto {
    pub id: Uuid,
    pub title: Option<String>,
    pub author: Option<String>,
    pub cover: Option<String>,
    pub inventory: Option<i32>,
    pub daily_fee: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct DeleteBookDto {
    pub id: Uuid,
}
