use application::transfer::{
    CreateBorrowingDto, DeleteBorrowingDto, GetAllBorrowingDto, GetBorrowingDto,
    ReturnBorrowingDto, UpdateBorrowingDto,
};
use kernel::prelude::entity::{SelectLimit, SelectOffset};
use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::controller::Intake;

#[derive(Debug, Deserialize)]
pub struct CreateBorrowingRequest {
    book_id: Uuid,
    expected_return_date: Date,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBorrowingRequest {
    expected_return_date: Date,
}

/// Body of `POST /borrowings/:id/return`. May be omitted entirely.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnBorrowingRequest {
    #[serde(default)]
    actual_return_date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct GetAllBorrowingRequest {
    is_active: Option<bool>,
    user_id: Option<Uuid>,
    #[serde(default)]
    limit: SelectLimit,
    #[serde(default)]
    offset: SelectOffset,
}

#[derive(Debug)]
pub struct GetBorrowingRequest {
    id: Uuid,
}

impl GetBorrowingRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

#[derive(Debug)]
pub struct DeleteBorrowingRequest {
    id: Uuid,
}

impl DeleteBorrowingRequest {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

pub struct BorrowingTransformer;

impl Intake<CreateBorrowingRequest> for BorrowingTransformer {
    type To = CreateBorrowingDto;
    fn emit(&self, input: CreateBorrowingRequest) -> Self::To {
        CreateBorrowingDto {
            book_id: input.book_id,
            expected_return_date: input.expected_return_date,
        }
    }
}

impl Intake<(Uuid, UpdateBorrowingRequest)> for BorrowingTransformer {
    type To = UpdateBorrowingDto;
    fn emit(&self, input: (Uuid, UpdateBorrowingRequest)) -> Self::To {
        let (id, input) = input;
        UpdateBorrowingDto {
            id,
            expected_return_date: input.expected_return_date,
        }
    }
}

impl Intake<(Uuid, ReturnBorrowingRequest)> for BorrowingTransformer {
    type To = ReturnBorrowingDto;
    fn emit(&self, input: (Uuid, ReturnBorrowingRequest)) -> Self::To {
        let (id, input) = input;
        ReturnBorrowingDto {
            id,
            actual_return_date: input.actual_return_date,
        }
    }
}

impl Intake<GetAllBorrowingRequest> for BorrowingTransformer {
    type To = GetAllBorrowingDto;
    fn emit(&self, input: GetAllBorrowingRequest) -> Self::To {
        GetAllBorrowingDto {
            is_active: input.is_active,
            user_id: input.user_id,
            limit: input.limit,
            offset: input.offset,
        }
    }
}

impl Intake<GetBorrowingRequest> for BorrowingTransformer {
    type To = GetBorrowingDto;
    fn emit(&self, input: GetBorrowingRequest) -> Self::To {
        GetBorrowingDto { id: input.id }
    }
}

impl Intake<DeleteBorrowingRequest> for BorrowingTransformer {
    type To = DeleteBorrowingDto;
    fn emit(&self, input: DeleteBorrowingRequest) -> Self::To {
        DeleteBorrowingDto { id: input.id }
    }
}
