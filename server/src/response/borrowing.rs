use application::transfer::BorrowingDetailDto;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::prelude::entity::{
    ActualReturnDate, BookId, BorrowDate, Borrowing, BorrowingId, DestructBorrowing,
    ExpectedReturnDate, UserId,
};
use serde::Serialize;

use crate::controller::Exhaust;
use crate::response::BookResponse;

#[derive(Debug, Serialize)]
pub struct BorrowingResponse {
    id: BorrowingId,
    borrow_date: BorrowDate,
    expected_return_date: ExpectedReturnDate,
    actual_return_date: Option<ActualReturnDate>,
    book_id: BookId,
    user_id: UserId,
}

impl IntoResponse for BorrowingResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

impl From<Borrowing> for BorrowingResponse {
    fn from(borrowing: Borrowing) -> Self {
        let DestructBorrowing {
            id,
            borrow_date,
            expected_return_date,
            actual_return_date,
            book_id,
            user_id,
        } = borrowing.into_destruct();
        Self {
            id,
            borrow_date,
            expected_return_date,
            actual_return_date,
            book_id,
            user_id,
        }
    }
}

/// Read shape: the borrowed book is nested instead of referenced.
#[derive(Debug, Serialize)]
pub struct BorrowingDetailResponse {
    id: BorrowingId,
    borrow_date: BorrowDate,
    expected_return_date: ExpectedReturnDate,
    actual_return_date: Option<ActualReturnDate>,
    book: BookResponse,
    user_id: UserId,
}

impl IntoResponse for BorrowingDetailResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

impl From<BorrowingDetailDto> for BorrowingDetailResponse {
    fn from(detail: BorrowingDetailDto) -> Self {
        let DestructBorrowing {
            id,
            borrow_date,
            expected_return_date,
            actual_return_date,
            user_id,
            ..
        } = detail.borrowing.into_destruct();
        Self {
            id,
            borrow_date,
            expected_return_date,
            actual_return_date,
            book: BookResponse::from(detail.book),
            user_id,
        }
    }
}

pub struct BorrowingPresenter;

impl Exhaust<()> for BorrowingPresenter {
    type To = StatusCode;
    fn emit(&self, _: ()) -> Self::To {
        StatusCode::NO_CONTENT
    }
}

impl Exhaust<Borrowing> for BorrowingPresenter {
    type To = BorrowingResponse;
    fn emit(&self, input: Borrowing) -> Self::To {
        BorrowingResponse::from(input)
    }
}

impl Exhaust<BorrowingDetailDto> for BorrowingPresenter {
    type To = BorrowingDetailResponse;
    fn emit(&self, input: BorrowingDetailDto) -> Self::To {
        BorrowingDetailResponse::from(input)
    }
}

impl Exhaust<Vec<BorrowingDetailDto>> for BorrowingPresenter {
    type To = axum::Json<Vec<BorrowingDetailResponse>>;
    fn emit(&self, input: Vec<BorrowingDetailDto>) -> Self::To {
        let result = input
            .into_iter()
            .map(BorrowingDetailResponse::from)
            .collect::<Vec<_>>();

        axum::Json::from(result)
    }
}

#[derive(Debug, Serialize)]
pub struct ReturnedResponse {
    status: &'static str,
}

/// Answers a successful return with a fixed status body.
pub struct ReturnPresenter;

impl Exhaust<Borrowing> for ReturnPresenter {
    type To = axum::Json<ReturnedResponse>;
    fn emit(&self, _: Borrowing) -> Self::To {
        axum::Json(ReturnedResponse {
            status: "Book returned",
        })
    }
}

#[derive(Debug, Serialize)]
pub struct OverdueResponse {
    overdue: usize,
}

pub struct OverduePresenter;

impl Exhaust<usize> for OverduePresenter {
    type To = axum::Json<OverdueResponse>;
    fn emit(&self, input: usize) -> Self::To {
        axum::Json(OverdueResponse { overdue: input })
    }
}
