use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::prelude::entity::{
    Book, BookAuthor, BookCover, BookId, BookInventory, BookTitle, DestructBook,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::controller::Exhaust;

const FEE_SCALE: u32 = 2;

#[derive(Debug, Serialize)]
pub struct BookResponse {
    id: BookId,
    title: BookTitle,
    author: BookAuthor,
    cover: BookCover,
    inventory: BookInventory,
    daily_fee: Decimal,
}

impl IntoResponse for BookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let DestructBook {
            id,
            title,
            author,
            cover,
            inventory,
            daily_fee,
        } = book.into_destruct();
        let mut daily_fee = *daily_fee.as_ref();
        daily_fee.rescale(FEE_SCALE);
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

pub struct BookPresenter;

impl Exhaust<()> for BookPresenter {
    type To = StatusCode;
    fn emit(&self, _: ()) -> Self::To {
        StatusCode::NO_CONTENT
    }
}

impl Exhaust<Book> for BookPresenter {
    type To = BookResponse;
    fn emit(&self, input: Book) -> Self::To {
        BookResponse::from(input)
    }
}

impl Exhaust<Vec<Book>> for BookPresenter {
    type To = axum::Json<Vec<BookResponse>>;
    fn emit(&self, input: Vec<Book>) -> Self::To {
        let result = input
            .into_iter()
            .map(BookResponse::from)
            .collect::<Vec<_>>();

        axum::Json::from(result)
    }
}
