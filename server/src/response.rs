mod book;
mod borrowing;
mod notification;

pub use self::{book::*, borrowing::*, notification::*};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::controller::Exhaust;

/// Presents like `P` but answers `201 Created`.
pub struct Created<P>(pub P);

pub struct CreatedResponse<T>(T);

impl<T: Serialize> IntoResponse for CreatedResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, axum::Json(self.0)).into_response()
    }
}

impl<P, O> Exhaust<O> for Created<P>
where
    P: Exhaust<O>,
    P::To: Serialize,
{
    type To = CreatedResponse<P::To>;
    fn emit(&self, input: O) -> Self::To {
        CreatedResponse(self.0.emit(input))
    }
}
