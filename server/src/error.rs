use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use error_stack::Report;
use kernel::{ErrorDetail, KernelError};
use serde::Serialize;
use std::process::{ExitCode, Termination};

#[derive(Debug)]
pub struct StackTrace(Report<KernelError>);

impl From<Report<KernelError>> for StackTrace {
    fn from(e: Report<KernelError>) -> Self {
        StackTrace(e)
    }
}

impl Termination for StackTrace {
    fn report(self) -> ExitCode {
        self.0.report()
    }
}

#[derive(Debug)]
pub struct ErrorStatus(Report<KernelError>);

impl From<Report<KernelError>> for ErrorStatus {
    fn from(e: Report<KernelError>) -> Self {
        ErrorStatus(e)
    }
}

impl From<KernelError> for ErrorStatus {
    fn from(e: KernelError) -> Self {
        ErrorStatus(Report::new(e))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ErrorStatus {
    pub fn status(&self) -> StatusCode {
        match self.0.current_context() {
            KernelError::OutOfStock
            | KernelError::AlreadyReturned
            | KernelError::InvalidDateRange
            | KernelError::ValidationFailed => StatusCode::BAD_REQUEST,
            KernelError::Unauthenticated => StatusCode::UNAUTHORIZED,
            KernelError::PermissionDenied => StatusCode::FORBIDDEN,
            KernelError::NotFound => StatusCode::NOT_FOUND,
            KernelError::Concurrency => StatusCode::CONFLICT,
            KernelError::Timeout => StatusCode::REQUEST_TIMEOUT,
            KernelError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Latest `ErrorDetail`, else the error kind itself. Internal errors
    /// never leak their details.
    pub fn message(&self) -> String {
        let context = self.0.current_context();
        if *context == KernelError::Internal {
            return context.to_string();
        }
        self.0
            .downcast_ref::<ErrorDetail>()
            .map(|detail| detail.to_string())
            .unwrap_or_else(|| context.to_string())
    }
}

impl IntoResponse for ErrorStatus {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            tracing::error!("{:?}", self.0);
        } else {
            tracing::debug!("{:?}", self.0);
        }
        let body = ErrorBody {
            error: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use error_stack::Report;
    use kernel::{ErrorDetail, KernelError};

    use super::ErrorStatus;

    #[test]
    fn status_mapping() {
        let cases = [
            (KernelError::OutOfStock, StatusCode::BAD_REQUEST),
            (KernelError::AlreadyReturned, StatusCode::BAD_REQUEST),
            (KernelError::InvalidDateRange, StatusCode::BAD_REQUEST),
            (KernelError::ValidationFailed, StatusCode::BAD_REQUEST),
            (KernelError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (KernelError::PermissionDenied, StatusCode::FORBIDDEN),
            (KernelError::NotFound, StatusCode::NOT_FOUND),
            (KernelError::Concurrency, StatusCode::CONFLICT),
            (KernelError::Timeout, StatusCode::REQUEST_TIMEOUT),
            (KernelError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ErrorStatus::from(error).status(), status);
        }
    }

    #[test]
    fn message_prefers_latest_detail() {
        let report = Report::new(KernelError::OutOfStock)
            .attach_printable(ErrorDetail::new("first"))
            .attach_printable(ErrorDetail::new("This book is currently out of stock"));
        assert_eq!(
            ErrorStatus::from(report).message(),
            "This book is currently out of stock"
        );
    }

    #[test]
    fn message_falls_back_to_kind() {
        let report = Report::new(KernelError::AlreadyReturned).attach_printable("internal note");
        assert_eq!(
            ErrorStatus::from(report).message(),
            "This borrowing has already been returned"
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        let report = Report::new(KernelError::Internal)
            .attach_printable(ErrorDetail::new("connection string leaked"));
        assert_eq!(
            ErrorStatus::from(report).message(),
            KernelError::Internal.to_string()
        );
    }
}
