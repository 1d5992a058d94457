use application::service::AuthenticateService;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::{Json, RequestPartsExt};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use error_stack::Report;
use kernel::prelude::entity::AccessToken;
use kernel::prelude::policy::Caller;
use kernel::{ErrorDetail, KernelError};
use serde::de::DeserializeOwned;

use crate::error::ErrorStatus;
use crate::handler::AppModule;

/// Principal of the current request. A missing `Authorization` header makes
/// an anonymous caller; a malformed or unknown token is rejected.
pub struct Principal(pub Caller);

#[async_trait]
impl FromRequestParts<AppModule> for Principal {
    type Rejection = ErrorStatus;

    async fn from_request_parts(
        parts: &mut Parts,
        module: &AppModule,
    ) -> Result<Self, Self::Rejection> {
        let token = if parts.headers.contains_key(AUTHORIZATION) {
            let TypedHeader(Authorization(bearer)) = parts
                .extract::<TypedHeader<Authorization<Bearer>>>()
                .await
                .map_err(|_| {
                    Report::new(KernelError::Unauthenticated)
                        .attach_printable(ErrorDetail::new("Malformed authorization header."))
                })?;
            Some(AccessToken::new(bearer.token()))
        } else {
            None
        };
        let caller = module.authenticate(token).await?;
        Ok(Self(caller))
    }
}

/// `Json` whose rejections use the common error body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ErrorStatus;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_input(rejection.body_text()).into()),
        }
    }
}

/// `Query` whose rejections use the common error body.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ErrorStatus;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection: QueryRejection| invalid_input(rejection.body_text()).into())
    }
}

/// Like `JsonBody`, but an empty body yields `T::default()`.
pub struct OptionalJsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ErrorStatus;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| invalid_input(rejection.body_text()))?;
        if body.is_empty() {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&body).map(Self).map_err(|error| {
            invalid_input(format!("Failed to parse the request body: {error}")).into()
        })
    }
}

fn invalid_input(text: String) -> Report<KernelError> {
    Report::new(KernelError::ValidationFailed).attach_printable(ErrorDetail::new(text))
}
