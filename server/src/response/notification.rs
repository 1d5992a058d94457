use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::interface::mq::ErroredInfo;
use kernel::interface::notify::{ChatId, Notification};
use serde::Serialize;
use uuid::Uuid;

use crate::controller::Exhaust;
use crate::mq::FailedNotifications;

#[derive(Debug, Serialize)]
pub struct FailedNotificationResponse {
    id: Uuid,
    chat_id: ChatId,
    text: String,
    stack_trace: String,
}

impl From<ErroredInfo<Notification>> for FailedNotificationResponse {
    fn from(info: ErroredInfo<Notification>) -> Self {
        Self {
            id: *info.id(),
            chat_id: info.data().chat_id().clone(),
            text: info.data().text().clone(),
            stack_trace: info.stack_trace().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailedNotificationsResponse {
    total: usize,
    items: Vec<FailedNotificationResponse>,
}

impl IntoResponse for FailedNotificationsResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

pub struct NotificationPresenter;

impl Exhaust<FailedNotifications> for NotificationPresenter {
    type To = FailedNotificationsResponse;
    fn emit(&self, input: FailedNotifications) -> Self::To {
        FailedNotificationsResponse {
            total: input.total,
            items: input
                .infos
                .into_iter()
                .map(FailedNotificationResponse::from)
                .collect(),
        }
    }
}
