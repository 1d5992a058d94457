use std::time::Duration;

use error_stack::Report;
use reqwest::StatusCode;
use serde::Serialize;

use kernel::interface::notify::{ChatId, Notification};
use kernel::KernelError;

use crate::error::ConvertError;
use crate::{env, env_or};

const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
const TELEGRAM_API_URL: &str = "TELEGRAM_API_URL";
const DEFAULT_API_URL: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
}

/// Bot API client posting plain text into a single chat.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    endpoint: String,
    chat_id: ChatId,
}

impl TelegramClient {
    pub fn new() -> error_stack::Result<Self, KernelError> {
        let token = env(TELEGRAM_BOT_TOKEN)?;
        let chat_id = ChatId::new(env(TELEGRAM_CHAT_ID)?);
        let api_url = env_or(TELEGRAM_API_URL, DEFAULT_API_URL);
        Self::with_endpoint(&api_url, &token, chat_id)
    }

    pub fn with_endpoint(
        api_url: &str,
        token: &str,
        chat_id: ChatId,
    ) -> error_stack::Result<Self, KernelError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .convert_error()?;
        Ok(Self {
            http,
            endpoint: send_message_url(api_url, token),
            chat_id,
        })
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// Delivers one message.
    ///
    /// Fails with `Timeout` when another attempt may succeed and `Internal`
    /// otherwise.
    pub async fn send(&self, notification: &Notification) -> error_stack::Result<(), KernelError> {
        let body = SendMessage {
            chat_id: notification.chat_id(),
            text: notification.text(),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                let context = classify_error(&error);
                Report::new(error).change_context(context)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        Err(Report::new(classify_status(status))
            .attach_printable(format!("Telegram responded {status}: {detail}")))
    }
}

fn send_message_url(api_url: &str, token: &str) -> String {
    format!("{}/bot{token}/sendMessage", api_url.trim_end_matches('/'))
}

/// Only timeouts and refused connections are transient; a request that could
/// not be built fails the same way every time.
fn classify_error(error: &reqwest::Error) -> KernelError {
    if error.is_timeout() || error.is_connect() {
        KernelError::Timeout
    } else {
        KernelError::Internal
    }
}

fn classify_status(status: StatusCode) -> KernelError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        KernelError::Timeout
    } else {
        KernelError::Internal
    }
}
