use destructure::Destructure;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use vodca::{AsRefln, Fromln, References};

/// Destination channel a notification is delivered to.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Fromln, AsRefln)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for ChatId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, References, Destructure)]
pub struct Notification {
    chat_id: ChatId,
    text: String,
}

impl Notification {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

/// Fire-and-forget delivery of plain text messages.
///
/// Implementations must never block the caller on delivery and never report
/// failures back; they log them instead.
#[async_trait::async_trait]
pub trait Notifier: 'static + Sync + Send {
    async fn notify(&self, text: String);
}

pub trait DependOnNotifier: 'static + Sync + Send {
    type Notifier: Notifier;
    fn notifier(&self) -> &Self::Notifier;
}
