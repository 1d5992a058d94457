use kernel::prelude::entity::{SelectLimit, SelectOffset};
use serde::Deserialize;

use crate::controller::Intake;

#[derive(Debug, Deserialize)]
pub struct GetFailedNotificationRequest {
    #[serde(default)]
    limit: SelectLimit,
    #[serde(default)]
    offset: SelectOffset,
}

pub struct NotificationTransformer;

impl Intake<GetFailedNotificationRequest> for NotificationTransformer {
    type To = (SelectLimit, SelectOffset);
    fn emit(&self, input: GetFailedNotificationRequest) -> Self::To {
        (input.limit, input.offset)
    }
}
