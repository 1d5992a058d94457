use axum::extract::State;
use axum::routing::get;
use axum::Router;
use kernel::interface::notify::DependOnNotifier;
use kernel::prelude::policy::{authorize, Operation, Resource};

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extractor::{Principal, QueryParams};
use crate::handler::AppModule;
use crate::request::{GetFailedNotificationRequest, NotificationTransformer};
use crate::response::NotificationPresenter;

pub trait NotificationRouter {
    fn route_notification(self) -> Self;
}

impl NotificationRouter for Router<AppModule> {
    fn route_notification(self) -> Self {
        self.route(
            "/notifications/failed",
            get(
                |State(module): State<AppModule>,
                 Principal(caller): Principal,
                 QueryParams(req): QueryParams<GetFailedNotificationRequest>| async move {
                    authorize(&caller, Operation::Read, Resource::NotificationQueue)
                        .map_err(ErrorStatus::from)?;
                    Controller::new(NotificationTransformer, NotificationPresenter)
                        .intake(req)
                        .handle(|(limit, offset)| async move {
                            module.notifier().failed(&limit, &offset).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
