use application::service::{
    CreateBorrowingService, DeleteBorrowingService, GetBorrowingService, ReturnBorrowingService,
    ScanOverdueService, UpdateBorrowingService,
};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extractor::{JsonBody, OptionalJsonBody, Principal, QueryParams};
use crate::handler::AppModule;
use crate::request::{
    BorrowingTransformer, CreateBorrowingRequest, DeleteBorrowingRequest, GetAllBorrowingRequest,
    GetBorrowingRequest, ReturnBorrowingRequest, UpdateBorrowingRequest,
};
use crate::response::{BorrowingPresenter, Created, OverduePresenter, ReturnPresenter};

pub trait BorrowingRouter {
    fn route_borrowing(self) -> Self;
}

impl BorrowingRouter for Router<AppModule> {
    fn route_borrowing(self) -> Self {
        self.route(
            "/borrowings",
            get(
                |State(module): State<AppModule>,
                 Principal(caller): Principal,
                 QueryParams(req): QueryParams<GetAllBorrowingRequest>| async move {
                    Controller::new(BorrowingTransformer, BorrowingPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.get_borrowings(&caller, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule>,
                 Principal(caller): Principal,
                 JsonBody(req): JsonBody<CreateBorrowingRequest>| async move {
                    Controller::new(BorrowingTransformer, Created(BorrowingPresenter))
                        .intake(req)
                        .handle(|dto| async move { module.create_borrowing(&caller, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/borrowings/overdue/scan",
            post(
                |State(module): State<AppModule>, Principal(caller): Principal| async move {
                    Controller::new((), OverduePresenter)
                        .bypass(|| async move { module.scan_overdue_for(&caller).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/borrowings/:id",
            get(
                |State(module): State<AppModule>,
                 Principal(caller): Principal,
                 Path(id): Path<Uuid>| async move {
                    Controller::new(BorrowingTransformer, BorrowingPresenter)
                        .intake(GetBorrowingRequest::new(id))
                        .handle(|dto| async move { module.get_borrowing(&caller, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .patch(
                |State(module): State<AppModule>,
                 Principal(caller): Principal,
                 Path(id): Path<Uuid>,
                 JsonBody(req): JsonBody<UpdateBorrowingRequest>| async move {
                    Controller::new(BorrowingTransformer, BorrowingPresenter)
                        .intake((id, req))
                        .handle(|dto| async move { module.update_borrowing(&caller, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .delete(
                |State(module): State<AppModule>,
                 Principal(caller): Principal,
                 Path(id): Path<Uuid>| async move {
                    Controller::new(BorrowingTransformer, BorrowingPresenter)
                        .intake(DeleteBorrowingRequest::new(id))
                        .handle(|dto| async move { module.delete_borrowing(&caller, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/borrowings/:id/return",
            post(
                |State(module): State<AppModule>,
                 Principal(caller): Principal,
                 Path(id): Path<Uuid>,
                 OptionalJsonBody(req): OptionalJsonBody<ReturnBorrowingRequest>| async move {
                    Controller::new(BorrowingTransformer, ReturnPresenter)
                        .intake((id, req))
                        .handle(|dto| async move { module.return_borrowing(&caller, dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
