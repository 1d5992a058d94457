use crate::error::StackTrace;
use crate::handler::AppModule;
use crate::route::{BookRouter, BorrowingRouter, NotificationRouter};
use application::service::ScanOverdueService;
use error_stack::{Report, ResultExt};
use kernel::interface::notify::DependOnNotifier;
use kernel::KernelError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

mod controller;
mod error;
mod extractor;
mod handler;
mod mq;
mod request;
mod response;
mod route;

const SERVER_PORT: &str = "SERVER_PORT";
const DEFAULT_PORT: u16 = 8080;
const SCAN_OVERDUE: &str = "scan-overdue";
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), StackTrace> {
    let appender = tracing_appender::rolling::daily(std::path::Path::new("./logs/"), "debug.log");
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_filter(tracing_subscriber::EnvFilter::new(
                    dotenvy::var("RUST_LOG").unwrap_or_else(|_| {
                        "driver=debug,server=debug,application=debug,tower_http=debug,sqlx=info"
                            .into()
                    }),
                ))
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
        )
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
        )
        .init();

    let app = AppModule::new().await?;

    if std::env::args().nth(1).as_deref() == Some(SCAN_OVERDUE) {
        scan_overdue(&app).await?;
        return Ok(());
    }

    app.notifier().start_workers();

    let router = axum::Router::new()
        .route_book()
        .route_borrowing()
        .route_notification()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new())
        .with_state(app);

    let bind = SocketAddr::from(([0, 0, 0, 0], port()?));
    let tcp = TcpListener::bind(bind)
        .await
        .change_context_lazy(|| KernelError::Internal)
        .attach_printable_lazy(|| "Failed to listen tcp")?;
    tracing::info!("Listening on {bind}");

    axum::serve(tcp, router.into_make_service())
        .await
        .change_context_lazy(|| KernelError::Internal)?;

    Ok(())
}

fn port() -> error_stack::Result<u16, KernelError> {
    match dotenvy::var(SERVER_PORT) {
        Ok(port) => port
            .parse::<u16>()
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable_lazy(|| format!("{SERVER_PORT} is not a valid port: {port}")),
        Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(DEFAULT_PORT),
        Err(error) => Err(Report::new(error)
            .change_context(KernelError::Internal)
            .attach_printable(format!("Failed to read {SERVER_PORT}"))),
    }
}

/// One-shot run for an external scheduler. Messages are delivered by this
/// process before it exits.
async fn scan_overdue(app: &AppModule) -> error_stack::Result<(), KernelError> {
    let count = app.scan_overdue().await?;
    app.notifier().start_workers();
    let remaining = app.notifier().drain(DRAIN_TIMEOUT).await?;
    if remaining > 0 {
        tracing::warn!("{remaining} notifications are still queued");
    }
    tracing::info!("Overdue scan finished, {count} borrowings reported");
    Ok(())
}
