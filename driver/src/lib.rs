use error_stack::{Report, ResultExt};
use kernel::KernelError;

pub mod database;
pub mod error;
pub mod notification;

pub(crate) fn env(key: &str) -> error_stack::Result<String, KernelError> {
    dotenvy::var(key)
        .map_err(Report::new)
        .change_context(KernelError::Internal)
        .attach_printable_lazy(|| format!("Failed to read environment variable {key}"))
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    dotenvy::var(key).unwrap_or_else(|_| default.to_string())
}
