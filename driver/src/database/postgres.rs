use std::ops::{Deref, DerefMut};

use error_stack::{Report, ResultExt};
use sqlx::{Error, PgConnection, Pool, Postgres};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::{ErrorDetail, KernelError};

use crate::env;
use crate::error::ConvertError;

pub use self::{book::*, borrowing::*, user::*};

mod book;
mod borrowing;
mod user;

static POSTGRES_URL: &str = "POSTGRES_URL";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let url = env(POSTGRES_URL)?;
        let pool = Pool::connect(&url).await.convert_error()?;
        Ok(Self { pool })
    }

    /// Applies every pending schema migration.
    pub async fn migrate(&self) -> error_stack::Result<(), KernelError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(Report::new)
            .change_context(KernelError::Internal)
            .attach_printable("Failed to run migrations")
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresConnection;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let con = self.pool.begin().await.convert_error()?;
        Ok(PostgresConnection(con))
    }
}

pub struct PostgresConnection(sqlx::Transaction<'static, Postgres>);

#[async_trait::async_trait]
impl Transaction for PostgresConnection {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl Deref for PostgresConnection {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostgresConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let (context, detail) = classify(&error);
            let report = Report::from(error).change_context(context);
            match detail {
                Some(detail) => report.attach_printable(detail),
                None => report,
            }
        })
    }
}

fn classify(error: &Error) -> (KernelError, Option<ErrorDetail>) {
    let db = match error {
        Error::PoolTimedOut => return (KernelError::Timeout, None),
        Error::Database(db) => db,
        _ => return (KernelError::Internal, None),
    };
    match db.code().as_deref() {
        Some(UNIQUE_VIOLATION) => {
            let field = db.constraint().map_or("value", constraint_field);
            let detail = ErrorDetail::new(format!("A record with the same {field} already exists"));
            (KernelError::ValidationFailed, Some(detail))
        }
        Some(FOREIGN_KEY_VIOLATION) | Some(CHECK_VIOLATION) => (KernelError::ValidationFailed, None),
        _ => (KernelError::Internal, None),
    }
}

/// `books_title_key` -> `title`
fn constraint_field(constraint: &str) -> &str {
    constraint
        .strip_suffix("_key")
        .and_then(|rest| rest.split_once('_'))
        .map_or(constraint, |(_, field)| field)
}
