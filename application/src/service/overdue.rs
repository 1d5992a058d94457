use error_stack::Report;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection};
use kernel::interface::notify::{DependOnNotifier, Notifier};
use kernel::interface::query::{
    BookQuery, BorrowingQuery, DependOnBookQuery, DependOnBorrowingQuery, DependOnUserQuery,
    UserQuery,
};
use kernel::prelude::entity::tomorrow;
use kernel::prelude::policy::{authorize, Caller, Operation, Resource};
use kernel::KernelError;

pub const NOTHING_OVERDUE: &str = "No borrowings overdue today!";

#[async_trait::async_trait]
pub trait ScanOverdueService:
    'static + Sync + Send + DependOnBorrowingQuery + DependOnBookQuery + DependOnUserQuery + DependOnNotifier
{
    /// Sends one message per active borrowing due by tomorrow.
    ///
    /// Returns how many borrowings were reported.
    #[tracing::instrument(skip(self))]
    async fn scan_overdue(&self) -> error_stack::Result<usize, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let due = self
            .borrowing_query()
            .find_due_by(&mut connection, &tomorrow())
            .await?;

        if due.is_empty() {
            self.notifier().notify(NOTHING_OVERDUE.to_string()).await;
            return Ok(0);
        }

        let mut messages = Vec::with_capacity(due.len());
        for borrowing in &due {
            let book = self
                .book_query()
                .find_by_id(&mut connection, borrowing.book_id())
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::Internal)
                        .attach_printable(format!("book of borrowing {} vanished", borrowing.id()))
                })?;
            let user = self
                .user_query()
                .find_by_id(&mut connection, borrowing.user_id())
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::Internal)
                        .attach_printable(format!("user of borrowing {} vanished", borrowing.id()))
                })?;
            messages.push(format!(
                "Borrowing of {} is overdue by user {}. Expected return date - {}",
                book.title(),
                user.email(),
                borrowing.expected_return_date()
            ));
        }

        for message in messages {
            self.notifier().notify(message).await;
        }
        tracing::info!("Reported {} overdue borrowings", due.len());
        Ok(due.len())
    }

    /// `scan_overdue` on behalf of an HTTP caller. Administrators only.
    async fn scan_overdue_for(&self, caller: &Caller) -> error_stack::Result<usize, KernelError> {
        authorize(caller, Operation::Create, Resource::OverdueScan)?;
        self.scan_overdue().await
    }
}

impl<T> ScanOverdueService for T where
    T: DependOnBorrowingQuery + DependOnBookQuery + DependOnUserQuery + DependOnNotifier
{
}
