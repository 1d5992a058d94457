use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Borrowing, BorrowingId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BorrowingModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn create(
        &self,
        con: &mut Self::Transaction,
        borrowing: &Borrowing,
    ) -> error_stack::Result<(), KernelError>;

    /// Writes the expected return date only. The return date is owned by
    /// `mark_returned`.
    async fn update(
        &self,
        con: &mut Self::Transaction,
        borrowing: &Borrowing,
    ) -> error_stack::Result<(), KernelError>;

    /// Stores the actual return date only if none is stored yet.
    ///
    /// Returns `false` when the row was already returned (or is missing).
    async fn mark_returned(
        &self,
        con: &mut Self::Transaction,
        borrowing: &Borrowing,
    ) -> error_stack::Result<bool, KernelError>;

    /// Returns the row as it was when removed, `None` when it was missing.
    async fn delete(
        &self,
        con: &mut Self::Transaction,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError>;
}

pub trait DependOnBorrowingModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type BorrowingModifier: BorrowingModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn borrowing_modifier(&self) -> &Self::BorrowingModifier;
}
