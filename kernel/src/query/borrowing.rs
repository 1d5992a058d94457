use time::Date;

use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Borrowing, BorrowingId, SelectLimit, SelectOffset, UserId};
use crate::KernelError;

/// Filter for borrowing listings.
///
/// `user_id: None` means every user; callers are responsible for narrowing
/// it to themselves unless they are administrators.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BorrowingFilter {
    pub user_id: Option<UserId>,
    pub is_active: Option<bool>,
    pub limit: SelectLimit,
    pub offset: SelectOffset,
}

#[async_trait::async_trait]
pub trait BorrowingQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError>;

    /// Like `find_by_id`, but keeps the row locked until the transaction ends.
    async fn find_by_id_for_update(
        &self,
        con: &mut Self::Transaction,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError>;

    async fn find_all(
        &self,
        con: &mut Self::Transaction,
        filter: &BorrowingFilter,
    ) -> error_stack::Result<Vec<Borrowing>, KernelError>;

    /// Active borrowings expected back on or before `due`.
    async fn find_due_by(
        &self,
        con: &mut Self::Transaction,
        due: &Date,
    ) -> error_stack::Result<Vec<Borrowing>, KernelError>;
}

pub trait DependOnBorrowingQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type BorrowingQuery: BorrowingQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn borrowing_query(&self) -> &Self::BorrowingQuery;
}
