use sqlx::{PgConnection, Postgres, QueryBuilder};
use time::Date;
use uuid::Uuid;

use kernel::interface::query::{BorrowingFilter, BorrowingQuery};
use kernel::interface::update::BorrowingModifier;
use kernel::prelude::entity::{
    ActualReturnDate, BookId, BorrowDate, Borrowing, BorrowingId, ExpectedReturnDate, UserId,
};
use kernel::KernelError;

use crate::database::postgres::PostgresConnection;
use crate::error::ConvertError;

pub struct PostgresBorrowingRepository;

#[async_trait::async_trait]
impl BorrowingQuery for PostgresBorrowingRepository {
    type Transaction = PostgresConnection;
    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        PgBorrowingInternal::find_by_id(con, id).await
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut PostgresConnection,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        PgBorrowingInternal::find_by_id_for_update(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresConnection,
        filter: &BorrowingFilter,
    ) -> error_stack::Result<Vec<Borrowing>, KernelError> {
        PgBorrowingInternal::find_all(con, filter).await
    }

    async fn find_due_by(
        &self,
        con: &mut PostgresConnection,
        due: &Date,
    ) -> error_stack::Result<Vec<Borrowing>, KernelError> {
        PgBorrowingInternal::find_due_by(con, due).await
    }
}

#[async_trait::async_trait]
impl BorrowingModifier for PostgresBorrowingRepository {
    type Transaction = PostgresConnection;
    async fn create(
        &self,
        con: &mut PostgresConnection,
        borrowing: &Borrowing,
    ) -> error_stack::Result<(), KernelError> {
        PgBorrowingInternal::create(con, borrowing).await
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        borrowing: &Borrowing,
    ) -> error_stack::Result<(), KernelError> {
        PgBorrowingInternal::update(con, borrowing).await
    }

    async fn mark_returned(
        &self,
        con: &mut PostgresConnection,
        borrowing: &Borrowing,
    ) -> error_stack::Result<bool, KernelError> {
        PgBorrowingInternal::mark_returned(con, borrowing).await
    }

    async fn delete(
        &self,
        con: &mut PostgresConnection,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        PgBorrowingInternal::delete(con, id).await
    }
}

#[derive(sqlx::FromRow)]
struct BorrowingRow {
    id: Uuid,
    borrow_date: Date,
    expected_return_date: Date,
    actual_return_date: Option<Date>,
    book_id: Uuid,
    user_id: Uuid,
}

impl From<BorrowingRow> for Borrowing {
    fn from(row: BorrowingRow) -> Self {
        Borrowing::new(
            BorrowingId::new(row.id),
            BorrowDate::new(row.borrow_date),
            ExpectedReturnDate::new(row.expected_return_date),
            row.actual_return_date.map(ActualReturnDate::new),
            BookId::new(row.book_id),
            UserId::new(row.user_id),
        )
    }
}

pub(in crate::database) struct PgBorrowingInternal;

impl PgBorrowingInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        let row = sqlx::query_as::<_, BorrowingRow>(
            // language=postgresql
            r#"
            SELECT id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            FROM borrowings
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Borrowing::from))
    }

    async fn find_by_id_for_update(
        con: &mut PgConnection,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        let row = sqlx::query_as::<_, BorrowingRow>(
            // language=postgresql
            r#"
            SELECT id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            FROM borrowings
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Borrowing::from))
    }

    async fn find_all(
        con: &mut PgConnection,
        filter: &BorrowingFilter,
    ) -> error_stack::Result<Vec<Borrowing>, KernelError> {
        let mut query = QueryBuilder::<Postgres>::new(
            // language=postgresql
            r#"
            SELECT id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            FROM borrowings
            WHERE TRUE
            "#,
        );
        if let Some(user_id) = &filter.user_id {
            query.push(" AND user_id = ").push_bind(*user_id.as_ref());
        }
        match filter.is_active {
            Some(true) => {
                query.push(" AND actual_return_date IS NULL");
            }
            Some(false) => {
                query.push(" AND actual_return_date IS NOT NULL");
            }
            None => {}
        }
        query
            .push(" ORDER BY borrow_date DESC, id LIMIT ")
            .push_bind(*filter.limit.as_ref())
            .push(" OFFSET ")
            .push_bind(*filter.offset.as_ref());

        let rows = query
            .build_query_as::<BorrowingRow>()
            .fetch_all(con)
            .await
            .convert_error()?;
        Ok(rows.into_iter().map(Borrowing::from).collect())
    }

    async fn find_due_by(
        con: &mut PgConnection,
        due: &Date,
    ) -> error_stack::Result<Vec<Borrowing>, KernelError> {
        let rows = sqlx::query_as::<_, BorrowingRow>(
            // language=postgresql
            r#"
            SELECT id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            FROM borrowings
            WHERE actual_return_date IS NULL AND expected_return_date <= $1
            ORDER BY expected_return_date
            "#,
        )
        .bind(due)
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Borrowing::from).collect())
    }

    async fn create(
        con: &mut PgConnection,
        borrowing: &Borrowing,
    ) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO borrowings (id, borrow_date, expected_return_date, actual_return_date, book_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(borrowing.id().as_ref())
        .bind(borrowing.borrow_date().as_ref())
        .bind(borrowing.expected_return_date().as_ref())
        .bind(borrowing.actual_return_date().map(|date| *date.as_ref()))
        .bind(borrowing.book_id().as_ref())
        .bind(borrowing.user_id().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(
        con: &mut PgConnection,
        borrowing: &Borrowing,
    ) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            UPDATE borrowings
            SET expected_return_date = $2
            WHERE id = $1
            "#,
        )
        .bind(borrowing.id().as_ref())
        .bind(borrowing.expected_return_date().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn mark_returned(
        con: &mut PgConnection,
        borrowing: &Borrowing,
    ) -> error_stack::Result<bool, KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            UPDATE borrowings
            SET actual_return_date = $2
            WHERE id = $1 AND actual_return_date IS NULL
            "#,
        )
        .bind(borrowing.id().as_ref())
        .bind(borrowing.actual_return_date().map(|date| *date.as_ref()))
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(
        con: &mut PgConnection,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        let row = sqlx::query_as::<_, BorrowingRow>(
            // language=postgresql
            r#"
            DELETE FROM borrowings
            WHERE id = $1
            RETURNING id, borrow_date, expected_return_date, actual_return_date, book_id, user_id
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Borrowing::from))
    }
}
