use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use kernel::interface::query::BookQuery;
use kernel::interface::update::BookModifier;
use kernel::prelude::entity::{
    Book, BookAuthor, BookCover, BookId, BookInventory, BookTitle, DailyFee, SelectLimit,
    SelectOffset,
};
use kernel::KernelError;

use crate::database::postgres::PostgresConnection;
use crate::error::ConvertError;

pub struct PostgresBookRepository;

#[async_trait::async_trait]
impl BookQuery for PostgresBookRepository {
    type Transaction = PostgresConnection;
    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::find_by_id(con, id).await
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut PostgresConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        PgBookInternal::find_by_id_for_update(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresConnection,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        PgBookInternal::find_all(con, limit, offset).await
    }
}

#[async_trait::async_trait]
impl BookModifier for PostgresBookRepository {
    type Transaction = PostgresConnection;
    async fn create(
        &self,
        con: &mut PostgresConnection,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        PgBookInternal::create(con, book).await
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        PgBookInternal::update(con, book).await
    }

    async fn delete(
        &self,
        con: &mut PostgresConnection,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        PgBookInternal::delete(con, book_id).await
    }

    async fn check_out(
        &self,
        con: &mut PostgresConnection,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BookInventory>, KernelError> {
        PgBookInternal::check_out(con, book_id).await
    }

    async fn check_in(
        &self,
        con: &mut PostgresConnection,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BookInventory>, KernelError> {
        PgBookInternal::check_in(con, book_id).await
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    author: String,
    cover: String,
    inventory: i32,
    daily_fee: Decimal,
}

impl TryFrom<BookRow> for Book {
    type Error = error_stack::Report<KernelError>;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Book::new(
            BookId::new(row.id),
            BookTitle::new(row.title),
            BookAuthor::new(row.author),
            row.cover.parse::<BookCover>()?,
            BookInventory::new(row.inventory),
            DailyFee::new(row.daily_fee),
        ))
    }
}

pub(in crate::database) struct PgBookInternal;

impl PgBookInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let row = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, cover, inventory, daily_fee
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        row.map(Book::try_from).transpose()
    }

    async fn find_by_id_for_update(
        con: &mut PgConnection,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        let row = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, cover, inventory, daily_fee
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        row.map(Book::try_from).transpose()
    }

    async fn find_all(
        con: &mut PgConnection,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let rows = sqlx::query_as::<_, BookRow>(
            // language=postgresql
            r#"
            SELECT id, title, author, cover, inventory, daily_fee
            FROM books
            ORDER BY title
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit.as_ref())
        .bind(offset.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        rows.into_iter().map(Book::try_from).collect()
    }

    async fn create(con: &mut PgConnection, book: &Book) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO books (id, title, author, cover, inventory, daily_fee)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(book.id().as_ref())
        .bind(book.title().as_ref())
        .bind(book.author().as_ref())
        .bind(book.cover().as_str())
        .bind(book.inventory().as_ref())
        .bind(book.daily_fee().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(con: &mut PgConnection, book: &Book) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            UPDATE books
            SET title = $2, author = $3, cover = $4, inventory = $5, daily_fee = $6
            WHERE id = $1
            "#,
        )
        .bind(book.id().as_ref())
        .bind(book.title().as_ref())
        .bind(book.author().as_ref())
        .bind(book.cover().as_str())
        .bind(book.inventory().as_ref())
        .bind(book.daily_fee().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn delete(con: &mut PgConnection, book_id: &BookId) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            DELETE FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn check_out(
        con: &mut PgConnection,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BookInventory>, KernelError> {
        let remaining = sqlx::query_scalar::<_, i32>(
            // language=postgresql
            r#"
            UPDATE books
            SET inventory = inventory - 1
            WHERE id = $1 AND inventory > 0
            RETURNING inventory
            "#,
        )
        .bind(book_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(remaining.map(BookInventory::new))
    }

    async fn check_in(
        con: &mut PgConnection,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BookInventory>, KernelError> {
        let remaining = sqlx::query_scalar::<_, i32>(
            // language=postgresql
            r#"
            UPDATE books
            SET inventory = inventory + 1
            WHERE id = $1
            RETURNING inventory
            "#,
        )
        .bind(book_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(remaining.map(BookInventory::new))
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use tokio::time::sleep;
    use uuid::Uuid;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::BookQuery;
    use kernel::interface::update::BookModifier;
    use kernel::prelude::entity::{
        Book, BookAuthor, BookCover, BookId, BookInventory, BookTitle, DailyFee, SelectLimit,
        SelectOffset,
    };
    use kernel::KernelError;

    use crate::database::postgres::book::PostgresBookRepository;
    use crate::database::postgres::PostgresDatabase;

    fn book(inventory: i32) -> Book {
        let id = Uuid::new_v4();
        Book::new(
            BookId::new(id),
            BookTitle::new(format!("The Left Hand of Darkness {id}")),
            BookAuthor::new("Ursula K. Le Guin"),
            BookCover::Hard,
            BookInventory::new(inventory),
            DailyFee::new(Decimal::new(125, 2)),
        )
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn crud() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let mut con = db.transact().await?;
        let book = book(3);

        PostgresBookRepository.create(&mut con, &book).await?;
        let found = PostgresBookRepository
            .find_by_id(&mut con, book.id())
            .await?;
        assert_eq!(found, Some(book.clone()));

        let listed = PostgresBookRepository
            .find_all(&mut con, &SelectLimit::new(100), &SelectOffset::default())
            .await?;
        assert!(listed.contains(&book));

        let mut book = book;
        book.substitute(|book| *book.cover = BookCover::Soft);
        PostgresBookRepository.update(&mut con, &book).await?;
        let found = PostgresBookRepository
            .find_by_id(&mut con, book.id())
            .await?;
        assert_eq!(found, Some(book.clone()));

        PostgresBookRepository.delete(&mut con, book.id()).await?;
        let found = PostgresBookRepository
            .find_by_id(&mut con, book.id())
            .await?;
        assert!(found.is_none());

        con.roll_back().await
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn check_out_stops_at_zero() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let mut con = db.transact().await?;
        let book = book(1);
        PostgresBookRepository.create(&mut con, &book).await?;

        let remaining = PostgresBookRepository
            .check_out(&mut con, book.id())
            .await?;
        assert_eq!(remaining, Some(BookInventory::new(0)));
        let remaining = PostgresBookRepository
            .check_out(&mut con, book.id())
            .await?;
        assert_eq!(remaining, None);
        let remaining = PostgresBookRepository
            .check_in(&mut con, book.id())
            .await?;
        assert_eq!(remaining, Some(BookInventory::new(1)));

        con.roll_back().await
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn duplicate_title_is_a_validation_error() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let mut con = db.transact().await?;
        let first = book(1);
        PostgresBookRepository.create(&mut con, &first).await?;

        let mut second = book(1);
        second.substitute(|book| *book.title = first.title().clone());
        let report = PostgresBookRepository
            .create(&mut con, &second)
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::ValidationFailed);
        Ok(())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn edit_does_not_undo_concurrent_check_out() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let book = book(1);
        let mut setup = db.transact().await?;
        PostgresBookRepository.create(&mut setup, &book).await?;
        setup.commit().await?;

        let mut admin = db.transact().await?;
        let mut locked = PostgresBookRepository
            .find_by_id_for_update(&mut admin, book.id())
            .await?
            .unwrap();

        let mut member = db.transact().await?;
        let book_id = *book.id();
        let borrow = tokio::spawn(async move {
            let remaining = PostgresBookRepository
                .check_out(&mut member, &book_id)
                .await?;
            member.commit().await?;
            Ok::<_, error_stack::Report<KernelError>>(remaining)
        });
        sleep(Duration::from_millis(200)).await;
        assert!(!borrow.is_finished());

        let renamed = BookTitle::new(format!("{} (2nd edition)", book.title().as_ref()));
        locked.substitute(|book| *book.title = renamed);
        PostgresBookRepository.update(&mut admin, &locked).await?;
        admin.commit().await?;

        let remaining = borrow.await.unwrap()?;
        assert_eq!(remaining, Some(BookInventory::new(0)));

        let mut check = db.transact().await?;
        let stored = PostgresBookRepository
            .find_by_id(&mut check, book.id())
            .await?
            .unwrap();
        assert_eq!(stored.inventory(), &BookInventory::new(0));
        assert_eq!(stored.title(), locked.title());
        PostgresBookRepository.delete(&mut check, book.id()).await?;
        check.commit().await
    }
}
