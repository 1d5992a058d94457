use std::collections::HashMap;

use error_stack::Report;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::notify::{DependOnNotifier, Notifier};
use kernel::interface::query::{
    BookQuery, BorrowingFilter, BorrowingQuery, DependOnBookQuery, DependOnBorrowingQuery,
};
use kernel::interface::update::{
    BookModifier, BorrowingModifier, DependOnBookModifier, DependOnBorrowingModifier,
};
use kernel::prelude::entity::{
    today, ActualReturnDate, Book, BookId, Borrowing, BorrowingId, ExpectedReturnDate, UserId,
};
use kernel::prelude::policy::{authorize, Caller, Operation, Resource};
use kernel::{ErrorDetail, KernelError};

use crate::transfer::{
    BorrowingDetailDto, CreateBorrowingDto, DeleteBorrowingDto, GetAllBorrowingDto,
    GetBorrowingDto, ReturnBorrowingDto, UpdateBorrowingDto,
};

fn borrowing_not_found(id: &BorrowingId) -> Report<KernelError> {
    Report::new(KernelError::NotFound).attach_printable(ErrorDetail::new(format!(
        "Borrowing {id} does not exist"
    )))
}

fn book_missing(borrowing: &Borrowing) -> Report<KernelError> {
    Report::new(KernelError::Internal).attach_printable(format!(
        "book {} of borrowing {} is missing",
        borrowing.book_id(),
        borrowing.id()
    ))
}

/// Members only ever see their own records; anything else looks missing.
fn visible_to(
    caller: &Caller,
    id: &BorrowingId,
    borrowing: Option<Borrowing>,
) -> error_stack::Result<Borrowing, KernelError> {
    match (borrowing, caller.scope()) {
        (Some(borrowing), Some(scope)) if borrowing.user_id() != scope => {
            Err(borrowing_not_found(id))
        }
        (Some(borrowing), _) => Ok(borrowing),
        (None, _) => Err(borrowing_not_found(id)),
    }
}

#[async_trait::async_trait]
pub trait GetBorrowingService:
    'static + Sync + Send + DependOnBorrowingQuery + DependOnBookQuery
{
    async fn get_borrowing(
        &self,
        caller: &Caller,
        dto: GetBorrowingDto,
    ) -> error_stack::Result<BorrowingDetailDto, KernelError> {
        authorize(caller, Operation::Read, Resource::Borrowing { owner: None })?;
        let mut connection = self.database_connection().transact().await?;

        let id = BorrowingId::new(dto.id);
        let borrowing = self
            .borrowing_query()
            .find_by_id(&mut connection, &id)
            .await?;
        let borrowing = visible_to(caller, &id, borrowing)?;
        let book = self
            .book_query()
            .find_by_id(&mut connection, borrowing.book_id())
            .await?
            .ok_or_else(|| book_missing(&borrowing))?;
        Ok(BorrowingDetailDto { borrowing, book })
    }

    async fn get_borrowings(
        &self,
        caller: &Caller,
        dto: GetAllBorrowingDto,
    ) -> error_stack::Result<Vec<BorrowingDetailDto>, KernelError> {
        authorize(caller, Operation::Read, Resource::Borrowing { owner: None })?;
        let user_id = match caller.scope() {
            Some(own) => Some(*own),
            None => dto.user_id.map(UserId::new),
        };
        let filter = BorrowingFilter {
            user_id,
            is_active: dto.is_active,
            limit: dto.limit,
            offset: dto.offset,
        };

        let mut connection = self.database_connection().transact().await?;
        let borrowings = self
            .borrowing_query()
            .find_all(&mut connection, &filter)
            .await?;

        let mut books: HashMap<BookId, Book> = HashMap::new();
        for borrowing in &borrowings {
            if books.contains_key(borrowing.book_id()) {
                continue;
            }
            let book = self
                .book_query()
                .find_by_id(&mut connection, borrowing.book_id())
                .await?
                .ok_or_else(|| book_missing(borrowing))?;
            books.insert(*borrowing.book_id(), book);
        }
        borrowings
            .into_iter()
            .map(|borrowing| match books.get(borrowing.book_id()) {
                Some(book) => Ok(BorrowingDetailDto {
                    book: book.clone(),
                    borrowing,
                }),
                None => Err(book_missing(&borrowing)),
            })
            .collect()
    }
}

impl<T> GetBorrowingService for T where T: DependOnBorrowingQuery + DependOnBookQuery {}

#[async_trait::async_trait]
pub trait CreateBorrowingService:
    'static
    + Sync
    + Send
    + DependOnBookQuery
    + DependOnBookModifier
    + DependOnBorrowingModifier
    + DependOnNotifier
{
    /// Lends one copy of a book to the caller.
    #[tracing::instrument(skip(self))]
    async fn create_borrowing(
        &self,
        caller: &Caller,
        dto: CreateBorrowingDto,
    ) -> error_stack::Result<Borrowing, KernelError> {
        authorize(caller, Operation::Create, Resource::Borrowing { owner: None })?;
        let user = caller
            .user()
            .ok_or_else(|| Report::new(KernelError::Unauthenticated))?;

        let borrowing = Borrowing::open(
            BorrowingId::new(Uuid::new_v4()),
            ExpectedReturnDate::new(dto.expected_return_date),
            BookId::new(dto.book_id),
            *user.id(),
            today(),
        )?;

        let mut connection = self.database_connection().transact().await?;
        let book_id = borrowing.book_id();
        let book = self
            .book_query()
            .find_by_id(&mut connection, book_id)
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::NotFound).attach_printable(ErrorDetail::new(format!(
                    "Book {book_id} does not exist"
                )))
            })?;

        let remaining = self
            .book_modifier()
            .check_out(&mut connection, book_id)
            .await?;
        let Some(remaining) = remaining else {
            connection.roll_back().await?;
            return Err(Report::new(KernelError::OutOfStock)
                .attach_printable(ErrorDetail::new("This book is currently out of stock")));
        };
        self.borrowing_modifier()
            .create(&mut connection, &borrowing)
            .await?;
        connection.commit().await?;

        tracing::info!(
            "Borrowing {} created, {} copies of book {} left",
            borrowing.id(),
            remaining.as_ref(),
            book_id
        );
        self.notifier()
            .notify(format!(
                "New borrowing: {} borrowed by {}, expected return date - {}",
                book.title(),
                user.email(),
                borrowing.expected_return_date()
            ))
            .await;

        Ok(borrowing)
    }
}

impl<T> CreateBorrowingService for T where
    T: DependOnBookQuery + DependOnBookModifier + DependOnBorrowingModifier + DependOnNotifier
{
}

#[async_trait::async_trait]
pub trait ReturnBorrowingService:
    'static + Sync + Send + DependOnBorrowingQuery + DependOnBorrowingModifier + DependOnBookModifier
{
    /// Closes an active borrowing and puts the copy back on the shelf.
    #[tracing::instrument(skip(self))]
    async fn return_borrowing(
        &self,
        caller: &Caller,
        dto: ReturnBorrowingDto,
    ) -> error_stack::Result<Borrowing, KernelError> {
        authorize(caller, Operation::Return, Resource::Borrowing { owner: None })?;
        let mut connection = self.database_connection().transact().await?;

        let id = BorrowingId::new(dto.id);
        let borrowing = self
            .borrowing_query()
            .find_by_id(&mut connection, &id)
            .await?;
        let borrowing = visible_to(caller, &id, borrowing)?;
        authorize(
            caller,
            Operation::Return,
            Resource::Borrowing {
                owner: Some(borrowing.user_id()),
            },
        )?;

        let returned = borrowing.close(dto.actual_return_date.map(ActualReturnDate::new), today())?;
        if !self
            .borrowing_modifier()
            .mark_returned(&mut connection, &returned)
            .await?
        {
            connection.roll_back().await?;
            return Err(Report::new(KernelError::AlreadyReturned)
                .attach_printable(format!("borrowing {id} was returned concurrently")));
        }
        self.book_modifier()
            .check_in(&mut connection, returned.book_id())
            .await?;
        connection.commit().await?;

        tracing::info!("Borrowing {id} returned");
        Ok(returned)
    }
}

impl<T> ReturnBorrowingService for T where
    T: DependOnBorrowingQuery + DependOnBorrowingModifier + DependOnBookModifier
{
}

#[async_trait::async_trait]
pub trait UpdateBorrowingService:
    'static + Sync + Send + DependOnBorrowingQuery + DependOnBorrowingModifier
{
    /// Admin correction of the expected return date.
    #[tracing::instrument(skip(self))]
    async fn update_borrowing(
        &self,
        caller: &Caller,
        dto: UpdateBorrowingDto,
    ) -> error_stack::Result<Borrowing, KernelError> {
        authorize(caller, Operation::Update, Resource::Borrowing { owner: None })?;
        let mut connection = self.database_connection().transact().await?;

        let id = BorrowingId::new(dto.id);
        let borrowing = self
            .borrowing_query()
            .find_by_id_for_update(&mut connection, &id)
            .await?
            .ok_or_else(|| borrowing_not_found(&id))?;
        let borrowing =
            borrowing.reschedule(ExpectedReturnDate::new(dto.expected_return_date), today())?;
        self.borrowing_modifier()
            .update(&mut connection, &borrowing)
            .await?;
        connection.commit().await?;

        Ok(borrowing)
    }
}

impl<T> UpdateBorrowingService for T where T: DependOnBorrowingQuery + DependOnBorrowingModifier {}

#[async_trait::async_trait]
pub trait DeleteBorrowingService:
    'static + Sync + Send + DependOnBorrowingModifier + DependOnBookModifier
{
    /// Removes a record; an active one gives its copy back.
    #[tracing::instrument(skip(self))]
    async fn delete_borrowing(
        &self,
        caller: &Caller,
        dto: DeleteBorrowingDto,
    ) -> error_stack::Result<(), KernelError> {
        authorize(caller, Operation::Delete, Resource::Borrowing { owner: None })?;
        let mut connection = self.database_connection().transact().await?;

        let id = BorrowingId::new(dto.id);
        let deleted = self
            .borrowing_modifier()
            .delete(&mut connection, &id)
            .await?
            .ok_or_else(|| borrowing_not_found(&id))?;
        if deleted.is_active() {
            self.book_modifier()
                .check_in(&mut connection, deleted.book_id())
                .await?;
        }
        connection.commit().await?;

        tracing::info!("Deleted borrowing {id}");
        Ok(())
    }
}

impl<T> DeleteBorrowingService for T where T: DependOnBorrowingModifier + DependOnBookModifier {}
