use error_stack::Report;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{BookQuery, DependOnBookQuery};
use kernel::interface::update::{BookModifier, DependOnBookModifier};
use kernel::prelude::entity::{
    Book, BookAuthor, BookCover, BookId, BookInventory, BookTitle, DailyFee,
};
use kernel::prelude::policy::{authorize, Caller, Operation, Resource};
use kernel::{ErrorDetail, KernelError};

use crate::transfer::{CreateBookDto, DeleteBookDto, GetAllBookDto, GetBookDto, UpdateBookDto};

fn book_not_found(id: &BookId) -> Report<KernelError> {
    Report::new(KernelError::NotFound).attach_printable(ErrorDetail::new(format!(
        "Book {id} does not exist"
    )))
}

#[async_trait::async_trait]
pub trait GetBookService: 'static + Sync + Send + DependOnBookQuery {
    async fn get_book(
        &self,
        caller: &Caller,
        dto: GetBookDto,
    ) -> error_stack::Result<Book, KernelError> {
        authorize(caller, Operation::Read, Resource::Catalog)?;
        let mut connection = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        let book = self.book_query().find_by_id(&mut connection, &id).await?;
        book.ok_or_else(|| book_not_found(&id))
    }

    async fn get_books(
        &self,
        caller: &Caller,
        dto: GetAllBookDto,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        authorize(caller, Operation::Read, Resource::Catalog)?;
        let mut connection = self.database_connection().transact().await?;
        self.book_query()
            .find_all(&mut connection, &dto.limit, &dto.offset)
            .await
    }
}

impl<T> GetBookService for T where T: DependOnBookQuery {}

#[async_trait::async_trait]
pub trait CreateBookService: 'static + Sync + Send + DependOnBookModifier {
    #[tracing::instrument(skip(self))]
    async fn create_book(
        &self,
        caller: &Caller,
        dto: CreateBookDto,
    ) -> error_stack::Result<Book, KernelError> {
        authorize(caller, Operation::Create, Resource::Catalog)?;
        let book = Book::new(
            BookId::new(Uuid::new_v4()),
            BookTitle::parse(dto.title)?,
            BookAuthor::parse(dto.author)?,
            dto.cover.parse::<BookCover>()?,
            BookInventory::parse(dto.inventory)?,
            DailyFee::parse(dto.daily_fee)?,
        );

        let mut connection = self.database_connection().transact().await?;
        self.book_modifier().create(&mut connection, &book).await?;
        connection.commit().await?;

        tracing::info!("Created book {}", book.id());
        Ok(book)
    }
}

impl<T> CreateBookService for T where T: DependOnBookModifier {}

#[async_trait::async_trait]
pub trait UpdateBookService:
    'static + Sync + Send + DependOnBookQuery + DependOnBookModifier
{
    #[tracing::instrument(skip(self))]
    async fn update_book(
        &self,
        caller: &Caller,
        dto: UpdateBookDto,
    ) -> error_stack::Result<Book, KernelError> {
        authorize(caller, Operation::Update, Resource::Catalog)?;
        let title = dto.title.map(BookTitle::parse).transpose()?;
        let author = dto.author.map(BookAuthor::parse).transpose()?;
        let cover = dto
            .cover
            .as_deref()
            .map(str::parse::<BookCover>)
            .transpose()?;
        let inventory = dto.inventory.map(BookInventory::parse).transpose()?;
        let daily_fee = dto.daily_fee.map(DailyFee::parse).transpose()?;

        let mut connection = self.database_connection().transact().await?;
        let id = BookId::new(dto.id);
        let mut book = self
            .book_query()
            .find_by_id_for_update(&mut connection, &id)
            .await?
            .ok_or_else(|| book_not_found(&id))?;

        book.substitute(|book| {
            if let Some(title) = title {
                *book.title = title;
            }
            if let Some(author) = author {
                *book.author = author;
            }
            if let Some(cover) = cover {
                *book.cover = cover;
            }
            if let Some(inventory) = inventory {
                *book.inventory = inventory;
            }
            if let Some(daily_fee) = daily_fee {
                *book.daily_fee = daily_fee;
            }
        });
        self.book_modifier().update(&mut connection, &book).await?;
        connection.commit().await?;

        tracing::info!("Updated book {}", book.id());
        Ok(book)
    }
}

impl<T> UpdateBookService for T where T: DependOnBookQuery + DependOnBookModifier {}

#[async_trait::async_trait]
pub trait DeleteBookService:
    'static + Sync + Send + DependOnBookQuery + DependOnBookModifier
{
    #[tracing::instrument(skip(self))]
    async fn delete_book(
        &self,
        caller: &Caller,
        dto: DeleteBookDto,
    ) -> error_stack::Result<(), KernelError> {
        authorize(caller, Operation::Delete, Resource::Catalog)?;
        let mut connection = self.database_connection().transact().await?;

        let id = BookId::new(dto.id);
        if self
            .book_query()
            .find_by_id(&mut connection, &id)
            .await?
            .is_none()
        {
            return Err(book_not_found(&id));
        }
        self.book_modifier().delete(&mut connection, &id).await?;
        connection.commit().await?;

        tracing::info!("Deleted book {id}");
        Ok(())
    }
}

impl<T> DeleteBookService for T where T: DependOnBookQuery + DependOnBookModifier {}
