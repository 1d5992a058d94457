use driver::database::{
    PostgresBookRepository, PostgresBorrowingRepository, PostgresDatabase,
    PostgresUserRepository, RedisDatabase,
};
use driver::notification::TelegramClient;
use kernel::interface::database::DependOnDatabaseConnection;
use kernel::interface::notify::DependOnNotifier;
use kernel::interface::query::{DependOnBookQuery, DependOnBorrowingQuery, DependOnUserQuery};
use kernel::interface::update::{DependOnBookModifier, DependOnBorrowingModifier};
use kernel::KernelError;
use std::ops::Deref;
use std::sync::Arc;

use crate::mq::{init_notification_worker, QueueNotifier};

#[derive(Clone)]
pub struct AppModule(Arc<Handler>);

impl AppModule {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        Ok(Self(Arc::new(Handler::init().await?)))
    }
}

impl Deref for AppModule {
    type Target = Handler;
    fn deref(&self) -> &Self::Target {
        Deref::deref(&self.0)
    }
}

pub struct Handler {
    pgpool: PostgresDatabase,
    notifier: QueueNotifier,
}

impl Handler {
    pub async fn init() -> error_stack::Result<Self, KernelError> {
        let pgpool = PostgresDatabase::new().await?;
        pgpool.migrate().await?;

        let redis = RedisDatabase::new()?;
        let telegram = TelegramClient::new()?;
        let chat_id = telegram.chat_id().clone();
        let notifier = QueueNotifier::new(init_notification_worker(redis, telegram), chat_id);

        Ok(Self { pgpool, notifier })
    }
}

impl DependOnDatabaseConnection for Handler {
    type DatabaseConnection = PostgresDatabase;
    fn database_connection(&self) -> &Self::DatabaseConnection {
        &self.pgpool
    }
}

impl DependOnBookQuery for Handler {
    type BookQuery = PostgresBookRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &PostgresBookRepository
    }
}

impl DependOnBookModifier for Handler {
    type BookModifier = PostgresBookRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &PostgresBookRepository
    }
}

impl DependOnBorrowingQuery for Handler {
    type BorrowingQuery = PostgresBorrowingRepository;
    fn borrowing_query(&self) -> &Self::BorrowingQuery {
        &PostgresBorrowingRepository
    }
}

impl DependOnBorrowingModifier for Handler {
    type BorrowingModifier = PostgresBorrowingRepository;
    fn borrowing_modifier(&self) -> &Self::BorrowingModifier {
        &PostgresBorrowingRepository
    }
}

impl DependOnUserQuery for Handler {
    type UserQuery = PostgresUserRepository;
    fn user_query(&self) -> &Self::UserQuery {
        &PostgresUserRepository
    }
}

impl DependOnNotifier for Handler {
    type Notifier = QueueNotifier;
    fn notifier(&self) -> &Self::Notifier {
        &self.notifier
    }
}
