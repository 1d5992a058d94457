//! In-memory stand-ins for the persistence and notification seams.

use std::sync::{Arc, Mutex};

use time::Date;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::notify::{DependOnNotifier, Notifier};
use kernel::interface::query::{
    BookQuery, BorrowingFilter, BorrowingQuery, DependOnBookQuery, DependOnBorrowingQuery,
    DependOnUserQuery, UserQuery,
};
use kernel::interface::update::{
    BookModifier, BorrowingModifier, DependOnBookModifier, DependOnBorrowingModifier,
};
use kernel::prelude::entity::{
    AccessToken, Book, BookId, BookInventory, Borrowing, BorrowingId, SelectLimit, SelectOffset,
    User, UserId,
};
use kernel::KernelError;

#[derive(Debug, Clone, Default)]
pub struct State {
    pub books: Vec<Book>,
    pub borrowings: Vec<Borrowing>,
    pub users: Vec<(AccessToken, User)>,
}

#[derive(Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<State>>,
}

/// Works on a private copy, published on commit.
pub struct MockTransaction {
    shared: Arc<Mutex<State>>,
    staged: State,
}

#[async_trait::async_trait]
impl DatabaseConnection for MockDatabase {
    type Transaction = MockTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let staged = self.state.lock().expect("poisoned").clone();
        Ok(MockTransaction {
            shared: Arc::clone(&self.state),
            staged,
        })
    }
}

#[async_trait::async_trait]
impl Transaction for MockTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        *self.shared.lock().expect("poisoned") = self.staged;
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

pub struct MockRepository;

fn paginate<T>(items: Vec<T>, limit: &SelectLimit, offset: &SelectOffset) -> Vec<T> {
    items
        .into_iter()
        .skip(*offset.as_ref() as usize)
        .take(*limit.as_ref() as usize)
        .collect()
}

/// Same contract as the SQL: check out only while stock is left.
fn shift_inventory(
    con: &mut MockTransaction,
    book_id: &BookId,
    delta: i32,
) -> Option<BookInventory> {
    let book = con.staged.books.iter_mut().find(|book| book.id() == book_id)?;
    let next = book.inventory().as_ref() + delta;
    if next < 0 {
        return None;
    }
    let next = BookInventory::new(next);
    book.substitute(|book| *book.inventory = next);
    Some(next)
}

#[async_trait::async_trait]
impl BookQuery for MockRepository {
    type Transaction = MockTransaction;
    async fn find_by_id(
        &self,
        con: &mut MockTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        Ok(con.staged.books.iter().find(|book| book.id() == id).cloned())
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut MockTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        BookQuery::find_by_id(self, con, id).await
    }

    async fn find_all(
        &self,
        con: &mut MockTransaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        let mut books = con.staged.books.clone();
        books.sort_by(|a, b| a.title().as_ref().cmp(b.title().as_ref()));
        Ok(paginate(books, limit, offset))
    }
}

#[async_trait::async_trait]
impl BookModifier for MockRepository {
    type Transaction = MockTransaction;
    async fn create(
        &self,
        con: &mut MockTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        con.staged.books.push(book.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut MockTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        if let Some(stored) = con.staged.books.iter_mut().find(|b| b.id() == book.id()) {
            *stored = book.clone();
        }
        Ok(())
    }

    async fn delete(
        &self,
        con: &mut MockTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        con.staged.books.retain(|book| book.id() != book_id);
        con.staged
            .borrowings
            .retain(|borrowing| borrowing.book_id() != book_id);
        Ok(())
    }

    async fn check_out(
        &self,
        con: &mut MockTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BookInventory>, KernelError> {
        Ok(shift_inventory(con, book_id, -1))
    }

    async fn check_in(
        &self,
        con: &mut MockTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BookInventory>, KernelError> {
        Ok(shift_inventory(con, book_id, 1))
    }
}

#[async_trait::async_trait]
impl BorrowingQuery for MockRepository {
    type Transaction = MockTransaction;
    async fn find_by_id(
        &self,
        con: &mut MockTransaction,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        Ok(con.staged.borrowings.iter().find(|b| b.id() == id).cloned())
    }

    async fn find_by_id_for_update(
        &self,
        con: &mut MockTransaction,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        BorrowingQuery::find_by_id(self, con, id).await
    }

    async fn find_all(
        &self,
        con: &mut MockTransaction,
        filter: &BorrowingFilter,
    ) -> error_stack::Result<Vec<Borrowing>, KernelError> {
        let borrowings = con
            .staged
            .borrowings
            .iter()
            .filter(|b| filter.user_id.map_or(true, |user_id| b.user_id() == &user_id))
            .filter(|b| filter.is_active.map_or(true, |active| b.is_active() == active))
            .cloned()
            .collect();
        Ok(paginate(borrowings, &filter.limit, &filter.offset))
    }

    async fn find_due_by(
        &self,
        con: &mut MockTransaction,
        due: &Date,
    ) -> error_stack::Result<Vec<Borrowing>, KernelError> {
        Ok(con
            .staged
            .borrowings
            .iter()
            .filter(|b| b.is_active() && b.expected_return_date().as_ref() <= due)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl BorrowingModifier for MockRepository {
    type Transaction = MockTransaction;
    async fn create(
        &self,
        con: &mut MockTransaction,
        borrowing: &Borrowing,
    ) -> error_stack::Result<(), KernelError> {
        con.staged.borrowings.push(borrowing.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut MockTransaction,
        borrowing: &Borrowing,
    ) -> error_stack::Result<(), KernelError> {
        if let Some(stored) = con
            .staged
            .borrowings
            .iter_mut()
            .find(|b| b.id() == borrowing.id())
        {
            let expected = *borrowing.expected_return_date();
            stored.substitute(|stored| *stored.expected_return_date = expected);
        }
        Ok(())
    }

    async fn mark_returned(
        &self,
        con: &mut MockTransaction,
        borrowing: &Borrowing,
    ) -> error_stack::Result<bool, KernelError> {
        match con
            .staged
            .borrowings
            .iter_mut()
            .find(|b| b.id() == borrowing.id() && b.is_active())
        {
            Some(stored) => {
                *stored = borrowing.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(
        &self,
        con: &mut MockTransaction,
        id: &BorrowingId,
    ) -> error_stack::Result<Option<Borrowing>, KernelError> {
        let index = con.staged.borrowings.iter().position(|b| b.id() == id);
        Ok(index.map(|index| con.staged.borrowings.remove(index)))
    }
}

#[async_trait::async_trait]
impl UserQuery for MockRepository {
    type Transaction = MockTransaction;
    async fn find_by_id(
        &self,
        con: &mut MockTransaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        Ok(con
            .staged
            .users
            .iter()
            .map(|(_, user)| user)
            .find(|user| user.id() == id)
            .cloned())
    }

    async fn find_by_token(
        &self,
        con: &mut MockTransaction,
        token: &AccessToken,
    ) -> error_stack::Result<Option<User>, KernelError> {
        Ok(con
            .staged
            .users
            .iter()
            .find(|(stored, _)| stored == token)
            .map(|(_, user)| user.clone()))
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("poisoned").clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: String) {
        self.sent.lock().expect("poisoned").push(text);
    }
}

#[derive(Clone, Default)]
pub struct TestModule {
    pub database: MockDatabase,
    pub notifier: RecordingNotifier,
}

impl TestModule {
    pub fn seed(&self, seed: impl FnOnce(&mut State)) {
        seed(&mut self.database.state.lock().expect("poisoned"));
    }

    pub fn state(&self) -> State {
        self.database.state.lock().expect("poisoned").clone()
    }
}

impl DependOnDatabaseConnection for TestModule {
    type DatabaseConnection = MockDatabase;
    fn database_connection(&self) -> &Self::DatabaseConnection {
        &self.database
    }
}

impl DependOnBookQuery for TestModule {
    type BookQuery = MockRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &MockRepository
    }
}

impl DependOnBookModifier for TestModule {
    type BookModifier = MockRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &MockRepository
    }
}

impl DependOnBorrowingQuery for TestModule {
    type BorrowingQuery = MockRepository;
    fn borrowing_query(&self) -> &Self::BorrowingQuery {
        &MockRepository
    }
}

impl DependOnBorrowingModifier for TestModule {
    type BorrowingModifier = MockRepository;
    fn borrowing_modifier(&self) -> &Self::BorrowingModifier {
        &MockRepository
    }
}

impl DependOnUserQuery for TestModule {
    type UserQuery = MockRepository;
    fn user_query(&self) -> &Self::UserQuery {
        &MockRepository
    }
}

impl DependOnNotifier for TestModule {
    type Notifier = RecordingNotifier;
    fn notifier(&self) -> &Self::Notifier {
        &self.notifier
    }
}

#[cfg(test)]
mod test {
    use rust_decimal::Decimal;
    use time::Duration;
    use uuid::Uuid;

    use kernel::prelude::entity::{
        today, AccessToken, Book, BookAuthor, BookCover, BookId, BookInventory, BookTitle,
        BorrowDate, Borrowing, BorrowingId, DailyFee, ExpectedReturnDate, User, UserEmail, UserId,
        UserRole,
    };
    use kernel::prelude::policy::Caller;
    use kernel::KernelError;

    use super::TestModule;
    use crate::service::{
        AuthenticateService, CreateBookService, CreateBorrowingService, DeleteBorrowingService,
        GetBookService, GetBorrowingService, ReturnBorrowingService, ScanOverdueService,
        UpdateBorrowingService, NOTHING_OVERDUE,
    };
    use crate::transfer::{
        BorrowingDetailDto, CreateBookDto, CreateBorrowingDto, DeleteBorrowingDto, GetAllBookDto,
        GetAllBorrowingDto, GetBorrowingDto, ReturnBorrowingDto, UpdateBorrowingDto,
    };

    fn user(email: &str, role: UserRole) -> User {
        User::new(UserId::new(Uuid::new_v4()), UserEmail::new(email), role)
    }

    fn book(title: &str, inventory: i32) -> Book {
        Book::new(
            BookId::new(Uuid::new_v4()),
            BookTitle::parse(title).unwrap(),
            BookAuthor::parse("Frank Herbert").unwrap(),
            BookCover::Soft,
            BookInventory::new(inventory),
            DailyFee::parse(Decimal::new(150, 2)).unwrap(),
        )
    }

    struct Fixture {
        module: TestModule,
        member: Caller,
        admin: Caller,
        book: Book,
    }

    fn fixture(inventory: i32) -> Fixture {
        let module = TestModule::default();
        let member = user("member@library.test", UserRole::Member);
        let admin = user("admin@library.test", UserRole::Admin);
        let book = book("Dune", inventory);
        module.seed(|state| {
            state.books.push(book.clone());
            state
                .users
                .push((AccessToken::new("member-token"), member.clone()));
            state
                .users
                .push((AccessToken::new("admin-token"), admin.clone()));
        });
        Fixture {
            module,
            member: Caller::Authenticated(member),
            admin: Caller::Authenticated(admin),
            book,
        }
    }

    fn inventory_of(module: &TestModule, id: &BookId) -> i32 {
        let state = module.state();
        let book = state.books.iter().find(|book| book.id() == id).unwrap();
        *book.inventory().as_ref()
    }

    fn records(details: Vec<BorrowingDetailDto>) -> Vec<Borrowing> {
        details.into_iter().map(|detail| detail.borrowing).collect()
    }

    fn borrow_dto(book: &Book) -> CreateBorrowingDto {
        CreateBorrowingDto {
            book_id: *book.id().as_ref(),
            expected_return_date: today() + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn borrow_and_return_moves_inventory() {
        let Fixture {
            module,
            member,
            book,
            ..
        } = fixture(10);

        let borrowing = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        assert_eq!(inventory_of(&module, book.id()), 9);
        assert_eq!(borrowing.borrow_date(), &BorrowDate::new(today()));
        let sent = module.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("New borrowing: Dune borrowed by member@library.test"));

        let returned = module
            .return_borrowing(
                &member,
                ReturnBorrowingDto {
                    id: *borrowing.id().as_ref(),
                    actual_return_date: None,
                },
            )
            .await
            .unwrap();
        assert!(!returned.is_active());
        assert_eq!(inventory_of(&module, book.id()), 10);
    }

    #[tokio::test]
    async fn out_of_stock_leaves_state_untouched() {
        let Fixture {
            module,
            member,
            book,
            ..
        } = fixture(0);

        let report = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::OutOfStock);
        assert_eq!(inventory_of(&module, book.id()), 0);
        assert!(module.state().borrowings.is_empty());
        assert!(module.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn second_return_is_rejected() {
        let Fixture {
            module,
            member,
            book,
            ..
        } = fixture(1);

        let borrowing = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        let dto = ReturnBorrowingDto {
            id: *borrowing.id().as_ref(),
            actual_return_date: None,
        };
        module.return_borrowing(&member, dto.clone()).await.unwrap();
        let report = module.return_borrowing(&member, dto).await.unwrap_err();
        assert_eq!(report.current_context(), &KernelError::AlreadyReturned);
        assert_eq!(inventory_of(&module, book.id()), 1);
    }

    #[tokio::test]
    async fn past_expected_date_is_rejected() {
        let Fixture {
            module,
            member,
            book,
            ..
        } = fixture(3);

        let dto = CreateBorrowingDto {
            book_id: *book.id().as_ref(),
            expected_return_date: today() - Duration::days(1),
        };
        let report = module.create_borrowing(&member, dto).await.unwrap_err();
        assert_eq!(report.current_context(), &KernelError::InvalidDateRange);
        assert_eq!(inventory_of(&module, book.id()), 3);
    }

    #[tokio::test]
    async fn unknown_book_is_not_found() {
        let Fixture { module, member, .. } = fixture(3);
        let dto = CreateBorrowingDto {
            book_id: Uuid::new_v4(),
            expected_return_date: today(),
        };
        let report = module.create_borrowing(&member, dto).await.unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);
    }

    #[tokio::test]
    async fn members_only_see_their_own_borrowings() {
        let Fixture {
            module,
            member,
            admin,
            book,
        } = fixture(5);

        let own = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        let others = module
            .create_borrowing(&admin, borrow_dto(&book))
            .await
            .unwrap();

        let listed = module
            .get_borrowings(&member, GetAllBorrowingDto::default())
            .await
            .unwrap();
        assert_eq!(records(listed), vec![own.clone()]);

        let sneaky = GetAllBorrowingDto {
            user_id: Some(*others.user_id().as_ref()),
            ..Default::default()
        };
        let listed = module.get_borrowings(&member, sneaky).await.unwrap();
        assert_eq!(records(listed), vec![own.clone()]);

        let report = module
            .get_borrowing(
                &member,
                GetBorrowingDto {
                    id: *others.id().as_ref(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);

        let detail = module
            .get_borrowing(
                &member,
                GetBorrowingDto {
                    id: *own.id().as_ref(),
                },
            )
            .await
            .unwrap();
        assert_eq!(detail.borrowing, own);
        assert_eq!(detail.book.id(), book.id());
        assert_eq!(detail.book.inventory(), &BookInventory::new(3));

        let all = module
            .get_borrowings(&admin, GetAllBorrowingDto::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        let filtered = GetAllBorrowingDto {
            user_id: Some(*own.user_id().as_ref()),
            ..Default::default()
        };
        let listed = module.get_borrowings(&admin, filtered).await.unwrap();
        assert_eq!(records(listed), vec![own]);
    }

    #[tokio::test]
    async fn active_filter_splits_returned_records() {
        let Fixture {
            module,
            member,
            book,
            ..
        } = fixture(5);

        let first = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        let second = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        module
            .return_borrowing(
                &member,
                ReturnBorrowingDto {
                    id: *first.id().as_ref(),
                    actual_return_date: Some(today()),
                },
            )
            .await
            .unwrap();

        let active = GetAllBorrowingDto {
            is_active: Some(true),
            ..Default::default()
        };
        let listed = module.get_borrowings(&member, active).await.unwrap();
        assert_eq!(records(listed), vec![second]);
    }

    #[tokio::test]
    async fn members_cannot_touch_catalog_or_reschedule() {
        let Fixture {
            module,
            member,
            book,
            ..
        } = fixture(5);

        let dto = CreateBookDto {
            title: "Children of Dune".to_string(),
            author: "Frank Herbert".to_string(),
            cover: "HARD".to_string(),
            inventory: 2,
            daily_fee: Decimal::new(99, 2),
        };
        let report = module.create_book(&member, dto.clone()).await.unwrap_err();
        assert_eq!(report.current_context(), &KernelError::PermissionDenied);
        let report = module
            .create_book(&Caller::Anonymous, dto)
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Unauthenticated);

        let borrowing = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        let report = module
            .update_borrowing(
                &member,
                UpdateBorrowingDto {
                    id: *borrowing.id().as_ref(),
                    expected_return_date: today() + Duration::days(30),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::PermissionDenied);
    }

    #[tokio::test]
    async fn anonymous_may_browse_catalog() {
        let Fixture { module, book, .. } = fixture(5);
        let books = module
            .get_books(&Caller::Anonymous, GetAllBookDto::default())
            .await
            .unwrap();
        assert_eq!(books, vec![book]);
    }

    #[tokio::test]
    async fn admin_delete_restores_inventory_of_active_borrowing() {
        let Fixture {
            module,
            member,
            admin,
            book,
        } = fixture(2);

        let borrowing = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        assert_eq!(inventory_of(&module, book.id()), 1);
        module
            .delete_borrowing(
                &admin,
                DeleteBorrowingDto {
                    id: *borrowing.id().as_ref(),
                },
            )
            .await
            .unwrap();
        assert_eq!(inventory_of(&module, book.id()), 2);
        assert!(module.state().borrowings.is_empty());
    }

    #[tokio::test]
    async fn admin_changes_keep_a_recorded_return() {
        let Fixture {
            module,
            member,
            admin,
            book,
        } = fixture(1);

        let borrowing = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        let id = *borrowing.id().as_ref();
        module
            .return_borrowing(
                &member,
                ReturnBorrowingDto {
                    id,
                    actual_return_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(inventory_of(&module, book.id()), 1);

        let moved = module
            .update_borrowing(
                &admin,
                UpdateBorrowingDto {
                    id,
                    expected_return_date: today(),
                },
            )
            .await
            .unwrap();
        assert!(!moved.is_active());
        let stored = module.state().borrowings[0].clone();
        assert_eq!(
            stored.actual_return_date().map(|date| *date.as_ref()),
            Some(today())
        );

        module
            .delete_borrowing(&admin, DeleteBorrowingDto { id })
            .await
            .unwrap();
        assert_eq!(inventory_of(&module, book.id()), 1);

        let report = module
            .delete_borrowing(&admin, DeleteBorrowingDto { id })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);
    }

    #[tokio::test]
    async fn admin_reschedule_validates_date() {
        let Fixture {
            module,
            member,
            admin,
            book,
        } = fixture(2);

        let borrowing = module
            .create_borrowing(&member, borrow_dto(&book))
            .await
            .unwrap();
        let later = today() + Duration::days(21);
        let moved = module
            .update_borrowing(
                &admin,
                UpdateBorrowingDto {
                    id: *borrowing.id().as_ref(),
                    expected_return_date: later,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.expected_return_date(), &ExpectedReturnDate::new(later));

        let report = module
            .update_borrowing(
                &admin,
                UpdateBorrowingDto {
                    id: *borrowing.id().as_ref(),
                    expected_return_date: today() - Duration::days(1),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::InvalidDateRange);
    }

    #[tokio::test]
    async fn overdue_scan_reports_due_borrowings() {
        let Fixture {
            module,
            member,
            book,
            ..
        } = fixture(5);
        let member_id = *member.user().unwrap().id();

        let due = Borrowing::new(
            BorrowingId::new(Uuid::new_v4()),
            BorrowDate::new(today() - Duration::days(14)),
            ExpectedReturnDate::new(today()),
            None,
            *book.id(),
            member_id,
        );
        let later = Borrowing::new(
            BorrowingId::new(Uuid::new_v4()),
            BorrowDate::new(today()),
            ExpectedReturnDate::new(today() + Duration::days(10)),
            None,
            *book.id(),
            member_id,
        );
        module.seed(|state| {
            state.borrowings.push(due.clone());
            state.borrowings.push(later);
        });

        let count = module.scan_overdue().await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            module.notifier.sent(),
            vec![format!(
                "Borrowing of Dune is overdue by user member@library.test. Expected return date - {}",
                due.expected_return_date()
            )]
        );
    }

    #[tokio::test]
    async fn overdue_scan_without_results() {
        let Fixture { module, .. } = fixture(5);
        assert_eq!(module.scan_overdue().await.unwrap(), 0);
        assert_eq!(module.notifier.sent(), vec![NOTHING_OVERDUE.to_string()]);
    }

    #[tokio::test]
    async fn overdue_scan_endpoint_is_admin_only() {
        let Fixture {
            module,
            admin,
            member,
            ..
        } = fixture(5);
        let report = module.scan_overdue_for(&member).await.unwrap_err();
        assert_eq!(report.current_context(), &KernelError::PermissionDenied);
        let report = module.scan_overdue_for(&Caller::Anonymous).await.unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Unauthenticated);
        assert!(module.notifier.sent().is_empty());

        assert_eq!(module.scan_overdue_for(&admin).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn token_resolution() {
        let Fixture { module, member, .. } = fixture(1);
        assert_eq!(module.authenticate(None).await.unwrap(), Caller::Anonymous);
        assert_eq!(
            module
                .authenticate(Some(AccessToken::new("member-token")))
                .await
                .unwrap(),
            member
        );
        let report = module
            .authenticate(Some(AccessToken::new("bogus")))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Unauthenticated);
    }

    #[tokio::test]
    async fn catalog_lookup_of_missing_book() {
        let Fixture { module, admin, .. } = fixture(1);
        let report = module
            .get_book(
                &admin,
                crate::transfer::GetBookDto { id: Uuid::new_v4() },
            )
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);
    }
}
