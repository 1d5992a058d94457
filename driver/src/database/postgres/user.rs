use sqlx::PgConnection;
use uuid::Uuid;

use kernel::interface::query::UserQuery;
use kernel::prelude::entity::{AccessToken, User, UserEmail, UserId, UserRole};
use kernel::KernelError;

use crate::database::postgres::PostgresConnection;
use crate::error::ConvertError;

/// Read side of the account tables. Accounts and tokens are provisioned
/// outside of this service.
pub struct PostgresUserRepository;

#[async_trait::async_trait]
impl UserQuery for PostgresUserRepository {
    type Transaction = PostgresConnection;
    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        PgUserInternal::find_by_id(con, id).await
    }

    async fn find_by_token(
        &self,
        con: &mut PostgresConnection,
        token: &AccessToken,
    ) -> error_stack::Result<Option<User>, KernelError> {
        PgUserInternal::find_by_token(con, token).await
    }
}

#[cfg(test)]
impl PostgresUserRepository {
    pub(in crate::database) async fn create(
        &self,
        con: &mut PostgresConnection,
        user: &User,
    ) -> error_stack::Result<(), KernelError> {
        PgUserInternal::create(con, user).await
    }

    pub(in crate::database) async fn issue_token(
        &self,
        con: &mut PostgresConnection,
        user_id: &UserId,
        token: &AccessToken,
    ) -> error_stack::Result<(), KernelError> {
        PgUserInternal::issue_token(con, user_id, token).await
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    is_staff: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::new(
            UserId::new(row.id),
            UserEmail::new(row.email),
            UserRole::from_staff_flag(row.is_staff),
        )
    }
}

pub(in crate::database) struct PgUserInternal;

impl PgUserInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        let row = sqlx::query_as::<_, UserRow>(
            // language=postgresql
            r#"
            SELECT id, email, is_staff
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(User::from))
    }

    async fn find_by_token(
        con: &mut PgConnection,
        token: &AccessToken,
    ) -> error_stack::Result<Option<User>, KernelError> {
        let row = sqlx::query_as::<_, UserRow>(
            // language=postgresql
            r#"
            SELECT users.id, users.email, users.is_staff
            FROM access_tokens
            JOIN users ON users.id = access_tokens.user_id
            WHERE access_tokens.token = $1
            "#,
        )
        .bind(token.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(User::from))
    }

    #[cfg(test)]
    async fn create(con: &mut PgConnection, user: &User) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO users (id, email, is_staff)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user.id().as_ref())
        .bind(user.email().as_ref())
        .bind(user.role().is_staff())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    #[cfg(test)]
    async fn issue_token(
        con: &mut PgConnection,
        user_id: &UserId,
        token: &AccessToken,
    ) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO access_tokens (token, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(token.as_ref())
        .bind(user_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::UserQuery;
    use kernel::prelude::entity::{AccessToken, User, UserEmail, UserId, UserRole};
    use kernel::KernelError;

    use crate::database::postgres::user::PostgresUserRepository;
    use crate::database::postgres::PostgresDatabase;

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn find_by_token() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let mut con = db.transact().await?;
        let id = Uuid::new_v4();
        let user = User::new(
            UserId::new(id),
            UserEmail::new(format!("{id}@library.test")),
            UserRole::Admin,
        );
        let token = AccessToken::new(format!("token-{id}"));
        PostgresUserRepository.create(&mut con, &user).await?;
        PostgresUserRepository
            .issue_token(&mut con, user.id(), &token)
            .await?;

        let found = PostgresUserRepository
            .find_by_token(&mut con, &token)
            .await?;
        assert_eq!(found, Some(user.clone()));
        let found = PostgresUserRepository
            .find_by_id(&mut con, user.id())
            .await?;
        assert_eq!(found, Some(user));
        let found = PostgresUserRepository
            .find_by_token(&mut con, &AccessToken::new("missing"))
            .await?;
        assert!(found.is_none());

        con.roll_back().await
    }
}
