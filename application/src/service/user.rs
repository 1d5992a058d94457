use error_stack::Report;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection};
use kernel::interface::query::{DependOnUserQuery, UserQuery};
use kernel::prelude::entity::AccessToken;
use kernel::prelude::policy::Caller;
use kernel::{ErrorDetail, KernelError};

#[async_trait::async_trait]
pub trait AuthenticateService: 'static + Sync + Send + DependOnUserQuery {
    /// Resolves the request principal.
    ///
    /// No token means an anonymous caller. A token that matches nobody is
    /// rejected rather than downgraded.
    async fn authenticate(
        &self,
        token: Option<AccessToken>,
    ) -> error_stack::Result<Caller, KernelError> {
        let Some(token) = token else {
            return Ok(Caller::Anonymous);
        };
        let mut connection = self.database_connection().transact().await?;
        let user = self
            .user_query()
            .find_by_token(&mut connection, &token)
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::Unauthenticated)
                    .attach_printable(ErrorDetail::new("Invalid token."))
            })?;
        tracing::debug!("Authenticated user {}", user.id());
        Ok(Caller::Authenticated(user))
    }
}

impl<T> AuthenticateService for T where T: DependOnUserQuery {}
