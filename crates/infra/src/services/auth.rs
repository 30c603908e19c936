use std::sync::Arc;

use tracing::{info, instrument};

use cardhub_auth::{
    Account, Claims, LoginCredentials, PasswordComparator, TokenPair, TokenPurpose, TokenService,
};
use cardhub_core::{Clock, DomainError, DomainResult};
use cardhub_employees::Employee;

use super::store_failure;
use crate::store::AccountStore;

const BAD_CREDENTIALS: &str =
    "Your credentials not valid. Please check your username and password and try again.";
const BAD_TOKEN: &str = "Your credentials not valid. Please check your token and try again.";
const NOT_ALLOWED_USER: &str = "You are not allowed to access this user or (it may not exist)";

/// Login, token refresh and bearer verification.
///
/// Usernames are employee codes, so a token's subject is enough to find the
/// account again on refresh.
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    tokens: TokenService,
    passwords: Arc<dyn PasswordComparator>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        tokens: TokenService,
        passwords: Arc<dyn PasswordComparator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            tokens,
            passwords,
            clock,
        }
    }

    #[instrument(skip(self, password), fields(method = "Login"))]
    pub async fn login(&self, username: &str, password: &str) -> DomainResult<TokenPair> {
        let credentials = LoginCredentials::try_from_parts(username, password)?;

        let account = self
            .accounts
            .find_account(credentials.username())
            .await
            .map_err(|e| store_failure("find_account", e))?;
        let Some(account) = account else {
            info!(username = credentials.username(), "unknown user");
            return Err(DomainError::unauthenticated(BAD_CREDENTIALS));
        };
        if !self
            .passwords
            .matches(credentials.password(), &account.password_hash)
        {
            info!(username = credentials.username(), "password mismatch");
            return Err(DomainError::unauthenticated(BAD_CREDENTIALS));
        }

        self.issue(&account)
    }

    /// Trade a refresh token for a new pair built from the account as it is
    /// now; org fields inside the old token are ignored.
    #[instrument(skip(self, refresh_token), fields(method = "RefreshToken"))]
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenPurpose::Refresh, self.clock.now())
            .map_err(|e| {
                info!(error = %e, "refresh token rejected");
                DomainError::unauthenticated(BAD_TOKEN)
            })?;

        let account = self
            .accounts
            .find_account(&claims.code)
            .await
            .map_err(|e| store_failure("find_account", e))?;
        let Some(account) = account else {
            info!(username = %claims.code, "account no longer exists");
            return Err(DomainError::unauthenticated(BAD_TOKEN));
        };

        self.issue(&account)
    }

    /// Verify a bearer access token.
    pub fn verify_access(&self, token: &str) -> DomainResult<Claims> {
        self.tokens
            .verify(token, TokenPurpose::Access, self.clock.now())
            .map_err(|e| {
                info!(error = %e, "access token rejected");
                e.into()
            })
    }

    #[instrument(skip(self, claims), fields(method = "Profile", username = %claims.code))]
    pub async fn profile(&self, claims: &Claims) -> DomainResult<Employee> {
        claims.require_authenticated()?;
        let account = self
            .accounts
            .find_account(&claims.code)
            .await
            .map_err(|e| store_failure("find_account", e))?;
        match account {
            Some(account) => Ok(account.employee),
            None => {
                info!("account not found");
                Err(DomainError::permission_denied(NOT_ALLOWED_USER))
            }
        }
    }

    fn issue(&self, account: &Account) -> DomainResult<TokenPair> {
        self.tokens
            .issue(account, self.clock.now())
            .map_err(|e| {
                tracing::error!(error = %e, "failed to generate token");
                e.into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDirectory;
    use crate::test_support::{employee, hr, t0, token_service};
    use cardhub_auth::{Argon2Comparator, hash_password};
    use cardhub_core::{EmployeeId, FixedClock};
    use chrono::Duration;

    fn service_at(
        directory: Arc<InMemoryDirectory>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> AuthService {
        AuthService::new(
            directory,
            token_service(),
            Arc::new(Argon2Comparator),
            Arc::new(FixedClock(now)),
        )
    }

    fn directory() -> Arc<InMemoryDirectory> {
        let dir = Arc::new(InMemoryDirectory::new());
        dir.upsert_employee(employee(42, 7)).unwrap();
        dir.upsert_employee(hr(1)).unwrap();
        dir.upsert_account("E042", EmployeeId::new(42), hash_password("s3cret").unwrap(), false)
            .unwrap();
        dir.upsert_account("E001", EmployeeId::new(1), hash_password("hr-pass").unwrap(), true)
            .unwrap();
        dir
    }

    #[tokio::test]
    async fn login_issues_tokens_carrying_the_profile() {
        let svc = service_at(directory(), t0());
        let pair = svc.login(" E042 ", "s3cret").await.unwrap();

        let claims = svc.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.id, EmployeeId::new(42));
        assert_eq!(claims.manager_id, EmployeeId::new(7));
        assert!(!claims.is_hr);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let svc = service_at(directory(), t0());
        let unknown = svc.login("nobody", "s3cret").await.unwrap_err();
        let wrong = svc.login("E042", "guess").await.unwrap_err();
        assert_eq!(unknown, wrong);
        assert_eq!(unknown.code(), "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn empty_credentials_are_invalid_arguments() {
        let svc = service_at(directory(), t0());
        let err = svc.login("  ", "").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(err.violations().len(), 2);
    }

    #[tokio::test]
    async fn refresh_rereads_the_account() {
        let dir = directory();
        let pair = service_at(dir.clone(), t0()).login("E042", "s3cret").await.unwrap();

        let mut promoted = employee(42, 8);
        promoted.display_name = "Noy V.".into();
        dir.upsert_employee(promoted).unwrap();

        let later = service_at(dir, t0() + Duration::days(2));
        let fresh = later.refresh(&pair.refresh_token).await.unwrap();
        let claims = later.verify_access(&fresh.access_token).unwrap();
        assert_eq!(claims.manager_id, EmployeeId::new(8));
        assert_eq!(claims.display_name, "Noy V.");
    }

    #[tokio::test]
    async fn refresh_fails_for_removed_account_or_access_token() {
        let dir = directory();
        let svc = service_at(dir.clone(), t0());
        let pair = svc.login("E042", "s3cret").await.unwrap();

        let err = svc.refresh(&pair.access_token).await.unwrap_err();
        assert_eq!(err.code(), "UNAUTHENTICATED");

        dir.remove_employee(EmployeeId::new(42)).unwrap();
        let err = svc.refresh(&pair.refresh_token).await.unwrap_err();
        assert_eq!(err.code(), "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn access_token_expires_after_an_hour() {
        let dir = directory();
        let pair = service_at(dir.clone(), t0()).login("E042", "s3cret").await.unwrap();

        let almost = service_at(dir.clone(), t0() + Duration::seconds(3599));
        assert!(almost.verify_access(&pair.access_token).is_ok());

        let expired = service_at(dir, t0() + Duration::hours(1));
        assert_eq!(
            expired.verify_access(&pair.access_token).unwrap_err().code(),
            "UNAUTHENTICATED"
        );
    }

    #[tokio::test]
    async fn profile_requires_identity_and_existing_account() {
        let dir = directory();
        let svc = service_at(dir.clone(), t0());

        let err = svc.profile(&Claims::default()).await.unwrap_err();
        assert_eq!(err.code(), "UNAUTHENTICATED");

        let pair = svc.login("E042", "s3cret").await.unwrap();
        let claims = svc.verify_access(&pair.access_token).unwrap();
        assert_eq!(svc.profile(&claims).await.unwrap().id, EmployeeId::new(42));

        dir.remove_employee(EmployeeId::new(42)).unwrap();
        assert_eq!(svc.profile(&claims).await.unwrap_err().code(), "PERMISSION_DENIED");
    }
}
