//! Service wiring shared by every route.

use std::sync::Arc;

use thiserror::Error;

use cardhub_auth::{Argon2Comparator, TokenError, TokenKeys, TokenService};
use cardhub_cards::E164Normalizer;
use cardhub_core::{Clock, CursorCodec, CursorError};
use cardhub_infra::config::AppConfig;
use cardhub_infra::services::{AuthService, CardService, EmployeeService};
use cardhub_infra::store::{AccountStore, CardStore, EmployeeStore};

#[derive(Debug, Error)]
pub enum WiringError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("cursor key: {0}")]
    Cursor(#[from] CursorError),
}

pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub employees: EmployeeService,
    pub cards: CardService,
}

impl AppServices {
    /// Wire all services over one directory backend.
    pub fn new<D>(
        directory: Arc<D>,
        tokens: TokenService,
        cursors: CursorCodec,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        D: AccountStore + EmployeeStore + CardStore + 'static,
    {
        let cursors = Arc::new(cursors);
        Self {
            auth: Arc::new(AuthService::new(
                directory.clone(),
                tokens,
                Arc::new(Argon2Comparator),
                clock.clone(),
            )),
            employees: EmployeeService::new(directory.clone(), cursors.clone()),
            cards: CardService::new(
                directory.clone(),
                directory,
                cursors,
                Arc::new(E164Normalizer),
                clock,
            ),
        }
    }

    pub fn from_config<D>(
        config: &AppConfig,
        directory: Arc<D>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WiringError>
    where
        D: AccountStore + EmployeeStore + CardStore + 'static,
    {
        let tokens = TokenService::new(TokenKeys::new(
            &config.access_token_key,
            &config.refresh_token_key,
        )?);
        let cursors = CursorCodec::new(config.cursor_key.clone())?;
        Ok(Self::new(directory, tokens, cursors, clock))
    }
}
