//! Token issuing and verification.
//!
//! Access and refresh tokens are HS256 JWTs signed with two different keys.
//! Signature, audience and the presence of the registered claims are checked
//! by `jsonwebtoken`; the time rules are checked by [`validate_claims`]
//! against an explicit `now`, so callers control the clock.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cardhub_core::DomainError;

use crate::{Account, Claims, TokenClaims, TokenPurpose, validate_claims};

/// Minimum accepted length for either signing key.
pub const MIN_KEY_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("token generation failed: {0}")]
    GenerationFailed(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken(_) => {
                DomainError::unauthenticated("Invalid or expired token.")
            }
            other => DomainError::internal(other.to_string()),
        }
    }
}

/// Freshly issued token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The two symmetric keys. They must differ so that a leaked refresh key
/// cannot mint access tokens and vice versa.
#[derive(Clone)]
pub struct TokenKeys {
    access: SigningKey,
    refresh: SigningKey,
}

impl core::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn new(access: &[u8], refresh: &[u8]) -> Result<Self, TokenError> {
        if access.len() < MIN_KEY_LEN || refresh.len() < MIN_KEY_LEN {
            return Err(TokenError::InvalidKey(format!(
                "signing keys must be at least {MIN_KEY_LEN} bytes"
            )));
        }
        if access == refresh {
            return Err(TokenError::InvalidKey(
                "access and refresh keys must differ".into(),
            ));
        }
        Ok(Self {
            access: SigningKey::from_secret(access),
            refresh: SigningKey::from_secret(refresh),
        })
    }

    fn for_purpose(&self, purpose: TokenPurpose) -> &SigningKey {
        match purpose {
            TokenPurpose::Access => &self.access,
            TokenPurpose::Refresh => &self.refresh,
        }
    }
}

/// Stateless issuer/verifier. Nothing is stored and nothing can be revoked.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: TokenKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(keys: TokenKeys) -> Self {
        Self {
            keys,
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(7),
        }
    }

    /// Mint an access/refresh pair carrying the same snapshot.
    pub fn issue(&self, account: &Account, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        let profile = Claims::for_account(account);
        Ok(TokenPair {
            access_token: self.sign(&profile, TokenPurpose::Access, now)?,
            refresh_token: self.sign(&profile, TokenPurpose::Refresh, now)?,
        })
    }

    fn sign(
        &self,
        profile: &Claims,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = match purpose {
            TokenPurpose::Access => self.access_ttl,
            TokenPurpose::Refresh => self.refresh_ttl,
        };
        let iat = now.timestamp();
        let claims = TokenClaims {
            sub: profile.code.clone(),
            aud: purpose.audience().to_string(),
            iat,
            nbf: iat,
            exp: iat + ttl.num_seconds(),
            profile: profile.clone(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.for_purpose(purpose).encoding,
        )
        .map_err(|e| TokenError::GenerationFailed(e.to_string()))
    }

    /// All-or-nothing verification: either the full snapshot or an error.
    pub fn verify(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_audience(&[purpose.audience()]);
        validation.required_spec_claims =
            ["exp", "nbf", "sub", "aud"].into_iter().map(String::from).collect::<HashSet<_>>();

        let key = &self.keys.for_purpose(purpose).decoding;
        let data = decode::<TokenClaims>(token, key, &validation)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;
        validate_claims(&data.claims, now).map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        if data.claims.sub != data.claims.profile.code {
            return Err(TokenError::InvalidToken("subject does not match profile".into()));
        }
        Ok(data.claims.profile)
    }
}
