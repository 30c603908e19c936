//! `cardhub-auth`: identity tokens and the authorization policy.
//!
//! This crate is intentionally decoupled from HTTP and storage: it issues and
//! verifies tokens, compares passwords, and decides whether a [`Claims`]
//! snapshot may act on a resource.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod password;
pub mod token;

pub use account::{Account, LoginCredentials};
pub use authorize::{AuthzError, NOT_ALLOWED_CARD};
pub use claims::{Claims, TokenClaims, TokenPurpose, TokenValidationError, validate_claims};
pub use password::{Argon2Comparator, PasswordComparator, hash_password};
pub use token::{TokenError, TokenKeys, TokenPair, TokenService};
