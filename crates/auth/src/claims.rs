use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cardhub_core::EmployeeId;

use crate::Account;

/// Identity snapshot carried inside a verified token.
///
/// Built once at login/refresh from a fresh account read. The default value is
/// the anonymous caller: id 0, empty code, not HR. It fails every
/// authorization predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: EmployeeId,
    pub code: String,
    pub display_name: String,
    pub manager_id: EmployeeId,
    pub position_id: i64,
    pub department_id: i64,
    pub company_id: i64,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    #[serde(rename = "isHR")]
    pub is_hr: bool,
}

impl Claims {
    pub fn for_account(account: &Account) -> Self {
        let e = &account.employee;
        Self {
            id: e.id,
            code: e.code.clone(),
            display_name: e.display_name.clone(),
            manager_id: e.manager_id,
            position_id: e.position.id,
            department_id: e.department.id,
            company_id: e.company.id,
            email: e.email.clone(),
            phone: e.phone.clone(),
            mobile: e.mobile.clone(),
            is_hr: account.is_hr,
        }
    }

    /// `false` for the zero value and anything that looks like it.
    pub fn is_authenticated(&self) -> bool {
        !self.id.is_unset() && !self.code.is_empty()
    }
}

/// Which key and lifetime a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    Access,
    Refresh,
}

impl TokenPurpose {
    pub fn audience(self) -> &'static str {
        match self {
            Self::Access => "cardhub:access",
            Self::Refresh => "cardhub:refresh",
        }
    }
}

/// Registered claims plus the identity snapshot under `profile`.
///
/// Times are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Employee code.
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub profile: Claims,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time rules of decoded token claims.
///
/// Note: this validates the *claims* only. MAC verification happens in
/// [`crate::TokenService::verify`] before this is called.
pub fn validate_claims(
    claims: &TokenClaims,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.nbf {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims(iat: i64, nbf: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: "E042".into(),
            aud: TokenPurpose::Access.audience().into(),
            iat,
            nbf,
            exp,
            profile: Claims::default(),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn zero_claims_are_anonymous() {
        let anon = Claims::default();
        assert!(!anon.is_authenticated());
        assert!(!anon.is_hr);
        assert!(anon.code.is_empty());
    }

    #[test]
    fn time_window_boundaries() {
        let c = claims(1_000, 1_000, 4_600);
        assert_eq!(validate_claims(&c, at(999)), Err(TokenValidationError::NotYetValid));
        assert!(validate_claims(&c, at(1_000)).is_ok());
        assert!(validate_claims(&c, at(4_599)).is_ok());
        assert_eq!(validate_claims(&c, at(4_600)), Err(TokenValidationError::Expired));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let c = claims(5_000, 5_000, 5_000);
        assert_eq!(
            validate_claims(&c, at(5_000)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn hr_flag_uses_explicit_wire_name() {
        let json = serde_json::to_value(Claims {
            is_hr: true,
            ..Claims::default()
        })
        .unwrap();
        assert_eq!(json["isHR"], true);
    }
}
