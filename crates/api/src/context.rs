use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use cardhub_auth::Claims;

/// Caller identity for a request.
///
/// The auth middleware attaches verified [`Claims`]. When nothing was
/// attached this yields the anonymous value, which every policy check
/// rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Claims>().cloned().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use cardhub_core::EmployeeId;

    #[tokio::test]
    async fn missing_claims_are_anonymous() {
        let (mut parts, _) = Request::new(()).into_parts();
        let Caller(claims) = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(!claims.is_authenticated());
    }

    #[tokio::test]
    async fn attached_claims_are_returned() {
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(Claims {
            id: EmployeeId::new(42),
            code: "E042".into(),
            ..Claims::default()
        });
        let Caller(claims) = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(claims.id, EmployeeId::new(42));
    }
}
