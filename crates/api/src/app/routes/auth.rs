use std::sync::Arc;

use axum::{Json, extract::Extension};

use cardhub_auth::TokenPair;

use crate::app::dto::{LoginRequest, ProfileResponse, RefreshTokenRequest};
use crate::app::errors::{ApiError, JsonBody};
use crate::app::services::AppServices;
use crate::context::Caller;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = services.auth.login(&body.username, &body.password).await?;
    Ok(Json(pair))
}

pub async fn refresh_token(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = services.auth.refresh(&body.token).await?;
    Ok(Json(pair))
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = services.auth.profile(&claims).await?;
    Ok(Json(ProfileResponse { profile }))
}
