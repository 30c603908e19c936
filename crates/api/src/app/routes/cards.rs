use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, post},
};

use cardhub_cards::{ApproveCard, CardContactRequest, PublishCard, RejectCard};
use cardhub_core::CardId;

use crate::app::dto::{CardListResponse, CardQuery, CardResponse, VcfResponse};
use crate::app::errors::{ApiError, BAD_PARAMS, JsonBody, PathParam, QueryParams};
use crate::app::services::AppServices;
use crate::context::Caller;

pub fn router() -> Router {
    Router::new()
        .route("/v1/business-cards", post(create_card).get(list_cards))
        .route("/v1/business-cards/me", get(list_my_cards))
        .route("/v1/business-cards/me/approval", get(list_my_approvals))
        .route("/v1/business-cards/me/approval/:id", get(get_my_approval))
        .route("/v1/business-cards/me/:id", get(get_my_card))
        .route("/v1/business-cards/me/:id/vcf", get(get_card_vcf))
        .route("/v1/business-cards/approve", post(approve_card))
        .route("/v1/business-cards/reject", post(reject_card))
        .route("/v1/business-cards/publish", post(publish_card))
        .route("/v1/business-cards/:id", get(get_card).put(update_card))
}

fn card_id(raw: &str) -> Result<CardId, ApiError> {
    raw.parse().map_err(|_| ApiError::binding(BAD_PARAMS, "id"))
}

pub async fn create_card(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    JsonBody(body): JsonBody<CardContactRequest>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = services.cards.create_card(&claims, &body).await?;
    Ok(Json(CardResponse { card }))
}

pub async fn update_card(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<CardContactRequest>,
) -> Result<Json<CardResponse>, ApiError> {
    let id = card_id(&id)?;
    let card = services.cards.update_card(&claims, &id, &body).await?;
    Ok(Json(CardResponse { card }))
}

pub async fn list_my_cards(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    QueryParams(query): QueryParams<CardQuery>,
) -> Result<Json<CardListResponse>, ApiError> {
    let page = services
        .cards
        .list_my_cards(&claims, query.filter(), query.page_size, query.page_token.as_deref())
        .await?;
    Ok(Json(page.into()))
}

pub async fn get_my_card(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    PathParam(id): PathParam<String>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = services.cards.get_my_card(&claims, &card_id(&id)?).await?;
    Ok(Json(CardResponse { card }))
}

pub async fn get_card_vcf(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    PathParam(id): PathParam<String>,
) -> Result<Json<VcfResponse>, ApiError> {
    let vcf = services
        .cards
        .get_published_vcard(&claims, &card_id(&id)?)
        .await?;
    Ok(Json(VcfResponse { vcf }))
}

pub async fn list_my_approvals(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    QueryParams(query): QueryParams<CardQuery>,
) -> Result<Json<CardListResponse>, ApiError> {
    let page = services
        .cards
        .list_my_approvals(&claims, query.filter(), query.page_size, query.page_token.as_deref())
        .await?;
    Ok(Json(page.into()))
}

pub async fn get_my_approval(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    PathParam(id): PathParam<String>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = services.cards.get_my_approval(&claims, &card_id(&id)?).await?;
    Ok(Json(CardResponse { card }))
}

pub async fn list_cards(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    QueryParams(query): QueryParams<CardQuery>,
) -> Result<Json<CardListResponse>, ApiError> {
    let page = services
        .cards
        .list_cards(&claims, query.filter(), query.page_size, query.page_token.as_deref())
        .await?;
    Ok(Json(page.into()))
}

pub async fn get_card(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    PathParam(id): PathParam<String>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = services.cards.get_card(&claims, &card_id(&id)?).await?;
    Ok(Json(CardResponse { card }))
}

pub async fn approve_card(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    JsonBody(body): JsonBody<ApproveCard>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = services.cards.approve(&claims, &body).await?;
    Ok(Json(CardResponse { card }))
}

pub async fn reject_card(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    JsonBody(body): JsonBody<RejectCard>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = services.cards.reject(&claims, &body).await?;
    Ok(Json(CardResponse { card }))
}

pub async fn publish_card(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    JsonBody(body): JsonBody<PublishCard>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = services.cards.publish(&claims, &body).await?;
    Ok(Json(CardResponse { card }))
}
