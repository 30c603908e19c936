use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, instrument};

use cardhub_auth::{AuthzError, Claims, NOT_ALLOWED_CARD};
use cardhub_cards::{
    ApproveCard, Card, CardContactRequest, CardFilter, CardStatus, PhoneNormalizer, PublishCard,
    RejectCard, Transition, vcard,
};
use cardhub_core::{
    CardId, Clock, Cursor, CursorCodec, CursorKind, DomainError, DomainResult, Page, PageRequest,
};
use cardhub_employees::Employee;

use super::store_failure;
use crate::store::{CREATE_CONFLICT, CardStore, EmployeeStore, StoreError};

fn card_cursor(card: &Card) -> Cursor {
    Cursor::new(CursorKind::Card, card.id.as_str(), card.created_at)
}

fn not_allowed() -> DomainError {
    AuthzError::NotAllowed(NOT_ALLOWED_CARD).into()
}

/// Business card lifecycle and the scoped card views.
///
/// Owner and manager scopes always come from the caller's claims and replace
/// whatever the client put in the filter.
pub struct CardService {
    cards: Arc<dyn CardStore>,
    employees: Arc<dyn EmployeeStore>,
    cursors: Arc<CursorCodec>,
    phones: Arc<dyn PhoneNormalizer>,
    clock: Arc<dyn Clock>,
}

impl CardService {
    pub fn new(
        cards: Arc<dyn CardStore>,
        employees: Arc<dyn EmployeeStore>,
        cursors: Arc<CursorCodec>,
        phones: Arc<dyn PhoneNormalizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cards,
            employees,
            cursors,
            phones,
            clock,
        }
    }

    #[instrument(
        skip(self, claims, request),
        fields(method = "CreateBusinessCard", username = %claims.code)
    )]
    pub async fn create_card(
        &self,
        claims: &Claims,
        request: &CardContactRequest,
    ) -> DomainResult<Card> {
        claims.require_authenticated()?;
        let numbers = request.validate(self.phones.as_ref())?;
        let employee = self.caller_employee(claims).await?;

        let card = Card::new_from_employee(&employee, &numbers, self.clock.now());
        self.cards.create_card(&card).await.map_err(|e| {
            let conflict = matches!(e, StoreError::Conflict(_));
            let err = store_failure("create_card", e);
            if conflict {
                DomainError::failed_precondition(CREATE_CONFLICT)
            } else {
                err
            }
        })?;
        info!(card_id = %card.id, "card submitted");
        Ok(card)
    }

    /// Re-submit one of the caller's own cards with their current profile.
    #[instrument(
        skip(self, claims, request),
        fields(method = "UpdateBusinessCard", username = %claims.code, card_id = %id)
    )]
    pub async fn update_card(
        &self,
        claims: &Claims,
        id: &CardId,
        request: &CardContactRequest,
    ) -> DomainResult<Card> {
        claims.require_authenticated()?;
        let numbers = request.validate(self.phones.as_ref())?;
        let employee = self.caller_employee(claims).await?;

        let mut card = self
            .find_scoped(CardFilter::by_id(id.clone()).owned_by(claims.id))
            .await?;
        claims.require_card_owner(card.employee_id)?;

        if let Transition::Applied { from } =
            card.update_from_employee(&employee, &numbers, self.clock.now())?
        {
            self.cards
                .save_card(&card, from, true)
                .await
                .map_err(|e| store_failure("save_card", e))?;
        }
        Ok(card)
    }

    #[instrument(
        skip(self, claims),
        fields(method = "GetMyBusinessCardByID", username = %claims.code, card_id = %id)
    )]
    pub async fn get_my_card(&self, claims: &Claims, id: &CardId) -> DomainResult<Card> {
        claims.require_authenticated()?;
        let card = self
            .find_scoped(CardFilter::by_id(id.clone()).owned_by(claims.id))
            .await?;
        claims.require_card_owner(card.employee_id)?;
        Ok(card)
    }

    #[instrument(
        skip(self, claims, filter),
        fields(method = "ListMyBusinessCards", username = %claims.code)
    )]
    pub async fn list_my_cards(
        &self,
        claims: &Claims,
        filter: CardFilter,
        page_size: Option<i64>,
        page_token: Option<&str>,
    ) -> DomainResult<Page<Card>> {
        claims.require_authenticated()?;
        let filter = CardFilter {
            id: None,
            manager: None,
            employee_id: None,
            ..filter
        }
        .owned_by(claims.id);
        self.list(&filter, page_size, page_token).await
    }

    #[instrument(
        skip(self, claims, filter),
        fields(method = "ListMyApprovalBusinessCards", username = %claims.code)
    )]
    pub async fn list_my_approvals(
        &self,
        claims: &Claims,
        filter: CardFilter,
        page_size: Option<i64>,
        page_token: Option<&str>,
    ) -> DomainResult<Page<Card>> {
        claims.require_authenticated()?;
        let filter = CardFilter {
            id: None,
            owner: None,
            ..filter
        }
        .managed_by(claims.id);
        self.list(&filter, page_size, page_token).await
    }

    #[instrument(
        skip(self, claims),
        fields(method = "GetMyApprovalBusinessCardByID", username = %claims.code, card_id = %id)
    )]
    pub async fn get_my_approval(&self, claims: &Claims, id: &CardId) -> DomainResult<Card> {
        claims.require_authenticated()?;
        let card = self
            .find_scoped(CardFilter::by_id(id.clone()).managed_by(claims.id))
            .await?;
        claims.require_card_manager(card.manager_id)?;
        Ok(card)
    }

    /// HR only.
    #[instrument(
        skip(self, claims, filter),
        fields(method = "ListBusinessCards", username = %claims.code)
    )]
    pub async fn list_cards(
        &self,
        claims: &Claims,
        filter: CardFilter,
        page_size: Option<i64>,
        page_token: Option<&str>,
    ) -> DomainResult<Page<Card>> {
        claims.require_hr()?;
        let filter = CardFilter {
            id: None,
            owner: None,
            manager: None,
            ..filter
        };
        self.list(&filter, page_size, page_token).await
    }

    /// HR only.
    #[instrument(
        skip(self, claims),
        fields(method = "GetBusinessCardByID", username = %claims.code, card_id = %id)
    )]
    pub async fn get_card(&self, claims: &Claims, id: &CardId) -> DomainResult<Card> {
        claims.require_hr()?;
        self.find_scoped(CardFilter::by_id(id.clone())).await
    }

    /// Manager of the card owner only.
    #[instrument(
        skip(self, claims, request),
        fields(method = "ApproveBusinessCard", username = %claims.code)
    )]
    pub async fn approve(&self, claims: &Claims, request: &ApproveCard) -> DomainResult<Card> {
        claims.require_authenticated()?;
        let id = request.validate()?;
        let mut card = self
            .find_scoped(CardFilter::by_id(id).managed_by(claims.id))
            .await?;
        claims.require_card_manager(card.manager_id)?;

        let transition = card.approve(&claims.code, self.clock.now())?;
        self.persist(&card, transition).await?;
        Ok(card)
    }

    /// Manager of the card owner only.
    #[instrument(
        skip(self, claims, request),
        fields(method = "RejectBusinessCard", username = %claims.code)
    )]
    pub async fn reject(&self, claims: &Claims, request: &RejectCard) -> DomainResult<Card> {
        claims.require_authenticated()?;
        let (id, remark) = request.validate()?;
        let mut card = self
            .find_scoped(CardFilter::by_id(id).managed_by(claims.id))
            .await?;
        claims.require_card_manager(card.manager_id)?;

        let transition = card.reject(&claims.code, &remark, self.clock.now())?;
        self.persist(&card, transition).await?;
        Ok(card)
    }

    /// HR only.
    #[instrument(
        skip(self, claims, request),
        fields(method = "PublishBusinessCard", username = %claims.code)
    )]
    pub async fn publish(&self, claims: &Claims, request: &PublishCard) -> DomainResult<Card> {
        claims.require_hr()?;
        let id = request.validate()?;
        let mut card = self.find_scoped(CardFilter::by_id(id)).await?;

        let transition = card.publish(&claims.code, self.clock.now())?;
        self.persist(&card, transition).await?;
        Ok(card)
    }

    /// Base64 of the vCard of a PUBLISHED card, for any signed-in caller.
    ///
    /// Unpublished and missing cards are refused alike.
    #[instrument(
        skip(self, claims),
        fields(method = "GetMyVCFBusinessCardByID", username = %claims.code, card_id = %id)
    )]
    pub async fn get_published_vcard(&self, claims: &Claims, id: &CardId) -> DomainResult<String> {
        claims.require_authenticated()?;
        let filter = CardFilter {
            status: Some(CardStatus::Published),
            ..CardFilter::by_id(id.clone())
        };
        let card = self.find_scoped(filter).await?;
        Ok(STANDARD.encode(vcard::render(&card)))
    }

    async fn caller_employee(&self, claims: &Claims) -> DomainResult<Employee> {
        let employee = self
            .employees
            .get_employee(claims.id)
            .await
            .map_err(|e| store_failure("get_employee", e))?;
        employee.ok_or_else(|| {
            info!("caller has no employee record");
            DomainError::permission_denied(
                "You are not allowed to access this employee or (it may not exist)",
            )
        })
    }

    async fn find_scoped(&self, filter: CardFilter) -> DomainResult<Card> {
        let card = self
            .cards
            .find_card(&filter)
            .await
            .map_err(|e| store_failure("find_card", e))?;
        card.ok_or_else(|| {
            info!("card not found in caller scope");
            not_allowed()
        })
    }

    async fn list(
        &self,
        filter: &CardFilter,
        page_size: Option<i64>,
        page_token: Option<&str>,
    ) -> DomainResult<Page<Card>> {
        let request =
            PageRequest::from_client(&self.cursors, CursorKind::Card, page_size, page_token)?;
        let rows = self
            .cards
            .list_cards(filter, &request)
            .await
            .map_err(|e| store_failure("list_cards", e))?;
        Ok(Page::from_rows(rows, &request, &self.cursors, card_cursor))
    }

    async fn persist(&self, card: &Card, transition: Transition) -> DomainResult<()> {
        match transition {
            Transition::Unchanged => {
                info!(card_id = %card.id, status = %card.status, "already in target status");
                Ok(())
            }
            Transition::Applied { from } => {
                self.cards
                    .save_card(card, from, false)
                    .await
                    .map_err(|e| store_failure("save_card", e))?;
                info!(card_id = %card.id, %from, to = %card.status, "card status changed");
                Ok(())
            }
        }
    }
}
