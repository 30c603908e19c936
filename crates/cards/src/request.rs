//! Inbound card requests and their boundary validation.
//!
//! Validation runs before any store access and reports every failing field
//! at once.

use serde::Deserialize;

use cardhub_core::{CardId, DomainError, DomainResult, FieldViolation};
use cardhub_employees::ContactNumbers;

use crate::{PhoneError, PhoneNormalizer, PhoneNumber};

/// Body of "create card" and "update card".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CardContactRequest {
    pub phone: PhoneNumber,
    /// Optional; an empty number means "no mobile".
    pub mobile: PhoneNumber,
}

impl CardContactRequest {
    pub fn validate(&self, normalizer: &dyn PhoneNormalizer) -> DomainResult<ContactNumbers> {
        let mut violations = Vec::new();

        let phone = normalized(normalizer, "phone", &self.phone, &mut violations);
        let mobile = if self.mobile.number.trim().is_empty() {
            String::new()
        } else {
            normalized(normalizer, "mobile", &self.mobile, &mut violations)
        };

        if !violations.is_empty() {
            return Err(DomainError::invalid_argument("Card request is invalid.", violations));
        }
        Ok(ContactNumbers { phone, mobile })
    }
}

fn normalized(
    normalizer: &dyn PhoneNormalizer,
    name: &str,
    phone: &PhoneNumber,
    violations: &mut Vec<FieldViolation>,
) -> String {
    match normalizer.normalize(phone) {
        Ok(number) => number,
        Err(e) => {
            let part = match e {
                PhoneError::MissingCountry | PhoneError::UnknownCountry(_) => "country",
                PhoneError::Empty | PhoneError::Invalid => "number",
            };
            violations.push(FieldViolation::new(format!("{name}.{part}"), format!("{name} {e}")));
            String::new()
        }
    }
}

fn card_id(raw: &str, violations: &mut Vec<FieldViolation>) -> Option<CardId> {
    match raw.parse::<CardId>() {
        Ok(id) => Some(id),
        Err(_) => {
            violations.push(FieldViolation::new("cardId", "cardId must not be empty"));
            None
        }
    }
}

fn single_card_id(raw: &str) -> DomainResult<CardId> {
    let mut violations = Vec::new();
    card_id(raw, &mut violations)
        .ok_or_else(|| DomainError::invalid_argument("Card request is invalid.", violations))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApproveCard {
    pub card_id: String,
}

impl ApproveCard {
    pub fn validate(&self) -> DomainResult<CardId> {
        single_card_id(&self.card_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishCard {
    pub card_id: String,
}

impl PublishCard {
    pub fn validate(&self) -> DomainResult<CardId> {
        single_card_id(&self.card_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RejectCard {
    pub card_id: String,
    pub remark: String,
}

impl RejectCard {
    /// Returns the card id and the trimmed remark.
    pub fn validate(&self) -> DomainResult<(CardId, String)> {
        let mut violations = Vec::new();
        let id = card_id(&self.card_id, &mut violations);
        let remark = self.remark.trim();
        if remark.is_empty() {
            violations.push(FieldViolation::new("remark", "remark must not be empty"));
        }
        match id {
            Some(id) if violations.is_empty() => Ok((id, remark.to_string())),
            _ => Err(DomainError::invalid_argument("Card request is invalid.", violations)),
        }
    }
}
