//! Phone number normalization.
//!
//! [`E164Normalizer`] validates against the libphonenumber numbering plans
//! shipped with the `phonenumber` crate and stores the E.164 form.

use phonenumber::Mode;
use phonenumber::country::Id as Region;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A number as entered by the user, with the region it was entered for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneNumber {
    /// ISO 3166-1 alpha-2 region code.
    pub country: String,
    pub number: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("number must not be empty")]
    Empty,

    #[error("country must not be empty")]
    MissingCountry,

    #[error("unknown country code '{0}'")]
    UnknownCountry(String),

    #[error("number must be a valid number")]
    Invalid,
}

/// Turns user input into the canonical stored form.
pub trait PhoneNormalizer: Send + Sync {
    fn normalize(&self, phone: &PhoneNumber) -> Result<String, PhoneError>;
}

/// Produces `+<calling code><national number>` for numbers valid in their
/// region's numbering plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct E164Normalizer;

fn region(country: &str) -> Result<Option<Region>, PhoneError> {
    let country = country.trim();
    if country.is_empty() {
        return Ok(None);
    }
    country
        .to_ascii_uppercase()
        .parse::<Region>()
        .map(Some)
        .map_err(|_| PhoneError::UnknownCountry(country.to_string()))
}

impl PhoneNormalizer for E164Normalizer {
    fn normalize(&self, phone: &PhoneNumber) -> Result<String, PhoneError> {
        let raw = phone.number.trim();
        if raw.is_empty() {
            return Err(PhoneError::Empty);
        }
        let region = region(&phone.country)?;
        // Without a region only a `+`-prefixed number can be placed.
        if region.is_none() && !raw.starts_with('+') {
            return Err(PhoneError::MissingCountry);
        }

        let parsed = phonenumber::parse(region, raw).map_err(|_| PhoneError::Invalid)?;
        if !phonenumber::is_valid(&parsed) {
            return Err(PhoneError::Invalid);
        }
        Ok(parsed.format().mode(Mode::E164).to_string())
    }
}
