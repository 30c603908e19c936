//! Card lifecycle status.
//!
//! Wire form is the upper-case name. Decoding also accepts the raw ordinal
//! (as a number or a numeric string); ordinals outside the known range are
//! kept as [`CardStatus::Unrecognized`] instead of failing.

use core::fmt;
use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CardStatus {
    #[default]
    Unspecified,
    Pending,
    Approved,
    Rejected,
    Published,
    /// A raw ordinal this build does not know about.
    Unrecognized(i32),
}

const NAMES: [(CardStatus, &str); 5] = [
    (CardStatus::Unspecified, "UNSPECIFIED"),
    (CardStatus::Pending, "PENDING"),
    (CardStatus::Approved, "APPROVED"),
    (CardStatus::Rejected, "REJECTED"),
    (CardStatus::Published, "PUBLISHED"),
];

impl CardStatus {
    pub fn from_ordinal(n: i32) -> Self {
        match n {
            0 => Self::Unspecified,
            1 => Self::Pending,
            2 => Self::Approved,
            3 => Self::Rejected,
            4 => Self::Published,
            other => Self::Unrecognized(other),
        }
    }

    pub fn ordinal(self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::Pending => 1,
            Self::Approved => 2,
            Self::Rejected => 3,
            Self::Published => 4,
            Self::Unrecognized(n) => n,
        }
    }

    /// Known name, or `None` for unrecognized ordinals.
    pub fn name(self) -> Option<&'static str> {
        NAMES.iter().find(|(s, _)| *s == self).map(|(_, n)| *n)
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Status({})", self.ordinal()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown card status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for CardStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((status, _)) = NAMES.iter().find(|(_, n)| n.eq_ignore_ascii_case(s)) {
            return Ok(*status);
        }
        let raw = s
            .strip_prefix("Status(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(s);
        raw.parse::<i32>()
            .map(Self::from_ordinal)
            .map_err(|_| UnknownStatus(s.to_string()))
    }
}

impl Serialize for CardStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct StatusVisitor;

impl<'de> Visitor<'de> for StatusVisitor {
    type Value = CardStatus;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a status name or ordinal")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        i32::try_from(v)
            .map(CardStatus::from_ordinal)
            .map_err(|_| E::custom(format!("status ordinal out of range: {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i32::try_from(v)
            .map(CardStatus::from_ordinal)
            .map_err(|_| E::custom(format!("status ordinal out of range: {v}")))
    }
}

impl<'de> Deserialize<'de> for CardStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StatusVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_name() {
        assert_eq!(serde_json::to_string(&CardStatus::Approved).unwrap(), "\"APPROVED\"");
        assert_eq!(serde_json::to_string(&CardStatus::Unspecified).unwrap(), "\"UNSPECIFIED\"");
    }

    #[test]
    fn decodes_name_or_ordinal() {
        let by_name: CardStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        let by_number: CardStatus = serde_json::from_str("3").unwrap();
        let by_numeric_string: CardStatus = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(by_name, CardStatus::Rejected);
        assert_eq!(by_number, CardStatus::Rejected);
        assert_eq!(by_numeric_string, CardStatus::Rejected);
    }

    #[test]
    fn unknown_ordinal_is_preserved() {
        let s: CardStatus = serde_json::from_str("9").unwrap();
        assert_eq!(s, CardStatus::Unrecognized(9));
        assert_eq!(s.to_string(), "Status(9)");
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"Status(9)\"");
        assert_eq!("Status(9)".parse::<CardStatus>().unwrap(), s);
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(serde_json::from_str::<CardStatus>("\"ARCHIVED\"").is_err());
    }

    #[test]
    fn ordinals_round_trip() {
        for n in 0..=4 {
            assert_eq!(CardStatus::from_ordinal(n).ordinal(), n);
        }
    }
}
