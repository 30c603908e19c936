use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cardhub_core::{CardId, EmployeeId};

use crate::{Card, CardStatus};

/// Filter criteria for card listings and scoped lookups.
///
/// `owner` and `manager` are scopes set by the service from the caller's
/// claims; client input never reaches them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFilter {
    pub id: Option<CardId>,
    pub owner: Option<EmployeeId>,
    pub manager: Option<EmployeeId>,
    pub employee_id: Option<EmployeeId>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    pub company_id: Option<i64>,
    /// Case-insensitive substring match.
    pub display_name: Option<String>,
    pub status: Option<CardStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl CardFilter {
    pub fn by_id(id: CardId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Restrict to cards owned by `employee`.
    pub fn owned_by(mut self, employee: EmployeeId) -> Self {
        self.owner = Some(employee);
        self
    }

    /// Restrict to cards `manager` is expected to review.
    pub fn managed_by(mut self, manager: EmployeeId) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn matches(&self, card: &Card) -> bool {
        if self.id.as_ref().is_some_and(|id| *id != card.id) {
            return false;
        }
        if self.owner.is_some_and(|o| o != card.employee_id) {
            return false;
        }
        if self.manager.is_some_and(|m| m != card.manager_id) {
            return false;
        }
        if self.employee_id.is_some_and(|e| e != card.employee_id) {
            return false;
        }
        if self.department_id.is_some_and(|d| d != card.department.id) {
            return false;
        }
        if self.position_id.is_some_and(|p| p != card.position.id) {
            return false;
        }
        if self.company_id.is_some_and(|c| c != card.company.id) {
            return false;
        }
        if let Some(needle) = &self.display_name {
            if !card
                .display_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != card.status) {
            return false;
        }
        if self.created_after.is_some_and(|t| card.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| card.created_at >= t) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardhub_employees::{ContactNumbers, Employee, OrgUnit};
    use chrono::TimeZone;

    fn card(owner: i64, manager: i64, status: CardStatus) -> Card {
        let employee = Employee {
            id: EmployeeId::new(owner),
            code: format!("E{owner:03}"),
            display_name: "Noy Vongsa".into(),
            manager_id: EmployeeId::new(manager),
            department: OrgUnit::new(3, "Engineering"),
            position: OrgUnit::new(11, "Developer"),
            company: OrgUnit::new(1, "Acme"),
            email: String::new(),
            phone: String::new(),
            mobile: String::new(),
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        };
        let mut card = Card::new_from_employee(
            &employee,
            &ContactNumbers::default(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        card.status = status;
        card
    }

    #[test]
    fn scopes_restrict_by_owner_and_manager() {
        let c = card(42, 7, CardStatus::Pending);
        assert!(CardFilter::default().owned_by(EmployeeId::new(42)).matches(&c));
        assert!(!CardFilter::default().owned_by(EmployeeId::new(99)).matches(&c));
        assert!(CardFilter::default().managed_by(EmployeeId::new(7)).matches(&c));
        assert!(!CardFilter::default().managed_by(EmployeeId::new(42)).matches(&c));
    }

    #[test]
    fn id_and_status_filters() {
        let c = card(42, 7, CardStatus::Approved);
        assert!(CardFilter::by_id(c.id.clone()).matches(&c));
        let other: CardId = "000000000000".parse().unwrap();
        assert!(!CardFilter::by_id(other).matches(&c));

        let pending_only = CardFilter {
            status: Some(CardStatus::Pending),
            ..Default::default()
        };
        assert!(!pending_only.matches(&c));
    }

    #[test]
    fn display_name_substring() {
        let c = card(42, 7, CardStatus::Pending);
        let f = CardFilter {
            display_name: Some("noy".into()),
            ..Default::default()
        };
        assert!(f.matches(&c));
    }
}
