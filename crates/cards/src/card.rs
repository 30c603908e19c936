use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use cardhub_core::{CardId, DomainError, DomainResult, EmployeeId, Entity};
use cardhub_employees::{ContactNumbers, Employee, OrgUnit};

use crate::CardStatus;

/// Outcome of a guarded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The card was already in the target state. Nothing to persist.
    Unchanged,
    /// The card moved; `from` is the status the store must still see when
    /// it writes, or the write loses a race.
    Applied { from: CardStatus },
}

/// Business card: a snapshot of an employee's profile going through review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub employee_id: EmployeeId,
    pub employee_code: String,
    /// Owner's manager when the card was last submitted; the approver.
    pub manager_id: EmployeeId,
    pub display_name: String,
    pub position: OrgUnit,
    pub department: OrgUnit,
    pub company: OrgUnit,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub remark: String,
    pub status: CardStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

impl Card {
    /// New PENDING card for `employee` with the numbers they submitted.
    ///
    /// Timestamps are truncated to microseconds so they survive a round trip
    /// through the database unchanged.
    pub fn new_from_employee(
        employee: &Employee,
        numbers: &ContactNumbers,
        at: DateTime<Utc>,
    ) -> Self {
        let at = at.trunc_subsecs(6);
        Self {
            id: CardId::generate(),
            employee_id: employee.id,
            employee_code: employee.code.clone(),
            manager_id: employee.manager_id,
            display_name: employee.display_name.clone(),
            position: employee.position.clone(),
            department: employee.department.clone(),
            company: employee.company.clone(),
            email: employee.email.clone(),
            phone: numbers.phone.clone(),
            mobile: numbers.mobile.clone(),
            remark: String::new(),
            status: CardStatus::Pending,
            created_at: at,
            updated_at: at,
            created_by: employee.code.clone(),
            updated_by: employee.code.clone(),
        }
    }

    pub fn approve(&mut self, actor: &str, at: DateTime<Utc>) -> DomainResult<Transition> {
        if self.status == CardStatus::Approved {
            return Ok(Transition::Unchanged);
        }
        self.require(CardStatus::Pending, "Only PENDING status can be APPROVED.")?;
        Ok(self.apply(CardStatus::Approved, actor, at))
    }

    /// `remark` must be non-empty; request validation normally catches this first.
    pub fn reject(
        &mut self,
        actor: &str,
        remark: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Transition> {
        if self.status == CardStatus::Rejected {
            return Ok(Transition::Unchanged);
        }
        let remark = remark.trim();
        if remark.is_empty() {
            return Err(DomainError::invalid_field("remark", "remark must not be empty"));
        }
        self.require(CardStatus::Pending, "Only PENDING status can be REJECTED.")?;
        self.remark = remark.to_string();
        Ok(self.apply(CardStatus::Rejected, actor, at))
    }

    pub fn publish(&mut self, actor: &str, at: DateTime<Utc>) -> DomainResult<Transition> {
        if self.status == CardStatus::Published {
            return Ok(Transition::Unchanged);
        }
        self.require(CardStatus::Approved, "Only APPROVED status can be PUBLISHED.")?;
        Ok(self.apply(CardStatus::Published, actor, at))
    }

    /// Re-submit the card with the owner's current profile.
    ///
    /// Allowed from PENDING and REJECTED; always lands in PENDING.
    pub fn update_from_employee(
        &mut self,
        employee: &Employee,
        numbers: &ContactNumbers,
        at: DateTime<Utc>,
    ) -> DomainResult<Transition> {
        if !matches!(self.status, CardStatus::Pending | CardStatus::Rejected) {
            return Err(DomainError::failed_precondition(format!(
                "Card is in {} status. Only PENDING and REJECTED status can be updated.",
                self.status
            )));
        }
        self.manager_id = employee.manager_id;
        self.display_name = employee.display_name.clone();
        self.position = employee.position.clone();
        self.department = employee.department.clone();
        self.company = employee.company.clone();
        self.email = employee.email.clone();
        self.phone = numbers.phone.clone();
        self.mobile = numbers.mobile.clone();
        Ok(self.apply(CardStatus::Pending, &employee.code, at))
    }

    pub fn contact_numbers(&self) -> ContactNumbers {
        ContactNumbers {
            phone: self.phone.clone(),
            mobile: self.mobile.clone(),
        }
    }

    fn require(&self, expected: CardStatus, rule: &str) -> DomainResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(DomainError::failed_precondition(format!(
                "Card is in {} status. {rule}",
                self.status
            )))
        }
    }

    fn apply(&mut self, to: CardStatus, actor: &str, at: DateTime<Utc>) -> Transition {
        let from = self.status;
        self.status = to;
        self.updated_by = actor.to_string();
        self.updated_at = at.trunc_subsecs(6);
        Transition::Applied { from }
    }
}

impl Entity for Card {
    type Id = CardId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
