use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cardhub_core::{EmployeeId, Entity};

/// A reference into the org chart (department, position or company).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgUnit {
    pub id: i64,
    pub name: String,
}

impl OrgUnit {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Normalized phone numbers carried by employees and cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumbers {
    pub phone: String,
    pub mobile: String,
}

/// Employee profile as read from the HR system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    /// Employee code, also the login username.
    pub code: String,
    pub display_name: String,
    /// `EmployeeId::default()` when the employee reports to nobody.
    pub manager_id: EmployeeId,
    pub department: OrgUnit,
    pub position: OrgUnit,
    pub company: OrgUnit,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn contact_numbers(&self) -> ContactNumbers {
        ContactNumbers {
            phone: self.phone.clone(),
            mobile: self.mobile.clone(),
        }
    }

    /// Apply the numbers an employee submitted with a card request.
    pub fn set_contact_numbers(&mut self, numbers: &ContactNumbers) {
        self.phone = numbers.phone.clone();
        self.mobile = numbers.mobile.clone();
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn employee() -> Employee {
        Employee {
            id: EmployeeId::new(42),
            code: "E042".into(),
            display_name: "Noy Vongsa".into(),
            manager_id: EmployeeId::new(7),
            department: OrgUnit::new(3, "Engineering"),
            position: OrgUnit::new(11, "Developer"),
            company: OrgUnit::new(1, "Acme Lao"),
            email: "noy@example.com".into(),
            phone: String::new(),
            mobile: String::new(),
            created_at: Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn contact_numbers_are_written_back() {
        let mut e = employee();
        e.set_contact_numbers(&ContactNumbers {
            phone: "+856 21 123456".into(),
            mobile: "+856 20 55512345".into(),
        });
        assert_eq!(e.phone, "+856 21 123456");
        assert_eq!(e.contact_numbers().mobile, "+856 20 55512345");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(employee()).unwrap();
        assert_eq!(json["displayName"], "Noy Vongsa");
        assert_eq!(json["managerId"], 7);
        assert_eq!(json["department"]["name"], "Engineering");
    }
}
