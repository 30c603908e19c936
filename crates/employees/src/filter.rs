use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cardhub_core::EmployeeId;

use crate::Employee;

/// Filter criteria for employee listings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFilter {
    pub code: Option<String>,
    pub manager_id: Option<EmployeeId>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    pub company_id: Option<i64>,
    /// Case-insensitive substring match.
    pub display_name: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl EmployeeFilter {
    /// In-process evaluation, used by the in-memory store.
    pub fn matches(&self, employee: &Employee) -> bool {
        if self.code.as_deref().is_some_and(|c| c != employee.code) {
            return false;
        }
        if self.manager_id.is_some_and(|m| m != employee.manager_id) {
            return false;
        }
        if self.department_id.is_some_and(|d| d != employee.department.id) {
            return false;
        }
        if self.position_id.is_some_and(|p| p != employee.position.id) {
            return false;
        }
        if self.company_id.is_some_and(|c| c != employee.company.id) {
            return false;
        }
        if let Some(needle) = &self.display_name {
            if !employee
                .display_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if self.created_after.is_some_and(|t| employee.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| employee.created_at >= t) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrgUnit;
    use chrono::TimeZone;

    fn employee(id: i64, name: &str, department: i64) -> Employee {
        Employee {
            id: EmployeeId::new(id),
            code: format!("E{id:03}"),
            display_name: name.into(),
            manager_id: EmployeeId::new(1),
            department: OrgUnit::new(department, "Dept"),
            position: OrgUnit::new(2, "Pos"),
            company: OrgUnit::new(1, "Co"),
            email: String::new(),
            phone: String::new(),
            mobile: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(EmployeeFilter::default().matches(&employee(1, "A", 1)));
    }

    #[test]
    fn display_name_is_case_insensitive_substring() {
        let filter = EmployeeFilter {
            display_name: Some("VONG".into()),
            ..Default::default()
        };
        assert!(filter.matches(&employee(1, "Noy Vongsa", 1)));
        assert!(!filter.matches(&employee(2, "Kham Phet", 1)));
    }

    #[test]
    fn created_range_is_half_open() {
        let filter = EmployeeFilter {
            created_after: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
            created_before: Some(Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(!filter.matches(&employee(1, "A", 1)));
        assert!(filter.matches(&employee(2, "A", 1)));
        assert!(filter.matches(&employee(3, "A", 1)));
        assert!(!filter.matches(&employee(4, "A", 1)));
    }

    #[test]
    fn org_filters_combine() {
        let filter = EmployeeFilter {
            department_id: Some(5),
            company_id: Some(1),
            ..Default::default()
        };
        assert!(filter.matches(&employee(1, "A", 5)));
        assert!(!filter.matches(&employee(1, "A", 6)));
    }
}
