use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cardhub_cards::{Card, CardFilter, CardStatus};
use cardhub_core::{EmployeeId, Page};
use cardhub_employees::{Employee, EmployeeFilter};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshTokenRequest {
    pub token: String,
}

/// `GET /v1/employees` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeeQuery {
    pub code: Option<String>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    pub company_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub display_name: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub page_token: Option<String>,
    pub page_size: Option<i64>,
}

impl EmployeeQuery {
    pub fn filter(&self) -> EmployeeFilter {
        EmployeeFilter {
            code: non_blank(&self.code),
            manager_id: self.manager_id.map(EmployeeId::new),
            department_id: self.department_id,
            position_id: self.position_id,
            company_id: self.company_id,
            display_name: non_blank(&self.display_name),
            created_after: self.created_after,
            created_before: self.created_before,
        }
    }
}

/// Query string shared by every card listing.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardQuery {
    pub employee_id: Option<i64>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    pub company_id: Option<i64>,
    pub display_name: Option<String>,
    pub status: Option<CardStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub page_token: Option<String>,
    pub page_size: Option<i64>,
}

impl CardQuery {
    /// Client-controllable criteria only; scopes are set by the service.
    pub fn filter(&self) -> CardFilter {
        CardFilter {
            employee_id: self.employee_id.map(EmployeeId::new),
            department_id: self.department_id,
            position_id: self.position_id,
            company_id: self.company_id,
            display_name: non_blank(&self.display_name),
            status: self.status,
            created_after: self.created_after,
            created_before: self.created_before,
            ..CardFilter::default()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Employee,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub employee: Employee,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfileResponse {
    pub employee_profile: Employee,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListResponse {
    pub employees: Vec<Employee>,
    pub next_page_token: String,
}

impl From<Page<Employee>> for EmployeeListResponse {
    fn from(page: Page<Employee>) -> Self {
        Self {
            employees: page.items,
            next_page_token: page.next_page_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub card: Card,
}

/// Base64 of the card's vCard.
#[derive(Debug, Serialize)]
pub struct VcfResponse {
    pub vcf: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardListResponse {
    pub business_cards: Vec<Card>,
    pub next_page_token: String,
}

impl From<Page<Card>> for CardListResponse {
    fn from(page: Page<Card>) -> Self {
        Self {
            business_cards: page.items,
            next_page_token: page.next_page_token,
        }
    }
}
