//! Infrastructure layer: configuration, storage adapters and the application
//! services that sit on top of them.

pub mod config;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};

    use cardhub_auth::{Account, Claims, TokenKeys, TokenService};
    use cardhub_core::{CursorCodec, EmployeeId};
    use cardhub_employees::{Employee, OrgUnit};

    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    pub fn employee(id: i64, manager: i64) -> Employee {
        Employee {
            id: EmployeeId::new(id),
            code: format!("E{id:03}"),
            display_name: format!("Employee {id}"),
            manager_id: EmployeeId::new(manager),
            department: OrgUnit::new(3, "Engineering"),
            position: OrgUnit::new(11, "Developer"),
            company: OrgUnit::new(1, "Acme Lao"),
            email: format!("e{id}@example.com"),
            phone: String::new(),
            mobile: String::new(),
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    pub fn hr(id: i64) -> Employee {
        let mut e = employee(id, 0);
        e.department = OrgUnit::new(9, "Human Resources");
        e
    }

    pub fn claims_for(employee: &Employee, is_hr: bool) -> Claims {
        Claims::for_account(&Account {
            username: employee.code.clone(),
            employee: employee.clone(),
            password_hash: String::new(),
            is_hr,
        })
    }

    pub fn token_service() -> TokenService {
        TokenService::new(
            TokenKeys::new(
                b"access-key-access-key-access-key-0001",
                b"refresh-key-refresh-key-refresh-key-01",
            )
            .unwrap(),
        )
    }

    pub fn cursor_codec() -> CursorCodec {
        CursorCodec::new(b"cursor-key-cursor-key-cursor-key-0001".to_vec()).unwrap()
    }
}
