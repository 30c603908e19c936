use std::sync::Arc;

use tracing::{info, instrument};

use cardhub_auth::Claims;
use cardhub_core::{
    Cursor, CursorCodec, CursorKind, DomainError, DomainResult, EmployeeId, Page, PageRequest,
};
use cardhub_employees::{Employee, EmployeeFilter};

use super::store_failure;
use crate::store::EmployeeStore;

const NOT_ALLOWED_EMPLOYEE: &str =
    "You are not allowed to access this employee or (it may not exist)";

fn employee_cursor(e: &Employee) -> Cursor {
    Cursor::new(CursorKind::Employee, e.id.to_string(), e.created_at)
}

pub struct EmployeeService {
    employees: Arc<dyn EmployeeStore>,
    cursors: Arc<CursorCodec>,
}

impl EmployeeService {
    pub fn new(employees: Arc<dyn EmployeeStore>, cursors: Arc<CursorCodec>) -> Self {
        Self { employees, cursors }
    }

    /// HR only.
    #[instrument(
        skip(self, claims, filter),
        fields(method = "ListEmployees", username = %claims.code)
    )]
    pub async fn list_employees(
        &self,
        claims: &Claims,
        filter: &EmployeeFilter,
        page_size: Option<i64>,
        page_token: Option<&str>,
    ) -> DomainResult<Page<Employee>> {
        claims.require_hr()?;
        let request =
            PageRequest::from_client(&self.cursors, CursorKind::Employee, page_size, page_token)?;

        let rows = self
            .employees
            .list_employees(filter, &request)
            .await
            .map_err(|e| store_failure("list_employees", e))?;
        Ok(Page::from_rows(rows, &request, &self.cursors, employee_cursor))
    }

    /// HR only.
    #[instrument(skip(self, claims), fields(method = "GetEmployeeByID", username = %claims.code))]
    pub async fn get_employee(&self, claims: &Claims, id: EmployeeId) -> DomainResult<Employee> {
        claims.require_hr()?;
        self.load(id).await
    }

    /// The caller's own record, looked up by the id in their token.
    #[instrument(
        skip(self, claims),
        fields(method = "GetMyEmployeeProfile", username = %claims.code)
    )]
    pub async fn my_profile(&self, claims: &Claims) -> DomainResult<Employee> {
        claims.require_authenticated()?;
        self.load(claims.id).await
    }

    async fn load(&self, id: EmployeeId) -> DomainResult<Employee> {
        let employee = self
            .employees
            .get_employee(id)
            .await
            .map_err(|e| store_failure("get_employee", e))?;
        employee.ok_or_else(|| {
            info!(employee_id = %id, "employee not found");
            DomainError::permission_denied(NOT_ALLOWED_EMPLOYEE)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDirectory;
    use crate::test_support::{claims_for, cursor_codec, employee, hr};

    fn service() -> EmployeeService {
        let dir = Arc::new(InMemoryDirectory::new());
        for id in 2..=30 {
            dir.upsert_employee(employee(id, 1)).unwrap();
        }
        dir.upsert_employee(hr(1)).unwrap();
        EmployeeService::new(dir, Arc::new(cursor_codec()))
    }

    #[tokio::test]
    async fn listing_is_hr_only() {
        let svc = service();
        let staff = claims_for(&employee(5, 1), false);
        let err = svc
            .list_employees(&staff, &EmployeeFilter::default(), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PERMISSION_DENIED");

        let err = svc
            .list_employees(&Claims::default(), &EmployeeFilter::default(), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn hr_pages_through_everyone() {
        let svc = service();
        let hr_claims = claims_for(&hr(1), true);
        let filter = EmployeeFilter::default();

        let first = svc.list_employees(&hr_claims, &filter, None, None).await.unwrap();
        assert_eq!(first.items.len(), 20);
        assert!(!first.next_page_token.is_empty());

        let second = svc
            .list_employees(&hr_claims, &filter, None, Some(&first.next_page_token))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 10);
        assert!(second.next_page_token.is_empty());
        assert_eq!(second.items.last().map(|e| e.id.get()), Some(1));
    }

    #[tokio::test]
    async fn garbage_page_token_is_invalid_argument() {
        let svc = service();
        let hr_claims = claims_for(&hr(1), true);
        let err = svc
            .list_employees(&hr_claims, &EmployeeFilter::default(), None, Some("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(err.violations()[0].field, "pageToken");
    }

    #[tokio::test]
    async fn lookups_by_id() {
        let svc = service();
        let me = claims_for(&employee(5, 1), false);
        assert_eq!(svc.my_profile(&me).await.unwrap().id, EmployeeId::new(5));
        assert_eq!(
            svc.get_employee(&me, EmployeeId::new(6)).await.unwrap_err().code(),
            "PERMISSION_DENIED"
        );

        let hr_claims = claims_for(&hr(1), true);
        assert!(svc.get_employee(&hr_claims, EmployeeId::new(6)).await.is_ok());
        let missing = svc.get_employee(&hr_claims, EmployeeId::new(999)).await.unwrap_err();
        assert_eq!(missing.public_message(), NOT_ALLOWED_EMPLOYEE);
    }
}
