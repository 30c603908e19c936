use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use cardhub_auth::Account;
use cardhub_cards::{Card, CardFilter, CardStatus};
use cardhub_core::{CardId, EmployeeId, PageRequest};
use cardhub_employees::{Employee, EmployeeFilter};

use super::{AccountStore, CardStore, EmployeeStore, StoreError, card_key, employee_key};

#[derive(Debug, Clone)]
struct AccountRow {
    employee_id: EmployeeId,
    password_hash: String,
    is_hr: bool,
}

#[derive(Debug, Default)]
struct State {
    employees: BTreeMap<EmployeeId, Employee>,
    accounts: HashMap<String, AccountRow>,
    cards: HashMap<CardId, Card>,
}

/// In-memory directory.
///
/// Intended for tests/dev. Every write takes the single lock, which makes
/// multi-row writes atomic.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<State>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an employee record.
    pub fn upsert_employee(&self, employee: Employee) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.employees.insert(employee.id, employee);
        Ok(())
    }

    /// Add or replace a login for an existing employee.
    pub fn upsert_account(
        &self,
        username: impl Into<String>,
        employee_id: EmployeeId,
        password_hash: impl Into<String>,
        is_hr: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if !state.employees.contains_key(&employee_id) {
            return Err(StoreError::Backend(format!("unknown employee {employee_id}")));
        }
        state.accounts.insert(
            username.into(),
            AccountRow {
                employee_id,
                password_hash: password_hash.into(),
                is_hr,
            },
        );
        Ok(())
    }

    /// Drop an employee and their logins, as an HR offboarding would.
    pub fn remove_employee(&self, id: EmployeeId) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.employees.remove(&id);
        state.accounts.retain(|_, row| row.employee_id != id);
        Ok(())
    }

    /// Insert a card as-is, bypassing the create path. Test seeding only.
    pub fn put_card(&self, card: Card) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.cards.insert(card.id.clone(), card);
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryDirectory {
    async fn find_account(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        let Some(row) = state.accounts.get(username) else {
            return Ok(None);
        };
        Ok(state.employees.get(&row.employee_id).map(|employee| Account {
            username: username.to_string(),
            employee: employee.clone(),
            password_hash: row.password_hash.clone(),
            is_hr: row.is_hr,
        }))
    }
}

#[async_trait]
impl EmployeeStore for InMemoryDirectory {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.employees.get(&id).cloned())
    }

    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: &PageRequest,
    ) -> Result<Vec<Employee>, StoreError> {
        let before = page.cursor().map(employee_key).transpose()?;
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .employees
            .values()
            .rev()
            .filter(|e| before.is_none_or(|b| e.id.get() < b))
            .filter(|e| filter.matches(e))
            .take(page.size() as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CardStore for InMemoryDirectory {
    async fn find_card(&self, filter: &CardFilter) -> Result<Option<Card>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        if let Some(id) = &filter.id {
            return Ok(state.cards.get(id).filter(|c| filter.matches(c)).cloned());
        }
        Ok(state.cards.values().find(|c| filter.matches(c)).cloned())
    }

    async fn list_cards(
        &self,
        filter: &CardFilter,
        page: &PageRequest,
    ) -> Result<Vec<Card>, StoreError> {
        let before = page.cursor().map(card_key).transpose()?;
        let state = self.state.read().map_err(poisoned)?;
        let mut rows: Vec<&Card> = state
            .cards
            .values()
            .filter(|c| filter.matches(c))
            .filter(|c| before.is_none_or(|key| (c.created_at, c.id.as_str()) < key))
            .collect();
        rows.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));
        Ok(rows
            .into_iter()
            .take(page.size() as usize)
            .cloned()
            .collect())
    }

    async fn create_card(&self, card: &Card) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.cards.contains_key(&card.id) {
            return Err(StoreError::Backend(format!("duplicate card id {}", card.id)));
        }
        let Some(owner) = state.employees.get_mut(&card.employee_id) else {
            return Err(StoreError::Backend(format!(
                "card owner {} does not exist",
                card.employee_id
            )));
        };
        owner.set_contact_numbers(&card.contact_numbers());
        state.cards.insert(card.id.clone(), card.clone());
        Ok(())
    }

    async fn save_card(
        &self,
        card: &Card,
        expected: CardStatus,
        write_back_contact: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        match state.cards.get(&card.id) {
            Some(stored) if stored.status == expected => {}
            Some(stored) => {
                return Err(StoreError::Conflict(format!(
                    "card {} is {}, expected {expected}",
                    card.id, stored.status
                )));
            }
            None => return Err(StoreError::Conflict(format!("card {} vanished", card.id))),
        }
        if write_back_contact {
            if let Some(owner) = state.employees.get_mut(&card.employee_id) {
                owner.set_contact_numbers(&card.contact_numbers());
            }
        }
        state.cards.insert(card.id.clone(), card.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardhub_core::{Cursor, CursorCodec, CursorKind, Page};
    use cardhub_employees::{ContactNumbers, OrgUnit};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn employee(id: i64, manager: i64) -> Employee {
        Employee {
            id: EmployeeId::new(id),
            code: format!("E{id:03}"),
            display_name: format!("Employee {id}"),
            manager_id: EmployeeId::new(manager),
            department: OrgUnit::new(1, "Ops"),
            position: OrgUnit::new(1, "Staff"),
            company: OrgUnit::new(1, "Acme"),
            email: String::new(),
            phone: String::new(),
            mobile: String::new(),
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn codec() -> CursorCodec {
        CursorCodec::new(b"in-memory-test-cursor-key".to_vec()).unwrap()
    }

    fn seeded(employees: i64) -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        for id in 1..=employees {
            dir.upsert_employee(employee(id, 1)).unwrap();
        }
        dir
    }

    fn card_key(c: &Card) -> Cursor {
        Cursor::new(CursorKind::Card, c.id.to_string(), c.created_at)
    }

    #[tokio::test]
    async fn employee_pages_walk_ids_descending_without_gaps() {
        let dir = seeded(7);
        let mut seen = Vec::new();
        let mut request = PageRequest::first(3);
        loop {
            let rows = dir.list_employees(&EmployeeFilter::default(), &request).await.unwrap();
            let page = Page::from_rows(rows, &request, &codec(), |e: &Employee| {
                Cursor::new(CursorKind::Employee, e.id.to_string(), e.created_at)
            });
            seen.extend(page.items.iter().map(|e| e.id.get()));
            if page.next_page_token.is_empty() {
                break;
            }
            request = PageRequest::first(3).after(codec().decode(&page.next_page_token).unwrap());
        }
        assert_eq!(seen, vec![7, 6, 5, 4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn card_pages_break_timestamp_ties_by_id() {
        let dir = seeded(1);
        // Five cards share one timestamp, two are newer.
        for i in 0..7 {
            let at = if i < 5 { t0() } else { t0() + Duration::seconds(i) };
            let card = Card::new_from_employee(&employee(1, 1), &ContactNumbers::default(), at);
            dir.put_card(card).unwrap();
        }

        let all = dir
            .list_cards(&CardFilter::default(), &PageRequest::first(100))
            .await
            .unwrap();
        assert_eq!(all.len(), 7);

        let mut paged = Vec::new();
        let mut request = PageRequest::first(2);
        loop {
            let rows = dir.list_cards(&CardFilter::default(), &request).await.unwrap();
            let page = Page::from_rows(rows, &request, &codec(), card_key);
            paged.extend(page.items);
            if page.next_page_token.is_empty() {
                break;
            }
            request = PageRequest::first(2).after(codec().decode(&page.next_page_token).unwrap());
        }
        assert_eq!(paged, all);

        let unique: std::collections::HashSet<_> = paged.iter().map(|c| c.id.clone()).collect();
        assert_eq!(unique.len(), 7);
    }

    #[tokio::test]
    async fn employee_listing_rejects_card_cursor() {
        let dir = seeded(2);
        // A digits-only card id still must not resume the employee listing.
        let request = PageRequest::first(5).after(Cursor::new(CursorKind::Card, "1", t0()));
        let err = dir
            .list_employees(&EmployeeFilter::default(), &request)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidCursor);
    }

    #[tokio::test]
    async fn card_listing_rejects_employee_cursor() {
        let dir = seeded(2);
        let request = PageRequest::first(5).after(Cursor::new(CursorKind::Employee, "2", t0()));
        let err = dir
            .list_cards(&CardFilter::default(), &request)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidCursor);
    }

    #[tokio::test]
    async fn create_card_writes_numbers_back() {
        let dir = seeded(1);
        let numbers = ContactNumbers {
            phone: "+85621123456".into(),
            mobile: "+8562055512345".into(),
        };
        let card = Card::new_from_employee(&employee(1, 1), &numbers, t0());
        dir.create_card(&card).await.unwrap();
        let owner = dir.get_employee(EmployeeId::new(1)).await.unwrap().unwrap();
        assert_eq!(owner.contact_numbers(), numbers);
    }

    #[tokio::test]
    async fn create_card_for_missing_owner_writes_nothing() {
        let dir = seeded(1);
        let card = Card::new_from_employee(&employee(9, 1), &ContactNumbers::default(), t0());
        assert!(dir.create_card(&card).await.is_err());
        let found = dir.find_card(&CardFilter::by_id(card.id.clone())).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn save_card_is_conditional_on_status() {
        let dir = seeded(1);
        let mut card = Card::new_from_employee(&employee(1, 1), &ContactNumbers::default(), t0());
        dir.create_card(&card).await.unwrap();

        let mut racer = card.clone();
        racer.reject("E001", "no", t0()).unwrap();
        dir.save_card(&racer, CardStatus::Pending, false).await.unwrap();

        card.approve("E001", t0()).unwrap();
        let err = dir.save_card(&card, CardStatus::Pending, false).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored = dir.find_card(&CardFilter::by_id(card.id.clone())).await.unwrap().unwrap();
        assert_eq!(stored.status, CardStatus::Rejected);
    }

    #[tokio::test]
    async fn scoped_lookup_hides_foreign_cards() {
        let dir = seeded(2);
        let card = Card::new_from_employee(&employee(2, 1), &ContactNumbers::default(), t0());
        dir.create_card(&card).await.unwrap();

        let mine = CardFilter::by_id(card.id.clone()).owned_by(EmployeeId::new(1));
        assert!(dir.find_card(&mine).await.unwrap().is_none());
        let theirs = CardFilter::by_id(card.id.clone()).owned_by(EmployeeId::new(2));
        assert!(dir.find_card(&theirs).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn accounts_join_their_employee() {
        let dir = seeded(1);
        dir.upsert_account("E001", EmployeeId::new(1), "hash", true).unwrap();
        let account = dir.find_account("E001").await.unwrap().unwrap();
        assert_eq!(account.employee.id, EmployeeId::new(1));
        assert!(account.is_hr);
        assert!(dir.find_account("nobody").await.unwrap().is_none());

        dir.remove_employee(EmployeeId::new(1)).unwrap();
        assert!(dir.find_account("E001").await.unwrap().is_none());
    }
}
