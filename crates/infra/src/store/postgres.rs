//! Postgres-backed directory.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (serialization failure) | `40001` | `Conflict` | Concurrent card writes |
//! | Database (unique violation) | `23505` | `Backend` | Card id collision |
//! | Database (other) | Any other | `Backend` | Schema or data errors |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` | Connectivity |
//! | Other | N/A | `Backend` | Decoding errors etc. |
//!
//! Multi-statement writes run at `SERIALIZABLE`. Status transitions are a
//! single `UPDATE ... WHERE status = $expected`; zero affected rows means a
//! concurrent writer got there first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::instrument;

use cardhub_auth::Account;
use cardhub_cards::{Card, CardFilter, CardStatus};
use cardhub_core::{CardId, EmployeeId, PageRequest};
use cardhub_employees::{Employee, EmployeeFilter, OrgUnit};

use super::{AccountStore, CardStore, EmployeeStore, StoreError, card_key, employee_key};

const SCHEMA: &str = include_str!("../../migrations/0001_directory.sql");

const EMPLOYEE_COLUMNS: &str = "e.id, e.code, e.display_name, e.manager_id, \
    e.department_id, e.department_name, e.position_id, e.position_name, \
    e.company_id, e.company_name, e.email, e.phone, e.mobile, e.created_at";

const CARD_COLUMNS: &str = "id, employee_id, employee_code, manager_id, display_name, \
    department_id, department_name, position_id, position_name, company_id, company_name, \
    email, phone, mobile, remark, status, created_at, updated_at, created_by, updated_by";

#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin_serializable(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;
        Ok(tx)
    }
}

async fn write_back_contact(
    tx: &mut Transaction<'static, Postgres>,
    card: &Card,
) -> Result<(), StoreError> {
    let result = sqlx::query("UPDATE employees SET phone = $1, mobile = $2 WHERE id = $3")
        .bind(&card.phone)
        .bind(&card.mobile)
        .bind(card.employee_id.get())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("write_back_contact", e))?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Backend(format!(
            "card owner {} does not exist",
            card.employee_id
        )));
    }
    Ok(())
}

#[async_trait]
impl AccountStore for PostgresDirectory {
    #[instrument(skip(self), err)]
    async fn find_account(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            "SELECT a.username, a.password_hash, a.is_hr, {EMPLOYEE_COLUMNS} \
             FROM accounts a JOIN employees e ON e.id = a.employee_id \
             WHERE a.username = $1"
        );
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_account", e))?;
        row.map(|row| {
            Ok(Account {
                username: row.try_get("username")?,
                password_hash: row.try_get("password_hash")?,
                is_hr: row.try_get("is_hr")?,
                employee: employee_from_row(&row)?,
            })
        })
        .transpose()
        .map_err(|e: sqlx::Error| map_sqlx_error("find_account", e))
    }
}

#[async_trait]
impl EmployeeStore for PostgresDirectory {
    #[instrument(skip(self), fields(employee_id = %id), err)]
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_employee", e))?;
        row.as_ref()
            .map(employee_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_employee", e))
    }

    #[instrument(skip(self, filter), fields(page_size = page.size()), err)]
    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: &PageRequest,
    ) -> Result<Vec<Employee>, StoreError> {
        let before = page.cursor().map(employee_key).transpose()?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE TRUE"
        ));
        if let Some(code) = &filter.code {
            qb.push(" AND e.code = ").push_bind(code.clone());
        }
        if let Some(manager) = filter.manager_id {
            qb.push(" AND e.manager_id = ").push_bind(manager.get());
        }
        push_org_filters(
            &mut qb,
            "e.",
            filter.department_id,
            filter.position_id,
            filter.company_id,
        );
        push_name_and_range(
            &mut qb,
            "e.",
            filter.display_name.as_deref(),
            filter.created_after,
            filter.created_before,
        );
        if let Some(before) = before {
            qb.push(" AND e.id < ").push_bind(before);
        }
        qb.push(" ORDER BY e.id DESC LIMIT ")
            .push_bind(i64::from(page.size()));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_employees", e))?;
        rows.iter()
            .map(employee_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_employees", e))
    }
}

#[async_trait]
impl CardStore for PostgresDirectory {
    #[instrument(skip(self, filter), err)]
    async fn find_card(&self, filter: &CardFilter) -> Result<Option<Card>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CARD_COLUMNS} FROM business_cards WHERE TRUE"
        ));
        push_card_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT 1");
        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_card", e))?;
        row.as_ref()
            .map(card_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("find_card", e))
    }

    #[instrument(skip(self, filter), fields(page_size = page.size()), err)]
    async fn list_cards(
        &self,
        filter: &CardFilter,
        page: &PageRequest,
    ) -> Result<Vec<Card>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CARD_COLUMNS} FROM business_cards WHERE TRUE"
        ));
        push_card_filter(&mut qb, filter);
        if let Some((created_at, id)) = page.cursor().map(card_key).transpose()? {
            qb.push(" AND (created_at, id) < (")
                .push_bind(created_at)
                .push(", ")
                .push_bind(id.to_string())
                .push(")");
        }
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(page.size()));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_cards", e))?;
        rows.iter()
            .map(card_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_cards", e))
    }

    #[instrument(
        skip(self, card),
        fields(card_id = %card.id, employee_id = %card.employee_id),
        err
    )]
    async fn create_card(&self, card: &Card) -> Result<(), StoreError> {
        let mut tx = self.begin_serializable().await?;

        let sql = format!(
            "INSERT INTO business_cards ({CARD_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
              $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)"
        );
        sqlx::query(&sql)
            .bind(card.id.as_str())
            .bind(card.employee_id.get())
            .bind(&card.employee_code)
            .bind(card.manager_id.get())
            .bind(&card.display_name)
            .bind(card.department.id)
            .bind(&card.department.name)
            .bind(card.position.id)
            .bind(&card.position.name)
            .bind(card.company.id)
            .bind(&card.company.name)
            .bind(&card.email)
            .bind(&card.phone)
            .bind(&card.mobile)
            .bind(&card.remark)
            .bind(card.status.ordinal())
            .bind(card.created_at)
            .bind(card.updated_at)
            .bind(&card.created_by)
            .bind(&card.updated_by)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_card", e))?;

        write_back_contact(&mut tx, card).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_card_commit", e))
    }

    #[instrument(
        skip(self, card),
        fields(card_id = %card.id, expected = %expected, status = %card.status),
        err
    )]
    async fn save_card(
        &self,
        card: &Card,
        expected: CardStatus,
        write_back: bool,
    ) -> Result<(), StoreError> {
        let mut tx = if write_back {
            self.begin_serializable().await?
        } else {
            self.pool
                .begin()
                .await
                .map_err(|e| map_sqlx_error("begin", e))?
        };

        let result = sqlx::query(
            r#"
            UPDATE business_cards SET
                manager_id = $3,
                display_name = $4,
                department_id = $5,
                department_name = $6,
                position_id = $7,
                position_name = $8,
                company_id = $9,
                company_name = $10,
                email = $11,
                phone = $12,
                mobile = $13,
                remark = $14,
                status = $15,
                updated_at = $16,
                updated_by = $17
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(card.id.as_str())
        .bind(expected.ordinal())
        .bind(card.manager_id.get())
        .bind(&card.display_name)
        .bind(card.department.id)
        .bind(&card.department.name)
        .bind(card.position.id)
        .bind(&card.position.name)
        .bind(card.company.id)
        .bind(&card.company.name)
        .bind(&card.email)
        .bind(&card.phone)
        .bind(&card.mobile)
        .bind(&card.remark)
        .bind(card.status.ordinal())
        .bind(card.updated_at)
        .bind(&card.updated_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("save_card", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "card {} is no longer {expected}",
                card.id
            )));
        }
        if write_back {
            write_back_contact(&mut tx, card).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("save_card_commit", e))
    }
}

fn push_org_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    prefix: &str,
    department: Option<i64>,
    position: Option<i64>,
    company: Option<i64>,
) {
    for (column, value) in [
        ("department_id", department),
        ("position_id", position),
        ("company_id", company),
    ] {
        if let Some(value) = value {
            qb.push(format!(" AND {prefix}{column} = ")).push_bind(value);
        }
    }
}

fn push_name_and_range(
    qb: &mut QueryBuilder<'_, Postgres>,
    prefix: &str,
    display_name: Option<&str>,
    created_after: Option<DateTime<Utc>>,
    created_before: Option<DateTime<Utc>>,
) {
    if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
        qb.push(format!(" AND {prefix}display_name ILIKE "))
            .push_bind(format!("%{}%", escape_like(name)));
    }
    if let Some(after) = created_after {
        qb.push(format!(" AND {prefix}created_at >= ")).push_bind(after);
    }
    if let Some(before) = created_before {
        qb.push(format!(" AND {prefix}created_at < ")).push_bind(before);
    }
}

fn push_card_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &CardFilter) {
    if let Some(id) = &filter.id {
        qb.push(" AND id = ").push_bind(id.as_str().to_string());
    }
    for scope in [filter.owner, filter.employee_id].into_iter().flatten() {
        qb.push(" AND employee_id = ").push_bind(scope.get());
    }
    if let Some(manager) = filter.manager {
        qb.push(" AND manager_id = ").push_bind(manager.get());
    }
    push_org_filters(qb, "", filter.department_id, filter.position_id, filter.company_id);
    push_name_and_range(
        qb,
        "",
        filter.display_name.as_deref(),
        filter.created_after,
        filter.created_before,
    );
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.ordinal());
    }
}

/// Escape `ILIKE` metacharacters (`\` is the default escape).
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `<kind>_id` and `<kind>_name` columns as one org-chart reference.
fn org_unit(row: &PgRow, kind: &str) -> Result<OrgUnit, sqlx::Error> {
    let id: i64 = row.try_get(format!("{kind}_id").as_str())?;
    let name: String = row.try_get(format!("{kind}_name").as_str())?;
    Ok(OrgUnit::new(id, name))
}

fn employee_from_row(row: &PgRow) -> Result<Employee, sqlx::Error> {
    Ok(Employee {
        id: EmployeeId::new(row.try_get("id")?),
        code: row.try_get("code")?,
        display_name: row.try_get("display_name")?,
        manager_id: EmployeeId::new(row.try_get("manager_id")?),
        department: org_unit(row, "department")?,
        position: org_unit(row, "position")?,
        company: org_unit(row, "company")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        mobile: row.try_get("mobile")?,
        created_at: row.try_get("created_at")?,
    })
}

fn card_from_row(row: &PgRow) -> Result<Card, sqlx::Error> {
    let id: String = row.try_get("id")?;
    Ok(Card {
        id: id
            .parse::<CardId>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        employee_id: EmployeeId::new(row.try_get("employee_id")?),
        employee_code: row.try_get("employee_code")?,
        manager_id: EmployeeId::new(row.try_get("manager_id")?),
        display_name: row.try_get("display_name")?,
        department: org_unit(row, "department")?,
        position: org_unit(row, "position")?,
        company: org_unit(row, "company")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        mobile: row.try_get("mobile")?,
        remark: row.try_get("remark")?,
        status: CardStatus::from_ordinal(row.try_get("status")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // serialization_failure: another transaction touched the same rows
                Some("40001") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
