use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::RegistrationRow;

const SQL_SELECT_REGISTRATION: &str = r#"
SELECT
  r.id,
  r.delegate_id,
  d.name AS delegate_name,
  r.conference_id,
  c.name AS conference_name,
  r.registration_date,
  r.status,
  r.payment_status,
  r.ticket_type,
  r.amount_cents,
  r.payment_method
FROM registrations r
LEFT JOIN delegates d ON d.id = r.delegate_id
LEFT JOIN conferences c ON c.id = r.conference_id
"#;

/// Registrations newest first. `statuses` empty means all.
pub async fn list_registrations(
    pool: &SqlitePool,
    statuses: &[&str],
) -> sqlx::Result<Vec<RegistrationRow>> {
    let mut sql = SQL_SELECT_REGISTRATION.to_string();
    if !statuses.is_empty() {
        let placeholders = vec!["?"; statuses.len()].join(", ");
        sql.push_str(&format!("WHERE r.status IN ({placeholders})\n"));
    }
    sql.push_str("ORDER BY r.registration_date DESC, r.rowid DESC");

    let mut query = sqlx::query_as::<_, RegistrationRow>(&sql);
    for status in statuses {
        query = query.bind(*status);
    }
    query.fetch_all(pool).await
}

pub async fn load_registration(
    pool: &SqlitePool,
    registration_id: &str,
) -> sqlx::Result<Option<RegistrationRow>> {
    let sql = format!("{SQL_SELECT_REGISTRATION} WHERE r.id = ?1 LIMIT 1");
    sqlx::query_as::<_, RegistrationRow>(&sql)
        .bind(registration_id)
        .fetch_optional(pool)
        .await
}

const SQL_INSERT_REGISTRATION: &str = r#"
INSERT INTO registrations (
  id,
  delegate_id,
  conference_id,
  registration_date,
  status,
  payment_status,
  ticket_type,
  amount_cents,
  payment_method
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

#[derive(Debug, Clone, Copy)]
pub struct NewRegistration<'a> {
    pub id: &'a str,
    pub delegate_id: &'a str,
    pub conference_id: &'a str,
    pub registration_date: &'a str,
    pub status: &'a str,
    pub payment_status: &'a str,
    pub ticket_type: &'a str,
    pub amount_cents: i64,
    pub payment_method: Option<&'a str>,
}

pub async fn insert_registration<'e>(
    executor: impl SqliteExecutor<'e>,
    row: NewRegistration<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_REGISTRATION)
        .bind(row.id)
        .bind(row.delegate_id)
        .bind(row.conference_id)
        .bind(row.registration_date)
        .bind(row.status)
        .bind(row.payment_status)
        .bind(row.ticket_type)
        .bind(row.amount_cents)
        .bind(row.payment_method)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_UPDATE_REGISTRATION: &str = r#"
UPDATE registrations
SET status = ?,
    payment_status = ?,
    ticket_type = ?
WHERE id = ?
"#;

pub async fn update_registration(
    pool: &SqlitePool,
    registration_id: &str,
    status: &str,
    payment_status: &str,
    ticket_type: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_REGISTRATION)
        .bind(status)
        .bind(payment_status)
        .bind(ticket_type)
        .bind(registration_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_SET_STATUS: &str = r#"
UPDATE registrations
SET status = ?
WHERE id = ?
"#;

pub async fn set_status(pool: &SqlitePool, registration_id: &str, status: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_STATUS)
        .bind(status)
        .bind(registration_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
