use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::DelegateRow;

const SQL_SELECT_DELEGATE: &str = r#"
SELECT
  d.id,
  d.name,
  d.email,
  d.phone,
  d.organization,
  d.status,
  d.badge_id,
  d.conference_id,
  c.name AS conference_name,
  d.check_in_status,
  d.check_in_time,
  (
    SELECT COUNT(*)
    FROM registrations r
    WHERE r.delegate_id = d.id
  ) AS registered_events
FROM delegates d
LEFT JOIN conferences c ON c.id = d.conference_id
"#;

/// Every delegate in insertion order. This is the check-in roster.
pub async fn list_roster(pool: &SqlitePool) -> sqlx::Result<Vec<DelegateRow>> {
    let sql = format!("{SQL_SELECT_DELEGATE} ORDER BY d.rowid ASC");
    sqlx::query_as::<_, DelegateRow>(&sql).fetch_all(pool).await
}

pub async fn list_delegates(
    pool: &SqlitePool,
    status: Option<&str>,
) -> sqlx::Result<Vec<DelegateRow>> {
    let sql = format!("{SQL_SELECT_DELEGATE} WHERE (?1 IS NULL OR d.status = ?1) ORDER BY d.rowid ASC");
    sqlx::query_as::<_, DelegateRow>(&sql)
        .bind(status)
        .fetch_all(pool)
        .await
}

pub async fn load_delegate(pool: &SqlitePool, delegate_id: &str) -> sqlx::Result<Option<DelegateRow>> {
    let sql = format!("{SQL_SELECT_DELEGATE} WHERE d.id = ?1 LIMIT 1");
    sqlx::query_as::<_, DelegateRow>(&sql)
        .bind(delegate_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email<'e>(
    executor: impl SqliteExecutor<'e>,
    email: &str,
) -> sqlx::Result<Option<DelegateRow>> {
    let sql = format!(
        "{SQL_SELECT_DELEGATE} WHERE LOWER(d.email) = LOWER(?1) ORDER BY d.rowid ASC LIMIT 1"
    );
    sqlx::query_as::<_, DelegateRow>(&sql)
        .bind(email.trim())
        .fetch_optional(executor)
        .await
}

const SQL_MAX_BADGE_NUMBER: &str = r#"
SELECT MAX(CAST(SUBSTR(badge_id, 5) AS INTEGER))
FROM delegates
WHERE badge_id LIKE 'DEL-%'
"#;

/// Highest numeric suffix among `DEL-nnnn` badge ids.
pub async fn max_badge_number<'e>(executor: impl SqliteExecutor<'e>) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar::<_, Option<i64>>(SQL_MAX_BADGE_NUMBER)
        .fetch_one(executor)
        .await
}

const SQL_INSERT_DELEGATE: &str = r#"
INSERT INTO delegates (
  id,
  name,
  email,
  phone,
  organization,
  status,
  badge_id,
  conference_id,
  check_in_status,
  check_in_time
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

#[derive(Debug, Clone, Copy)]
pub struct NewDelegate<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub organization: Option<&'a str>,
    pub status: &'a str, // active|inactive|pending
    pub badge_id: &'a str,
    pub conference_id: Option<&'a str>,
    pub check_in_status: &'a str,
    pub check_in_time: Option<&'a str>,
}

/// Fails with a unique violation when `row.badge_id` is taken.
pub async fn insert_delegate<'e>(
    executor: impl SqliteExecutor<'e>,
    row: NewDelegate<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_DELEGATE)
        .bind(row.id)
        .bind(row.name)
        .bind(row.email)
        .bind(row.phone)
        .bind(row.organization)
        .bind(row.status)
        .bind(row.badge_id)
        .bind(row.conference_id)
        .bind(row.check_in_status)
        .bind(row.check_in_time)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_UPDATE_DELEGATE: &str = r#"
UPDATE delegates
SET name = ?,
    email = ?,
    phone = ?,
    organization = ?,
    status = ?,
    conference_id = ?
WHERE id = ?
"#;

#[derive(Debug, Clone, Copy)]
pub struct DelegateChanges<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub organization: Option<&'a str>,
    pub status: &'a str,
    pub conference_id: Option<&'a str>,
}

pub async fn update_delegate(
    pool: &SqlitePool,
    delegate_id: &str,
    changes: DelegateChanges<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_DELEGATE)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.organization)
        .bind(changes.status)
        .bind(changes.conference_id)
        .bind(delegate_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_ASSIGN_CONFERENCE: &str = r#"
UPDATE delegates
SET conference_id = ?
WHERE id = ?
  AND conference_id IS NULL
"#;

/// Attaches a delegate without a conference to `conference_id`.
pub async fn assign_conference_if_unset<'e>(
    executor: impl SqliteExecutor<'e>,
    delegate_id: &str,
    conference_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_ASSIGN_CONFERENCE)
        .bind(conference_id)
        .bind(delegate_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_MARK_CHECKED_IN: &str = r#"
UPDATE delegates
SET check_in_status = 'checked-in',
    check_in_time = ?
WHERE id = ?
  AND check_in_status = 'not-checked-in'
"#;

pub async fn mark_checked_in(
    pool: &SqlitePool,
    delegate_id: &str,
    check_in_time: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_CHECKED_IN)
        .bind(check_in_time)
        .bind(delegate_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_DELEGATE: &str = r#"
DELETE FROM delegates
WHERE id = ?
"#;

pub async fn delete_delegate(pool: &SqlitePool, delegate_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_DELEGATE)
        .bind(delegate_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
