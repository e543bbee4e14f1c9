use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::ConferenceRow;

const SQL_SELECT_CONFERENCE: &str = r#"
SELECT
  id,
  name,
  start_date,
  end_date,
  time_label,
  location,
  capacity,
  registered_count,
  status,
  description,
  price_cents,
  tags
FROM conferences
"#;

pub async fn list_conferences(pool: &SqlitePool) -> sqlx::Result<Vec<ConferenceRow>> {
    let sql = format!("{SQL_SELECT_CONFERENCE} ORDER BY start_date ASC, rowid ASC");
    sqlx::query_as::<_, ConferenceRow>(&sql).fetch_all(pool).await
}

/// Conferences still open for registration: upcoming and below capacity.
pub async fn list_available(pool: &SqlitePool) -> sqlx::Result<Vec<ConferenceRow>> {
    let sql = format!(
        "{SQL_SELECT_CONFERENCE} WHERE status = 'upcoming' AND registered_count < capacity \
         ORDER BY start_date ASC, rowid ASC"
    );
    sqlx::query_as::<_, ConferenceRow>(&sql).fetch_all(pool).await
}

pub async fn load_conference(
    pool: &SqlitePool,
    conference_id: &str,
) -> sqlx::Result<Option<ConferenceRow>> {
    let sql = format!("{SQL_SELECT_CONFERENCE} WHERE id = ?1 LIMIT 1");
    sqlx::query_as::<_, ConferenceRow>(&sql)
        .bind(conference_id)
        .fetch_optional(pool)
        .await
}

const SQL_INSERT_CONFERENCE: &str = r#"
INSERT INTO conferences (
  id,
  name,
  start_date,
  end_date,
  time_label,
  location,
  capacity,
  registered_count,
  status,
  description,
  price_cents,
  tags
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

#[derive(Debug, Clone, Copy)]
pub struct NewConference<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub start_date: &'a str,
    pub end_date: Option<&'a str>,
    pub time_label: Option<&'a str>,
    pub location: &'a str,
    pub capacity: i64,
    pub registered_count: i64,
    pub status: &'a str,
    pub description: Option<&'a str>,
    pub price_cents: i64,
    pub tags: Option<&'a str>,
}

pub async fn insert_conference(pool: &SqlitePool, row: NewConference<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_CONFERENCE)
        .bind(row.id)
        .bind(row.name)
        .bind(row.start_date)
        .bind(row.end_date)
        .bind(row.time_label)
        .bind(row.location)
        .bind(row.capacity)
        .bind(row.registered_count)
        .bind(row.status)
        .bind(row.description)
        .bind(row.price_cents)
        .bind(row.tags)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_UPDATE_CONFERENCE: &str = r#"
UPDATE conferences
SET name = ?,
    start_date = ?,
    end_date = ?,
    time_label = ?,
    location = ?,
    capacity = ?,
    status = ?,
    description = ?,
    price_cents = ?,
    tags = ?
WHERE id = ?
"#;

#[derive(Debug, Clone, Copy)]
pub struct ConferenceChanges<'a> {
    pub name: &'a str,
    pub start_date: &'a str,
    pub end_date: Option<&'a str>,
    pub time_label: Option<&'a str>,
    pub location: &'a str,
    pub capacity: i64,
    pub status: &'a str,
    pub description: Option<&'a str>,
    pub price_cents: i64,
    pub tags: Option<&'a str>,
}

pub async fn update_conference(
    pool: &SqlitePool,
    conference_id: &str,
    changes: ConferenceChanges<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_CONFERENCE)
        .bind(changes.name)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.time_label)
        .bind(changes.location)
        .bind(changes.capacity)
        .bind(changes.status)
        .bind(changes.description)
        .bind(changes.price_cents)
        .bind(changes.tags)
        .bind(conference_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_CONFERENCE: &str = r#"
DELETE FROM conferences
WHERE id = ?
"#;

pub async fn delete_conference(pool: &SqlitePool, conference_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_CONFERENCE)
        .bind(conference_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// Claims one seat; affects no row when the conference is closed or full.
const SQL_CLAIM_SEAT: &str = r#"
UPDATE conferences
SET registered_count = registered_count + 1
WHERE id = ?
  AND status = 'upcoming'
  AND registered_count < capacity
"#;

pub async fn claim_seat<'e>(
    executor: impl SqliteExecutor<'e>,
    conference_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_CLAIM_SEAT)
        .bind(conference_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}
