use sqlx::SqlitePool;

const SQL_CREATE_CONFERENCES: &str = r#"
CREATE TABLE IF NOT EXISTS conferences (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  start_date TEXT NOT NULL,
  end_date TEXT,
  time_label TEXT,
  location TEXT NOT NULL,
  capacity INTEGER NOT NULL CHECK (capacity >= 1),
  registered_count INTEGER NOT NULL DEFAULT 0,
  status TEXT NOT NULL DEFAULT 'upcoming',
  description TEXT,
  price_cents INTEGER NOT NULL DEFAULT 0,
  tags TEXT
)
"#;

const SQL_CREATE_DELEGATES: &str = r#"
CREATE TABLE IF NOT EXISTS delegates (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  email TEXT NOT NULL,
  phone TEXT NOT NULL,
  organization TEXT,
  status TEXT NOT NULL DEFAULT 'active',
  badge_id TEXT NOT NULL UNIQUE,
  conference_id TEXT REFERENCES conferences(id) ON DELETE SET NULL,
  check_in_status TEXT NOT NULL DEFAULT 'not-checked-in',
  check_in_time TEXT
)
"#;

const SQL_CREATE_REGISTRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS registrations (
  id TEXT PRIMARY KEY,
  delegate_id TEXT NOT NULL REFERENCES delegates(id) ON DELETE CASCADE,
  conference_id TEXT NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
  registration_date TEXT NOT NULL,
  status TEXT NOT NULL DEFAULT 'pending',
  payment_status TEXT NOT NULL DEFAULT 'unpaid',
  ticket_type TEXT NOT NULL,
  amount_cents INTEGER NOT NULL DEFAULT 0,
  payment_method TEXT
)
"#;

const SCHEMA: &[&str] = &[
    SQL_CREATE_CONFERENCES,
    SQL_CREATE_DELEGATES,
    SQL_CREATE_REGISTRATIONS,
];

pub async fn create_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
