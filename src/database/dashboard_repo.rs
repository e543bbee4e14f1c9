use sqlx::SqlitePool;

use crate::models::DashboardCountsRow;

const SQL_LOAD_COUNTS: &str = r#"
SELECT
  (SELECT COUNT(*) FROM delegates) AS total_delegates,
  (SELECT COUNT(*) FROM delegates WHERE check_in_status = 'checked-in') AS checked_in_delegates,
  (SELECT COUNT(*) FROM conferences) AS total_conferences,
  (SELECT COUNT(*) FROM conferences WHERE status = 'upcoming') AS upcoming_conferences,
  (SELECT COUNT(*) FROM registrations) AS total_registrations,
  (SELECT COUNT(*) FROM registrations WHERE status = 'pending') AS pending_registrations
"#;

pub async fn load_counts(pool: &SqlitePool) -> sqlx::Result<DashboardCountsRow> {
    sqlx::query_as::<_, DashboardCountsRow>(SQL_LOAD_COUNTS)
        .fetch_one(pool)
        .await
}
