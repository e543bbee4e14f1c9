#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct DashboardCountsRow {
    pub total_delegates: i64,
    pub checked_in_delegates: i64,
    pub total_conferences: i64,
    pub upcoming_conferences: i64,
    pub total_registrations: i64,
    pub pending_registrations: i64,
}
