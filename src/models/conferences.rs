#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ConferenceRow {
    pub id: String,
    pub name: String,
    pub start_date: String, // YYYY-MM-DD
    pub end_date: Option<String>,
    pub time_label: Option<String>,
    pub location: String,
    pub capacity: i64,
    pub registered_count: i64,
    pub status: String, // upcoming|ongoing|completed|cancelled
    pub description: Option<String>,
    pub price_cents: i64,
    pub tags: Option<String>, // JSON array of strings
}
