use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RegistrationRow {
    pub id: String,
    pub delegate_id: String,
    pub delegate_name: Option<String>,
    pub conference_id: String,
    pub conference_name: Option<String>,
    pub registration_date: String, // YYYY-MM-DD
    pub status: String,            // pending|approved|rejected|cancelled
    pub payment_status: String,    // unpaid|paid|refunded
    pub ticket_type: String,
    pub amount_cents: i64,
    pub payment_method: Option<String>,
}
