use serde::Serialize;

use super::status::CheckInStatus;

// Delegate joined with its conference name and registration count.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DelegateRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub organization: Option<String>,
    pub status: String, // active|inactive|pending
    pub badge_id: String,
    pub conference_id: Option<String>,
    pub conference_name: Option<String>,
    pub check_in_status: String, // not-checked-in|checked-in
    pub check_in_time: Option<String>,
    pub registered_events: i64,
}

impl DelegateRow {
    pub fn is_checked_in(&self) -> bool {
        CheckInStatus::parse(&self.check_in_status) == Some(CheckInStatus::CheckedIn)
    }

    /// Payload encoded in the delegate's badge QR code.
    pub fn qr_payload(&self) -> String {
        format!("delegate:{}:{}", self.id, self.badge_id)
    }
}
