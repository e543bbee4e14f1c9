use serde::Deserialize;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{conference_repo, delegate_repo};
use crate::error::{DeskError, DeskResult};
use crate::models::{CheckInStatus, DelegateRow, DelegateStatus};
use crate::services::form_validation::{self as fv, FieldErrors};

const FIRST_BADGE_NUMBER: i64 = 1001;
const BADGE_ATTEMPTS: usize = 5;

/// Next free `DEL-nnnn` badge id.
pub async fn next_badge_id<'e>(executor: impl SqliteExecutor<'e>) -> sqlx::Result<String> {
    let next = match delegate_repo::max_badge_number(executor).await? {
        Some(max) if max >= FIRST_BADGE_NUMBER => max + 1,
        _ => FIRST_BADGE_NUMBER,
    };
    Ok(format!("DEL-{next}"))
}

/// Inserts `row` under the next free badge id, ignoring `row.badge_id`.
/// Badge ids are unique store-wide; a collision picks the next number.
pub async fn insert_with_next_badge(
    conn: &mut SqliteConnection,
    row: delegate_repo::NewDelegate<'_>,
) -> sqlx::Result<String> {
    let mut attempt = 1;
    loop {
        let badge_id = next_badge_id(&mut *conn).await?;
        let insert = delegate_repo::NewDelegate {
            badge_id: &badge_id,
            ..row
        };
        match delegate_repo::insert_delegate(&mut *conn, insert).await {
            Ok(_) => return Ok(badge_id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() && attempt < BADGE_ATTEMPTS => {
                warn!(badge_id = %badge_id, attempt, "badge id taken, picking another");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// `all`, a missing value and unknown values list everyone.
pub fn parse_status_filter(raw: Option<&str>) -> Option<DelegateStatus> {
    raw.and_then(DelegateStatus::parse)
}

#[derive(Debug, Clone)]
pub struct DelegateView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub organization: Option<String>,
    pub status: String,
    pub badge_id: String,
    pub conference_name: String,
    pub is_checked_in: bool,
    pub check_in_time: Option<String>,
    pub registered_events: i64,
    pub qr_payload: String,
}

impl From<&DelegateRow> for DelegateView {
    fn from(row: &DelegateRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.name.clone(),
            email: row.email.clone(),
            phone: row.phone.clone(),
            organization: row.organization.clone(),
            status: row.status.clone(),
            badge_id: row.badge_id.clone(),
            conference_name: row
                .conference_name
                .clone()
                .unwrap_or_else(|| "No conference".to_string()),
            is_checked_in: row.is_checked_in(),
            check_in_time: row.check_in_time.clone(),
            registered_events: row.registered_events,
            qr_payload: row.qr_payload(),
        }
    }
}

pub async fn list_delegates(
    pool: &SqlitePool,
    status: Option<DelegateStatus>,
) -> sqlx::Result<Vec<DelegateView>> {
    let rows = delegate_repo::list_delegates(pool, status.map(DelegateStatus::as_str)).await?;
    Ok(rows.iter().map(DelegateView::from).collect())
}

pub async fn load_delegate(pool: &SqlitePool, delegate_id: &str) -> sqlx::Result<Option<DelegateView>> {
    let row = delegate_repo::load_delegate(pool, delegate_id).await?;
    Ok(row.as_ref().map(DelegateView::from))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelegateForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub conference_id: String,
}

impl DelegateForm {
    pub fn blank() -> Self {
        Self {
            status: DelegateStatus::Active.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn from_row(row: &DelegateRow) -> Self {
        Self {
            name: row.name.clone(),
            email: row.email.clone(),
            phone: row.phone.clone(),
            organization: row.organization.clone().unwrap_or_default(),
            status: row.status.clone(),
            conference_id: row.conference_id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidDelegate {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub organization: Option<String>,
    pub status: DelegateStatus,
    pub conference_id: Option<String>,
}

pub fn validate(form: &DelegateForm) -> Result<ValidDelegate, FieldErrors> {
    let mut errors = FieldErrors::new();
    fv::require(&mut errors, "name", &form.name, "Name is required");
    fv::require_email(&mut errors, "email", &form.email);
    fv::require_phone(&mut errors, "phone", &form.phone);
    let status = DelegateStatus::parse(&form.status);
    if status.is_none() {
        errors.add("status", "Please select a status");
    }
    errors.into_result()?;

    Ok(ValidDelegate {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        organization: fv::optional(Some(form.organization.as_str())).map(str::to_string),
        status: status.unwrap_or(DelegateStatus::Active),
        conference_id: fv::optional(Some(form.conference_id.as_str())).map(str::to_string),
    })
}

/// Validates the form, then checks that the chosen conference exists.
async fn validate_against_store(
    pool: &SqlitePool,
    form: &DelegateForm,
) -> DeskResult<ValidDelegate> {
    let valid = validate(form).map_err(DeskError::ValidationFailed)?;
    if let Some(conference_id) = valid.conference_id.as_deref() {
        if conference_repo::load_conference(pool, conference_id).await?.is_none() {
            let mut errors = FieldErrors::new();
            errors.add("conference_id", "Please select a conference");
            return Err(DeskError::ValidationFailed(errors));
        }
    }
    Ok(valid)
}

pub async fn create_delegate(pool: &SqlitePool, form: &DelegateForm) -> DeskResult<String> {
    let valid = validate_against_store(pool, form).await?;
    let id = Uuid::new_v4().to_string();
    let mut conn = pool.acquire().await?;
    let badge_id = insert_with_next_badge(
        &mut *conn,
        delegate_repo::NewDelegate {
            id: &id,
            name: &valid.name,
            email: &valid.email,
            phone: &valid.phone,
            organization: valid.organization.as_deref(),
            status: valid.status.as_str(),
            badge_id: "",
            conference_id: valid.conference_id.as_deref(),
            check_in_status: CheckInStatus::NotCheckedIn.as_str(),
            check_in_time: None,
        },
    )
    .await?;
    info!(delegate_id = %id, badge_id = %badge_id, "delegate created");
    Ok(id)
}

pub async fn update_delegate(
    pool: &SqlitePool,
    delegate_id: &str,
    form: &DelegateForm,
) -> DeskResult<()> {
    let valid = validate_against_store(pool, form).await?;
    let changed = delegate_repo::update_delegate(
        pool,
        delegate_id,
        delegate_repo::DelegateChanges {
            name: &valid.name,
            email: &valid.email,
            phone: &valid.phone,
            organization: valid.organization.as_deref(),
            status: valid.status.as_str(),
            conference_id: valid.conference_id.as_deref(),
        },
    )
    .await?;
    if changed == 0 {
        return Err(DeskError::NotFound(delegate_id.to_string()));
    }
    info!(delegate_id, "delegate updated");
    Ok(())
}

pub async fn delete_delegate(pool: &SqlitePool, delegate_id: &str) -> DeskResult<()> {
    if delegate_repo::delete_delegate(pool, delegate_id).await? == 0 {
        return Err(DeskError::NotFound(delegate_id.to_string()));
    }
    info!(delegate_id, "delegate deleted");
    Ok(())
}
