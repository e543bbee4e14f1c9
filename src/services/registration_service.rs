use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::database::registration_repo;
use crate::error::{DeskError, DeskResult};
use crate::models::{PaymentMethod, PaymentStatus, RegistrationRow, RegistrationStatus};
use crate::services::conference_service::format_price;
use crate::services::form_validation::{self as fv, FieldErrors};

/// `all`, a missing value and unknown values list everything.
pub fn parse_status_filter(raw: Option<&str>) -> Option<RegistrationStatus> {
    raw.and_then(RegistrationStatus::parse)
}

#[derive(Debug, Clone)]
pub struct RegistrationView {
    pub id: String,
    pub delegate_id: String,
    pub delegate_name: String,
    pub conference_id: String,
    pub conference_name: String,
    pub registration_date: String,
    pub status: String,
    pub payment_status: String,
    pub ticket_type: String,
    pub amount_label: String,
    pub payment_method_label: String,
    pub is_pending: bool,
}

impl From<&RegistrationRow> for RegistrationView {
    fn from(row: &RegistrationRow) -> Self {
        let payment_method_label = row
            .payment_method
            .as_deref()
            .and_then(PaymentMethod::parse)
            .map(PaymentMethod::label)
            .unwrap_or("Not specified")
            .to_string();
        Self {
            id: row.id.clone(),
            delegate_id: row.delegate_id.clone(),
            delegate_name: row
                .delegate_name
                .clone()
                .unwrap_or_else(|| "Unknown delegate".to_string()),
            conference_id: row.conference_id.clone(),
            conference_name: row
                .conference_name
                .clone()
                .unwrap_or_else(|| "Unknown conference".to_string()),
            registration_date: row.registration_date.clone(),
            status: row.status.clone(),
            payment_status: row.payment_status.clone(),
            ticket_type: row.ticket_type.clone(),
            amount_label: format_price(row.amount_cents),
            payment_method_label,
            is_pending: RegistrationStatus::parse(&row.status) == Some(RegistrationStatus::Pending),
        }
    }
}

pub async fn list_registrations(
    pool: &SqlitePool,
    status: Option<RegistrationStatus>,
) -> sqlx::Result<Vec<RegistrationView>> {
    let statuses: Vec<&str> = status.map(RegistrationStatus::as_str).into_iter().collect();
    let rows = registration_repo::list_registrations(pool, &statuses).await?;
    Ok(rows.iter().map(RegistrationView::from).collect())
}

pub async fn load_registration(
    pool: &SqlitePool,
    registration_id: &str,
) -> sqlx::Result<Option<RegistrationView>> {
    let row = registration_repo::load_registration(pool, registration_id).await?;
    Ok(row.as_ref().map(RegistrationView::from))
}

/// Admin edit form; delegate, conference and amount are fixed at submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationEditForm {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub ticket_type: String,
}

impl RegistrationEditForm {
    pub fn from_row(row: &RegistrationRow) -> Self {
        Self {
            status: row.status.clone(),
            payment_status: row.payment_status.clone(),
            ticket_type: row.ticket_type.clone(),
        }
    }
}

pub fn validate(
    form: &RegistrationEditForm,
) -> Result<(RegistrationStatus, PaymentStatus, String), FieldErrors> {
    let mut errors = FieldErrors::new();
    let status = RegistrationStatus::parse(&form.status);
    if status.is_none() {
        errors.add("status", "Please select a status");
    }
    let payment_status = PaymentStatus::parse(&form.payment_status);
    if payment_status.is_none() {
        errors.add("payment_status", "Please select a payment status");
    }
    fv::require(&mut errors, "ticket_type", &form.ticket_type, "Ticket type is required");
    errors.into_result()?;

    Ok((
        status.unwrap_or(RegistrationStatus::Pending),
        payment_status.unwrap_or(PaymentStatus::Unpaid),
        form.ticket_type.trim().to_string(),
    ))
}

/// Loads the raw row for prefilling the edit form.
pub async fn load_for_edit(
    pool: &SqlitePool,
    registration_id: &str,
) -> sqlx::Result<Option<(RegistrationView, RegistrationEditForm)>> {
    let row = registration_repo::load_registration(pool, registration_id).await?;
    Ok(row.map(|r| (RegistrationView::from(&r), RegistrationEditForm::from_row(&r))))
}

pub async fn update_registration(
    pool: &SqlitePool,
    registration_id: &str,
    form: &RegistrationEditForm,
) -> DeskResult<()> {
    let (status, payment_status, ticket_type) =
        validate(form).map_err(DeskError::ValidationFailed)?;
    let changed = registration_repo::update_registration(
        pool,
        registration_id,
        status.as_str(),
        payment_status.as_str(),
        &ticket_type,
    )
    .await?;
    if changed == 0 {
        return Err(DeskError::NotFound(registration_id.to_string()));
    }
    info!(registration_id, status = %status, payment_status = %payment_status, "registration updated");
    Ok(())
}

pub async fn set_status(
    pool: &SqlitePool,
    registration_id: &str,
    status: RegistrationStatus,
) -> DeskResult<()> {
    if registration_repo::set_status(pool, registration_id, status.as_str()).await? == 0 {
        return Err(DeskError::NotFound(registration_id.to_string()));
    }
    info!(registration_id, status = %status, "registration status changed");
    Ok(())
}
