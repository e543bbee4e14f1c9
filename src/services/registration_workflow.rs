use chrono::Local;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{conference_repo, delegate_repo, registration_repo};
use crate::error::{DeskError, DeskResult};
use crate::models::{
    CheckInStatus, ConferenceRow, ConferenceStatus, DelegateStatus, PaymentMethod, PaymentStatus,
    RegistrationRow, RegistrationStatus,
};
use crate::services::conference_service::{self, ConferenceCardView};
use crate::services::delegate_service;
use crate::services::form_validation::{self as fv, FieldErrors};

pub const STANDARD_TICKET: &str = "Standard";

/// Where the attendee is in the two-step flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    Browse,
    Form,
}

/// Whether a conference still takes registrations.
pub fn is_available(conference: &ConferenceRow) -> bool {
    ConferenceStatus::parse(&conference.status) == Some(ConferenceStatus::Upcoming)
        && conference.registered_count < conference.capacity
}

/// Available conferences whose name or location contains `term`, case-insensitively.
pub fn filter_available<'a>(
    conferences: &'a [ConferenceRow],
    term: &str,
) -> impl Iterator<Item = &'a ConferenceRow> + 'a {
    let needle = term.trim().to_lowercase();
    conferences.iter().filter(move |c| {
        is_available(c)
            && (needle.is_empty()
                || c.name.to_lowercase().contains(&needle)
                || c.location.to_lowercase().contains(&needle))
    })
}

pub struct BrowsePageData {
    pub search_query: String,
    pub conferences: Vec<ConferenceCardView>,
}

pub async fn build_browse_page(pool: &SqlitePool, term: &str) -> sqlx::Result<BrowsePageData> {
    let conferences = conference_repo::list_available(pool).await?;
    let cards = filter_available(&conferences, term)
        .map(conference_service::card_view)
        .collect();
    Ok(BrowsePageData {
        search_query: term.trim().to_string(),
        conferences: cards,
    })
}

/// Attendee form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub organization: Option<String>,
    pub job_title: Option<String>,
    pub dietary_requirements: Option<String>,
    pub accessibility_needs: Option<String>,
    pub special_requests: Option<String>,
    #[serde(default)]
    pub payment_method: String,
    pub agree_to_terms: Option<String>,
}

impl RegistrationForm {
    pub fn agreed_to_terms(&self) -> bool {
        fv::checkbox_ticked(self.agree_to_terms.as_deref())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Form fields that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub organization: Option<String>,
    pub payment_method: PaymentMethod,
}

pub fn validate(form: &RegistrationForm) -> Result<ValidRegistration, FieldErrors> {
    let mut errors = FieldErrors::new();
    fv::require_min_chars(&mut errors, "first_name", &form.first_name, 2, "First name is required");
    fv::require_min_chars(&mut errors, "last_name", &form.last_name, 2, "Last name is required");
    fv::require_email(&mut errors, "email", &form.email);
    fv::require_phone(&mut errors, "phone", &form.phone);
    let payment_method = PaymentMethod::parse(&form.payment_method);
    if payment_method.is_none() {
        errors.add("payment_method", "Please select a payment method");
    }
    if !form.agreed_to_terms() {
        errors.add("agree_to_terms", "You must agree to the terms and conditions");
    }
    errors.into_result()?;

    Ok(ValidRegistration {
        name: form.full_name(),
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        organization: fv::optional(form.organization.as_deref()).map(str::to_string),
        payment_method: payment_method.unwrap_or(PaymentMethod::CreditCard),
    })
}

/// Validates the form and records a pending registration for `conference_id`.
///
/// The attendee is matched to an existing delegate by email or added to the
/// directory as a pending delegate with a fresh badge id.
pub async fn submit_registration(
    pool: &SqlitePool,
    conference_id: &str,
    form: &RegistrationForm,
) -> DeskResult<RegistrationRow> {
    let Some(conference) = conference_repo::load_conference(pool, conference_id).await? else {
        return Err(DeskError::NotFound(conference_id.to_string()));
    };
    let valid = validate(form).map_err(DeskError::ValidationFailed)?;

    // Seat, delegate and registration land together or not at all. The
    // transaction holds the store's only connection until it finishes.
    let mut tx = pool.begin().await?;
    if conference_repo::claim_seat(&mut *tx, conference_id).await? == 0 {
        warn!(conference_id, "registration refused, conference closed or full");
        let mut errors = FieldErrors::new();
        errors.add("conference", "This conference is no longer open for registration");
        return Err(DeskError::ValidationFailed(errors));
    }

    let delegate_id = match delegate_repo::find_by_email(&mut *tx, &valid.email).await? {
        Some(existing) => {
            delegate_repo::assign_conference_if_unset(&mut *tx, &existing.id, conference_id).await?;
            existing.id
        }
        None => {
            let id = Uuid::new_v4().to_string();
            delegate_service::insert_with_next_badge(
                &mut *tx,
                delegate_repo::NewDelegate {
                    id: &id,
                    name: &valid.name,
                    email: &valid.email,
                    phone: &valid.phone,
                    organization: valid.organization.as_deref(),
                    status: DelegateStatus::Pending.as_str(),
                    badge_id: "",
                    conference_id: Some(conference_id),
                    check_in_status: CheckInStatus::NotCheckedIn.as_str(),
                    check_in_time: None,
                },
            )
            .await?;
            id
        }
    };

    let registration_id = Uuid::new_v4().to_string();
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    registration_repo::insert_registration(
        &mut *tx,
        registration_repo::NewRegistration {
            id: &registration_id,
            delegate_id: &delegate_id,
            conference_id,
            registration_date: &today,
            status: RegistrationStatus::Pending.as_str(),
            payment_status: PaymentStatus::Unpaid.as_str(),
            ticket_type: STANDARD_TICKET,
            amount_cents: conference.price_cents,
            payment_method: Some(valid.payment_method.as_str()),
        },
    )
    .await?;
    tx.commit().await?;

    info!(
        registration_id = %registration_id,
        conference_id,
        delegate_id = %delegate_id,
        "registration submitted"
    );

    registration_repo::load_registration(pool, &registration_id)
        .await?
        .ok_or(DeskError::NotFound(registration_id))
}
