use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::error::DeskError;
use crate::models::{PaymentStatus, RegistrationStatus};
use crate::services::form_validation::FieldErrors;
use crate::services::registration_service::{self, RegistrationEditForm, RegistrationView};
use crate::web::{notice_message, redirect_with_notice, render};

#[derive(Debug, Deserialize, Default)]
pub struct RegistrationsQuery {
    pub status: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "registrations.html")]
pub struct RegistrationsTemplate {
    pub registrations: Vec<RegistrationView>,
    pub status_filter: &'static str,
    pub statuses: &'static [RegistrationStatus],
    pub notice: Option<&'static str>,
}

pub async fn index_handler(
    Query(query): Query<RegistrationsQuery>,
    State(pool): State<SqlitePool>,
) -> Response {
    let status = registration_service::parse_status_filter(query.status.as_deref());
    match registration_service::list_registrations(&pool, status).await {
        Ok(registrations) => render(&RegistrationsTemplate {
            registrations,
            status_filter: status.map(RegistrationStatus::as_str).unwrap_or("all"),
            statuses: RegistrationStatus::ALL,
            notice: notice_message(query.notice.as_deref()),
        }),
        Err(e) => {
            warn!("Registration list failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "registration_detail.html")]
pub struct RegistrationDetailTemplate {
    pub registration: RegistrationView,
}

pub async fn show_handler(
    Path(registration_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match registration_service::load_registration(&pool, &registration_id).await {
        Ok(Some(registration)) => render(&RegistrationDetailTemplate { registration }),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Registration load failed for {}: {}", registration_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "registration_form.html")]
pub struct RegistrationFormTemplate {
    pub registration: RegistrationView,
    pub form: RegistrationEditForm,
    pub errors: FieldErrors,
    pub statuses: &'static [RegistrationStatus],
    pub payment_statuses: &'static [PaymentStatus],
}

pub async fn edit_handler(
    Path(registration_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match registration_service::load_for_edit(&pool, &registration_id).await {
        Ok(Some((registration, form))) => render(&RegistrationFormTemplate {
            registration,
            form,
            errors: FieldErrors::new(),
            statuses: RegistrationStatus::ALL,
            payment_statuses: PaymentStatus::ALL,
        }),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Registration load failed for {}: {}", registration_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn update_handler(
    Path(registration_id): Path<String>,
    State(pool): State<SqlitePool>,
    Form(form): Form<RegistrationEditForm>,
) -> Response {
    let errors = match registration_service::update_registration(&pool, &registration_id, &form)
        .await
    {
        Ok(()) => return redirect_with_notice("/registrations", "updated"),
        Err(DeskError::ValidationFailed(errors)) => errors,
        Err(e) => return e.into_response(),
    };

    let registration = match registration_service::load_registration(&pool, &registration_id).await {
        Ok(Some(r)) => r,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Registration load failed for {}: {}", registration_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let mut response = render(&RegistrationFormTemplate {
        registration,
        form,
        errors,
        statuses: RegistrationStatus::ALL,
        payment_statuses: PaymentStatus::ALL,
    });
    if response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
    }
    response
}

pub async fn approve_handler(
    Path(registration_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match registration_service::set_status(&pool, &registration_id, RegistrationStatus::Approved)
        .await
    {
        Ok(()) => redirect_with_notice("/registrations", "approved"),
        Err(e) => e.into_response(),
    }
}

pub async fn reject_handler(
    Path(registration_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match registration_service::set_status(&pool, &registration_id, RegistrationStatus::Rejected)
        .await
    {
        Ok(()) => redirect_with_notice("/registrations", "rejected"),
        Err(e) => e.into_response(),
    }
}
