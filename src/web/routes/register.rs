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

use crate::database::conference_repo;
use crate::error::DeskError;
use crate::models::{PaymentMethod, RegistrationRow};
use crate::services::conference_service::{self, ConferenceCardView};
use crate::services::form_validation::FieldErrors;
use crate::services::registration_service::RegistrationView;
use crate::services::registration_workflow::{self, RegistrationForm, RegistrationStep};
use crate::web::{notice_message, redirect_with_notice, render};

#[derive(Template)]
#[template(path = "register_browse.html")]
pub struct BrowseTemplate {
    pub step: RegistrationStep,
    pub search_query: String,
    pub conferences: Vec<ConferenceCardView>,
    pub notice: Option<&'static str>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BrowseQuery {
    pub q: Option<String>,
    pub notice: Option<String>,
}

pub async fn browse_handler(
    Query(query): Query<BrowseQuery>,
    State(pool): State<SqlitePool>,
) -> Response {
    let term = query.q.unwrap_or_default();
    match registration_workflow::build_browse_page(&pool, &term).await {
        Ok(data) => render(&BrowseTemplate {
            step: RegistrationStep::Browse,
            search_query: data.search_query,
            conferences: data.conferences,
            notice: notice_message(query.notice.as_deref()),
        }),
        Err(e) => {
            warn!("Conference browse failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "register_form.html")]
pub struct RegisterFormTemplate {
    pub step: RegistrationStep,
    pub conference: ConferenceCardView,
    pub form: RegistrationForm,
    pub errors: FieldErrors,
    pub payment_methods: &'static [PaymentMethod],
}

#[derive(Template)]
#[template(path = "register_success.html")]
pub struct RegisterSuccessTemplate {
    pub conference: ConferenceCardView,
    pub registration: RegistrationView,
}

pub async fn form_handler(
    Path(conference_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    let conference = match conference_repo::load_conference(&pool, &conference_id).await {
        Ok(Some(c)) => c,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Conference load failed for {}: {}", conference_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if !registration_workflow::is_available(&conference) {
        return redirect_with_notice("/register", "closed");
    }
    render(&RegisterFormTemplate {
        step: RegistrationStep::Form,
        conference: conference_service::card_view(&conference),
        form: RegistrationForm::default(),
        errors: FieldErrors::new(),
        payment_methods: PaymentMethod::ALL,
    })
}

pub async fn submit_handler(
    Path(conference_id): Path<String>,
    State(pool): State<SqlitePool>,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let result = registration_workflow::submit_registration(&pool, &conference_id, &form).await;
    let conference = match conference_service::load_card(&pool, &conference_id).await {
        Ok(Some(c)) => c,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Conference load failed for {}: {}", conference_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match result {
        Ok(row) => success_page(conference, &row),
        Err(DeskError::ValidationFailed(errors)) => {
            let mut response = render(&RegisterFormTemplate {
                step: RegistrationStep::Form,
                conference,
                form,
                errors,
                payment_methods: PaymentMethod::ALL,
            });
            if response.status() == StatusCode::OK {
                *response.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
            }
            response
        }
        Err(e) => e.into_response(),
    }
}

fn success_page(conference: ConferenceCardView, row: &RegistrationRow) -> Response {
    render(&RegisterSuccessTemplate {
        conference,
        registration: RegistrationView::from(row),
    })
}
