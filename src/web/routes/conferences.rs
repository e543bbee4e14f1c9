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
use crate::models::ConferenceStatus;
use crate::services::conference_service::{self, ConferenceCardView, ConferenceForm};
use crate::services::form_validation::FieldErrors;
use crate::web::{notice_message, redirect_with_notice, render};

#[derive(Debug, Deserialize, Default)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "conferences.html")]
pub struct ConferencesTemplate {
    pub conferences: Vec<ConferenceCardView>,
    pub notice: Option<&'static str>,
}

pub async fn index_handler(
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Response {
    match conference_service::list_cards(&pool).await {
        Ok(conferences) => render(&ConferencesTemplate {
            conferences,
            notice: notice_message(query.notice.as_deref()),
        }),
        Err(e) => {
            warn!("Conference list failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "conference_detail.html")]
pub struct ConferenceDetailTemplate {
    pub conference: ConferenceCardView,
    pub notice: Option<&'static str>,
}

pub async fn show_handler(
    Path(conference_id): Path<String>,
    Query(query): Query<NoticeQuery>,
    State(pool): State<SqlitePool>,
) -> Response {
    match conference_service::load_card(&pool, &conference_id).await {
        Ok(Some(conference)) => render(&ConferenceDetailTemplate {
            conference,
            notice: notice_message(query.notice.as_deref()),
        }),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Conference load failed for {}: {}", conference_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "conference_form.html")]
pub struct ConferenceFormTemplate {
    /// `None` when creating.
    pub conference_id: Option<String>,
    pub form: ConferenceForm,
    pub errors: FieldErrors,
    pub statuses: &'static [ConferenceStatus],
}

impl ConferenceFormTemplate {
    fn new(conference_id: Option<String>, form: ConferenceForm, errors: FieldErrors) -> Self {
        Self {
            conference_id,
            form,
            errors,
            statuses: ConferenceStatus::ALL,
        }
    }

    fn action(&self) -> String {
        match &self.conference_id {
            Some(id) => format!("/conferences/{id}/edit"),
            None => "/conferences".to_string(),
        }
    }
}

fn invalid_form(template: ConferenceFormTemplate) -> Response {
    let mut response = render(&template);
    if response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
    }
    response
}

pub async fn new_handler() -> Response {
    render(&ConferenceFormTemplate::new(
        None,
        ConferenceForm::blank(),
        FieldErrors::new(),
    ))
}

pub async fn create_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<ConferenceForm>,
) -> Response {
    match conference_service::create_conference(&pool, &form).await {
        Ok(_) => redirect_with_notice("/conferences", "created"),
        Err(DeskError::ValidationFailed(errors)) => {
            invalid_form(ConferenceFormTemplate::new(None, form, errors))
        }
        Err(e) => e.into_response(),
    }
}

pub async fn edit_handler(
    Path(conference_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match conference_repo::load_conference(&pool, &conference_id).await {
        Ok(Some(row)) => render(&ConferenceFormTemplate::new(
            Some(conference_id),
            ConferenceForm::from_row(&row),
            FieldErrors::new(),
        )),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Conference load failed for {}: {}", conference_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn update_handler(
    Path(conference_id): Path<String>,
    State(pool): State<SqlitePool>,
    Form(form): Form<ConferenceForm>,
) -> Response {
    match conference_service::update_conference(&pool, &conference_id, &form).await {
        Ok(()) => redirect_with_notice("/conferences", "updated"),
        Err(DeskError::ValidationFailed(errors)) => {
            invalid_form(ConferenceFormTemplate::new(Some(conference_id), form, errors))
        }
        Err(e) => e.into_response(),
    }
}

pub async fn delete_handler(
    Path(conference_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match conference_service::delete_conference(&pool, &conference_id).await {
        Ok(()) => redirect_with_notice("/conferences", "deleted"),
        Err(e) => e.into_response(),
    }
}
