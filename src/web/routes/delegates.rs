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

use crate::database::{conference_repo, delegate_repo};
use crate::error::DeskError;
use crate::models::DelegateStatus;
use crate::services::delegate_service::{self, DelegateForm, DelegateView};
use crate::services::form_validation::FieldErrors;
use crate::web::{notice_message, redirect_with_notice, render};

#[derive(Debug, Deserialize, Default)]
pub struct DelegatesQuery {
    pub status: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "delegates.html")]
pub struct DelegatesTemplate {
    pub delegates: Vec<DelegateView>,
    /// `all` or one of the directory statuses.
    pub status_filter: &'static str,
    pub statuses: &'static [DelegateStatus],
    pub notice: Option<&'static str>,
}

pub async fn index_handler(
    Query(query): Query<DelegatesQuery>,
    State(pool): State<SqlitePool>,
) -> Response {
    let status = delegate_service::parse_status_filter(query.status.as_deref());
    match delegate_service::list_delegates(&pool, status).await {
        Ok(delegates) => render(&DelegatesTemplate {
            delegates,
            status_filter: status.map(DelegateStatus::as_str).unwrap_or("all"),
            statuses: DelegateStatus::ALL,
            notice: notice_message(query.notice.as_deref()),
        }),
        Err(e) => {
            warn!("Delegate list failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "delegate_detail.html")]
pub struct DelegateDetailTemplate {
    pub delegate: DelegateView,
}

pub async fn show_handler(
    Path(delegate_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match delegate_service::load_delegate(&pool, &delegate_id).await {
        Ok(Some(delegate)) => render(&DelegateDetailTemplate { delegate }),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Delegate load failed for {}: {}", delegate_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub struct ConferenceOption {
    pub id: String,
    pub name: String,
}

#[derive(Template)]
#[template(path = "delegate_form.html")]
pub struct DelegateFormTemplate {
    pub delegate_id: Option<String>,
    pub form: DelegateForm,
    pub errors: FieldErrors,
    pub statuses: &'static [DelegateStatus],
    pub conferences: Vec<ConferenceOption>,
}

impl DelegateFormTemplate {
    fn action(&self) -> String {
        match &self.delegate_id {
            Some(id) => format!("/delegates/{id}/edit"),
            None => "/delegates".to_string(),
        }
    }
}

async fn form_page(
    pool: &SqlitePool,
    delegate_id: Option<String>,
    form: DelegateForm,
    errors: FieldErrors,
) -> Response {
    let conferences = match conference_repo::list_conferences(pool).await {
        Ok(rows) => rows
            .into_iter()
            .map(|c| ConferenceOption {
                id: c.id,
                name: c.name,
            })
            .collect(),
        Err(e) => {
            warn!("Conference options load failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let invalid = !errors.is_empty();
    let mut response = render(&DelegateFormTemplate {
        delegate_id,
        form,
        errors,
        statuses: DelegateStatus::ALL,
        conferences,
    });
    if invalid && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
    }
    response
}

pub async fn new_handler(State(pool): State<SqlitePool>) -> Response {
    form_page(&pool, None, DelegateForm::blank(), FieldErrors::new()).await
}

pub async fn create_handler(
    State(pool): State<SqlitePool>,
    Form(form): Form<DelegateForm>,
) -> Response {
    match delegate_service::create_delegate(&pool, &form).await {
        Ok(_) => redirect_with_notice("/delegates", "created"),
        Err(DeskError::ValidationFailed(errors)) => form_page(&pool, None, form, errors).await,
        Err(e) => e.into_response(),
    }
}

pub async fn edit_handler(
    Path(delegate_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match delegate_repo::load_delegate(&pool, &delegate_id).await {
        Ok(Some(row)) => {
            let form = DelegateForm::from_row(&row);
            form_page(&pool, Some(delegate_id), form, FieldErrors::new()).await
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Delegate load failed for {}: {}", delegate_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn update_handler(
    Path(delegate_id): Path<String>,
    State(pool): State<SqlitePool>,
    Form(form): Form<DelegateForm>,
) -> Response {
    match delegate_service::update_delegate(&pool, &delegate_id, &form).await {
        Ok(()) => redirect_with_notice("/delegates", "updated"),
        Err(DeskError::ValidationFailed(errors)) => {
            form_page(&pool, Some(delegate_id), form, errors).await
        }
        Err(e) => e.into_response(),
    }
}

pub async fn delete_handler(
    Path(delegate_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match delegate_service::delete_delegate(&pool, &delegate_id).await {
        Ok(()) => redirect_with_notice("/delegates", "deleted"),
        Err(e) => e.into_response(),
    }
}
