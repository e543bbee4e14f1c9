use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::models::DelegateRow;
use crate::services::checkin_desk::ScanReport;
use crate::services::checkin_service::{self, ConfirmationView, RosterEntryView};
use crate::services::checkin_view::{self, CheckinTab};
use crate::web::{render, sanitize_return_to, AppState, SharedDesk};

pub struct TabLink {
    pub name: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "checkin.html")]
pub struct CheckinTemplate {
    pub tabs: Vec<TabLink>,
    pub tab: &'static str,
    pub is_scanning: bool,
    pub scan_interval_ms: u64,
    pub confirmation: Option<ConfirmationView>,
    pub notice: Option<String>,
    pub search_query: String,
    pub roster: Vec<RosterEntryView>,
    pub history: Vec<RosterEntryView>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CheckinQuery {
    pub tab: Option<String>,
    pub q: Option<String>,
}

pub async fn checkin_page(
    Query(query): Query<CheckinQuery>,
    State(state): State<AppState>,
) -> Response {
    let mut desk = state.desk.lock().await;
    let tab = checkin_view::parse_tab(query.tab.as_deref());
    if let Err(e) = desk.enter_page(tab).await {
        debug!("Scanner not started: {}", e);
    }

    let search_query = query.q.unwrap_or_default().trim().to_string();
    let data = match checkin_service::build_roster_page(&state.pool, &search_query).await {
        Ok(d) => d,
        Err(e) => {
            warn!("Check-in roster load failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let current = desk.tab();
    let template = CheckinTemplate {
        tabs: CheckinTab::ALL
            .iter()
            .map(|t| TabLink {
                name: t.as_str(),
                label: t.label(),
                active: *t == current,
            })
            .collect(),
        tab: current.as_str(),
        is_scanning: desk.is_scanning(),
        scan_interval_ms: state.config.scan_interval.as_millis() as u64,
        confirmation: desk.view().confirmation().cloned(),
        notice: desk.take_notice(),
        search_query,
        roster: data.roster,
        history: data.history,
    };
    render(&template)
}

#[derive(Debug, Deserialize)]
pub struct ManualCheckinForm {
    #[serde(default)]
    pub badge_id: String,
    pub return_to: Option<String>,
}

pub async fn manual_checkin_handler(
    State(pool): State<SqlitePool>,
    State(desk): State<SharedDesk>,
    Form(form): Form<ManualCheckinForm>,
) -> Response {
    let target = return_target(form.return_to.as_deref(), "/checkin?tab=manual");
    if form.badge_id.trim().is_empty() {
        return Redirect::to(&target).into_response();
    }
    let mut desk = desk.lock().await;
    match desk.check_in_badge(&pool, &form.badge_id).await {
        Ok(_) => Redirect::to(&target).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RosterCheckinForm {
    pub return_to: Option<String>,
}

pub async fn roster_checkin_handler(
    Path(delegate_id): Path<String>,
    State(pool): State<SqlitePool>,
    State(desk): State<SharedDesk>,
    Form(form): Form<RosterCheckinForm>,
) -> Response {
    let target = return_target(form.return_to.as_deref(), "/checkin?tab=delegates");
    let mut desk = desk.lock().await;
    match desk.check_in_delegate(&pool, &delegate_id).await {
        Ok(_) => Redirect::to(&target).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanForm {
    #[serde(default)]
    pub qr_code: String,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate: Option<DelegateRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Dispatches a code read by the browser camera.
pub async fn scan_handler(
    State(pool): State<SqlitePool>,
    State(desk): State<SharedDesk>,
    Form(form): Form<ScanForm>,
) -> Response {
    let badge_id = checkin_service::badge_from_qr(&form.qr_code);
    let mut desk = desk.lock().await;
    let report = match desk.check_in_badge(&pool, badge_id).await {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };
    let notice = desk.take_notice();
    let body = match report {
        ScanReport::CheckedIn { delegate } => ScanResponse {
            success: true,
            delegate: Some(delegate),
            message: None,
        },
        ScanReport::AlreadyCheckedIn { delegate } => ScanResponse {
            success: false,
            delegate: Some(delegate),
            message: notice,
        },
        ScanReport::NotFound { .. } | ScanReport::ReadFailed { .. } => ScanResponse {
            success: false,
            delegate: None,
            message: Some("Invalid QR code".to_string()),
        },
    };
    Json(body).into_response()
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub tab: &'static str,
    pub scanning: bool,
    pub generation: u64,
    pub reports: Vec<ScanReport>,
    pub confirmation: Option<ConfirmationView>,
    pub notice: Option<String>,
}

/// Drains the scan feed. The page polls this while the scanner tab shows.
pub async fn poll_handler(
    State(pool): State<SqlitePool>,
    State(desk): State<SharedDesk>,
) -> Response {
    let mut desk = desk.lock().await;
    let reports = match desk.poll_scanner(&pool).await {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };
    Json(PollResponse {
        tab: desk.tab().as_str(),
        scanning: desk.is_scanning(),
        generation: desk.generation(),
        reports,
        confirmation: desk.view().confirmation().cloned(),
        notice: desk.take_notice(),
    })
    .into_response()
}

pub async fn dismiss_handler(State(desk): State<SharedDesk>) -> Response {
    desk.lock().await.dismiss_confirmation();
    Redirect::to("/checkin").into_response()
}

#[derive(Template)]
#[template(path = "checkin_confirmation.html")]
pub struct ConfirmationTemplate {
    pub confirmation: ConfirmationView,
}

pub async fn confirmation_page(
    Path(delegate_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Response {
    match checkin_service::load_confirmation(&pool, &delegate_id).await {
        Ok(Some(confirmation)) => render(&ConfirmationTemplate { confirmation }),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("Confirmation load failed for {}: {}", delegate_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn return_target(return_to: Option<&str>, fallback: &str) -> String {
    return_to
        .and_then(sanitize_return_to)
        .unwrap_or(fallback)
        .to_string()
}
