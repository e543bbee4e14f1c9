use std::sync::Arc;

use askama::Template;
use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderName, HeaderValue, CACHE_CONTROL};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

use crate::config::AppConfig;
use crate::error::DeskError;
use crate::services::checkin_desk::CheckinDesk;
use crate::services::scan_feed::CaptureDevice;

pub mod routes;

use routes::{checkin, conferences, dashboard, delegates, register, registrations};

pub type SharedDesk = Arc<Mutex<CheckinDesk>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub desk: SharedDesk,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, device: Arc<dyn CaptureDevice>, config: AppConfig) -> Self {
        let desk = CheckinDesk::new(device, config.scan_interval);
        Self {
            pool,
            desk: Arc::new(Mutex::new(desk)),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for SharedDesk {
    fn from_ref(state: &AppState) -> Self {
        state.desk.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    let no_store = || {
        SetResponseHeaderLayer::if_not_present(CACHE_CONTROL, HeaderValue::from_static("no-store"))
    };
    let assets_dir = state.config.assets_dir.clone();

    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(dashboard::dashboard_handler))
        // Check-in desk
        .route("/checkin", get(checkin::checkin_page))
        .route("/checkin/manual", post(checkin::manual_checkin_handler))
        .route("/checkin/delegates/:delegate_id", post(checkin::roster_checkin_handler))
        .route("/checkin/scan", post(checkin::scan_handler))
        .route("/checkin/scan/poll", get(checkin::poll_handler))
        .route("/checkin/confirmation/dismiss", post(checkin::dismiss_handler))
        .route("/checkin/confirmation/:delegate_id", get(checkin::confirmation_page))
        // Registration
        .route("/register", get(register::browse_handler))
        .route(
            "/register/:conference_id",
            get(register::form_handler).post(register::submit_handler),
        )
        // Conferences
        .route(
            "/conferences",
            get(conferences::index_handler).post(conferences::create_handler),
        )
        .route("/conferences/new", get(conferences::new_handler))
        .route("/conferences/:conference_id", get(conferences::show_handler))
        .route(
            "/conferences/:conference_id/edit",
            get(conferences::edit_handler).post(conferences::update_handler),
        )
        .route("/conferences/:conference_id/delete", post(conferences::delete_handler))
        // Delegates
        .route(
            "/delegates",
            get(delegates::index_handler).post(delegates::create_handler),
        )
        .route("/delegates/new", get(delegates::new_handler))
        .route("/delegates/:delegate_id", get(delegates::show_handler))
        .route(
            "/delegates/:delegate_id/edit",
            get(delegates::edit_handler).post(delegates::update_handler),
        )
        .route("/delegates/:delegate_id/delete", post(delegates::delete_handler))
        // Registrations
        .route("/registrations", get(registrations::index_handler))
        .route("/registrations/:registration_id", get(registrations::show_handler))
        .route(
            "/registrations/:registration_id/edit",
            get(registrations::edit_handler).post(registrations::update_handler),
        )
        .route(
            "/registrations/:registration_id/approve",
            post(registrations::approve_handler),
        )
        .route(
            "/registrations/:registration_id/reject",
            post(registrations::reject_handler),
        )
        // Static files
        .nest_service(
            "/assets",
            get_service(ServeDir::new(assets_dir)).layer(no_store()),
        )
        // Layers
        .layer(no_store())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-desk-build"),
            HeaderValue::from_static(env!("DESK_BUILD_ID")),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Renders a page, answering 500 if the template fails.
pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!("Template render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl IntoResponse for DeskError {
    fn into_response(self) -> Response {
        let status = match &self {
            DeskError::NotFound(_) => StatusCode::NOT_FOUND,
            DeskError::CaptureUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DeskError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DeskError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Only same-site absolute paths are accepted as redirect targets.
pub fn sanitize_return_to(value: &str) -> Option<&str> {
    let v = value.trim();
    if !v.starts_with('/') {
        return None;
    }
    if v.starts_with("//") || v.contains("://") {
        return None;
    }
    Some(v)
}

/// Redirects to `target` with a `notice` code appended.
pub fn redirect_with_notice(target: &str, notice: &str) -> Response {
    let sep = if target.contains('?') { "&" } else { "?" };
    Redirect::to(&format!("{}{}notice={}", target, sep, notice)).into_response()
}

/// Banner text for the notice codes set by successful mutations.
pub fn notice_message(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "created" => Some("Saved successfully."),
        "updated" => Some("Changes saved."),
        "deleted" => Some("Deleted."),
        "approved" => Some("Registration approved."),
        "rejected" => Some("Registration rejected."),
        "closed" => Some("That conference is no longer open for registration."),
        _ => None,
    }
}
