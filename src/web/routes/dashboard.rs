use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::services::dashboard_service::{self, DashboardView};
use crate::web::render;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub dashboard: DashboardView,
}

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    pub role: Option<String>,
}

pub async fn dashboard_handler(
    Query(query): Query<DashboardQuery>,
    State(pool): State<SqlitePool>,
) -> Response {
    let role = dashboard_service::parse_role(query.role.as_deref());
    match dashboard_service::load_dashboard(&pool, role).await {
        Ok(dashboard) => render(&DashboardTemplate { dashboard }),
        Err(e) => {
            warn!("Dashboard load failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
