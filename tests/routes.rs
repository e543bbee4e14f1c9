use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use conference_desk::config::AppConfig;
use conference_desk::database;
use conference_desk::services::scan_feed::ScriptedCamera;
use conference_desk::web::{build_router, AppState};

async fn app() -> Router {
    app_with_camera(vec![None], Duration::from_millis(50)).await
}

async fn app_with_camera(script: Vec<Option<String>>, scan_interval: Duration) -> Router {
    let pool = database::open_seeded().await.unwrap();
    let config = AppConfig {
        scan_interval,
        ..AppConfig::default()
    };
    build_router(AppState::new(pool, Arc::new(ScriptedCamera::new(script)), config))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn post_form(app: &Router, uri: &str, body: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, location, String::from_utf8_lossy(&bytes).into_owned())
}

const VALID_REGISTRATION: &str = "first_name=Ada&last_name=Lovelace&email=ada%40example.com\
    &phone=555-123-4567&payment_method=credit_card&agree_to_terms=on";

#[tokio::test]
async fn root_redirects_to_dashboard() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn dashboard_role_selects_view() {
    let app = app().await;
    let (status, body) = get(&app, "/dashboard?role=administrator").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Admin Dashboard"));
    assert!(body.contains("pending approvals"));

    let (_, body) = get(&app, "/dashboard?role=nobody").await;
    assert!(body.contains("Delegate Dashboard"));
    assert!(!body.contains("pending approvals"));
}

#[tokio::test]
async fn manual_check_in_opens_confirmation() {
    let app = app().await;
    get(&app, "/checkin?tab=manual").await;
    let (status, location, _) = post_form(
        &app,
        "/checkin/manual",
        "badge_id=DEL-1001&return_to=%2Fcheckin%3Ftab%3Dmanual",
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/checkin?tab=manual"));

    let (status, body) = get(&app, "/checkin?tab=manual").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Check-in Successful"));
    assert!(body.contains("John Smith"));

    // Tabs stay put while the overlay is open.
    let (_, body) = get(&app, "/checkin?tab=history").await;
    assert!(body.contains("Check-in Successful"));
    assert!(body.contains("Manual Check-in</h2>"));

    let (status, _, _) = post_form(&app, "/checkin/confirmation/dismiss", "").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let (_, body) = get(&app, "/checkin?tab=history").await;
    assert!(!body.contains("Check-in Successful"));
    assert!(body.contains("DEL-1001"));
}

#[tokio::test]
async fn repeated_manual_check_in_shows_notice() {
    let app = app().await;
    post_form(&app, "/checkin/manual", "badge_id=DEL-1002").await;
    let (_, body) = get(&app, "/checkin?tab=manual").await;
    assert!(body.contains("Sarah Johnson (DEL-1002) is already checked in since Today, 9:45 AM"));
    assert!(!body.contains("Check-in Successful"));

    post_form(&app, "/checkin/manual", "badge_id=del-1002").await;
    let (_, body) = get(&app, "/checkin?tab=manual").await;
    assert!(body.contains("No delegate found with badge ID del-1002"));
}

#[tokio::test]
async fn scan_endpoint_reports_json() {
    let app = app().await;
    let (status, _, body) = post_form(&app, "/checkin/scan", "qr_code=DEL-9999").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Invalid QR code");

    let (_, _, body) = post_form(&app, "/checkin/scan", "qr_code=delegate%3A3%3ADEL-1003").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["delegate"]["name"], "Michael Brown");
    assert_eq!(json["delegate"]["check_in_status"], "checked-in");

    let (_, _, body) = post_form(&app, "/checkin/scan", "qr_code=DEL-1003").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("already checked in"));
}

#[tokio::test]
async fn scans_read_while_away_from_the_desk_are_dropped() {
    let app = app_with_camera(vec![Some("DEL-1001".to_string())], Duration::from_millis(20)).await;
    let (status, _) = get(&app, "/checkin").await;
    assert_eq!(status, StatusCode::OK);
    get(&app, "/dashboard").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let (_, body) = get(&app, "/checkin/scan/poll").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["reports"], serde_json::json!([]));
    assert_eq!(json["confirmation"], serde_json::Value::Null);
    assert_eq!(json["generation"], 1);

    let (_, body) = get(&app, "/delegates/1").await;
    assert!(body.contains("Not checked in"));
}

#[tokio::test]
async fn page_render_drops_reads_buffered_before_it() {
    let app = app_with_camera(vec![Some("DEL-1001".to_string())], Duration::from_millis(40)).await;
    get(&app, "/checkin").await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    get(&app, "/checkin").await;

    let (_, body) = get(&app, "/checkin/scan/poll").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["reports"], serde_json::json!([]));
    let (_, body) = get(&app, "/delegates/1").await;
    assert!(body.contains("Not checked in"));
}

#[tokio::test]
async fn poll_reports_desk_state() {
    let app = app().await;
    let (status, body) = get(&app, "/checkin/scan/poll").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["tab"], "scanner");
    assert_eq!(json["scanning"], false);
    assert_eq!(json["reports"], serde_json::json!([]));
}

#[tokio::test]
async fn roster_pick_and_confirmation_page() {
    let app = app().await;
    let (_, body) = get(&app, "/checkin?tab=delegates&q=michael").await;
    assert!(body.contains("Michael Brown"));
    assert!(!body.contains("John Smith"));

    let (status, location, _) = post_form(&app, "/checkin/delegates/3", "").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/checkin?tab=delegates"));

    let (status, body) = get(&app, "/checkin/confirmation/3").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Michael Brown"));
    assert!(body.contains("DEL-1003"));

    let (status, _, _) = post_form(&app, "/checkin/delegates/404", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/checkin/confirmation/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_form_keeps_input_on_errors() {
    let app = app().await;
    let (status, body) = get(&app, "/register?q=boston").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Healthcare Innovation Conference"));
    assert!(!body.contains("Annual Tech Summit 2023"));

    let (status, _, body) = post_form(
        &app,
        "/register/conf-1",
        "first_name=Ada&last_name=L&email=ada&phone=555&payment_method=credit_card",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Last name is required"));
    assert!(body.contains("Please enter a valid email address"));
    assert!(body.contains("You must agree to the terms and conditions"));
    assert!(body.contains("value=\"Ada\""));
}

#[tokio::test]
async fn valid_registration_is_pending() {
    let app = app().await;
    let (status, _, body) = post_form(&app, "/register/conf-1", VALID_REGISTRATION).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Registration Successful!"));
    assert!(body.contains("Ada Lovelace"));

    let (_, body) = get(&app, "/registrations?status=pending").await;
    assert!(body.contains("Ada Lovelace"));
    let (_, body) = get(&app, "/delegates?status=pending").await;
    assert!(body.contains("DEL-1006"));
}

#[tokio::test]
async fn closed_conference_refuses_registration() {
    let app = app().await;
    let (status, location, _) = post_form(&app, "/register/conf-3", VALID_REGISTRATION).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(location, None);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/register/conf-3").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/register?notice=closed");
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let app = app().await;
    assert_eq!(get(&app, "/conferences/nope").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/delegates/nope").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/registrations/nope").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/register/nope").await.0, StatusCode::NOT_FOUND);
    let (status, _, _) = post_form(&app, "/registrations/nope/approve", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conference_crud_round() {
    let app = app().await;
    let (status, _, body) = post_form(
        &app,
        "/conferences",
        "name=&start_date=2024-05-02&end_date=2024-05-01&location=Oslo&capacity=0&status=upcoming",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Conference name is required"));
    assert!(body.contains("End date cannot be before the start date"));
    assert!(body.contains("Capacity must be at least 1"));

    let (status, location, _) = post_form(
        &app,
        "/conferences",
        "name=Nordic+Rust&start_date=2024-05-01&location=Oslo&capacity=120&status=upcoming&price=99",
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/conferences?notice=created"));

    let (_, body) = get(&app, "/conferences?notice=created").await;
    assert!(body.contains("Nordic Rust"));
    assert!(body.contains("Saved successfully."));

    let (status, location, _) = post_form(&app, "/conferences/conf-5/delete", "").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/conferences?notice=deleted"));
    assert_eq!(get(&app, "/conferences/conf-5").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approve_pending_registration() {
    let app = app().await;
    let (status, location, _) = post_form(&app, "/registrations/2/approve", "").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/registrations?notice=approved"));

    let (_, body) = get(&app, "/registrations/2").await;
    assert!(body.contains("status-approved"));
}
