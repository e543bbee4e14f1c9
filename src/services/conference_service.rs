use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::conference_repo;
use crate::error::{DeskError, DeskResult};
use crate::models::{ConferenceRow, ConferenceStatus};
use crate::services::form_validation::{self as fv, FieldErrors};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct ConferenceCardView {
    pub id: String,
    pub name: String,
    pub date_label: String,
    pub time_label: Option<String>,
    pub location: String,
    pub capacity: i64,
    pub registered_count: i64,
    pub seats_left: i64,
    pub is_full: bool,
    pub capacity_pct: i64,
    pub status: String,
    pub price_label: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
}

pub fn card_view(row: &ConferenceRow) -> ConferenceCardView {
    let seats_left = (row.capacity - row.registered_count).max(0);
    let capacity_pct = if row.capacity > 0 {
        (row.registered_count * 100 / row.capacity).clamp(0, 100)
    } else {
        0
    };
    ConferenceCardView {
        id: row.id.clone(),
        name: row.name.clone(),
        date_label: format_date_range(&row.start_date, row.end_date.as_deref()),
        time_label: row.time_label.clone(),
        location: row.location.clone(),
        capacity: row.capacity,
        registered_count: row.registered_count,
        seats_left,
        is_full: seats_left == 0,
        capacity_pct,
        status: row.status.clone(),
        price_label: format_price(row.price_cents),
        tags: parse_tags(row.tags.as_deref()),
        description: row.description.clone(),
    }
}

/// `Nov 15, 2023`, or `Nov 15, 2023 - Nov 17, 2023` for multi-day events.
/// Unparseable dates are shown as stored.
pub fn format_date_range(start: &str, end: Option<&str>) -> String {
    let start_label = format_date(start);
    match end.filter(|e| *e != start) {
        Some(end) => format!("{start_label} - {}", format_date(end)),
        None => start_label,
    }
}

fn format_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn format_price(cents: i64) -> String {
    if cents <= 0 {
        return "Free".to_string();
    }
    format!("${}.{:02}", cents / 100, cents % 100)
}

fn parse_tags(json: Option<&str>) -> Vec<String> {
    let Some(raw) = json else {
        return Vec::new();
    };
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
}

pub async fn list_cards(pool: &SqlitePool) -> sqlx::Result<Vec<ConferenceCardView>> {
    let rows = conference_repo::list_conferences(pool).await?;
    Ok(rows.iter().map(card_view).collect())
}

pub async fn load_card(
    pool: &SqlitePool,
    conference_id: &str,
) -> sqlx::Result<Option<ConferenceCardView>> {
    let row = conference_repo::load_conference(pool, conference_id).await?;
    Ok(row.as_ref().map(card_view))
}

/// Conference editor form. Numbers arrive as text so bad input can be
/// echoed back next to its message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConferenceForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub time_label: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub capacity: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub tags: String, // comma separated
}

impl ConferenceForm {
    pub fn blank() -> Self {
        Self {
            status: ConferenceStatus::Upcoming.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn from_row(row: &ConferenceRow) -> Self {
        Self {
            name: row.name.clone(),
            start_date: row.start_date.clone(),
            end_date: row.end_date.clone().unwrap_or_default(),
            time_label: row.time_label.clone().unwrap_or_default(),
            location: row.location.clone(),
            capacity: row.capacity.to_string(),
            status: row.status.clone(),
            description: row.description.clone().unwrap_or_default(),
            price: format!("{}.{:02}", row.price_cents / 100, row.price_cents % 100),
            tags: parse_tags(row.tags.as_deref()).join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidConference {
    pub name: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub time_label: Option<String>,
    pub location: String,
    pub capacity: i64,
    pub status: ConferenceStatus,
    pub description: Option<String>,
    pub price_cents: i64,
    pub tags_json: Option<String>,
}

pub fn validate(form: &ConferenceForm) -> Result<ValidConference, FieldErrors> {
    let mut errors = FieldErrors::new();
    fv::require(&mut errors, "name", &form.name, "Conference name is required");
    fv::require(&mut errors, "location", &form.location, "Location is required");

    let start = NaiveDate::parse_from_str(form.start_date.trim(), DATE_FORMAT).ok();
    if start.is_none() {
        errors.add("start_date", "Start date is required (YYYY-MM-DD)");
    }
    let end = match fv::optional(Some(form.end_date.as_str())) {
        None => None,
        Some(raw) => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add("end_date", "End date must be a date (YYYY-MM-DD)");
                None
            }
        },
    };
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.add("end_date", "End date cannot be before the start date");
        }
    }

    let capacity = form.capacity.trim().parse::<i64>().ok().filter(|c| *c >= 1);
    if capacity.is_none() {
        errors.add("capacity", "Capacity must be at least 1");
    }
    let status = ConferenceStatus::parse(&form.status);
    if status.is_none() {
        errors.add("status", "Please select a status");
    }
    let price_cents = match fv::optional(Some(form.price.as_str())) {
        None => Some(0),
        Some(raw) => parse_price_cents(raw),
    };
    if price_cents.is_none() {
        errors.add("price", "Price must be a non-negative amount");
    }
    errors.into_result()?;

    let tags: Vec<&str> = form
        .tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let tags_json = if tags.is_empty() {
        None
    } else {
        serde_json::to_string(&tags).ok()
    };

    Ok(ValidConference {
        name: form.name.trim().to_string(),
        start_date: start.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default(),
        end_date: end.map(|d| d.format(DATE_FORMAT).to_string()),
        time_label: fv::optional(Some(form.time_label.as_str())).map(str::to_string),
        location: form.location.trim().to_string(),
        capacity: capacity.unwrap_or(1),
        status: status.unwrap_or(ConferenceStatus::Upcoming),
        description: fv::optional(Some(form.description.as_str())).map(str::to_string),
        price_cents: price_cents.unwrap_or(0),
        tags_json,
    })
}

/// Parses `499`, `499.9` or `499.00` into cents.
fn parse_price_cents(raw: &str) -> Option<i64> {
    let raw = raw.trim().trim_start_matches('$');
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let dollars: i64 = whole.parse().ok().filter(|d| *d >= 0)?;
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    dollars.checked_mul(100)?.checked_add(cents)
}

pub async fn create_conference(pool: &SqlitePool, form: &ConferenceForm) -> DeskResult<String> {
    let valid = validate(form).map_err(DeskError::ValidationFailed)?;
    let id = Uuid::new_v4().to_string();
    conference_repo::insert_conference(
        pool,
        conference_repo::NewConference {
            id: &id,
            name: &valid.name,
            start_date: &valid.start_date,
            end_date: valid.end_date.as_deref(),
            time_label: valid.time_label.as_deref(),
            location: &valid.location,
            capacity: valid.capacity,
            registered_count: 0,
            status: valid.status.as_str(),
            description: valid.description.as_deref(),
            price_cents: valid.price_cents,
            tags: valid.tags_json.as_deref(),
        },
    )
    .await?;
    info!(conference_id = %id, name = %valid.name, "conference created");
    Ok(id)
}

pub async fn update_conference(
    pool: &SqlitePool,
    conference_id: &str,
    form: &ConferenceForm,
) -> DeskResult<()> {
    let valid = validate(form).map_err(DeskError::ValidationFailed)?;
    let changed = conference_repo::update_conference(
        pool,
        conference_id,
        conference_repo::ConferenceChanges {
            name: &valid.name,
            start_date: &valid.start_date,
            end_date: valid.end_date.as_deref(),
            time_label: valid.time_label.as_deref(),
            location: &valid.location,
            capacity: valid.capacity,
            status: valid.status.as_str(),
            description: valid.description.as_deref(),
            price_cents: valid.price_cents,
            tags: valid.tags_json.as_deref(),
        },
    )
    .await?;
    if changed == 0 {
        return Err(DeskError::NotFound(conference_id.to_string()));
    }
    info!(conference_id, "conference updated");
    Ok(())
}

pub async fn delete_conference(pool: &SqlitePool, conference_id: &str) -> DeskResult<()> {
    if conference_repo::delete_conference(pool, conference_id).await? == 0 {
        return Err(DeskError::NotFound(conference_id.to_string()));
    }
    info!(conference_id, "conference deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    fn form() -> ConferenceForm {
        ConferenceForm {
            name: "RustConf".to_string(),
            start_date: "2024-09-10".to_string(),
            end_date: "2024-09-13".to_string(),
            location: "Montreal".to_string(),
            capacity: "800".to_string(),
            status: "upcoming".to_string(),
            price: "349.5".to_string(),
            tags: "Rust, Systems, ,".to_string(),
            ..ConferenceForm::default()
        }
    }

    #[test]
    fn date_ranges_are_humanized() {
        assert_eq!(format_date_range("2023-11-15", None), "Nov 15, 2023");
        assert_eq!(
            format_date_range("2023-11-15", Some("2023-11-17")),
            "Nov 15, 2023 - Nov 17, 2023"
        );
        assert_eq!(format_date_range("2023-11-15", Some("2023-11-15")), "Nov 15, 2023");
        assert_eq!(format_date_range("soon", None), "soon");
    }

    #[test]
    fn prices_render_in_dollars() {
        assert_eq!(format_price(49_900), "$499.00");
        assert_eq!(format_price(14_999), "$149.99");
        assert_eq!(format_price(0), "Free");
        assert_eq!(parse_price_cents("349.5"), Some(34_950));
        assert_eq!(parse_price_cents("$12"), Some(1_200));
        assert_eq!(parse_price_cents("1.234"), None);
        assert_eq!(parse_price_cents("-3"), None);
    }

    #[test]
    fn valid_form_normalizes_fields() {
        let valid = validate(&form()).unwrap();
        assert_eq!(valid.capacity, 800);
        assert_eq!(valid.price_cents, 34_950);
        assert_eq!(valid.tags_json.as_deref(), Some(r#"["Rust","Systems"]"#));
        assert_eq!(valid.time_label, None);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut bad = form();
        bad.end_date = "2024-09-01".to_string();
        bad.capacity = "0".to_string();
        bad.status = "postponed".to_string();
        let errors = validate(&bad).unwrap_err();
        assert_eq!(
            errors.message("end_date"),
            Some("End date cannot be before the start date")
        );
        assert!(errors.contains("capacity"));
        assert!(errors.contains("status"));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn card_reports_remaining_seats() {
        let row = ConferenceRow {
            id: "c".to_string(),
            name: "Forum".to_string(),
            start_date: "2023-10-10".to_string(),
            end_date: None,
            time_label: None,
            location: "London".to_string(),
            capacity: 400,
            registered_count: 400,
            status: "completed".to_string(),
            description: None,
            price_cents: 0,
            tags: Some(r#"["Business"]"#.to_string()),
        };
        let card = card_view(&row);
        assert!(card.is_full);
        assert_eq!(card.seats_left, 0);
        assert_eq!(card.capacity_pct, 100);
        assert_eq!(card.tags, vec!["Business".to_string()]);
    }

    #[tokio::test]
    async fn create_edit_delete_round() {
        let pool = database::open_in_memory().await.unwrap();
        let id = create_conference(&pool, &form()).await.unwrap();

        let mut edit = ConferenceForm::from_row(
            &conference_repo::load_conference(&pool, &id).await.unwrap().unwrap(),
        );
        assert_eq!(edit.price, "349.50");
        assert_eq!(edit.tags, "Rust, Systems");
        edit.capacity = "900".to_string();
        update_conference(&pool, &id, &edit).await.unwrap();
        let card = load_card(&pool, &id).await.unwrap().unwrap();
        assert_eq!(card.capacity, 900);

        delete_conference(&pool, &id).await.unwrap();
        assert!(load_card(&pool, &id).await.unwrap().is_none());
        assert!(matches!(
            delete_conference(&pool, &id).await,
            Err(DeskError::NotFound(_))
        ));
    }
}
