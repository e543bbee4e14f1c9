use chrono::{DateTime, Local};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::database::delegate_repo;
use crate::error::{DeskError, DeskResult};
use crate::models::{CheckInStatus, DelegateRow};

/// Result of dispatching one badge id against a roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "delegate", rename_all = "snake_case")]
pub enum CheckinOutcome {
    /// The record flipped to checked-in; carries the updated record.
    CheckedIn(DelegateRow),
    /// The record was already checked in; nothing changed.
    AlreadyCheckedIn(DelegateRow),
    NotFound,
}

impl CheckinOutcome {
    pub fn is_match(&self) -> bool {
        !matches!(self, CheckinOutcome::NotFound)
    }

    pub fn delegate(&self) -> Option<&DelegateRow> {
        match self {
            CheckinOutcome::CheckedIn(d) | CheckinOutcome::AlreadyCheckedIn(d) => Some(d),
            CheckinOutcome::NotFound => None,
        }
    }
}

/// Checks in the first roster record whose badge id equals `badge_id`
/// exactly (case-sensitive). At most one record changes.
pub fn check_in(roster: &mut [DelegateRow], badge_id: &str, stamp: &str) -> CheckinOutcome {
    check_in_first(roster, stamp, |d| d.badge_id == badge_id)
}

/// Same as [`check_in`], keyed by delegate id for roster picks.
pub fn check_in_by_id(roster: &mut [DelegateRow], delegate_id: &str, stamp: &str) -> CheckinOutcome {
    check_in_first(roster, stamp, |d| d.id == delegate_id)
}

fn check_in_first(
    roster: &mut [DelegateRow],
    stamp: &str,
    matches: impl Fn(&DelegateRow) -> bool,
) -> CheckinOutcome {
    let Some(record) = roster.iter_mut().find(|d| matches(d)) else {
        return CheckinOutcome::NotFound;
    };

    if record.is_checked_in() {
        return CheckinOutcome::AlreadyCheckedIn(record.clone());
    }

    record.check_in_status = CheckInStatus::CheckedIn.as_str().to_string();
    record.check_in_time = Some(stamp.to_string());
    CheckinOutcome::CheckedIn(record.clone())
}

/// Lazy, restartable view over the roster matching `term` against name,
/// email and badge id, case-insensitively. A blank term matches everything.
pub fn filter_roster<'a>(
    roster: &'a [DelegateRow],
    term: &str,
) -> impl Iterator<Item = &'a DelegateRow> + Clone + 'a {
    let needle = term.trim().to_lowercase();
    roster.iter().filter(move |d| {
        needle.is_empty()
            || d.name.to_lowercase().contains(&needle)
            || d.email.to_lowercase().contains(&needle)
            || d.badge_id.to_lowercase().contains(&needle)
    })
}

/// Checked-in records in roster order.
pub fn history(roster: &[DelegateRow]) -> impl Iterator<Item = &DelegateRow> + Clone {
    roster.iter().filter(|d| d.is_checked_in())
}

pub fn format_check_in_time(now: DateTime<Local>) -> String {
    now.format("Today, %-I:%M %p").to_string()
}

/// Loads the shared roster, dispatches `badge_id` and writes the change back.
pub async fn check_in_badge(pool: &SqlitePool, badge_id: &str) -> sqlx::Result<CheckinOutcome> {
    let mut roster = delegate_repo::list_roster(pool).await?;
    let stamp = format_check_in_time(Local::now());
    let outcome = check_in(&mut roster, badge_id, &stamp);
    persist_outcome(pool, outcome, &stamp).await
}

/// Roster pick. Dispatches by delegate id so a shared badge id can never
/// check in somebody else.
pub async fn check_in_delegate(pool: &SqlitePool, delegate_id: &str) -> DeskResult<CheckinOutcome> {
    let mut roster = delegate_repo::list_roster(pool).await?;
    let stamp = format_check_in_time(Local::now());
    match check_in_by_id(&mut roster, delegate_id, &stamp) {
        CheckinOutcome::NotFound => Err(DeskError::NotFound(delegate_id.to_string())),
        outcome => Ok(persist_outcome(pool, outcome, &stamp).await?),
    }
}

async fn persist_outcome(
    pool: &SqlitePool,
    outcome: CheckinOutcome,
    stamp: &str,
) -> sqlx::Result<CheckinOutcome> {
    match &outcome {
        CheckinOutcome::CheckedIn(record) => {
            let updated = delegate_repo::mark_checked_in(pool, &record.id, stamp).await?;
            if updated == 0 {
                // Someone else flipped it between load and write.
                let current = delegate_repo::load_delegate(pool, &record.id).await?;
                return Ok(current
                    .map(CheckinOutcome::AlreadyCheckedIn)
                    .unwrap_or(CheckinOutcome::NotFound));
            }
            info!(delegate_id = %record.id, badge_id = %record.badge_id, "delegate checked in");
        }
        CheckinOutcome::AlreadyCheckedIn(record) => {
            debug!(delegate_id = %record.id, badge_id = %record.badge_id, "badge already checked in");
        }
        CheckinOutcome::NotFound => {
            debug!("badge not on roster");
        }
    }
    Ok(outcome)
}

pub struct RosterPageData {
    pub roster: Vec<RosterEntryView>,
    pub history: Vec<RosterEntryView>,
}

/// Roster filtered by `term` plus the check-in history, from one roster load.
pub async fn build_roster_page(pool: &SqlitePool, term: &str) -> sqlx::Result<RosterPageData> {
    let roster = delegate_repo::list_roster(pool).await?;
    Ok(RosterPageData {
        roster: filter_roster(&roster, term).map(RosterEntryView::from).collect(),
        history: history(&roster).map(RosterEntryView::from).collect(),
    })
}

pub async fn load_confirmation(
    pool: &SqlitePool,
    delegate_id: &str,
) -> sqlx::Result<Option<ConfirmationView>> {
    let delegate = delegate_repo::load_delegate(pool, delegate_id).await?;
    Ok(delegate.as_ref().map(ConfirmationView::from))
}

#[derive(Debug, Clone)]
pub struct RosterEntryView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub badge_id: String,
    pub conference_name: String,
    pub checked_in: bool,
    pub check_in_time: String,
}

impl From<&DelegateRow> for RosterEntryView {
    fn from(d: &DelegateRow) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            email: d.email.clone(),
            badge_id: d.badge_id.clone(),
            conference_name: d.conference_name.clone().unwrap_or_default(),
            checked_in: d.is_checked_in(),
            check_in_time: d.check_in_time.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationView {
    pub delegate_id: String,
    pub delegate_name: String,
    pub conference_name: String,
    pub badge_id: String,
    pub check_in_time: String,
}

impl From<&DelegateRow> for ConfirmationView {
    fn from(d: &DelegateRow) -> Self {
        Self {
            delegate_id: d.id.clone(),
            delegate_name: d.name.clone(),
            conference_name: d
                .conference_name
                .clone()
                .unwrap_or_else(|| "No conference".to_string()),
            badge_id: d.badge_id.clone(),
            check_in_time: d.check_in_time.clone().unwrap_or_default(),
        }
    }
}

/// User-facing notice for a dispatch outcome that does not open the overlay.
pub fn outcome_notice(outcome: &CheckinOutcome, badge_id: &str) -> Option<String> {
    match outcome {
        CheckinOutcome::CheckedIn(_) => None,
        CheckinOutcome::AlreadyCheckedIn(d) => Some(format!(
            "{} ({}) is already checked in{}",
            d.name,
            d.badge_id,
            d.check_in_time
                .as_deref()
                .map(|t| format!(" since {t}"))
                .unwrap_or_default()
        )),
        CheckinOutcome::NotFound => Some(format!("No delegate found with badge ID {badge_id}")),
    }
}

/// Badge id carried by a scanned code. Badge QR codes encode
/// `delegate:{id}:{badge}`; anything else is taken as a bare badge id.
pub fn badge_from_qr(payload: &str) -> &str {
    let payload = payload.trim();
    match payload.strip_prefix("delegate:") {
        Some(rest) => rest.rsplit_once(':').map(|(_, badge)| badge).unwrap_or(rest),
        None => payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_payloads_reduce_to_badge_ids() {
        assert_eq!(badge_from_qr("delegate:1:DEL-1001"), "DEL-1001");
        assert_eq!(badge_from_qr(" DEL-1002 "), "DEL-1002");
        assert_eq!(badge_from_qr("delegate:DEL-1003"), "DEL-1003");
    }

    fn delegate(id: &str, name: &str, badge: &str, checked_in: Option<&str>) -> DelegateRow {
        DelegateRow {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: "+1 (555) 000-0000".to_string(),
            organization: None,
            status: "active".to_string(),
            badge_id: badge.to_string(),
            conference_id: Some("conf-1".to_string()),
            conference_name: Some("Annual Tech Summit 2023".to_string()),
            check_in_status: if checked_in.is_some() {
                "checked-in".to_string()
            } else {
                "not-checked-in".to_string()
            },
            check_in_time: checked_in.map(str::to_string),
            registered_events: 0,
        }
    }

    fn roster() -> Vec<DelegateRow> {
        vec![
            delegate("1", "John Smith", "DEL-1001", None),
            delegate("2", "Sarah Johnson", "DEL-1002", Some("Today, 9:45 AM")),
            delegate("3", "Michael Brown", "DEL-1003", None),
        ]
    }

    #[test]
    fn match_flips_exactly_one_record() {
        let mut r = roster();
        let before = r.clone();

        let outcome = check_in(&mut r, "DEL-1001", "Today, 10:00 AM");

        let CheckinOutcome::CheckedIn(updated) = outcome else {
            panic!("expected a match");
        };
        assert_eq!(updated.check_in_status, "checked-in");
        assert_eq!(updated.check_in_time.as_deref(), Some("Today, 10:00 AM"));
        assert_eq!(r[0], updated);
        assert_eq!(r[1..], before[1..]);
    }

    #[test]
    fn unknown_badge_changes_nothing() {
        let mut r = roster();
        let before = r.clone();
        assert_eq!(check_in(&mut r, "DEL-9999", "now"), CheckinOutcome::NotFound);
        assert_eq!(r, before);
    }

    #[test]
    fn roster_pick_targets_the_chosen_record() {
        let mut r = roster();
        r.push(delegate("4", "Emily Davis", "DEL-1001", None));

        let CheckinOutcome::CheckedIn(updated) = check_in_by_id(&mut r, "4", "now") else {
            panic!("expected a match");
        };
        assert_eq!(updated.name, "Emily Davis");
        assert!(!r[0].is_checked_in());
        assert_eq!(check_in_by_id(&mut r, "9", "now"), CheckinOutcome::NotFound);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let mut r = roster();
        assert_eq!(check_in(&mut r, "del-1001", "now"), CheckinOutcome::NotFound);
    }

    #[test]
    fn second_check_in_reports_already_checked_in_and_keeps_time() {
        let mut r = roster();
        assert!(matches!(
            check_in(&mut r, "DEL-1003", "Today, 10:00 AM"),
            CheckinOutcome::CheckedIn(_)
        ));
        let again = check_in(&mut r, "DEL-1003", "Today, 11:00 AM");
        let CheckinOutcome::AlreadyCheckedIn(d) = again else {
            panic!("expected already checked in");
        };
        assert_eq!(d.check_in_time.as_deref(), Some("Today, 10:00 AM"));
        assert_eq!(r[2].check_in_time.as_deref(), Some("Today, 10:00 AM"));
    }

    #[test]
    fn first_matching_badge_wins() {
        let mut r = roster();
        r.push(delegate("4", "Clone", "DEL-1001", None));
        let CheckinOutcome::CheckedIn(d) = check_in(&mut r, "DEL-1001", "now") else {
            panic!("expected a match");
        };
        assert_eq!(d.id, "1");
        assert!(!r[3].is_checked_in());
    }

    #[test]
    fn empty_term_returns_roster_unchanged() {
        let r = roster();
        let all: Vec<&DelegateRow> = filter_roster(&r, "").collect();
        assert_eq!(all.len(), r.len());
        assert!(all.iter().zip(r.iter()).all(|(a, b)| *a == b));
        assert_eq!(filter_roster(&r, "   ").count(), r.len());
    }

    #[test]
    fn filter_matches_name_email_or_badge_case_insensitively() {
        let r = roster();
        let ids: Vec<&str> = filter_roster(&r, "sarah").map(|d| d.badge_id.as_str()).collect();
        assert_eq!(ids, vec!["DEL-1002"]);

        let ids: Vec<&str> = filter_roster(&r, "BROWN@").map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);

        let ids: Vec<&str> = filter_roster(&r, "del-100").map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        assert_eq!(filter_roster(&r, "nobody").count(), 0);
    }

    #[test]
    fn filter_view_is_restartable_and_leaves_roster_alone() {
        let r = roster();
        let view = filter_roster(&r, "j");
        let first: Vec<_> = view.clone().map(|d| d.id.clone()).collect();
        let second: Vec<_> = view.map(|d| d.id.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(r, roster());
    }

    #[test]
    fn history_lists_checked_in_in_roster_order() {
        let mut r = roster();
        check_in(&mut r, "DEL-1001", "Today, 10:00 AM");
        let ids: Vec<&str> = history(&r).map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn notices() {
        let r = roster();
        assert_eq!(
            outcome_notice(&CheckinOutcome::NotFound, "DEL-9").as_deref(),
            Some("No delegate found with badge ID DEL-9")
        );
        let already = CheckinOutcome::AlreadyCheckedIn(r[1].clone());
        assert_eq!(
            outcome_notice(&already, "DEL-1002").as_deref(),
            Some("Sarah Johnson (DEL-1002) is already checked in since Today, 9:45 AM")
        );
        assert!(outcome_notice(&CheckinOutcome::CheckedIn(r[0].clone()), "DEL-1001").is_none());
    }
}
