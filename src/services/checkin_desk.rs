//! The check-in session: tab state, confirmation overlay and the scan feed
//! that runs while the scanner tab is open.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::DeskResult;
use crate::models::DelegateRow;
use crate::services::checkin_service::{self, CheckinOutcome, ConfirmationView};
use crate::services::checkin_view::{CheckinTab, CheckinView};
use crate::services::scan_feed::{CaptureDevice, ScanEvent, ScanFeed, ScanOutcome};

/// What happened to one dispatched badge or scan attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanReport {
    CheckedIn { delegate: DelegateRow },
    AlreadyCheckedIn { delegate: DelegateRow },
    NotFound { badge_id: String },
    ReadFailed { reason: String },
}

pub struct CheckinDesk {
    view: CheckinView,
    device: Arc<dyn CaptureDevice>,
    scan_interval: Duration,
    feed: Option<ScanFeed>,
    generation: u64,
    notice: Option<String>,
}

impl CheckinDesk {
    pub fn new(device: Arc<dyn CaptureDevice>, scan_interval: Duration) -> Self {
        Self {
            view: CheckinView::new(),
            device,
            scan_interval,
            feed: None,
            generation: 0,
            notice: None,
        }
    }

    pub fn view(&self) -> &CheckinView {
        &self.view
    }

    pub fn tab(&self) -> CheckinTab {
        self.view.tab()
    }

    pub fn is_scanning(&self) -> bool {
        self.feed.is_some()
    }

    /// Bumped every time the scanner tab is left.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Switches tabs. Leaving the scanner stops its feed; entering it
    /// acquires the capture device. When acquisition fails the desk falls
    /// back to manual entry and the error is returned.
    pub async fn select_tab(&mut self, tab: CheckinTab) -> DeskResult<()> {
        let previous = self.view.select_tab(tab);
        if previous == CheckinTab::Scanner && self.view.tab() != CheckinTab::Scanner {
            self.stop_scanning().await;
        }
        self.ensure_scanning()
    }

    /// A render of the check-in page. Whatever the feed buffered before the
    /// page was shown is stale and dropped.
    pub async fn enter_page(&mut self, tab: Option<CheckinTab>) -> DeskResult<()> {
        self.reap_idle_feed().await;
        let selected = match tab {
            Some(tab) => self.select_tab(tab).await,
            None => self.ensure_scanning(),
        };
        self.discard_buffered();
        selected
    }

    /// Retires a feed whose idle watchdog fired. The generation moves on so
    /// nothing it produced can be dispatched.
    async fn reap_idle_feed(&mut self) {
        if self.feed.as_ref().is_some_and(|f| f.is_cancelled()) {
            info!(generation = self.generation, "scan feed went idle, retiring it");
            self.stop_scanning().await;
        }
    }

    fn discard_buffered(&mut self) {
        if let Some(feed) = self.feed.as_mut() {
            let dropped = feed.discard_buffered();
            if dropped > 0 {
                debug!(dropped, generation = self.generation, "discarding buffered scans");
            }
        }
    }

    /// Starts the feed if the scanner tab is showing and no feed runs.
    pub fn ensure_scanning(&mut self) -> DeskResult<()> {
        if self.view.tab() != CheckinTab::Scanner || self.feed.is_some() {
            return Ok(());
        }
        match ScanFeed::start(self.device.as_ref(), self.scan_interval, self.generation) {
            Ok(feed) => {
                self.feed = Some(feed);
                Ok(())
            }
            Err(e) => {
                warn!("Scanner unavailable, falling back to manual entry: {}", e);
                self.view.select_tab(CheckinTab::ManualEntry);
                self.notice = Some(format!("{e}. Enter the badge ID manually."));
                Err(e)
            }
        }
    }

    async fn stop_scanning(&mut self) {
        self.generation += 1;
        if let Some(feed) = self.feed.take() {
            feed.stop().await;
        }
    }

    /// Drains buffered scan events and dispatches the ones still current.
    /// A feed that went idle is replaced and its events are not dispatched.
    pub async fn poll_scanner(&mut self, pool: &SqlitePool) -> DeskResult<Vec<ScanReport>> {
        if self.feed.as_ref().is_some_and(|f| f.is_cancelled()) {
            self.reap_idle_feed().await;
            if let Err(e) = self.ensure_scanning() {
                debug!("Scanner not restarted: {}", e);
            }
            return Ok(Vec::new());
        }

        let mut pending = Vec::new();
        if let Some(feed) = self.feed.as_mut() {
            while let Some(event) = feed.try_next() {
                pending.push(event);
            }
        }

        let mut reports = Vec::new();
        for event in pending {
            if let Some(report) = self.handle_scan_event(pool, event).await? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// Dispatches one scan event. Events from an older generation, events
    /// arriving off the scanner tab and events arriving while a confirmation
    /// is open are dropped.
    pub async fn handle_scan_event(
        &mut self,
        pool: &SqlitePool,
        event: ScanEvent,
    ) -> DeskResult<Option<ScanReport>> {
        let current = self.feed.as_ref().map(|f| f.generation()) == Some(self.generation);
        if event.generation != self.generation
            || !current
            || self.view.tab() != CheckinTab::Scanner
            || self.view.is_confirming()
        {
            debug!(
                event_generation = event.generation,
                desk_generation = self.generation,
                "discarding scan event"
            );
            return Ok(None);
        }

        match event.outcome {
            ScanOutcome::Decoded { payload } => {
                let outcome = checkin_service::check_in_badge(pool, &payload).await?;
                Ok(Some(self.record_outcome(outcome, &payload)))
            }
            ScanOutcome::Failed { reason } => Ok(Some(ScanReport::ReadFailed { reason })),
        }
    }

    /// Manual badge entry.
    pub async fn check_in_badge(&mut self, pool: &SqlitePool, badge_id: &str) -> DeskResult<ScanReport> {
        let badge_id = badge_id.trim();
        let outcome = checkin_service::check_in_badge(pool, badge_id).await?;
        Ok(self.record_outcome(outcome, badge_id))
    }

    /// Roster pick.
    pub async fn check_in_delegate(
        &mut self,
        pool: &SqlitePool,
        delegate_id: &str,
    ) -> DeskResult<ScanReport> {
        let outcome = checkin_service::check_in_delegate(pool, delegate_id).await?;
        let badge_id = outcome
            .delegate()
            .map(|d| d.badge_id.clone())
            .unwrap_or_default();
        Ok(self.record_outcome(outcome, &badge_id))
    }

    fn record_outcome(&mut self, outcome: CheckinOutcome, badge_id: &str) -> ScanReport {
        self.notice = checkin_service::outcome_notice(&outcome, badge_id);
        match outcome {
            CheckinOutcome::CheckedIn(delegate) => {
                info!(badge_id, tab = self.view.tab().as_str(), "opening check-in confirmation");
                self.view.open_confirmation(ConfirmationView::from(&delegate));
                ScanReport::CheckedIn { delegate }
            }
            CheckinOutcome::AlreadyCheckedIn(delegate) => ScanReport::AlreadyCheckedIn { delegate },
            CheckinOutcome::NotFound => ScanReport::NotFound {
                badge_id: badge_id.to_string(),
            },
        }
    }

    /// Closes the overlay. Reads that piled up while it was open are dropped.
    pub fn dismiss_confirmation(&mut self) -> Option<ConfirmationView> {
        self.discard_buffered();
        self.view.dismiss_confirmation()
    }

    /// Stops any running feed; used on server shutdown.
    pub async fn shutdown(&mut self) {
        self.stop_scanning().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::services::scan_feed::{ScriptedCamera, SimulatedCamera};

    fn scripted(script: &[Option<&str>]) -> ScriptedCamera {
        ScriptedCamera::new(script.iter().map(|s| s.map(str::to_string)).collect())
    }

    #[tokio::test]
    async fn starts_on_scanner_and_acquires_device() {
        let camera = scripted(&[]);
        let leases = camera.leases();
        let mut desk = CheckinDesk::new(Arc::new(camera), Duration::from_secs(1));
        assert_eq!(desk.tab(), CheckinTab::Scanner);
        assert!(!desk.is_scanning());

        desk.ensure_scanning().unwrap();
        assert!(desk.is_scanning());
        assert_eq!(leases.active(), 1);

        desk.select_tab(CheckinTab::History).await.unwrap();
        assert!(!desk.is_scanning());
        assert_eq!(desk.generation(), 1);
        assert_eq!(leases.active(), 0);
    }

    #[tokio::test]
    async fn capture_failure_falls_back_to_manual_entry() {
        let mut desk = CheckinDesk::new(Arc::new(SimulatedCamera::unavailable()), Duration::from_secs(1));
        let err = desk.ensure_scanning().unwrap_err();
        assert!(matches!(err, crate::error::DeskError::CaptureUnavailable(_)));
        assert_eq!(desk.tab(), CheckinTab::ManualEntry);
        assert!(!desk.is_scanning());
        assert!(desk.take_notice().unwrap().contains("manually"));
    }

    #[tokio::test]
    async fn scanned_badge_opens_confirmation_over_scanner() {
        let pool = database::open_seeded().await.unwrap();
        let mut desk = CheckinDesk::new(Arc::new(scripted(&[])), Duration::from_secs(1));
        desk.ensure_scanning().unwrap();

        let event = ScanEvent {
            generation: desk.generation(),
            outcome: ScanOutcome::Decoded {
                payload: "DEL-1001".to_string(),
            },
        };
        let report = desk.handle_scan_event(&pool, event).await.unwrap();
        assert!(matches!(report, Some(ScanReport::CheckedIn { .. })));
        assert_eq!(desk.tab(), CheckinTab::Scanner);
        let confirmation = desk.view().confirmation().unwrap();
        assert_eq!(confirmation.delegate_name, "John Smith");
        assert_eq!(confirmation.conference_name, "Annual Tech Summit 2023");

        desk.dismiss_confirmation();
        assert_eq!(desk.tab(), CheckinTab::Scanner);
        desk.shutdown().await;
    }

    #[tokio::test]
    async fn read_failure_never_opens_confirmation() {
        let pool = database::open_seeded().await.unwrap();
        let mut desk = CheckinDesk::new(Arc::new(scripted(&[])), Duration::from_secs(1));
        desk.ensure_scanning().unwrap();

        let event = ScanEvent {
            generation: desk.generation(),
            outcome: ScanOutcome::Failed {
                reason: "Could not read QR code".to_string(),
            },
        };
        let report = desk.handle_scan_event(&pool, event).await.unwrap();
        assert!(matches!(report, Some(ScanReport::ReadFailed { .. })));
        assert!(!desk.view().is_confirming());
        desk.shutdown().await;
    }

    #[tokio::test]
    async fn stale_generation_is_discarded() {
        let pool = database::open_seeded().await.unwrap();
        let mut desk = CheckinDesk::new(Arc::new(scripted(&[])), Duration::from_secs(1));
        desk.ensure_scanning().unwrap();
        let stale_generation = desk.generation();

        desk.select_tab(CheckinTab::ManualEntry).await.unwrap();
        desk.select_tab(CheckinTab::Scanner).await.unwrap();

        let event = ScanEvent {
            generation: stale_generation,
            outcome: ScanOutcome::Decoded {
                payload: "DEL-1001".to_string(),
            },
        };
        assert_eq!(desk.handle_scan_event(&pool, event).await.unwrap(), None);
        assert!(!desk.view().is_confirming());

        let roster = crate::database::delegate_repo::list_roster(&pool).await.unwrap();
        assert!(!roster[0].is_checked_in());
        desk.shutdown().await;
    }

    #[tokio::test]
    async fn events_off_the_scanner_tab_are_discarded() {
        let pool = database::open_seeded().await.unwrap();
        let mut desk = CheckinDesk::new(Arc::new(scripted(&[])), Duration::from_secs(1));
        desk.ensure_scanning().unwrap();
        let generation = desk.generation();
        desk.select_tab(CheckinTab::RosterBrowse).await.unwrap();

        let event = ScanEvent {
            generation,
            outcome: ScanOutcome::Decoded {
                payload: "DEL-1003".to_string(),
            },
        };
        assert_eq!(desk.handle_scan_event(&pool, event).await.unwrap(), None);
        assert!(desk.poll_scanner(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn queued_events_are_not_delivered_after_leaving_scanner() {
        let pool = database::open_seeded().await.unwrap();
        let camera = scripted(&[Some("DEL-1001"), Some("DEL-1003")]);
        let mut desk = CheckinDesk::new(Arc::new(camera), Duration::from_millis(20));
        desk.ensure_scanning().unwrap();

        // Let reads land in the buffer without polling them.
        tokio::time::sleep(Duration::from_millis(120)).await;
        desk.select_tab(CheckinTab::ManualEntry).await.unwrap();

        assert!(desk.poll_scanner(&pool).await.unwrap().is_empty());
        assert!(!desk.view().is_confirming());
        let roster = crate::database::delegate_repo::list_roster(&pool).await.unwrap();
        assert!(!roster[0].is_checked_in());
        assert!(!roster[2].is_checked_in());
    }

    #[tokio::test]
    async fn polling_dispatches_buffered_scans_until_confirmation() {
        let pool = database::open_seeded().await.unwrap();
        let camera = scripted(&[None, Some("DEL-1003"), Some("DEL-1001")]);
        let mut desk = CheckinDesk::new(Arc::new(camera), Duration::from_millis(50));
        desk.ensure_scanning().unwrap();

        tokio::time::sleep(Duration::from_millis(125)).await;
        let reports = desk.poll_scanner(&pool).await.unwrap();

        assert_eq!(reports.len(), 2);
        assert!(matches!(reports[0], ScanReport::ReadFailed { .. }));
        let ScanReport::CheckedIn { delegate } = &reports[1] else {
            panic!("expected a check-in");
        };
        assert_eq!(delegate.badge_id, "DEL-1003");

        // The third read arrives while the overlay is open.
        tokio::time::sleep(Duration::from_millis(75)).await;
        assert!(desk.poll_scanner(&pool).await.unwrap().is_empty());
        let roster = crate::database::delegate_repo::list_roster(&pool).await.unwrap();
        assert!(!roster[0].is_checked_in());
        desk.shutdown().await;
    }

    #[tokio::test]
    async fn reads_buffered_under_overlay_are_dropped_on_dismiss() {
        let pool = database::open_seeded().await.unwrap();
        let camera = scripted(&[Some("DEL-1001")]);
        let mut desk = CheckinDesk::new(Arc::new(camera), Duration::from_millis(40));
        desk.ensure_scanning().unwrap();
        desk.check_in_badge(&pool, "DEL-1003").await.unwrap();
        assert!(desk.view().is_confirming());

        tokio::time::sleep(Duration::from_millis(70)).await;
        desk.dismiss_confirmation();
        assert_eq!(desk.tab(), CheckinTab::Scanner);

        assert!(desk.poll_scanner(&pool).await.unwrap().is_empty());
        assert!(!desk.view().is_confirming());
        let roster = crate::database::delegate_repo::list_roster(&pool).await.unwrap();
        assert!(!roster[0].is_checked_in());
        desk.shutdown().await;
    }

    #[tokio::test]
    async fn unread_feed_is_retired_and_its_reads_never_dispatch() {
        let pool = database::open_seeded().await.unwrap();
        let camera = scripted(&[Some("DEL-1001")]);
        let leases = camera.leases();
        let mut desk = CheckinDesk::new(Arc::new(camera), Duration::from_millis(20));
        desk.ensure_scanning().unwrap();

        // Nobody polls: the client went to another page.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(leases.active(), 0);

        assert!(desk.poll_scanner(&pool).await.unwrap().is_empty());
        assert_eq!(desk.generation(), 1);
        assert!(desk.is_scanning());
        assert_eq!(leases.active(), 1);
        assert!(!desk.view().is_confirming());
        let roster = crate::database::delegate_repo::list_roster(&pool).await.unwrap();
        assert!(!roster[0].is_checked_in());
        desk.shutdown().await;
    }

    #[tokio::test]
    async fn tab_switch_under_overlay_is_ignored() {
        let pool = database::open_seeded().await.unwrap();
        let mut desk = CheckinDesk::new(Arc::new(scripted(&[])), Duration::from_secs(1));
        desk.ensure_scanning().unwrap();
        desk.check_in_badge(&pool, "DEL-1001").await.unwrap();

        desk.select_tab(CheckinTab::History).await.unwrap();
        assert_eq!(desk.tab(), CheckinTab::Scanner);
        assert!(desk.is_scanning());

        desk.dismiss_confirmation();
        assert_eq!(desk.tab(), CheckinTab::Scanner);
        desk.shutdown().await;
    }

    #[tokio::test]
    async fn manual_entry_reports_unknown_and_repeat_badges() {
        let pool = database::open_seeded().await.unwrap();
        let mut desk = CheckinDesk::new(Arc::new(scripted(&[])), Duration::from_secs(1));
        desk.select_tab(CheckinTab::ManualEntry).await.unwrap();

        let report = desk.check_in_badge(&pool, " DEL-9999 ").await.unwrap();
        assert_eq!(
            report,
            ScanReport::NotFound {
                badge_id: "DEL-9999".to_string()
            }
        );
        assert!(desk.take_notice().unwrap().contains("DEL-9999"));

        let report = desk.check_in_badge(&pool, "DEL-1002").await.unwrap();
        assert!(matches!(report, ScanReport::AlreadyCheckedIn { .. }));
        assert!(!desk.view().is_confirming());
    }

    #[tokio::test]
    async fn roster_pick_checks_in_by_delegate_id() {
        let pool = database::open_seeded().await.unwrap();
        let mut desk = CheckinDesk::new(Arc::new(scripted(&[])), Duration::from_secs(1));
        desk.select_tab(CheckinTab::RosterBrowse).await.unwrap();

        let report = desk.check_in_delegate(&pool, "4").await.unwrap();
        let ScanReport::CheckedIn { delegate } = report else {
            panic!("expected a check-in");
        };
        assert_eq!(delegate.badge_id, "DEL-1004");
        assert_eq!(desk.tab(), CheckinTab::RosterBrowse);
        assert!(desk.view().is_confirming());

        assert!(desk.check_in_delegate(&pool, "missing").await.is_err());
    }
}
