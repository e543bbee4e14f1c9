use sqlx::SqlitePool;

use crate::database::{conference_repo, dashboard_repo, delegate_repo};
use crate::models::DashboardCountsRow;
use crate::services::checkin_service::{self, RosterEntryView};
use crate::services::conference_service::{self, ConferenceCardView};

const UPCOMING_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardRole {
    Administrator,
    Staff,
    #[default]
    Delegate,
}

impl DashboardRole {
    pub fn as_str(self) -> &'static str {
        match self {
            DashboardRole::Administrator => "administrator",
            DashboardRole::Staff => "staff",
            DashboardRole::Delegate => "delegate",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DashboardRole::Administrator => "Admin Dashboard",
            DashboardRole::Staff => "Staff Dashboard",
            DashboardRole::Delegate => "Delegate Dashboard",
        }
    }
}

/// Case-insensitive; anything else is the delegate view.
pub fn parse_role(raw: Option<&str>) -> DashboardRole {
    match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
        Some("administrator") => DashboardRole::Administrator,
        Some("staff") => DashboardRole::Staff,
        _ => DashboardRole::Delegate,
    }
}

pub struct DashboardView {
    pub role: DashboardRole,
    pub counts: DashboardCountsRow,
    pub upcoming: Vec<ConferenceCardView>,
    pub recent_check_ins: Vec<RosterEntryView>,
}

impl DashboardView {
    pub fn is_admin(&self) -> bool {
        self.role == DashboardRole::Administrator
    }

    pub fn is_staff(&self) -> bool {
        self.role == DashboardRole::Staff
    }
}

pub async fn load_dashboard(pool: &SqlitePool, role: DashboardRole) -> sqlx::Result<DashboardView> {
    let counts = dashboard_repo::load_counts(pool).await?;
    let available = conference_repo::list_available(pool).await?;
    let upcoming = available
        .iter()
        .take(UPCOMING_LIMIT)
        .map(conference_service::card_view)
        .collect();

    let recent_check_ins = if role == DashboardRole::Delegate {
        Vec::new()
    } else {
        let roster = delegate_repo::list_roster(pool).await?;
        checkin_service::history(&roster)
            .map(RosterEntryView::from)
            .collect()
    };

    Ok(DashboardView {
        role,
        counts,
        upcoming,
        recent_check_ins,
    })
}
