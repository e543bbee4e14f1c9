use super::checkin_service::ConfirmationView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckinTab {
    #[default]
    Scanner,
    ManualEntry,
    RosterBrowse,
    History,
}

impl CheckinTab {
    pub const ALL: [CheckinTab; 4] = [
        CheckinTab::Scanner,
        CheckinTab::ManualEntry,
        CheckinTab::RosterBrowse,
        CheckinTab::History,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckinTab::Scanner => "scanner",
            CheckinTab::ManualEntry => "manual",
            CheckinTab::RosterBrowse => "delegates",
            CheckinTab::History => "history",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CheckinTab::Scanner => "QR Scanner",
            CheckinTab::ManualEntry => "Manual Check-in",
            CheckinTab::RosterBrowse => "Delegates",
            CheckinTab::History => "History",
        }
    }
}

/// Unknown or missing tab names keep the current tab.
pub fn parse_tab(input: Option<&str>) -> Option<CheckinTab> {
    match input?.trim() {
        "scanner" => Some(CheckinTab::Scanner),
        "manual" => Some(CheckinTab::ManualEntry),
        "delegates" => Some(CheckinTab::RosterBrowse),
        "history" => Some(CheckinTab::History),
        _ => None,
    }
}

/// Tab selection plus the confirmation overlay layered on top of it.
///
/// The overlay is modal: while it is open the tab cannot change, so
/// dismissing it lands on the tab it was opened over.
#[derive(Debug, Clone, Default)]
pub struct CheckinView {
    tab: CheckinTab,
    confirmation: Option<ConfirmationView>,
}

impl CheckinView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> CheckinTab {
        self.tab
    }

    pub fn confirmation(&self) -> Option<&ConfirmationView> {
        self.confirmation.as_ref()
    }

    pub fn is_confirming(&self) -> bool {
        self.confirmation.is_some()
    }

    /// Returns the previous tab. Ignored while the overlay is open.
    pub fn select_tab(&mut self, tab: CheckinTab) -> CheckinTab {
        if self.is_confirming() {
            return self.tab;
        }
        std::mem::replace(&mut self.tab, tab)
    }

    pub fn open_confirmation(&mut self, confirmation: ConfirmationView) {
        self.confirmation = Some(confirmation);
    }

    pub fn dismiss_confirmation(&mut self) -> Option<ConfirmationView> {
        self.confirmation.take()
    }
}
