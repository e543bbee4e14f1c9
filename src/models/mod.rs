pub mod conferences;
pub mod dashboard_counts;
pub mod delegates;
pub mod registrations;
pub mod status;

pub use conferences::ConferenceRow;
pub use dashboard_counts::DashboardCountsRow;
pub use delegates::DelegateRow;
pub use registrations::RegistrationRow;
pub use status::{
    CheckInStatus, ConferenceStatus, DelegateStatus, PaymentMethod, PaymentStatus,
    RegistrationStatus,
};
