pub mod checkin;
pub mod conferences;
pub mod dashboard;
pub mod delegates;
pub mod register;
pub mod registrations;
