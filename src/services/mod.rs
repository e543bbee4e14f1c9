pub mod checkin_desk;
pub mod checkin_service;
pub mod checkin_view;
pub mod conference_service;
pub mod dashboard_service;
pub mod delegate_service;
pub mod form_validation;
pub mod registration_service;
pub mod registration_workflow;
pub mod scan_feed;
