use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Field name to user-facing message, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn message(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// `None` for blank input, the trimmed value otherwise.
pub fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

pub fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

pub fn require_min_chars(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    min: usize,
    message: &str,
) {
    if value.trim().chars().count() < min {
        errors.add(field, message);
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

pub fn require_email(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if !is_valid_email(value) {
        errors.add(field, "Please enter a valid email address");
    }
}

/// Phone numbers need at least ten characters and only dialing symbols.
pub fn require_phone(errors: &mut FieldErrors, field: &'static str, value: &str) {
    let v = value.trim();
    let allowed = v
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ' | '.'));
    if v.chars().count() < 10 || !allowed {
        errors.add(field, "Please enter a valid phone number");
    }
}

/// Browsers send `on` for a ticked checkbox and omit the field otherwise.
pub fn checkbox_ticked(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("john.doe@example.com"));
        assert!(is_valid_email("  a@b.co "));
        assert!(!is_valid_email("john.doe@example"));
        assert!(!is_valid_email("john doe@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        assert_eq!(errors.message("email"), Some("first"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn phone_rules() {
        let mut errors = FieldErrors::new();
        require_phone(&mut errors, "phone", "+1 (555) 123-4567");
        assert!(errors.is_empty());
        require_phone(&mut errors, "phone", "555-1234");
        assert!(errors.contains("phone"));

        let mut errors = FieldErrors::new();
        require_phone(&mut errors, "phone", "call me maybe");
        assert!(errors.contains("phone"));
    }

    #[test]
    fn checkbox_values() {
        assert!(checkbox_ticked(Some("on")));
        assert!(checkbox_ticked(Some("true")));
        assert!(!checkbox_ticked(Some("off")));
        assert!(!checkbox_ticked(None));
    }

    #[test]
    fn optional_drops_blank() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" Acme ")), Some("Acme"));
        assert_eq!(optional(None), None);
    }
}
