use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, FieldError};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 ().-]{5,19}$").unwrap();
    static ref POSTAL_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]{1,9}$").unwrap();
    // Area/Location shape, e.g. America/Vancouver or Etc/GMT+8
    static ref TIMEZONE_RE: Regex = Regex::new(r"^[A-Za-z_]+(?:/[A-Za-z0-9_+\-]+)+$").unwrap();
}

/// Trims a request field; an empty or whitespace-only value counts as absent.
pub fn normalize(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Collects failures across every rule so the client sees all of them at once.
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Records an error when the field is absent; returns the value otherwise.
    pub fn require<'a>(
        &mut self,
        field: &str,
        value: Option<&'a str>,
        message: &str,
    ) -> Option<&'a str> {
        if value.is_none() {
            self.push(field, message);
        }
        value
    }

    pub fn length_max(&mut self, field: &str, value: Option<&str>, max: usize, message: &str) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.push(field, message);
            }
        }
    }

    pub fn length_min(&mut self, field: &str, value: Option<&str>, min: usize, message: &str) {
        if let Some(v) = value {
            if v.chars().count() < min {
                self.push(field, message);
            }
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !EMAIL_RE.is_match(v) {
                self.push(field, "Provide a valid email address.");
            }
        }
    }

    pub fn phone(&mut self, field: &str, value: Option<&str>, message: &str) {
        if let Some(v) = value {
            if !PHONE_RE.is_match(v) {
                self.push(field, message);
            }
        }
    }

    pub fn postal_code(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !POSTAL_RE.is_match(v) {
                self.push(field, "Invalid postal code");
            }
        }
    }

    pub fn website(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            let ok = url::Url::parse(v)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !ok {
                self.push(field, "The website address does not appear to be valid");
            }
        }
    }

    pub fn timezone(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if v != "UTC" && !TIMEZONE_RE.is_match(v) {
                self.push(field, "The timezone value is not a valid IANA zone");
            }
        }
    }

    /// Cross-field rule: `value` must equal `expected` when both are present.
    pub fn equals(
        &mut self,
        field: &str,
        value: Option<&str>,
        expected: Option<&str>,
        message: &str,
    ) {
        if let (Some(v), Some(e)) = (value, expected) {
            if v != e {
                self.push(field, message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(checks: FieldChecks) -> Vec<FieldError> {
        match checks.finish() {
            Ok(()) => vec![],
            Err(AppError::Validation(fields)) => fields,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn normalize_treats_blank_as_absent() {
        assert_eq!(normalize(&Some("  alice  ".into())), Some("alice"));
        assert_eq!(normalize(&Some("   ".into())), None);
        assert_eq!(normalize(&None), None);
    }

    #[test]
    fn collects_every_failure_instead_of_stopping_at_the_first() {
        let mut checks = FieldChecks::new();
        checks.require("username", None, "A username is required.");
        checks.email("email", Some("not-an-email"));
        checks.length_min(
            "new-password",
            Some("short"),
            8,
            "A minimum length of 8 characters is needed for the password.",
        );
        let errs = errors(checks);
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0].field, "username");
        assert_eq!(errs[1].field, "email");
        assert_eq!(errs[2].field, "new-password");
    }

    #[test]
    fn email_formats() {
        let mut checks = FieldChecks::new();
        checks.email("email", Some("a@example.com"));
        assert!(checks.is_empty());
        checks.email("email", Some("a@@example"));
        assert!(!checks.is_empty());
    }

    #[test]
    fn phone_formats() {
        let mut checks = FieldChecks::new();
        checks.phone("phone", Some("+1 (604) 555-0199"), "bad phone");
        checks.phone("fax", Some("604-555-0123"), "bad fax");
        assert!(checks.is_empty());
        checks.phone("phone", Some("call me"), "bad phone");
        assert!(!checks.is_empty());
    }

    #[test]
    fn postal_code_formats() {
        let mut checks = FieldChecks::new();
        checks.postal_code("postal_code", Some("V6B 1A1"));
        checks.postal_code("postal_code", Some("90210"));
        assert!(checks.is_empty());
        checks.postal_code("postal_code", Some("!"));
        assert!(!checks.is_empty());
    }

    #[test]
    fn website_must_be_http_url() {
        let mut checks = FieldChecks::new();
        checks.website("website", Some("https://food.example.org/donate"));
        assert!(checks.is_empty());
        checks.website("website", Some("ftp://food.example.org"));
        checks.website("website", Some("not a url"));
        let errs = errors(checks);
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn timezone_shapes() {
        let mut checks = FieldChecks::new();
        checks.timezone("timezone", Some("America/Vancouver"));
        checks.timezone("timezone", Some("America/Argentina/Buenos_Aires"));
        checks.timezone("timezone", Some("Etc/GMT+8"));
        checks.timezone("timezone", Some("UTC"));
        assert!(checks.is_empty());
        checks.timezone("timezone", Some("Pacific Time"));
        assert!(!checks.is_empty());
    }

    #[test]
    fn equals_flags_mismatch_only_when_both_present() {
        let mut checks = FieldChecks::new();
        checks.equals(
            "confirm-password",
            Some("password1"),
            Some("password1"),
            "The password confirmation must match the password value.",
        );
        assert!(checks.is_empty());
        checks.equals(
            "confirm-password",
            Some("password2"),
            Some("password1"),
            "The password confirmation must match the password value.",
        );
        assert!(!checks.is_empty());
    }

    #[test]
    fn optional_fields_skip_format_checks_when_absent() {
        let mut checks = FieldChecks::new();
        checks.email("email", None);
        checks.phone("phone", None, "bad phone");
        checks.website("website", None);
        checks.timezone("timezone", None);
        assert!(checks.is_empty());
    }
}
