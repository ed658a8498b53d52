//! Field-level validation of client attributes.

use crate::models::client::{Attribute, ClientAttributes};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::{collections::BTreeMap, sync::LazyLock};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Per-attribute validation messages. Empty means the record is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Attribute, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, attr: Attribute) -> Option<&str> {
        self.0.get(&attr).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages keyed by the attribute's wire name.
    pub fn to_messages(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(attr, msg)| (attr.name().to_string(), msg.clone()))
            .collect()
    }
}

/// Run every rule against `attrs`; errors accumulate.
///
/// - `title` is required and must not be blank.
/// - `email`, when present, must look like an email address.
/// - `dateOfBirth`, when present, must be a calendar date.
/// - `company`, when present, must not be blank.
pub fn validate(attrs: &ClientAttributes) -> ValidationErrors {
    let mut errors = BTreeMap::new();
    let value = |attr: Attribute| attrs.get(&attr).map(String::as_str);

    if value(Attribute::Title).is_none_or(is_blank) {
        errors.insert(Attribute::Title, "Title is required".to_string());
    }
    if let Some(email) = value(Attribute::Email) {
        if !EMAIL_RE.is_match(email) {
            errors.insert(Attribute::Email, "Invalid email".to_string());
        }
    }
    if let Some(date) = value(Attribute::DateOfBirth) {
        if !is_date(date) {
            errors.insert(Attribute::DateOfBirth, "Invalid date".to_string());
        }
    }
    if let Some(company) = value(Attribute::Company) {
        if is_blank(company) {
            errors.insert(Attribute::Company, "String is empty".to_string());
        }
    }

    ValidationErrors(errors)
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn is_date(s: &str) -> bool {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(s, fmt).is_ok())
        || DateTime::parse_from_rfc3339(s).is_ok()
}
