//! Format validators for the `format` keyword.
//!
//! By default `format` is annotation-only (draft 2020-12) or assertion
//! (2019-09, left to the caller to decide by enabling it). A [`Catalog`]
//! starts with the builtin formats registered but **not enabled**; callers
//! opt in per-format with [`Catalog::enable_format`], mirroring jschon's
//! `formats.py` registry plus its `is_format_assertion` toggle.

use std::net::{Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::catalog::Catalog;

/// A named format check. Only applies to string instances; any other
/// instance type trivially passes.
pub trait FormatValidator: Send + Sync + std::fmt::Debug {
    fn validate(&self, instance: &Value) -> bool;
}

#[derive(Debug)]
struct FnValidator(fn(&str) -> bool);

impl FormatValidator for FnValidator {
    fn validate(&self, instance: &Value) -> bool {
        match instance.as_str() {
            Some(s) => (self.0)(s),
            None => true,
        }
    }
}

/// Registers the builtin format checks onto `catalog`, matching the formats
/// both 2019-09 and 2020-12 metaschemas list. None are enabled by default.
pub fn register_defaults(catalog: &mut Catalog) {
    for (name, check) in BUILTIN {
        catalog.add_format_validator(*name, std::sync::Arc::new(FnValidator(*check)));
    }
}

type Check = fn(&str) -> bool;

const BUILTIN: &[(&str, Check)] = &[
    ("date-time", is_date_time),
    ("date", is_date),
    ("time", is_time),
    ("duration", is_duration),
    ("email", is_email),
    ("idn-email", is_email),
    ("hostname", is_hostname),
    ("idn-hostname", is_hostname),
    ("ipv4", is_ipv4),
    ("ipv6", is_ipv6),
    ("uri", is_uri),
    ("uri-reference", is_uri_reference),
    ("iri", is_uri),
    ("iri-reference", is_uri_reference),
    ("uuid", is_uuid),
    ("uri-template", is_uri_reference),
    ("json-pointer", is_json_pointer),
    ("relative-json-pointer", is_relative_json_pointer),
    ("regex", is_regex),
];

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$").unwrap());
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P(\d+W|(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+S)?)?)$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static HOSTNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap());
static UUID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").unwrap());
static RELATIVE_POINTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(#|(/.*)?)$").unwrap());

fn is_date(s: &str) -> bool {
    DATE_RE.is_match(s) && s.split('-').nth(1).and_then(|m| m.parse::<u32>().ok()).is_some_and(|m| (1..=12).contains(&m))
}

fn is_time(s: &str) -> bool {
    TIME_RE.is_match(s)
}

fn is_date_time(s: &str) -> bool {
    match s.split_once(['T', 't']) {
        Some((date, time)) => is_date(date) && is_time(time),
        None => false,
    }
}

fn is_duration(s: &str) -> bool {
    s.starts_with('P') && s.len() > 1 && DURATION_RE.is_match(s)
}

fn is_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

fn is_hostname(s: &str) -> bool {
    s.len() <= 253 && HOSTNAME_RE.is_match(s)
}

fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok() && s.split('.').count() == 4
}

fn is_ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

fn is_uri(s: &str) -> bool {
    schema_core::AbsoluteUri::parse(s).is_ok()
}

fn is_uri_reference(s: &str) -> bool {
    schema_core::Uri::parse(s).is_ok()
}

fn is_uuid(s: &str) -> bool {
    UUID_RE.is_match(s)
}

fn is_json_pointer(s: &str) -> bool {
    schema_core::PointerBuf::parse(s).is_ok()
}

fn is_relative_json_pointer(s: &str) -> bool {
    RELATIVE_POINTER_RE.is_match(s)
}

fn is_regex(s: &str) -> bool {
    Regex::new(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_rejects_bad_month() {
        assert!(is_date("2020-01-01"));
        assert!(!is_date("2020-13-01"));
    }

    #[test]
    fn date_time_requires_separator() {
        assert!(is_date_time("2020-01-01T10:00:00Z"));
        assert!(!is_date_time("2020-01-01 10:00:00Z"));
    }

    #[test]
    fn ipv4_rejects_ipv6() {
        assert!(is_ipv4("127.0.0.1"));
        assert!(!is_ipv4("::1"));
    }

    #[test]
    fn uuid_matches_canonical_form() {
        assert!(is_uuid("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!is_uuid("not-a-uuid"));
    }

    #[test]
    fn regex_checks_pattern_validity_not_match() {
        assert!(is_regex(r"^\d+$"));
        assert!(!is_regex(r"("));
    }
}
