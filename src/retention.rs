//! Keep/delete decisions for single package versions.
//!
//! A version is removed only when it is older than [`MAX_AGE_DAYS`] *and* its
//! tags mark it as disposable: no tags at all, or a single tag such as
//! `temp-foo`, `poc-bar`, `feat-x`, `dev-1` or `debug-y`.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

pub const MAX_AGE_DAYS: i64 = 30;

/// Format of `created_at` in the packages API.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static DISPOSABLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(temp|poc|feat|dev|debug)-.*$").unwrap());

pub fn is_safe_to_delete(tags: &[String]) -> bool {
    match tags {
        [] => true,
        [tag] => DISPOSABLE_TAG.is_match(tag),
        _ => false,
    }
}

pub fn is_outdated(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    created_at < now - Duration::days(MAX_AGE_DAYS)
}

pub fn should_delete(created_at: DateTime<Utc>, tags: &[String], now: DateTime<Utc>) -> bool {
    is_outdated(created_at, now) && is_safe_to_delete(tags)
}

pub fn parse_created_at(timestamp: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .context(format!("Invalid timestamp {:?}", timestamp))?;
    Ok(Utc.from_utc_datetime(&naive))
}
