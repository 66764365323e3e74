//! Parsing helpers for configuration values.

use std::time::Duration;

/// Parse duration string (e.g., "1h", "30m", "1d").
///
/// Supported units:
/// - s: seconds (also a bare number)
/// - m: minutes
/// - h: hours
/// - d: days
/// - w: weeks
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(seconds) = input.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let split = input.len() - input.chars().last()?.len_utf8();
    let (digits, unit) = input.split_at(split);
    let amount: u64 = digits.parse().ok()?;

    let seconds = match unit {
        "s" => amount,
        "m" => amount.checked_mul(60)?,
        "h" => amount.checked_mul(3600)?,
        "d" => amount.checked_mul(86400)?,
        "w" => amount.checked_mul(604800)?,
        _ => return None,
    };

    Some(Duration::from_secs(seconds))
}

/// Parse a TTL setting.
///
/// `none`, `off`, `0` and negative numbers disable expiration (`Ok(None)`).
/// Anything else must be a duration accepted by [`parse_duration`].
pub fn parse_ttl(input: &str) -> Result<Option<Duration>, ()> {
    let input = input.trim();
    if matches!(input.to_lowercase().as_str(), "none" | "off" | "never") {
        return Ok(None);
    }
    if let Ok(seconds) = input.parse::<i64>()
        && seconds <= 0
    {
        return Ok(None);
    }

    parse_duration(input).map(Some).ok_or(())
}
