//! # Inactivity duration expressions.
//!
//! [`SleepAfter`] is what users write in configuration: `"10m"`, `"30s"`, `"2h"`
//! or a bare number of seconds. [`parse_duration`] turns it into whole seconds.

use std::time::Duration;

use crate::error::ContainerError;

/// A human-readable duration: a `<digits><s|m|h>` expression or plain seconds.
#[derive(Clone, Debug, PartialEq)]
pub enum SleepAfter {
    /// Expression such as `"10m"`.
    Text(String),
    /// Whole seconds.
    Seconds(u64),
    /// Seconds given as a float; must be finite, non-negative and integral.
    Fractional(f64),
}

impl Default for SleepAfter {
    /// Returns `"10m"`.
    fn default() -> Self {
        SleepAfter::Text("10m".to_string())
    }
}

impl From<&str> for SleepAfter {
    fn from(s: &str) -> Self {
        SleepAfter::Text(s.to_string())
    }
}

impl From<String> for SleepAfter {
    fn from(s: String) -> Self {
        SleepAfter::Text(s)
    }
}

impl From<u64> for SleepAfter {
    fn from(secs: u64) -> Self {
        SleepAfter::Seconds(secs)
    }
}

impl From<u32> for SleepAfter {
    fn from(secs: u32) -> Self {
        SleepAfter::Seconds(u64::from(secs))
    }
}

impl From<f64> for SleepAfter {
    fn from(secs: f64) -> Self {
        SleepAfter::Fractional(secs)
    }
}

impl SleepAfter {
    /// Parses into a [`Duration`].
    pub fn to_duration(&self) -> Result<Duration, ContainerError> {
        parse_duration(self.clone()).map(Duration::from_secs)
    }
}

/// Converts a duration expression into seconds.
///
/// # Example
/// ```
/// use containervisor::parse_duration;
///
/// assert_eq!(parse_duration("10m").unwrap(), 600);
/// assert_eq!(parse_duration("45s").unwrap(), 45);
/// assert_eq!(parse_duration(30u64).unwrap(), 30);
/// assert!(parse_duration("10x").is_err());
/// ```
pub fn parse_duration(expr: impl Into<SleepAfter>) -> Result<u64, ContainerError> {
    match expr.into() {
        SleepAfter::Seconds(secs) => Ok(secs),
        SleepAfter::Fractional(secs) => {
            if secs.is_finite() && secs >= 0.0 && secs.fract() == 0.0 && secs <= u64::MAX as f64 {
                Ok(secs as u64)
            } else {
                Err(ContainerError::InvalidDuration {
                    input: secs.to_string(),
                })
            }
        }
        SleepAfter::Text(text) => parse_text(&text),
    }
}

fn parse_text(text: &str) -> Result<u64, ContainerError> {
    let invalid = || ContainerError::InvalidDuration {
        input: text.to_string(),
    };

    // `^(\d+)([smh])$`
    let unit = text.chars().last().ok_or_else(invalid)?;
    let digits = &text[..text.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let multiplier: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        _ => return Err(invalid()),
    };
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_duration("10m").unwrap(), 600);
        assert_eq!(parse_duration("45s").unwrap(), 45);
        assert_eq!(parse_duration("2h").unwrap(), 7200);
        assert_eq!(parse_duration("0s").unwrap(), 0);
    }

    #[test]
    fn test_bare_numbers_are_seconds() {
        assert_eq!(parse_duration(30u64).unwrap(), 30);
        assert_eq!(parse_duration(30u32).unwrap(), 30);
        assert_eq!(parse_duration(90.0).unwrap(), 90);
    }

    #[test]
    fn test_rejects_malformed_expressions() {
        for bad in ["10x", "m10", "", "m", "10", "1.5m", "-5s", " 5s", "5s ", "5S", "10mm"] {
            let err = parse_duration(bad).unwrap_err();
            assert_eq!(err.as_label(), "invalid_duration", "input {bad:?}");
        }
    }

    #[test]
    fn test_rejects_unusable_numbers() {
        assert!(parse_duration(1.5).is_err());
        assert!(parse_duration(-1.0).is_err());
        assert!(parse_duration(f64::NAN).is_err());
        assert!(parse_duration(f64::INFINITY).is_err());
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(parse_duration("99999999999999999999h").is_err());
        assert!(parse_duration("18446744073709551615h").is_err());
    }

    #[test]
    fn test_default_is_ten_minutes() {
        assert_eq!(
            SleepAfter::default().to_duration().unwrap(),
            Duration::from_secs(600)
        );
    }
}
