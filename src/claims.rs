//! Checks for registered claims (`exp`, `nbf`, `iat`, `aud`, `iss`, `sub`, `jti`).

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::token::JsonObject;

/// Clock skew tolerated by time-based claim checks, in seconds.
pub const DEFAULT_LEEWAY_SECS: i64 = 300;

/// Time-related validation options.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct TimeOptions<F = fn() -> DateTime<Utc>> {
    /// Leeway (clock skew) to use during validation.
    pub leeway: Duration,
    /// Source of the current timestamps.
    pub clock_fn: F,
}

impl<F: Fn() -> DateTime<Utc>> TimeOptions<F> {
    /// Creates options based on the specified time leeway and clock function.
    pub fn new(leeway: Duration, clock_fn: F) -> Self {
        Self { leeway, clock_fn }
    }

    /// Returns the current time as a Unix timestamp in seconds.
    pub fn now(&self) -> i64 {
        (self.clock_fn)().timestamp()
    }
}

impl TimeOptions {
    /// Creates options based on the specified time leeway. The clock source is [`Utc::now()`].
    #[cfg(feature = "clock")]
    #[cfg_attr(docsrs, doc(cfg(feature = "clock")))]
    pub fn from_leeway(leeway: Duration) -> Self {
        Self {
            leeway,
            clock_fn: Utc::now,
        }
    }
}

/// Uses the 300 second leeway and the system clock.
#[cfg(feature = "clock")]
impl Default for TimeOptions {
    fn default() -> Self {
        Self::from_leeway(Duration::seconds(DEFAULT_LEEWAY_SECS))
    }
}

/// Time-based claims.
const TIME_CLAIMS: [&str; 3] = ["exp", "nbf", "iat"];
/// Claims that must be strings if present.
const STRING_CLAIMS: [&str; 3] = ["iss", "sub", "jti"];

/// Checks `exp`, `nbf` and `iat` claims against the current time, appending
/// human-readable errors to `errors`.
///
/// A claim that is present but not a number yields a type error rather than a time error.
pub(crate) fn check_time_claims<F>(
    payload: &JsonObject,
    options: &TimeOptions<F>,
    errors: &mut Vec<String>,
) where
    F: Fn() -> DateTime<Utc>,
{
    // Precision loss is irrelevant for realistic timestamps.
    #[allow(clippy::cast_precision_loss)]
    let (now, skew) = (options.now() as f64, options.leeway.num_seconds() as f64);
    let number = |claim: &str| payload.get(claim).and_then(Value::as_f64);

    if let Some(exp) = number("exp") {
        if now - skew >= exp {
            errors.push(format!("exp: token has expired (exp = {exp})"));
        }
    }
    if let Some(nbf) = number("nbf") {
        if now + skew < nbf {
            errors.push(format!("nbf: token is not yet valid (nbf = {nbf})"));
        }
    }
    if let Some(iat) = number("iat") {
        if iat - skew > now {
            errors.push(format!("iat: token is issued in the future (iat = {iat})"));
        }
    }

    for claim in TIME_CLAIMS {
        if payload.get(claim).is_some_and(|value| !value.is_number()) {
            errors.push(format!("{claim} must be a number (Unix timestamp in seconds)"));
        }
    }
}

/// Checks types of `aud`, `iss`, `sub` and `jti` claims.
pub(crate) fn check_claim_types(payload: &JsonObject, errors: &mut Vec<String>) {
    if let Some(aud) = payload.get("aud") {
        let is_valid = match aud {
            Value::String(_) => true,
            Value::Array(items) => items.iter().all(Value::is_string),
            _ => false,
        };
        if !is_valid {
            errors.push("aud must be a string or an array of strings".to_owned());
        }
    }

    for claim in STRING_CLAIMS {
        if payload.get(claim).is_some_and(|value| !value.is_string()) {
            errors.push(format!("{claim} must be a string"));
        }
    }
}
