//! Functionality shared by integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jwt_anatomy::{Analyzer, JsonObject, TimeOptions};
use serde_json::{json, Value};

/// Fixed "current" time used by analyzers in tests.
pub const NOW: i64 = 1_700_000_000;

/// Secret long enough for all supported algorithms.
pub const SECRET: &str = "0123456789abcdef0123456789abcdef-secret";

pub fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(NOW, 0).single().unwrap()
}

pub fn create_analyzer() -> Analyzer<impl Fn() -> DateTime<Utc>> {
    Analyzer::new(TimeOptions::new(Duration::seconds(300), now))
}

pub fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(object) => object,
        other => panic!("expected an object, got {other}"),
    }
}

pub fn sample_header() -> JsonObject {
    object(json!({ "typ": "JWT" }))
}

pub fn sample_payload() -> JsonObject {
    object(json!({
        "sub": "1234567890",
        "name": "John Doe",
        "iat": NOW - 60,
        "exp": NOW + 3_600,
    }))
}

/// Creates a token with the specified payload signed with [`SECRET`].
pub fn create_token(payload: &JsonObject, algorithm: &str) -> String {
    create_analyzer()
        .encode(&sample_header(), payload, SECRET, algorithm)
        .unwrap()
        .token
}

/// Replaces the character at `index` in `s` with another base64url character.
pub fn flip_char(s: &str, index: usize) -> String {
    let mut chars: Vec<char> = s.chars().collect();
    chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
    chars.into_iter().collect()
}
