//! Syntactic analysis against the token grammar.

use serde::Serialize;
use serde_json::Value;

use crate::{base64url, token::Segment, ParsedToken};

/// Context-free grammar of tokens, in a human-readable form.
pub const GRAMMAR: &str = "\
S -> J
J -> H \".\" P \".\" Sg
H -> Base64url(JSON)
P -> Base64url(JSON)
Sg -> Base64url(signature)";

/// Result of checking a token against [`GRAMMAR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntacticReport {
    /// Grammar the token was checked against.
    pub grammar: &'static str,
    /// `true` iff no errors were collected.
    pub is_valid: bool,
    /// Violated productions.
    pub errors: Vec<String>,
}

/// Checks a parsed token against the grammar.
pub fn analyze(parsed: &ParsedToken) -> SyntacticReport {
    let parts = parsed.parts();
    let header = Value::Object(parsed.header().clone());
    let payload = Value::Object(parsed.payload().clone());
    analyze_parts(
        Segment::ALL.map(|segment| parts.get(segment)),
        Some(&header),
        Some(&payload),
    )
}

/// Checks raw token segments and their decoded JSON values against the grammar.
///
/// `header` and `payload` are `None` if the corresponding segment could not be decoded.
/// All productions are checked; violations are collected rather than short-circuited.
pub fn analyze_parts(
    segments: [&str; 3],
    header: Option<&Value>,
    payload: Option<&Value>,
) -> SyntacticReport {
    let mut errors: Vec<_> = Segment::ALL
        .into_iter()
        .zip(segments)
        .filter(|(_, raw)| !base64url::is_valid_segment(raw))
        .map(|(segment, _)| format!("{segment} not Base64URL-conformant"))
        .collect();

    for (segment, value) in [(Segment::Header, header), (Segment::Payload, payload)] {
        if !value.is_some_and(Value::is_object) {
            errors.push(format!("{segment} is not a JSON object"));
        }
    }

    SyntacticReport {
        grammar: GRAMMAR,
        is_valid: errors.is_empty(),
        errors,
    }
}
