//! Pumping lemma demonstration for the regular language of token shapes.
//!
//! The language is `L = base64url+ "." base64url+ "." base64url+`. For a word `w ∈ L`
//! with `|w| ≥ p`, the demonstrator picks the canonical decomposition `w = xyz` with
//! `x = ""` and `y` equal to the first character of the header, so that `|y| = 1`
//! and `|xy| = 1 ≤ p` hold for any pump length `p ≥ 1`.

use anyhow::ensure;
use serde::Serialize;

use crate::base64url;

/// Default pump length.
pub const DEFAULT_PUMP_LENGTH: usize = 5;

/// Description of the language used in reports.
pub const LANGUAGE: &str = "L = base64url+ '.' base64url+ '.' base64url+";

/// Lengths and pumped words demonstrating a [`Decomposition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpingCheck {
    /// `|y|`.
    pub y_length: usize,
    /// `|xy|`.
    pub xy_length: usize,
    /// `x y^0 z`.
    pub pumped0: String,
    /// `x y^2 z`.
    pub pumped2: String,
}

/// Decomposition `w = xyz` of a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decomposition {
    /// Prefix.
    pub x: String,
    /// Pumped part.
    pub y: String,
    /// Suffix.
    pub z: String,
    /// Lengths and pumped words.
    pub check: PumpingCheck,
}

impl Decomposition {
    /// Reassembles the decomposed word.
    pub fn word(&self) -> String {
        format!("{}{}{}", self.x, self.y, self.z)
    }

    /// Returns `x y^i z`.
    pub fn pump(&self, i: usize) -> String {
        format!("{}{}{}", self.x, self.y.repeat(i), self.z)
    }
}

/// Result of the pumping lemma demonstration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpingReport {
    /// Description of the language.
    pub language: &'static str,
    /// Pump length `p`.
    pub pumping_length: usize,
    /// Whether the token belongs to the language.
    pub in_language: bool,
    /// Decomposition of the token, if applicable.
    pub decomposition: Option<Decomposition>,
    /// Explanation why no decomposition is provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Splits `token` into 3 segments if it belongs to the language.
fn match_language(token: &str) -> Option<[&str; 3]> {
    let mut segments = token.split('.');
    let matched = [segments.next()?, segments.next()?, segments.next()?];
    if segments.next().is_some() || !matched.iter().all(|s| base64url::is_valid_segment(s)) {
        return None;
    }
    Some(matched)
}

/// Demonstrates the pumping lemma on `token` with pump length `pump_length`.
///
/// # Errors
///
/// Fails if `pump_length` is zero.
///
/// # Examples
///
/// ```
/// # use jwt_anatomy::pumping;
/// let report = pumping::analyze("abc.de.f", 5)?;
/// assert!(report.in_language);
/// let decomposition = report.decomposition.unwrap();
/// assert_eq!((decomposition.x.as_str(), decomposition.y.as_str()), ("", "a"));
/// assert_eq!(decomposition.z, "bc.de.f");
/// assert_eq!(decomposition.check.pumped2, "aabc.de.f");
/// # anyhow::Ok(())
/// ```
pub fn analyze(token: &str, pump_length: usize) -> anyhow::Result<PumpingReport> {
    ensure!(pump_length >= 1, "pump length must be positive");

    let mut report = PumpingReport {
        language: LANGUAGE,
        pumping_length: pump_length,
        in_language: false,
        decomposition: None,
        note: None,
    };
    let Some([header, payload, signature]) = match_language(token) else {
        return Ok(report);
    };
    report.in_language = true;
    if token.len() < pump_length {
        report.note = Some(format!(
            "token is shorter than the pump length ({} < {pump_length}); no decomposition applies",
            token.len()
        ));
        return Ok(report);
    }

    // Segments are ASCII, so splitting at byte 1 is a char boundary.
    let (y, rest) = header.split_at(1);
    let x = String::new();
    let z = format!("{rest}.{payload}.{signature}");
    let check = PumpingCheck {
        y_length: y.len(),
        xy_length: x.len() + y.len(),
        pumped0: z.clone(),
        pumped2: format!("{y}{y}{z}"),
    };
    report.decomposition = Some(Decomposition {
        x,
        y: y.to_owned(),
        z,
        check,
    });
    Ok(report)
}
