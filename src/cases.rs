//! Categorized test cases with expected analysis outcomes.
//!
//! A [`TestCase`] describes an input token (either given verbatim, or created from
//! a header, payload and algorithm) together with the expected signature, semantic
//! and syntactic verdicts. Running a case performs full analysis and compares
//! the observed verdicts to the expected ones.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    alg::{Algorithm, Secret},
    token::JsonObject,
    Analyzer,
};

/// Category of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseCategory {
    /// Well-formed token with a valid signature.
    Valid,
    /// Token with an `exp` claim in the past.
    Expired,
    /// Token signed with another secret.
    BadSignature,
    /// Token that cannot be parsed.
    Malformed,
    /// Token lacking required fields (e.g., `alg`).
    MissingClaims,
    /// Token with claims of wrong types.
    BadTypes,
}

/// Input of a test case.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseInput {
    /// Token to analyze. If absent, a token is created from the other fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Header for the created token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<JsonObject>,
    /// Payload for the created token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonObject>,
    /// Algorithm for the created token; `HS256` by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// Secret used to create and verify the token. Never serialized.
    #[serde(skip)]
    pub secret: Option<Secret>,
}

/// Expected verdicts. `None` fields are not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    /// Expected signature verification outcome.
    pub signature_verified: Option<bool>,
    /// Expected semantic validity.
    pub semantic_valid: Option<bool>,
    /// Expected syntactic validity.
    pub syntactic_valid: Option<bool>,
}

/// Observed verdicts of a test case run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Signature verification outcome; `None` if not attempted.
    pub signature_verified: Option<bool>,
    /// Semantic validity; `false` if the token cannot be parsed.
    pub semantic_valid: bool,
    /// Syntactic validity; `false` if the token cannot be parsed.
    pub syntactic_valid: bool,
    /// Errors reported by the analysis.
    pub errors: Vec<String>,
}

/// Result of running a [`TestCase`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    /// Whether all expectations are met.
    pub passed: bool,
    /// Observations and per-expectation verdicts.
    pub details: Value,
}

/// Categorized test case.
///
/// # Examples
///
/// ```
/// # use jwt_anatomy::{cases::*, Analyzer, Secret};
/// # use serde_json::json;
/// let case = TestCase {
///     category: CaseCategory::MissingClaims,
///     input: CaseInput {
///         header: Some(json!({ "typ": "JWT" }).as_object().unwrap().clone()),
///         payload: Some(Default::default()),
///         secret: Some(Secret::new("x".repeat(32))),
///         ..CaseInput::default()
///     },
///     expected: Expectation {
///         signature_verified: Some(true),
///         syntactic_valid: Some(true),
///         ..Expectation::default()
///     },
/// };
/// assert!(case.run(&Analyzer::default()).passed);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    /// Case category.
    pub category: CaseCategory,
    /// Case input.
    pub input: CaseInput,
    /// Expected verdicts.
    pub expected: Expectation,
}

impl TestCase {
    /// Builds the token for this case.
    fn token<F: Fn() -> DateTime<Utc>>(&self, analyzer: &Analyzer<F>) -> Result<String, String> {
        let input = &self.input;
        if let Some(token) = &input.token {
            return Ok(token.clone());
        }

        let header = input.header.clone().unwrap_or_default();
        let payload = input.payload.clone().unwrap_or_default();
        let algorithm = input
            .algorithm
            .as_deref()
            .unwrap_or_else(|| Algorithm::Hs256.name());
        let secret = input.secret.clone().unwrap_or_default();
        analyzer
            .encode(&header, &payload, &secret, algorithm)
            .map(|response| response.token)
            .map_err(|err| err.to_string())
    }

    fn observe<F: Fn() -> DateTime<Utc>>(&self, analyzer: &Analyzer<F>) -> Observation {
        let analysis = self.token(analyzer).and_then(|token| {
            analyzer
                .full_analyze_with(&token, self.input.secret.as_ref())
                .map_err(|err| err.to_string())
        });

        match analysis {
            Ok(analysis) => Observation {
                signature_verified: analysis.semantic.signature_verified.as_option(),
                semantic_valid: analysis.semantic.valid,
                syntactic_valid: analysis.syntactic.is_valid,
                errors: analysis
                    .syntactic
                    .errors
                    .into_iter()
                    .chain(analysis.semantic.errors)
                    .collect(),
            },
            Err(err) => Observation {
                signature_verified: None,
                semantic_valid: false,
                syntactic_valid: false,
                errors: vec![err],
            },
        }
    }

    /// Runs this case with the specified analyzer.
    pub fn run<F: Fn() -> DateTime<Utc>>(&self, analyzer: &Analyzer<F>) -> CaseResult {
        let observed = self.observe(analyzer);
        let expected = self.expected;

        let checks = [
            (
                "signatureVerified",
                expected
                    .signature_verified
                    .map(|value| observed.signature_verified == Some(value)),
            ),
            (
                "semanticValid",
                expected
                    .semantic_valid
                    .map(|value| observed.semantic_valid == value),
            ),
            (
                "syntacticValid",
                expected
                    .syntactic_valid
                    .map(|value| observed.syntactic_valid == value),
            ),
        ];
        let passed = checks.iter().all(|(_, check)| check.unwrap_or(true));
        let checks: serde_json::Map<_, _> = checks
            .into_iter()
            .filter_map(|(name, check)| Some((name.to_owned(), Value::Bool(check?))))
            .collect();

        tracing::debug!(category = ?self.category, passed, "ran test case");
        CaseResult {
            passed,
            details: json!({
                "category": self.category,
                "observed": observed,
                "checks": checks,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::claims::TimeOptions;

    const NOW: i64 = 1_700_000_000;

    fn analyzer() -> Analyzer<impl Fn() -> DateTime<Utc>> {
        let now = Utc.timestamp_opt(NOW, 0).unwrap();
        Analyzer::new(TimeOptions::new(Duration::seconds(300), move || now))
    }

    fn object(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    fn encoded(payload: Value, secret: &str) -> CaseInput {
        CaseInput {
            header: object(json!({ "typ": "JWT" })),
            payload: object(payload),
            secret: Some(Secret::from(secret)),
            ..CaseInput::default()
        }
    }

    #[test]
    fn standard_categories() {
        let secret = "y".repeat(32);
        let bad_signature_token = analyzer()
            .encode(
                &JsonObject::new(),
                &JsonObject::new(),
                "other-secret",
                "HS256",
            )
            .unwrap()
            .token;

        let cases = [
            TestCase {
                category: CaseCategory::Valid,
                input: encoded(json!({ "sub": "u", "exp": NOW + 60 }), &secret),
                expected: Expectation {
                    signature_verified: Some(true),
                    semantic_valid: Some(true),
                    syntactic_valid: Some(true),
                },
            },
            TestCase {
                category: CaseCategory::Expired,
                input: encoded(json!({ "sub": "u", "exp": 1 }), &secret),
                expected: Expectation {
                    signature_verified: Some(true),
                    semantic_valid: Some(false),
                    syntactic_valid: Some(true),
                },
            },
            TestCase {
                category: CaseCategory::BadSignature,
                input: CaseInput {
                    token: Some(bad_signature_token),
                    secret: Some(Secret::from(secret.as_str())),
                    ..CaseInput::default()
                },
                expected: Expectation {
                    signature_verified: Some(false),
                    semantic_valid: Some(false),
                    ..Expectation::default()
                },
            },
            TestCase {
                category: CaseCategory::Malformed,
                input: CaseInput {
                    token: Some("abc.def".to_owned()),
                    ..CaseInput::default()
                },
                expected: Expectation {
                    syntactic_valid: Some(false),
                    semantic_valid: Some(false),
                    ..Expectation::default()
                },
            },
            TestCase {
                category: CaseCategory::BadTypes,
                input: encoded(json!({ "sub": 1, "aud": false }), &secret),
                expected: Expectation {
                    semantic_valid: Some(false),
                    ..Expectation::default()
                },
            },
        ];

        for case in &cases {
            let result = case.run(&analyzer());
            assert!(result.passed, "{case:?}: {}", result.details);
        }
    }

    #[test]
    fn failed_expectations_are_reported() {
        let case = TestCase {
            category: CaseCategory::Valid,
            input: encoded(json!({ "exp": 1 }), "secret"),
            expected: Expectation {
                semantic_valid: Some(true),
                syntactic_valid: Some(true),
                ..Expectation::default()
            },
        };
        let result = case.run(&analyzer());
        assert!(!result.passed);
        assert_eq!(result.details["category"], "valid");
        assert_eq!(
            result.details["checks"],
            json!({ "semanticValid": false, "syntacticValid": true })
        );
        let errors = result.details["observed"]["errors"].as_array().unwrap();
        assert!(errors[0].as_str().unwrap().starts_with("exp"));
    }

    #[test]
    fn secrets_are_not_serialized() {
        let case = TestCase {
            category: CaseCategory::Valid,
            input: encoded(json!({}), "hunter2-hunter2"),
            expected: Expectation::default(),
        };
        let json = serde_json::to_string(&case).unwrap();
        assert!(!json.contains("hunter2"), "{json}");
        let debug = format!("{case:?}");
        assert!(!debug.contains("hunter2"), "{debug}");

        let result = case.run(&analyzer());
        assert!(result.passed);
        assert_eq!(result.details["observed"]["signatureVerified"], true);
    }
}
