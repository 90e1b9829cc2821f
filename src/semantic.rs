//! Semantic analysis: header fields, registered claims and (optionally) the signature.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use std::collections::BTreeMap;

use crate::{
    alg::{Algorithm, Secret},
    claims::{self, TimeOptions},
    token::{JsonObject, ParsedToken},
    UnsupportedAlgorithm,
};

/// Outcome of signature verification.
///
/// Serialized as `true`, `false` or `null` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureStatus {
    /// Signature matches the supplied secret.
    Verified,
    /// Signature does not match, or verification could not be performed.
    Failed,
    /// No secret was supplied, so verification was not attempted.
    #[default]
    NotAttempted,
}

impl SignatureStatus {
    /// Converts the status into a tri-state `Option<bool>`.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::Verified => Some(true),
            Self::Failed => Some(false),
            Self::NotAttempted => None,
        }
    }
}

impl From<bool> for SignatureStatus {
    fn from(verified: bool) -> Self {
        if verified {
            Self::Verified
        } else {
            Self::Failed
        }
    }
}

impl Serialize for SignatureStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

/// Runtime type of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// JSON string.
    String,
    /// JSON number (integer or floating-point).
    Number,
    /// `true` or `false`.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
    /// `null`.
    Null,
}

impl From<&Value> for TypeTag {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::Null => Self::Null,
        }
    }
}

/// Claim names mapped to the types of their values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolTable {
    /// Types of header fields.
    pub header: BTreeMap<String, TypeTag>,
    /// Types of payload claims.
    pub payload: BTreeMap<String, TypeTag>,
}

impl SymbolTable {
    fn collect(object: &JsonObject) -> BTreeMap<String, TypeTag> {
        object
            .iter()
            .map(|(name, value)| (name.clone(), TypeTag::from(value)))
            .collect()
    }
}

/// Result of semantic analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticReport {
    /// `true` if no errors were collected and the signature was not rejected.
    pub valid: bool,
    /// Collected errors.
    pub errors: Vec<String>,
    /// Collected warnings. Warnings do not influence validity.
    pub warnings: Vec<String>,
    /// Outcome of signature verification.
    pub signature_verified: SignatureStatus,
    /// Value of the `alg` header field, if it is a string.
    pub algorithm: Option<String>,
    /// Types of all header fields and payload claims.
    pub symbol_table: SymbolTable,
}

/// Performs semantic analysis of a parsed token.
///
/// All checks are performed, and all errors are collected. If a non-empty `secret`
/// is supplied, the signature is verified with the algorithm from the `alg` header field
/// (`HS256` if the field is absent).
pub fn analyze<F>(
    parsed: &ParsedToken,
    secret: Option<&Secret>,
    time_options: &TimeOptions<F>,
) -> SemanticReport
where
    F: Fn() -> DateTime<Utc>,
{
    let header = parsed.header();
    let payload = parsed.payload();
    let mut errors = vec![];
    let mut warnings = vec![];

    let alg = header.get("alg");
    match alg {
        None => errors.push("header.alg is required".to_owned()),
        Some(Value::String(name)) if !Algorithm::is_allowed(name) => {
            errors.push(format!("algorithm not allowed: {name}"));
        }
        Some(Value::String(_)) => { /* allowed */ }
        Some(other) => errors.push(format!("algorithm not allowed: {other}")),
    }

    match header.get("typ") {
        None | Some(Value::Null) => {}
        Some(Value::String(typ)) if typ == "JWT" => {}
        Some(Value::String(typ)) => {
            warnings.push(format!("header.typ should be \"JWT\", got \"{typ}\""));
        }
        Some(other) => warnings.push(format!("header.typ should be \"JWT\", got {other}")),
    }

    claims::check_time_claims(payload, time_options, &mut errors);
    claims::check_claim_types(payload, &mut errors);

    let signature_verified = match secret {
        Some(secret) if !secret.is_empty() => {
            match verify_signature(parsed, alg, secret) {
                Ok(true) => SignatureStatus::Verified,
                Ok(false) => {
                    errors.push("signature verification failed".to_owned());
                    SignatureStatus::Failed
                }
                Err(err) => {
                    errors.push(format!("cannot verify signature: {err}"));
                    SignatureStatus::Failed
                }
            }
        }
        _ => SignatureStatus::NotAttempted,
    };

    SemanticReport {
        valid: errors.is_empty() && signature_verified != SignatureStatus::Failed,
        errors,
        warnings,
        signature_verified,
        algorithm: parsed.algorithm().map(str::to_owned),
        symbol_table: SymbolTable {
            header: SymbolTable::collect(header),
            payload: SymbolTable::collect(payload),
        },
    }
}

/// Resolves the algorithm for verification: `alg` header field, or `HS256` if absent.
pub(crate) fn resolve_algorithm(alg: Option<&Value>) -> Result<Algorithm, UnsupportedAlgorithm> {
    match alg {
        None => Ok(Algorithm::Hs256),
        Some(Value::String(name)) => name.parse(),
        Some(other) => Err(UnsupportedAlgorithm::new(other.to_string())),
    }
}

fn verify_signature(
    parsed: &ParsedToken,
    alg: Option<&Value>,
    secret: &Secret,
) -> Result<bool, UnsupportedAlgorithm> {
    let algorithm = resolve_algorithm(alg)?;
    let parts = parsed.parts();
    Ok(algorithm.verify(&parts.header, &parts.payload, &parts.signature, secret))
}
