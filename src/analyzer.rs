//! External operations: decoding, full analysis, encoding and verification of tokens.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{
    alg::{Algorithm, Secret},
    base64url,
    claims::TimeOptions,
    lexical::{self, LexicalReport},
    pumping::{self, PumpingReport, DEFAULT_PUMP_LENGTH},
    semantic::{self, SemanticReport},
    syntax::{self, SyntacticReport},
    token::{JsonObject, TokenParts},
    Error, ParsedToken,
};

/// Response of the [decode](Analyzer::decode()) operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeResponse {
    /// Decoded header.
    pub header: JsonObject,
    /// Decoded payload.
    pub payload: JsonObject,
    /// Raw segments.
    pub parts: TokenParts,
}

/// Outcome of the pumping lemma demonstration within a [`FullAnalysis`].
///
/// Failures of the demonstrator are captured rather than propagated; they are serialized
/// as `{ "error": message }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpingOutcome {
    /// Demonstration has succeeded.
    Report(PumpingReport),
    /// Demonstration has failed with the specified message.
    Failed(String),
}

impl Serialize for PumpingOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct ErrorObject<'a> {
            error: &'a str,
        }

        match self {
            Self::Report(report) => report.serialize(serializer),
            Self::Failed(error) => ErrorObject { error }.serialize(serializer),
        }
    }
}

impl PumpingOutcome {
    /// Returns the report if the demonstration has succeeded.
    pub fn report(&self) -> Option<&PumpingReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::Failed(_) => None,
        }
    }
}

/// Response of the [full analysis](Analyzer::full_analyze()) operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullAnalysis {
    /// Lexical analysis.
    pub lexical: LexicalReport,
    /// Syntactic analysis.
    pub syntactic: SyntacticReport,
    /// Semantic analysis.
    pub semantic: SemanticReport,
    /// Pumping lemma demonstration.
    pub pumping: PumpingOutcome,
}

/// Response of the [encode](Analyzer::encode()) operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeResponse {
    /// Created token.
    pub token: String,
    /// Algorithm used to sign the token.
    pub algorithm: Algorithm,
}

/// Response of the [verify](Analyzer::verify()) operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Algorithm used for verification.
    pub algorithm: Algorithm,
    /// Whether the signature matches the secret.
    pub signature_verified: bool,
}

/// Token analyzer combining all analysis stages.
///
/// The analyzer is stateless apart from its configuration; all operations are pure
/// functions of their inputs (and the clock in [`TimeOptions`]), and can be called
/// concurrently.
///
/// # Examples
///
/// ```
/// # use jwt_anatomy::{Analyzer, semantic::SignatureStatus};
/// # use serde_json::json;
/// # fn main() -> Result<(), jwt_anatomy::Error> {
/// let analyzer = Analyzer::default();
/// let secret = "x".repeat(32);
/// let header = json!({ "typ": "JWT" });
/// let payload = json!({ "sub": "user1" });
/// let encoded = analyzer.encode(
///     header.as_object().unwrap(),
///     payload.as_object().unwrap(),
///     &secret,
///     "HS256",
/// )?;
///
/// let verified = analyzer.verify(&encoded.token, &secret)?;
/// assert!(verified.signature_verified);
///
/// let analysis = analyzer.full_analyze(&encoded.token, Some(secret.as_str()))?;
/// assert!(analysis.syntactic.is_valid);
/// assert_eq!(analysis.semantic.signature_verified, SignatureStatus::Verified);
/// assert!(analysis.pumping.report().unwrap().in_language);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer<F = fn() -> DateTime<Utc>> {
    time_options: TimeOptions<F>,
    pump_length: usize,
}

#[cfg(feature = "clock")]
impl Default for Analyzer {
    fn default() -> Self {
        Self::new(TimeOptions::default())
    }
}

impl<F: Fn() -> DateTime<Utc>> Analyzer<F> {
    /// Creates an analyzer with the specified time options and the default pump length.
    pub fn new(time_options: TimeOptions<F>) -> Self {
        Self {
            time_options,
            pump_length: DEFAULT_PUMP_LENGTH,
        }
    }

    /// Sets the pump length for the pumping lemma demonstration.
    #[must_use]
    pub fn with_pump_length(mut self, pump_length: usize) -> Self {
        self.pump_length = pump_length;
        self
    }

    /// Returns the current time according to the analyzer clock.
    pub fn now(&self) -> DateTime<Utc> {
        (self.time_options.clock_fn)()
    }

    /// Parses `token` into its header, payload and raw segments.
    pub fn decode(&self, token: &str) -> Result<DecodeResponse, Error> {
        let parsed = ParsedToken::new(token)?;
        tracing::debug!(token_len = token.len(), "decoded token");
        Ok(DecodeResponse {
            header: parsed.header().clone(),
            payload: parsed.payload().clone(),
            parts: parsed.parts().clone(),
        })
    }

    /// Performs lexical, syntactic and semantic analysis of `token` together with
    /// the pumping lemma demonstration.
    ///
    /// Fails only if the token cannot be parsed. An empty `secret` is treated as absent.
    pub fn full_analyze(&self, token: &str, secret: Option<&str>) -> Result<FullAnalysis, Error> {
        let secret = secret.map(Secret::from);
        self.full_analyze_with(token, secret.as_ref())
    }

    /// Same as [`Self::full_analyze()`], but with the secret already wrapped
    /// in a [`Secret`].
    pub fn full_analyze_with(
        &self,
        token: &str,
        secret: Option<&Secret>,
    ) -> Result<FullAnalysis, Error> {
        let parsed = ParsedToken::new(token)?;
        tracing::debug!(
            token_len = token.len(),
            with_secret = secret.is_some_and(|s| !s.is_empty()),
            "analyzing token"
        );

        let lexical = lexical::analyze(token);
        let syntactic = syntax::analyze(&parsed);
        let semantic = semantic::analyze(&parsed, secret, &self.time_options);
        let pumping = match pumping::analyze(token, self.pump_length) {
            Ok(report) => PumpingOutcome::Report(report),
            Err(err) => {
                tracing::warn!(%err, "pumping lemma demonstration failed");
                PumpingOutcome::Failed(format!("pumping failed: {err}"))
            }
        };

        tracing::debug!(
            lexemes = lexical.lexemes.len(),
            syntactic_valid = syntactic.is_valid,
            semantic_valid = semantic.valid,
            "analyzed token"
        );
        Ok(FullAnalysis {
            lexical,
            syntactic,
            semantic,
            pumping,
        })
    }

    /// Creates a token from `header` and `payload`, signing it with `secret` using
    /// the algorithm named `algorithm`.
    ///
    /// The `alg` header field is set to `algorithm`, overwriting any existing value.
    pub fn encode(
        &self,
        header: &JsonObject,
        payload: &JsonObject,
        secret: impl AsRef<[u8]>,
        algorithm: &str,
    ) -> Result<EncodeResponse, Error> {
        let algorithm: Algorithm = algorithm.parse()?;
        let mut header = header.clone();
        header.insert("alg".to_owned(), Value::from(algorithm.name()));

        let header = serde_json::to_vec(&header).map_err(Error::Serialization)?;
        let payload = serde_json::to_vec(payload).map_err(Error::Serialization)?;
        let header = base64url::encode(header);
        let payload = base64url::encode(payload);
        let signature = algorithm.sign(&header, &payload, secret);

        tracing::debug!(%algorithm, "encoded token");
        Ok(EncodeResponse {
            token: format!("{header}.{payload}.{signature}"),
            algorithm,
        })
    }

    /// Verifies the signature of `token` with `secret`, using the algorithm from
    /// the `alg` header field (`HS256` if absent).
    pub fn verify(&self, token: &str, secret: impl AsRef<[u8]>) -> Result<VerifyResponse, Error> {
        let parsed = ParsedToken::new(token)?;
        let algorithm = semantic::resolve_algorithm(parsed.header().get("alg"))?;
        let parts = parsed.parts();
        let signature_verified =
            algorithm.verify(&parts.header, &parts.payload, &parts.signature, secret);

        tracing::debug!(%algorithm, signature_verified, "verified token");
        Ok(VerifyResponse {
            algorithm,
            signature_verified,
        })
    }
}
