//! Educational analyzer of [JSON web tokens (JWTs)][JWT] in the compact serialization,
//! viewed through the lens of formal languages.
//!
//! A token `header.payload.signature` is examined in several stages:
//!
//! - [Lexical analysis](lexical): a deterministic finite automaton splits the token
//!   into `HEADER` / `PAYLOAD` / `SIGNATURE` lexemes and reports characters outside
//!   the Base64URL alphabet.
//! - [Syntactic analysis](syntax): the token is checked against a small grammar
//!   (three Base64URL segments; the first two must decode to JSON objects).
//! - [Semantic analysis](semantic): header fields and registered claims (`exp`, `nbf`,
//!   `iat`, `iss`, `sub`, `aud`, `jti`) are validated with a clock skew tolerance,
//!   and the signature is optionally verified with an HMAC secret.
//! - [Pumping lemma demonstration](pumping) for the regular language of token shapes.
//!
//! The [`Analyzer`] combines these stages and additionally creates (encodes) and verifies
//! tokens. Supplementary modules provide [history records](history) for completed operations
//! and [categorized test cases](cases).
//!
//! # Design choices
//!
//! - Only symmetric `HS256`, `HS384` and `HS512` [algorithms](Algorithm) are supported.
//!   Signatures are compared in constant time.
//! - Semantic analysis never fails: all problems are collected as error / warning messages.
//!   Only tokens that cannot be parsed at all produce an [`Error`].
//! - Time is obtained from a clock function in [`TimeOptions`], so the analysis is
//!   deterministic in tests.
//!
//! # Crate features
//!
//! - `clock` (on by default) enables getting the current time using `Utc::now()` from
//!   [`chrono`]. Without it, [`TimeOptions`] and [`Analyzer`] must be created
//!   with an explicitly specified clock function.
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, Utc};
//! use jwt_anatomy::{prelude::*, lexical::LexemeKind};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), jwt_anatomy::Error> {
//! let now = Utc::now();
//! let analyzer = Analyzer::new(TimeOptions::new(Duration::seconds(300), move || now));
//! let secret = "a-secret-of-at-least-32-characters!";
//!
//! let header = json!({ "typ": "JWT" });
//! let payload = json!({ "sub": "alice", "exp": now.timestamp() + 3_600 });
//! let token = analyzer
//!     .encode(
//!         header.as_object().unwrap(),
//!         payload.as_object().unwrap(),
//!         secret,
//!         "HS256",
//!     )?
//!     .token;
//!
//! let analysis = analyzer.full_analyze(&token, Some(secret))?;
//! let kinds: Vec<_> = analysis.lexical.lexemes.iter().map(|lex| lex.kind).collect();
//! assert_eq!(
//!     kinds,
//!     [LexemeKind::Header, LexemeKind::Payload, LexemeKind::Signature]
//! );
//! assert!(analysis.syntactic.is_valid);
//! assert!(analysis.semantic.valid);
//!
//! // Tampering with the payload invalidates the signature.
//! let forged_payload = jwt_anatomy::base64url::encode(r#"{"sub":"mallory"}"#);
//! let parts: Vec<_> = token.split('.').collect();
//! let forged = format!("{}.{forged_payload}.{}", parts[0], parts[2]);
//! assert!(!analyzer.verify(&forged, secret)?.signature_verified);
//! # Ok(())
//! # }
//! ```
//!
//! [JWT]: https://jwt.io/
//! [`chrono`]: https://docs.rs/chrono/

#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_root_url = "https://docs.rs/jwt-anatomy/0.1.0")]
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod alg;
pub mod analyzer;
pub mod base64url;
pub mod cases;
pub mod claims;
mod error;
pub mod history;
pub mod lexical;
pub mod pumping;
pub mod semantic;
pub mod syntax;
mod token;

/// Prelude to neatly import all necessary stuff from the crate.
pub mod prelude {
    pub use crate::{Algorithm, Analyzer, ParsedToken, TimeOptions};
}

pub use crate::{
    alg::{Algorithm, Secret},
    analyzer::Analyzer,
    claims::TimeOptions,
    error::{Error, ParseError, UnsupportedAlgorithm},
    token::{JsonObject, ParsedToken, Segment, TokenParts},
};
