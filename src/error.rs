//! Error handling.

use core::fmt;

use crate::token::Segment;

/// Errors that may occur during structural token parsing.
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// Token has invalid structure.
    ///
    /// Valid tokens must consist of exactly 3 parts (header, payload, and signature)
    /// separated by periods.
    MalformedToken,
    /// Token segment is empty or contains characters outside the base64url alphabet,
    /// or cannot be decoded as base64url.
    InvalidEncoding(Segment),
    /// Decoded segment is not a JSON object.
    InvalidJson {
        /// Segment that has failed to parse.
        segment: Segment,
        /// JSON parsing error, if the segment is not valid JSON at all. `None` means
        /// that the segment is valid JSON, but not an object.
        source: Option<serde_json::Error>,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken => formatter
                .write_str("Malformed token: expected exactly 3 parts separated by '.'"),
            Self::InvalidEncoding(segment) => {
                write!(formatter, "{segment} is not valid base64url")
            }
            Self::InvalidJson {
                segment,
                source: Some(e),
            } => write!(formatter, "{segment} is not valid JSON: {e}"),
            Self::InvalidJson {
                segment,
                source: None,
            } => write!(formatter, "{segment} is not a JSON object"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidJson {
                source: Some(e), ..
            } => Some(e),
            _ => None,
        }
    }
}

/// Error signalling that an algorithm name is outside the HMAC allow-list
/// (`HS256`, `HS384`, `HS512`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedAlgorithm {
    /// Offending algorithm name.
    pub name: String,
}

impl UnsupportedAlgorithm {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for UnsupportedAlgorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Unsupported algorithm: {}", self.name)
    }
}

impl std::error::Error for UnsupportedAlgorithm {}

/// Errors returned by [`Analyzer`](crate::Analyzer) operations.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Token cannot be parsed.
    Parse(ParseError),
    /// Requested or declared algorithm is not supported.
    UnsupportedAlgorithm(UnsupportedAlgorithm),
    /// Header or payload cannot be serialized into JSON.
    Serialization(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => fmt::Display::fmt(e, formatter),
            Self::UnsupportedAlgorithm(e) => fmt::Display::fmt(e, formatter),
            Self::Serialization(e) => write!(formatter, "Cannot serialize token part: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::UnsupportedAlgorithm(e) => Some(e),
            Self::Serialization(e) => Some(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<UnsupportedAlgorithm> for Error {
    fn from(error: UnsupportedAlgorithm) -> Self {
        Self::UnsupportedAlgorithm(error)
    }
}
