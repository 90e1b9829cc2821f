//! HMAC-based signing and verification (`HS256`, `HS384`, `HS512`).
//!
//! The algorithm name is mapped to a hash function via the [`Algorithm`] enum; no other
//! algorithms (in particular, asymmetric ones) are supported.

use hmac::{Hmac, Mac as _};
use serde::{Serialize, Serializer};
use sha2::{Sha256, Sha384, Sha512};
use smallvec::SmallVec;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use core::{fmt, str::FromStr};

use crate::{base64url, UnsupportedAlgorithm};

/// Maximum digest size in bytes (for `HS512`).
const DIGEST_SIZE: usize = 64;

/// Secret shared between the token issuer and verifier. Zeroed on drop.
///
/// HMACs accept secrets of any length; no strength requirements are enforced.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Secret(Vec<u8>);

impl fmt::Debug for Secret {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Secret").field(&"_").finish()
    }
}

impl Secret {
    /// Creates a secret from the specified `bytes`.
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self(bytes.as_ref().to_vec())
    }

    /// Checks whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&[u8]> for Secret {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for Secret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// HMAC signing algorithm allowed in analyzed tokens.
///
/// See [RFC 7518] for the algorithm specification.
///
/// [RFC 7518]: https://tools.ietf.org/html/rfc7518#section-3.2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Algorithm {
    /// HMAC with SHA-256.
    Hs256,
    /// HMAC with SHA-384.
    Hs384,
    /// HMAC with SHA-512.
    Hs512,
}

macro_rules! hmac_digest {
    ($digest:ty, $secret:expr, $message:expr) => {{
        let mut hmac = Hmac::<$digest>::new_from_slice($secret.as_ref())
            .expect("HMACs work with any key size");
        hmac.update($message);
        hmac.finalize().into_bytes().as_slice().into()
    }};
}

impl Algorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 3] = [Self::Hs256, Self::Hs384, Self::Hs512];

    /// Returns the name of this algorithm, as mentioned in the `alg` field of the JWT header.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }

    /// Checks whether `name` is in the allow-list.
    pub fn is_allowed(name: &str) -> bool {
        name.parse::<Self>().is_ok()
    }

    fn digest(self, secret: &Secret, message: &[u8]) -> SmallVec<[u8; DIGEST_SIZE]> {
        match self {
            Self::Hs256 => hmac_digest!(Sha256, secret, message),
            Self::Hs384 => hmac_digest!(Sha384, secret, message),
            Self::Hs512 => hmac_digest!(Sha512, secret, message),
        }
    }

    /// Computes the base64url-encoded signature of `header_seg.payload_seg`.
    pub fn sign(self, header_seg: &str, payload_seg: &str, secret: impl AsRef<[u8]>) -> String {
        let secret = Secret::new(secret);
        let message = format!("{header_seg}.{payload_seg}");
        base64url::encode(self.digest(&secret, message.as_bytes()))
    }

    /// Verifies `signature_seg` against `header_seg.payload_seg`.
    ///
    /// The expected signature is recomputed and compared in constant time. Signatures
    /// of differing lengths are rejected right away; the length is public anyway.
    pub fn verify(
        self,
        header_seg: &str,
        payload_seg: &str,
        signature_seg: &str,
        secret: impl AsRef<[u8]>,
    ) -> bool {
        let expected = self.sign(header_seg, payload_seg, secret);
        let (expected, actual) = (expected.as_bytes(), signature_seg.as_bytes());
        if expected.len() != actual.len() {
            return false;
        }
        expected.ct_eq(actual).into()
    }
}

impl FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name() == s)
            .ok_or_else(|| UnsupportedAlgorithm::new(s))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Signs `header_seg.payload_seg` with the algorithm named `algorithm`.
///
/// # Examples
///
/// ```
/// # use jwt_anatomy::alg;
/// let signature = alg::sign("eyJhbGciOiJIUzI1NiJ9", "e30", "secret", "HS256")?;
/// assert!(alg::verify("eyJhbGciOiJIUzI1NiJ9", "e30", &signature, "secret", "HS256")?);
/// assert!(alg::sign("eyJhbGciOiJIUzI1NiJ9", "e30", "secret", "RS256").is_err());
/// # Ok::<_, jwt_anatomy::UnsupportedAlgorithm>(())
/// ```
pub fn sign(
    header_seg: &str,
    payload_seg: &str,
    secret: impl AsRef<[u8]>,
    algorithm: &str,
) -> Result<String, UnsupportedAlgorithm> {
    let algorithm: Algorithm = algorithm.parse()?;
    Ok(algorithm.sign(header_seg, payload_seg, secret))
}

/// Verifies `signature_seg` with the algorithm named `algorithm`.
pub fn verify(
    header_seg: &str,
    payload_seg: &str,
    signature_seg: &str,
    secret: impl AsRef<[u8]>,
    algorithm: &str,
) -> Result<bool, UnsupportedAlgorithm> {
    let algorithm: Algorithm = algorithm.parse()?;
    Ok(algorithm.verify(header_seg, payload_seg, signature_seg, secret))
}
