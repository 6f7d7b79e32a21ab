//! Decoding of the compact token returned by the attestation service.
//!
//! The token is split into its header and payload segments and each is
//! decoded on its own, so a broken header never hides the payload. The
//! signature segment is carried along but never checked: the `200 OK` from
//! the service is the only authenticity signal this crate relies on.

pub mod path;
pub mod summary;

pub use path::{lookup, lookup_array, lookup_object, Lookup, MissingField};
pub use summary::{AttestationSummary, CryptpilotEntry, TrustTier, TrustVector};

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde_json::Value;
use std::fmt;

/// Number of `.` separated segments in a compact token.
const TOKEN_SEGMENTS: usize = 3;

/// Raw token text as returned by the attestation service.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedToken(String);

impl SignedToken {
    pub const fn new(raw: String) -> Self {
        Self(raw)
    }

    /// The token exactly as received.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Splits the token and decodes its header and payload segments.
    ///
    /// Surrounding whitespace is ignored. Only the segment count is fatal
    /// here; per-segment failures are reported inside [`DecodedToken`].
    pub fn decode(&self) -> Result<DecodedToken, TokenError> {
        let parts: Vec<&str> = self.0.trim().split('.').collect();
        if parts.len() != TOKEN_SEGMENTS {
            return Err(TokenError::Format {
                segments: parts.len(),
            });
        }

        Ok(DecodedToken {
            header: decode_segment(Segment::Header, parts[0]),
            payload: decode_segment(Segment::Payload, parts[1]),
        })
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignedToken")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

impl From<String> for SignedToken {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Header and payload of a token, each decoded independently.
#[derive(Debug)]
pub struct DecodedToken {
    pub header: Result<Value, SegmentError>,
    pub payload: Result<Value, SegmentError>,
}

/// Segments of a compact token that carry JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Header,
    Payload,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Payload => f.write_str("payload"),
        }
    }
}

/// Problems interpreting a token. None of these stop a run.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token does not have exactly three segments.
    #[error("invalid JWT format: expected 3 segments separated by '.', found {segments}")]
    Format { segments: usize },

    #[error(transparent)]
    Segment(#[from] SegmentError),
}

/// A header or payload segment that could not be turned into JSON.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode JWT {segment}")]
pub struct SegmentError {
    pub segment: Segment,
    #[source]
    pub kind: SegmentErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum SegmentErrorKind {
    #[error("invalid base64url")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),
}

/// Restores the `=` padding stripped from base64url segments.
pub fn pad_base64url(segment: &str) -> String {
    let mut padded = segment.to_string();
    let remainder = padded.len() % 4;
    if remainder != 0 {
        padded.extend(std::iter::repeat('=').take(4 - remainder));
    }
    padded
}

fn decode_segment(segment: Segment, encoded: &str) -> Result<Value, SegmentError> {
    let decode = || -> Result<Value, SegmentErrorKind> {
        let bytes = URL_SAFE.decode(pad_base64url(encoded))?;
        let text = String::from_utf8(bytes)?;
        Ok(serde_json::from_str(&text)?)
    };
    decode().map_err(|kind| SegmentError { segment, kind })
}
