//! HTTP method table.
//!
//! The parser never buffers a method name. It picks a candidate from the
//! first byte and then compares each further byte against the candidate's
//! literal; where two methods share a prefix the candidate is re-pinned to
//! its sibling at the exact `(index, byte)` where their literals diverge.

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP request method.
///
/// Discriminants are stable and match the numbering used on the wire by
/// existing consumers of this parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
#[repr(u8)]
pub enum Method {
    /// CHECKOUT method.
    Checkout = 1,
    /// CONNECT method.
    Connect,
    /// COPY method.
    Copy,
    /// DELETE method.
    Delete,
    /// GET method.
    Get,
    /// HEAD method.
    Head,
    /// LOCK method.
    Lock,
    /// MERGE method.
    Merge,
    /// MKACTIVITY method.
    MkActivity,
    /// MKCOL method.
    MkCol,
    /// MOVE method.
    Move,
    /// M-SEARCH method.
    MSearch,
    /// NOTIFY method.
    Notify,
    /// OPTIONS method.
    Options,
    /// PATCH method.
    Patch,
    /// POST method.
    Post,
    /// PROPFIND method.
    PropFind,
    /// PROPPATCH method.
    PropPatch,
    /// PUT method.
    Put,
    /// REPORT method.
    Report,
    /// SUBSCRIBE method.
    Subscribe,
    /// TRACE method.
    Trace,
    /// UNLOCK method.
    Unlock,
    /// UNSUBSCRIBE method.
    Unsubscribe,
}

impl Method {
    /// Every method, in tag order.
    pub const ALL: [Self; 24] = [
        Self::Checkout,
        Self::Connect,
        Self::Copy,
        Self::Delete,
        Self::Get,
        Self::Head,
        Self::Lock,
        Self::Merge,
        Self::MkActivity,
        Self::MkCol,
        Self::Move,
        Self::MSearch,
        Self::Notify,
        Self::Options,
        Self::Patch,
        Self::Post,
        Self::PropFind,
        Self::PropPatch,
        Self::Put,
        Self::Report,
        Self::Subscribe,
        Self::Trace,
        Self::Unlock,
        Self::Unsubscribe,
    ];

    /// Return the literal method name as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checkout => "CHECKOUT",
            Self::Connect => "CONNECT",
            Self::Copy => "COPY",
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Lock => "LOCK",
            Self::Merge => "MERGE",
            Self::MkActivity => "MKACTIVITY",
            Self::MkCol => "MKCOL",
            Self::Move => "MOVE",
            Self::MSearch => "M-SEARCH",
            Self::Notify => "NOTIFY",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::PropFind => "PROPFIND",
            Self::PropPatch => "PROPPATCH",
            Self::Put => "PUT",
            Self::Report => "REPORT",
            Self::Subscribe => "SUBSCRIBE",
            Self::Trace => "TRACE",
            Self::Unlock => "UNLOCK",
            Self::Unsubscribe => "UNSUBSCRIBE",
        }
    }

    /// Return the literal method name as bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Returns the stable numeric tag.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a complete method name (exact, case-sensitive).
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_bytes() == bytes)
    }

    /// Initial candidate selected by the first byte of a request line.
    ///
    /// Returns `None` when no method starts with `c`.
    #[must_use]
    pub const fn from_first_byte(c: u8) -> Option<Self> {
        Some(match c {
            b'C' => Self::Connect,
            b'D' => Self::Delete,
            b'G' => Self::Get,
            b'H' => Self::Head,
            b'L' => Self::Lock,
            b'M' => Self::MkCol,
            b'N' => Self::Notify,
            b'O' => Self::Options,
            b'P' => Self::Post,
            b'R' => Self::Report,
            b'S' => Self::Subscribe,
            b'T' => Self::Trace,
            b'U' => Self::Unlock,
            _ => return None,
        })
    }

    /// Sibling candidate for a byte that does not match `self` at `index`.
    ///
    /// Only the enumerated divergence points re-pin; every other mismatch
    /// returns `None` and the method is invalid.
    #[must_use]
    pub const fn repin(self, index: usize, c: u8) -> Option<Self> {
        match (self, index, c) {
            (Self::Connect, 1, b'H') => Some(Self::Checkout),
            (Self::Connect, 2, b'P') => Some(Self::Copy),
            (Self::MkCol, 1, b'O') => Some(Self::Move),
            (Self::MkCol, 1, b'E') => Some(Self::Merge),
            (Self::MkCol, 1, b'-') => Some(Self::MSearch),
            (Self::MkCol, 2, b'A') => Some(Self::MkActivity),
            (Self::Post, 1, b'A') => Some(Self::Patch),
            (Self::Post, 1, b'R') => Some(Self::PropFind),
            (Self::Post, 1, b'U') => Some(Self::Put),
            (Self::Unlock, 2, b'S') => Some(Self::Unsubscribe),
            (Self::PropFind, 4, b'P') => Some(Self::PropPatch),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for &'static str {
    fn from(method: Method) -> Self {
        method.as_str()
    }
}

impl TryFrom<String> for Method {
    type Error = UnknownMethod;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_bytes(value.as_bytes()).ok_or(UnknownMethod)
    }
}

/// Error returned when a string names no method in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMethod;

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown HTTP method")
    }
}

impl std::error::Error for UnknownMethod {}
