//! Shared types for the h1fsm parser.
//!
//! This crate holds the immutable, process-wide data the state machine
//! consults on every byte, enabling the parser crate to stay focused on
//! state transitions:
//!
//! - [`chars`] - byte classification predicates and the URL bitmap
//! - [`Method`] - the method table with first-byte and re-pin rules
//! - [`ErrorCode`] / [`ParseError`] - the closed error enumeration
//! - [`ParserType`] and [`HttpVersion`]

#![forbid(unsafe_code)]

pub mod chars;
mod error;
mod method;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::{ErrorCode, ParseError};
pub use method::{Method, UnknownMethod};

/// Which side of a connection a parser reads.
///
/// Fixed at construction; a parser never switches between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserType {
    /// Parse requests (server side).
    Request,
    /// Parse responses (client side).
    Response,
}

impl ParserType {
    /// Returns the mode as a lowercase string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

impl fmt::Display for ParserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP protocol version as parsed from a request or status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HttpVersion {
    /// Major version digit(s).
    pub major: u16,
    /// Minor version digit(s).
    pub minor: u16,
}

impl HttpVersion {
    /// HTTP/0.9 (request line without a version).
    pub const HTTP_09: Self = Self::new(0, 9);
    /// HTTP/1.0.
    pub const HTTP_10: Self = Self::new(1, 0);
    /// HTTP/1.1.
    pub const HTTP_11: Self = Self::new(1, 1);

    /// Create a version from its components.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Returns true for HTTP/1.1 and later, where connections persist by default.
    #[must_use]
    pub fn is_persistent_by_default(self) -> bool {
        self >= Self::HTTP_11
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_display() {
        assert_eq!(HttpVersion::HTTP_11.to_string(), "HTTP/1.1");
        assert_eq!(HttpVersion::new(0, 9).to_string(), "HTTP/0.9");
    }

    #[test]
    fn version_persistence() {
        assert!(HttpVersion::HTTP_11.is_persistent_by_default());
        assert!(HttpVersion::new(2, 0).is_persistent_by_default());
        assert!(!HttpVersion::HTTP_10.is_persistent_by_default());
        assert!(!HttpVersion::HTTP_09.is_persistent_by_default());
    }

    #[test]
    fn parser_type_serde() {
        let json = serde_json::to_string(&ParserType::Response).unwrap();
        assert_eq!(json, "\"response\"");
        let back: ParserType = serde_json::from_str("\"request\"").unwrap();
        assert_eq!(back, ParserType::Request);
    }
}
