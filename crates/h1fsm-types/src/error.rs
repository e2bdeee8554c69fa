//! Parser error codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a parser died or refused input.
///
/// The numeric values are stable for logging and wire compatibility. Values
/// 2 through 11 belonged to callback failures and are not assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ErrorCode {
    /// No error.
    Ok = 1,
    /// EOF arrived in the middle of a message.
    InvalidEofState = 12,
    /// Request/status line and headers exceed the configured limit.
    HeaderOverflow = 13,
    /// Data arrived after a message that closes the connection.
    ClosedConnection = 14,
    /// Malformed HTTP version.
    InvalidVersion = 15,
    /// Malformed response status code.
    InvalidStatus = 16,
    /// Unknown or malformed request method.
    InvalidMethod = 17,
    /// Malformed request target.
    InvalidUrl = 18,
    /// Malformed host in the request target.
    InvalidHost = 19,
    /// Malformed port in the request target.
    InvalidPort = 20,
    /// Malformed path in the request target.
    InvalidPath = 21,
    /// Malformed query string in the request target.
    InvalidQueryString = 22,
    /// Malformed fragment in the request target.
    InvalidFragment = 23,
    /// A CR was not followed by LF.
    LfExpected = 24,
    /// Invalid byte in a header name or value.
    InvalidHeaderToken = 25,
    /// Malformed, negative, overflowing or conflicting Content-Length.
    InvalidContentLength = 26,
    /// Malformed or overflowing chunk size.
    InvalidChunkSize = 27,
    /// Unexpected byte inside a fixed literal such as `HTTP/`.
    InvalidConstant = 28,
    /// The state machine reached a state it cannot handle.
    InvalidInternalState = 29,
    /// Input violated strict-mode rules.
    Strict = 30,
    /// The handler paused the parser.
    Paused = 31,
    /// Unclassified failure.
    Unknown = 32,
}

impl ErrorCode {
    /// Returns the stable numeric value.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the constant-style name, e.g. `INVALID_METHOD`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidEofState => "INVALID_EOF_STATE",
            Self::HeaderOverflow => "HEADER_OVERFLOW",
            Self::ClosedConnection => "CLOSED_CONNECTION",
            Self::InvalidVersion => "INVALID_VERSION",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidMethod => "INVALID_METHOD",
            Self::InvalidUrl => "INVALID_URL",
            Self::InvalidHost => "INVALID_HOST",
            Self::InvalidPort => "INVALID_PORT",
            Self::InvalidPath => "INVALID_PATH",
            Self::InvalidQueryString => "INVALID_QUERY_STRING",
            Self::InvalidFragment => "INVALID_FRAGMENT",
            Self::LfExpected => "LF_EXPECTED",
            Self::InvalidHeaderToken => "INVALID_HEADER_TOKEN",
            Self::InvalidContentLength => "INVALID_CONTENT_LENGTH",
            Self::InvalidChunkSize => "INVALID_CHUNK_SIZE",
            Self::InvalidConstant => "INVALID_CONSTANT",
            Self::InvalidInternalState => "INVALID_INTERNAL_STATE",
            Self::Strict => "STRICT",
            Self::Paused => "PAUSED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns a human readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::InvalidEofState => "stream ended at an unexpected time",
            Self::HeaderOverflow => "too many header bytes seen",
            Self::ClosedConnection => "data received after completed connection: close message",
            Self::InvalidVersion => "invalid HTTP version",
            Self::InvalidStatus => "invalid HTTP status code",
            Self::InvalidMethod => "invalid HTTP method",
            Self::InvalidUrl => "invalid URL",
            Self::InvalidHost => "invalid host",
            Self::InvalidPort => "invalid port",
            Self::InvalidPath => "invalid path",
            Self::InvalidQueryString => "invalid query string",
            Self::InvalidFragment => "invalid fragment",
            Self::LfExpected => "LF character expected",
            Self::InvalidHeaderToken => "invalid character in header",
            Self::InvalidContentLength => "invalid character in content-length header",
            Self::InvalidChunkSize => "invalid character in chunk size header",
            Self::InvalidConstant => "invalid constant string",
            Self::InvalidInternalState => "encountered unexpected internal state",
            Self::Strict => "strict mode assertion failed",
            Self::Paused => "parser is paused",
            Self::Unknown => "an unknown error occurred",
        }
    }

    /// Returns true for [`ErrorCode::Ok`].
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A protocol error with the offset of the offending byte.
///
/// `position` is relative to the slice passed to the call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub code: ErrorCode,
    /// Offset of the rejected byte within the input slice.
    pub position: usize,
}

impl ParseError {
    /// Create a new error.
    #[must_use]
    pub const fn new(code: ErrorCode, position: usize) -> Self {
        Self { code, position }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) at byte {}",
            self.code.description(),
            self.code.name(),
            self.position
        )
    }
}

impl std::error::Error for ParseError {}
