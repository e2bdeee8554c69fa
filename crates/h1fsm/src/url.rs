//! Request-target state machine.
//!
//! The message parser drives [`parse_url_char`] one byte at a time while it
//! is inside a request target. The same machine backs [`parse_url`], which
//! splits a complete target into borrowed components.

use h1fsm_types::chars::{is_alnum, is_alpha, is_digit, is_host_char, is_url_char};
use h1fsm_types::{ErrorCode, ParseError};
use serde::Serialize;

/// Position inside a request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UrlState {
    /// Nothing consumed yet.
    SpacesBeforeUrl,
    /// Inside `http` of `http://host`.
    Schema,
    /// After the `:` of a schema.
    SchemaSlash,
    /// After the first `/` of `://`.
    SchemaSlashSlash,
    /// After `://`, before the first host byte.
    HostStart,
    /// Inside an authority host.
    Host,
    /// After the `:` of an authority, before the first port digit.
    PortStart,
    /// Inside an authority port.
    Port,
    /// Inside the path, including `*` for `OPTIONS *`.
    Path,
    /// Just consumed the `?`.
    QueryStringStart,
    /// Inside the query string.
    QueryString,
    /// Just consumed the `#`.
    FragmentStart,
    /// Inside the fragment.
    Fragment,
    /// The last byte was rejected.
    Dead,
}

impl UrlState {
    /// Returns true when a target may end in this state.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(
            self,
            Self::Host
                | Self::Port
                | Self::Path
                | Self::QueryStringStart
                | Self::QueryString
                | Self::FragmentStart
                | Self::Fragment
        )
    }

    /// Error reported when this state rejects a byte.
    #[must_use]
    pub const fn error_code(self) -> ErrorCode {
        match self {
            Self::HostStart | Self::Host => ErrorCode::InvalidHost,
            Self::PortStart | Self::Port => ErrorCode::InvalidPort,
            Self::Path => ErrorCode::InvalidPath,
            Self::QueryStringStart | Self::QueryString => ErrorCode::InvalidQueryString,
            Self::FragmentStart | Self::Fragment => ErrorCode::InvalidFragment,
            _ => ErrorCode::InvalidUrl,
        }
    }
}

/// Advance the target machine by one byte.
///
/// `is_connect` lets a bare `host:port` authority start the target, as
/// `CONNECT` requests require. Returns [`UrlState::Dead`] when `state` does
/// not accept `c`; the caller reports `state.error_code()`.
#[must_use]
pub fn parse_url_char(state: UrlState, c: u8, is_connect: bool) -> UrlState {
    match state {
        UrlState::SpacesBeforeUrl => {
            if c == b'/' || c == b'*' {
                UrlState::Path
            } else if is_connect && is_alnum(c) {
                UrlState::Host
            } else if is_alpha(c) {
                UrlState::Schema
            } else {
                UrlState::Dead
            }
        }
        UrlState::Schema => {
            if is_alpha(c) {
                UrlState::Schema
            } else if c == b':' {
                UrlState::SchemaSlash
            } else {
                UrlState::Dead
            }
        }
        UrlState::SchemaSlash => {
            if c == b'/' {
                UrlState::SchemaSlashSlash
            } else {
                UrlState::Dead
            }
        }
        UrlState::SchemaSlashSlash => {
            if c == b'/' {
                UrlState::HostStart
            } else {
                UrlState::Dead
            }
        }
        UrlState::HostStart => {
            if is_host_char(c) {
                UrlState::Host
            } else {
                UrlState::Dead
            }
        }
        UrlState::Host => match c {
            b':' => UrlState::PortStart,
            b'/' => UrlState::Path,
            b'?' => UrlState::QueryStringStart,
            _ if is_host_char(c) => UrlState::Host,
            _ => UrlState::Dead,
        },
        UrlState::PortStart => {
            if is_digit(c) {
                UrlState::Port
            } else {
                UrlState::Dead
            }
        }
        UrlState::Port => match c {
            b'/' => UrlState::Path,
            b'?' => UrlState::QueryStringStart,
            _ if is_digit(c) => UrlState::Port,
            _ => UrlState::Dead,
        },
        UrlState::Path => match c {
            b'?' => UrlState::QueryStringStart,
            b'#' => UrlState::FragmentStart,
            _ if is_url_char(c) => UrlState::Path,
            _ => UrlState::Dead,
        },
        UrlState::QueryStringStart | UrlState::QueryString => match c {
            b'?' => UrlState::QueryString,
            b'#' => UrlState::FragmentStart,
            _ if is_url_char(c) => UrlState::QueryString,
            _ => UrlState::Dead,
        },
        UrlState::FragmentStart | UrlState::Fragment => {
            if c == b'#' || c == b'?' || is_url_char(c) {
                UrlState::Fragment
            } else {
                UrlState::Dead
            }
        }
        UrlState::Dead => UrlState::Dead,
    }
}

// ============================================================================
// Component Splitting
// ============================================================================

/// Components of a request target, borrowed from the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Url<'a> {
    /// `http` in `http://example.com/`.
    pub schema: Option<&'a str>,
    /// Authority host.
    pub host: Option<&'a str>,
    /// Authority port.
    pub port: Option<u16>,
    /// Path, starting with `/` (or `*`).
    pub path: Option<&'a str>,
    /// Query string without the leading `?`.
    pub query: Option<&'a str>,
    /// Fragment without the leading `#`.
    pub fragment: Option<&'a str>,
}

#[derive(Clone, Copy)]
enum Field {
    Schema,
    Host,
    Port,
    Path,
    Query,
    Fragment,
}

/// Which component a byte belongs to when it moves the machine to `to`.
///
/// `None` means the byte is a delimiter.
fn field_of(to: UrlState) -> Option<Field> {
    match to {
        UrlState::Schema => Some(Field::Schema),
        UrlState::Host => Some(Field::Host),
        UrlState::Port => Some(Field::Port),
        UrlState::Path => Some(Field::Path),
        UrlState::QueryString => Some(Field::Query),
        UrlState::Fragment => Some(Field::Fragment),
        _ => None,
    }
}

/// Split a complete request target into its components.
///
/// Runs the same machine the message parser uses between the method and the
/// version. `is_connect` selects authority form.
///
/// # Errors
///
/// Returns the code of the state that rejected a byte, or of the state a
/// truncated target ends in ([`ErrorCode::InvalidUrl`] for empty input), and
/// [`ErrorCode::InvalidPort`] for ports above 65535.
pub fn parse_url(bytes: &[u8], is_connect: bool) -> Result<Url<'_>, ParseError> {
    let mut spans: [Option<(usize, usize)>; 6] = [None; 6];
    let mut state = UrlState::SpacesBeforeUrl;

    for (i, &c) in bytes.iter().enumerate() {
        let next = parse_url_char(state, c, is_connect);
        if next == UrlState::Dead {
            return Err(ParseError::new(state.error_code(), i));
        }
        if let Some(field) = field_of(next) {
            let span = &mut spans[field as usize];
            *span = Some(span.map_or((i, i + 1), |(start, _)| (start, i + 1)));
        }
        state = next;
    }

    if !state.is_complete() {
        return Err(ParseError::new(state.error_code(), bytes.len()));
    }

    let text = |field: Field| span_text(bytes, spans[field as usize]);
    let port = spans[Field::Port as usize]
        .map(|(start, end)| parse_port(&bytes[start..end], start))
        .transpose()?;

    Ok(Url {
        schema: text(Field::Schema)?,
        host: text(Field::Host)?,
        port,
        path: text(Field::Path)?,
        query: text(Field::Query)?,
        fragment: text(Field::Fragment)?,
    })
}

fn span_text(bytes: &[u8], span: Option<(usize, usize)>) -> Result<Option<&str>, ParseError> {
    span.map(|(start, end)| {
        std::str::from_utf8(&bytes[start..end])
            .map_err(|_| ParseError::new(ErrorCode::InvalidUrl, start))
    })
    .transpose()
}

fn parse_port(digits: &[u8], start: usize) -> Result<u16, ParseError> {
    digits
        .iter()
        .try_fold(0u16, |acc, &c| {
            acc.checked_mul(10)?.checked_add(u16::from(c - b'0'))
        })
        .ok_or(ParseError::new(ErrorCode::InvalidPort, start))
}
