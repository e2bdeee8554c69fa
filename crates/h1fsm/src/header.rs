//! Recognition of framing headers.
//!
//! Names are matched byte by byte against lowercase literals with the same
//! candidate/re-pin scheme the method table uses, so a name split across
//! feeds resumes where it left off. Values of the recognised headers are
//! scanned incrementally by [`ValueScanner`]; nothing is buffered beyond a
//! short token.

use h1fsm_types::ErrorCode;

/// A header that affects message framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KnownHeader {
    Connection,
    ContentLength,
    TransferEncoding,
    Upgrade,
}

impl KnownHeader {
    const fn literal(self) -> &'static [u8] {
        match self {
            Self::Connection => b"connection",
            Self::ContentLength => b"content-length",
            Self::TransferEncoding => b"transfer-encoding",
            Self::Upgrade => b"upgrade",
        }
    }

    const fn from_first_byte(c: u8) -> Option<Self> {
        match c {
            b'c' => Some(Self::Connection),
            b't' => Some(Self::TransferEncoding),
            b'u' => Some(Self::Upgrade),
            _ => None,
        }
    }

    const fn repin(self, index: usize, c: u8) -> Option<Self> {
        match (self, index, c) {
            (Self::Connection, 3, b't') => Some(Self::ContentLength),
            _ => None,
        }
    }
}

// ============================================================================
// Name Matching
// ============================================================================

/// Incremental, case-insensitive header name matcher.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NameMatcher {
    candidate: Option<KnownHeader>,
    index: usize,
}

impl NameMatcher {
    /// Start a new name with its first byte.
    pub(crate) fn start(c: u8) -> Self {
        Self {
            candidate: KnownHeader::from_first_byte(c.to_ascii_lowercase()),
            index: 1,
        }
    }

    /// Feed the next name byte.
    pub(crate) fn push(&mut self, c: u8) {
        let Some(candidate) = self.candidate else {
            return;
        };
        let c = c.to_ascii_lowercase();
        if candidate.literal().get(self.index) != Some(&c) {
            self.candidate = candidate.repin(self.index, c);
        }
        self.index += 1;
    }

    /// The recognised header, once the name is complete.
    pub(crate) fn finish(self) -> Option<KnownHeader> {
        self.candidate
            .filter(|candidate| candidate.literal().len() == self.index)
    }
}

// ============================================================================
// Value Scanning
// ============================================================================

/// Token recognised inside a comma-separated header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Other,
    Chunked,
    KeepAlive,
    Close,
    Upgrade,
}

impl Token {
    const LONGEST: usize = 10;

    fn classify(token: &[u8]) -> Self {
        match token {
            b"chunked" => Self::Chunked,
            b"keep-alive" => Self::KeepAlive,
            b"close" => Self::Close,
            b"upgrade" => Self::Upgrade,
            _ => Self::Other,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Other => 0,
            Self::Chunked => 1,
            Self::KeepAlive => 1 << 1,
            Self::Close => 1 << 2,
            Self::Upgrade => 1 << 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenPhase {
    Leading,
    InToken,
    Trailing,
    Garbage,
}

/// Scanner for comma-separated token lists (`Connection`, `Transfer-Encoding`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct TokenList {
    buf: [u8; Token::LONGEST],
    len: usize,
    phase: TokenPhase,
    last: Option<Token>,
    seen: u8,
}

impl TokenList {
    fn new() -> Self {
        Self {
            buf: [0; Token::LONGEST],
            len: 0,
            phase: TokenPhase::Leading,
            last: None,
            seen: 0,
        }
    }

    fn push(&mut self, c: u8) {
        match c {
            b',' => self.end_token(),
            b' ' | b'\t' => {
                if self.phase == TokenPhase::InToken {
                    self.phase = TokenPhase::Trailing;
                }
            }
            _ => match self.phase {
                TokenPhase::Leading | TokenPhase::InToken if self.len < Token::LONGEST => {
                    self.buf[self.len] = c.to_ascii_lowercase();
                    self.len += 1;
                    self.phase = TokenPhase::InToken;
                }
                _ => self.phase = TokenPhase::Garbage,
            },
        }
    }

    fn end_token(&mut self) {
        let token = match self.phase {
            TokenPhase::Leading => None,
            TokenPhase::Garbage => Some(Token::Other),
            TokenPhase::InToken | TokenPhase::Trailing => {
                Some(Token::classify(&self.buf[..self.len]))
            }
        };
        if let Some(token) = token {
            self.last = Some(token);
            self.seen |= token.bit();
        }
        self.len = 0;
        self.phase = TokenPhase::Leading;
    }

    /// Close the list; returns the last token and the set of tokens seen.
    fn finish(mut self) -> (Option<Token>, u8) {
        self.end_token();
        (self.last, self.seen)
    }
}

/// Incremental `Content-Length` value scanner.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ContentLength {
    value: u64,
    digits: bool,
    trailing: bool,
}

impl ContentLength {
    fn push(&mut self, c: u8) -> Result<(), ErrorCode> {
        match c {
            b'0'..=b'9' if !self.trailing => {
                self.value = self
                    .value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(c - b'0')))
                    .ok_or(ErrorCode::InvalidContentLength)?;
                self.digits = true;
                Ok(())
            }
            b' ' | b'\t' => {
                self.trailing = self.digits;
                Ok(())
            }
            _ => Err(ErrorCode::InvalidContentLength),
        }
    }
}

/// What a completed recognised header contributes to framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderEffect {
    None,
    ContentLength(u64),
    /// Last coding of `Transfer-Encoding` and whether it was `chunked`.
    TransferEncoding { chunked: bool },
    /// Token bits seen in `Connection`.
    Connection(u8),
    Upgrade,
}

/// Per-header value state, chosen when the name completes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ValueScanner {
    Ignore,
    ContentLength(ContentLength),
    TransferEncoding(TokenList),
    Connection(TokenList),
    Upgrade,
}

impl ValueScanner {
    pub(crate) fn for_header(header: Option<KnownHeader>) -> Self {
        match header {
            None => Self::Ignore,
            Some(KnownHeader::ContentLength) => Self::ContentLength(ContentLength::default()),
            Some(KnownHeader::TransferEncoding) => Self::TransferEncoding(TokenList::new()),
            Some(KnownHeader::Connection) => Self::Connection(TokenList::new()),
            Some(KnownHeader::Upgrade) => Self::Upgrade,
        }
    }

    /// True when value bytes need not be inspected.
    pub(crate) fn is_passive(&self) -> bool {
        matches!(self, Self::Ignore | Self::Upgrade)
    }

    pub(crate) fn push(&mut self, c: u8) -> Result<(), ErrorCode> {
        match self {
            Self::ContentLength(scan) => scan.push(c),
            Self::TransferEncoding(list) | Self::Connection(list) => {
                list.push(c);
                Ok(())
            }
            Self::Ignore | Self::Upgrade => Ok(()),
        }
    }

    /// Complete the value.
    pub(crate) fn finish(self) -> Result<HeaderEffect, ErrorCode> {
        Ok(match self {
            Self::Ignore => HeaderEffect::None,
            Self::ContentLength(scan) if scan.digits => HeaderEffect::ContentLength(scan.value),
            Self::ContentLength(_) => return Err(ErrorCode::InvalidContentLength),
            Self::TransferEncoding(list) => HeaderEffect::TransferEncoding {
                chunked: list.finish().0 == Some(Token::Chunked),
            },
            Self::Connection(list) => HeaderEffect::Connection(list.finish().1),
            Self::Upgrade => HeaderEffect::Upgrade,
        })
    }
}

/// Bits reported by [`HeaderEffect::Connection`].
pub(crate) mod connection {
    use super::Token;

    pub(crate) const KEEP_ALIVE: u8 = Token::KeepAlive.bit();
    pub(crate) const CLOSE: u8 = Token::Close.bit();
    pub(crate) const UPGRADE: u8 = Token::Upgrade.bit();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(bytes: &[u8]) -> Option<KnownHeader> {
        let (&first, rest) = bytes.split_first()?;
        let mut matcher = NameMatcher::start(first);
        for &c in rest {
            matcher.push(c);
        }
        matcher.finish()
    }

    fn value(header: KnownHeader, bytes: &[u8]) -> Result<HeaderEffect, ErrorCode> {
        let mut scanner = ValueScanner::for_header(Some(header));
        for &c in bytes {
            scanner.push(c)?;
        }
        scanner.finish()
    }

    // ========================================================================
    // Name Tests
    // ========================================================================

    #[test]
    fn recognises_names_case_insensitively() {
        assert_eq!(name(b"Content-Length"), Some(KnownHeader::ContentLength));
        assert_eq!(name(b"CONTENT-LENGTH"), Some(KnownHeader::ContentLength));
        assert_eq!(name(b"connection"), Some(KnownHeader::Connection));
        assert_eq!(name(b"Transfer-Encoding"), Some(KnownHeader::TransferEncoding));
        assert_eq!(name(b"Upgrade"), Some(KnownHeader::Upgrade));
    }

    #[test]
    fn rejects_prefixes_and_extensions() {
        assert_eq!(name(b"Content-Type"), None);
        assert_eq!(name(b"Content-Len"), None);
        assert_eq!(name(b"Connections"), None);
        assert_eq!(name(b"Con"), None);
        assert_eq!(name(b"Host"), None);
        assert_eq!(name(b"Upgrade-Insecure-Requests"), None);
    }

    // ========================================================================
    // Value Tests
    // ========================================================================

    #[test]
    fn content_length_values() {
        let cl = KnownHeader::ContentLength;
        assert_eq!(value(cl, b"0"), Ok(HeaderEffect::ContentLength(0)));
        assert_eq!(value(cl, b"1234"), Ok(HeaderEffect::ContentLength(1234)));
        assert_eq!(value(cl, b"5  "), Ok(HeaderEffect::ContentLength(5)));
        assert_eq!(value(cl, b""), Err(ErrorCode::InvalidContentLength));
        assert_eq!(value(cl, b"-1"), Err(ErrorCode::InvalidContentLength));
        assert_eq!(value(cl, b"1 2"), Err(ErrorCode::InvalidContentLength));
        assert_eq!(value(cl, b"0x10"), Err(ErrorCode::InvalidContentLength));
        assert_eq!(
            value(cl, b"18446744073709551616"),
            Err(ErrorCode::InvalidContentLength)
        );
        assert_eq!(
            value(cl, b"18446744073709551615"),
            Ok(HeaderEffect::ContentLength(u64::MAX))
        );
    }

    #[test]
    fn transfer_encoding_last_coding_wins() {
        let te = KnownHeader::TransferEncoding;
        let chunked = |c| Ok(HeaderEffect::TransferEncoding { chunked: c });
        assert_eq!(value(te, b"chunked"), chunked(true));
        assert_eq!(value(te, b"Chunked"), chunked(true));
        assert_eq!(value(te, b"gzip, chunked"), chunked(true));
        assert_eq!(value(te, b"gzip,chunked  "), chunked(true));
        assert_eq!(value(te, b"chunked, gzip"), chunked(false));
        assert_eq!(value(te, b"chunked,"), chunked(true));
        assert_eq!(value(te, b"chunkedx"), chunked(false));
        assert_eq!(value(te, b"chun ked"), chunked(false));
        assert_eq!(value(te, b"identity"), chunked(false));
    }

    #[test]
    fn connection_tokens() {
        let conn = KnownHeader::Connection;
        assert_eq!(
            value(conn, b"keep-alive"),
            Ok(HeaderEffect::Connection(connection::KEEP_ALIVE))
        );
        assert_eq!(
            value(conn, b"Close"),
            Ok(HeaderEffect::Connection(connection::CLOSE))
        );
        assert_eq!(
            value(conn, b"keep-alive, Upgrade"),
            Ok(HeaderEffect::Connection(
                connection::KEEP_ALIVE | connection::UPGRADE
            ))
        );
        assert_eq!(value(conn, b"TE, foo"), Ok(HeaderEffect::Connection(0)));
        assert_eq!(
            value(conn, b"a-very-long-token-name, close"),
            Ok(HeaderEffect::Connection(connection::CLOSE))
        );
    }

    #[test]
    fn upgrade_records_presence() {
        assert_eq!(
            value(KnownHeader::Upgrade, b"websocket"),
            Ok(HeaderEffect::Upgrade)
        );
    }
}
