//! The message state machine.
//!
//! [`Parser`] consumes bytes one at a time, keeping everything it needs to
//! resume in a handful of scalar fields. Data events are emitted as slices of
//! the caller's buffer: a field that starts and ends within one feed arrives
//! in one slice, a field that straddles feeds arrives in one slice per feed.
//!
//! Request line and header block:
//!
//! ```text
//! StartReq -> ReqMethod -> ReqSpacesBeforeUrl -> ReqUrl -> ReqHttpStart
//!   -> HTTP/<major>.<minor> -> ReqLineAlmostDone -> HeaderFieldStart ...
//! StartRes -> HTTP/<major>.<minor> -> ResFirstStatusCode -> ResStatusCode
//!   -> ResStatusStart -> ResStatus -> ResLineAlmostDone -> HeaderFieldStart ...
//! HeaderFieldStart -> HeaderField -> HeaderValueStart -> HeaderValue
//!   -> HeaderAlmostDone -> HeaderValueLws -> (fold | next field | blank line)
//! ```

use std::fmt;

use h1fsm_types::chars::{dec_value, hex_value, is_token_char};
use h1fsm_types::{ErrorCode, HttpVersion, Method, ParseError, ParserType};
use memchr::memchr2;
use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::handler::{BodyFraming, Flow, Handler, HeadersAction, MessageHead};
use crate::header::{HeaderEffect, NameMatcher, ValueScanner, connection};
use crate::state::State;
use crate::url::{UrlState, parse_url_char};

const CR: u8 = b'\r';
const LF: u8 = b'\n';

const MAX_VERSION: u16 = 999;
const MAX_STATUS: u16 = 999;

// Per-message flags.
const F_CHUNKED: u8 = 1;
const F_CONNECTION_KEEP_ALIVE: u8 = 1 << 1;
const F_CONNECTION_CLOSE: u8 = 1 << 2;
const F_CONNECTION_UPGRADE: u8 = 1 << 3;
const F_UPGRADE: u8 = 1 << 4;
const F_TRAILING: u8 = 1 << 5;
const F_SKIP_BODY: u8 = 1 << 6;

/// Bytes allowed inside a header value: HTAB, visible ASCII, SP and obs-text.
#[inline]
const fn is_value_char(c: u8) -> bool {
    c == b'\t' || (c >= 0x20 && c != 0x7f)
}

/// Take the pending data span ending at `end`, if it is non-empty.
#[inline]
fn take_span<'a>(mark: &mut Option<usize>, data: &'a [u8], end: usize) -> Option<&'a [u8]> {
    mark.take()
        .filter(|&start| start < end)
        .map(|start| &data[start..end])
}

/// Bytes of `remaining` available in a buffer with `available` bytes left.
#[inline]
fn body_run(remaining: u64, available: usize) -> usize {
    usize::try_from(remaining).map_or(available, |r| r.min(available))
}

/// Error returned by [`Parser::try_feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedError {
    /// The requested range does not lie within the buffer.
    OutOfBounds {
        /// Requested start.
        offset: usize,
        /// Requested length.
        length: usize,
        /// Length of the buffer.
        len: usize,
    },
    /// The input violates the protocol.
    Parse(ParseError),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                offset,
                length,
                len,
            } => write!(
                f,
                "feed range {offset}+{length} out of bounds for buffer of {len} bytes"
            ),
            Self::Parse(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::OutOfBounds { .. } => None,
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<ParseError> for FeedError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

/// Incremental HTTP/1.x parser for one direction of one connection.
///
/// # Example
///
/// ```
/// use h1fsm::{MessageCollector, Parser, ParserType};
///
/// let mut parser = Parser::new(ParserType::Request);
/// let mut collector = MessageCollector::new();
///
/// let data = b"POST /upload HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
/// assert!(parser.feed(data, 0, 20, &mut collector));
/// assert!(parser.feed(data, 20, data.len() - 20, &mut collector));
///
/// let message = &collector.messages()[0];
/// assert_eq!(message.url, b"/upload");
/// assert_eq!(message.body, b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    kind: ParserType,
    config: ParserConfig,
    state: State,
    url_state: UrlState,
    /// Bytes of the method literal matched so far.
    index: usize,
    method: Option<Method>,
    http_major: u16,
    http_minor: u16,
    status_code: u16,
    content_length: Option<u64>,
    /// Body or chunk bytes still expected.
    remaining: u64,
    name: NameMatcher,
    value: ValueScanner,
    flags: u8,
    upgrade: bool,
    header_bytes: usize,
    last_error: ErrorCode,
}

impl Parser {
    /// Create a parser with the default configuration.
    #[must_use]
    pub fn new(kind: ParserType) -> Self {
        Self::with_config(kind, ParserConfig::default())
    }

    /// Create a parser with a custom configuration.
    #[must_use]
    pub fn with_config(kind: ParserType, config: ParserConfig) -> Self {
        Self {
            kind,
            config,
            state: Self::start_state_for(kind),
            url_state: UrlState::SpacesBeforeUrl,
            index: 0,
            method: None,
            http_major: 0,
            http_minor: 0,
            status_code: 0,
            content_length: None,
            remaining: 0,
            name: NameMatcher::default(),
            value: ValueScanner::Ignore,
            flags: 0,
            upgrade: false,
            header_bytes: 0,
            last_error: ErrorCode::Ok,
        }
    }

    /// Reinitialise for a new connection, keeping the configuration.
    pub fn reset(&mut self, kind: ParserType) {
        *self = Self::with_config(kind, self.config);
    }

    const fn start_state_for(kind: ParserType) -> State {
        match kind {
            ParserType::Request => State::StartReq,
            ParserType::Response => State::StartRes,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Request or response mode.
    #[must_use]
    pub fn kind(&self) -> ParserType {
        self.kind
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Current machine state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns true once a protocol error has been found.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == State::Dead
    }

    /// Returns true while paused by [`Flow::Pause`].
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.last_error == ErrorCode::Paused
    }

    /// Returns true when the current message switches protocols.
    #[must_use]
    pub fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    /// Why the parser died or paused; [`ErrorCode::Ok`] otherwise.
    #[must_use]
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Method of the current request.
    #[must_use]
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    /// Status code of the current response.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        (self.kind == ParserType::Response && self.status_code != 0).then_some(self.status_code)
    }

    /// Version of the current message.
    #[must_use]
    pub fn http_version(&self) -> HttpVersion {
        HttpVersion::new(self.http_major, self.http_minor)
    }

    /// Value of the `Content-Length` header of the current message.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Whether the connection may carry another message after this one.
    #[must_use]
    pub fn should_keep_alive(&self) -> bool {
        let persistent = if self.http_version().is_persistent_by_default() {
            self.flags & F_CONNECTION_CLOSE == 0
        } else {
            self.flags & F_CONNECTION_KEEP_ALIVE != 0
        };
        persistent && !self.needs_eof()
    }

    fn needs_eof(&self) -> bool {
        self.flags & F_SKIP_BODY == 0 && self.framing() == BodyFraming::UntilEof
    }

    fn framing(&self) -> BodyFraming {
        let bodiless_status = matches!(self.status_code, 100..=199 | 204 | 304);
        if self.kind == ParserType::Response && bodiless_status {
            BodyFraming::Empty
        } else if self.flags & F_CHUNKED != 0 {
            BodyFraming::Chunked
        } else if let Some(length) = self.content_length {
            BodyFraming::ContentLength(length)
        } else if self.kind == ParserType::Response {
            BodyFraming::UntilEof
        } else {
            BodyFraming::Empty
        }
    }

    fn is_upgrade_head(&self) -> bool {
        let negotiated = self.flags & F_UPGRADE != 0 && self.flags & F_CONNECTION_UPGRADE != 0;
        match self.kind {
            ParserType::Request => negotiated || self.method == Some(Method::Connect),
            ParserType::Response => negotiated && self.status_code == 101,
        }
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Continue after [`Flow::Pause`]. Has no effect otherwise.
    pub fn resume(&mut self) {
        if self.is_paused() {
            self.last_error = ErrorCode::Ok;
        }
    }

    /// Consume `data[offset..offset + length]`.
    ///
    /// Returns `false` once the parser is dead, on this call or any earlier
    /// one. Splitting a stream into any sequence of feeds produces the same
    /// events as a single feed. A zero-length range is a no-op.
    ///
    /// After a pause or upgrade, bytes past the completed message are not
    /// consumed and the return value does not say so. Callers that pause
    /// should use [`Parser::try_feed`] or [`Parser::execute`], which return
    /// the consumed count.
    ///
    /// # Panics
    ///
    /// Panics if the range does not lie within `data`. [`Parser::try_feed`]
    /// reports the same condition as an error instead.
    pub fn feed<H: Handler + ?Sized>(
        &mut self,
        data: &[u8],
        offset: usize,
        length: usize,
        handler: &mut H,
    ) -> bool {
        match self.try_feed(data, offset, length, handler) {
            Ok(_) => true,
            Err(FeedError::Parse(_)) => false,
            Err(err @ FeedError::OutOfBounds { .. }) => panic!("{err}"),
        }
    }

    /// Checked form of [`Parser::feed`], returning the bytes consumed.
    ///
    /// # Errors
    ///
    /// [`FeedError::OutOfBounds`] when the range does not lie within `data`;
    /// the parser is left untouched. [`FeedError::Parse`] for protocol errors,
    /// with the position relative to `offset`.
    pub fn try_feed<H: Handler + ?Sized>(
        &mut self,
        data: &[u8],
        offset: usize,
        length: usize,
        handler: &mut H,
    ) -> Result<usize, FeedError> {
        let range = offset
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .map(|end| offset..end);
        let Some(range) = range else {
            return Err(FeedError::OutOfBounds {
                offset,
                length,
                len: data.len(),
            });
        };
        Ok(self.execute(&data[range], handler)?)
    }

    /// Consume `data`, returning the number of bytes used.
    ///
    /// The count is below `data.len()` only when a message completed with
    /// [`Flow::Pause`] or a protocol upgrade; the rest belongs to the caller.
    /// While paused or upgraded nothing is consumed.
    ///
    /// # Errors
    ///
    /// Returns the error and the offset of the offending byte within `data`.
    /// A dead parser reports its recorded error at offset 0.
    pub fn execute<H: Handler + ?Sized>(
        &mut self,
        data: &[u8],
        handler: &mut H,
    ) -> Result<usize, ParseError> {
        match self.state {
            State::Dead => return Err(ParseError::new(self.last_error, 0)),
            State::Upgraded => return Ok(0),
            _ if self.is_paused() => return Ok(0),
            _ => {}
        }
        self.run(data, handler)
    }

    /// Signal the end of the stream.
    ///
    /// Completes a body framed by EOF. Anywhere other than between messages
    /// this is [`ErrorCode::InvalidEofState`].
    ///
    /// # Errors
    ///
    /// Returns the recorded error of a dead parser, or `InvalidEofState`.
    pub fn finish<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        match self.state {
            State::Dead => Err(ParseError::new(self.last_error, 0)),
            State::BodyIdentityEof => {
                self.message_complete(handler);
                Ok(())
            }
            State::Upgraded => Ok(()),
            state if state.is_message_boundary() => Ok(()),
            _ => Err(self.fail(ErrorCode::InvalidEofState, 0)),
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn fail(&mut self, code: ErrorCode, position: usize) -> ParseError {
        debug!(
            kind = %self.kind,
            state = ?self.state,
            code = code.name(),
            position,
            "parser died"
        );
        self.state = State::Dead;
        self.last_error = code;
        ParseError::new(code, position)
    }

    fn begin_message<H: Handler + ?Sized>(&mut self, handler: &mut H) {
        self.url_state = UrlState::SpacesBeforeUrl;
        self.index = 0;
        self.method = None;
        self.http_major = 0;
        self.http_minor = 0;
        self.status_code = 0;
        self.content_length = None;
        self.remaining = 0;
        self.value = ValueScanner::Ignore;
        self.flags = 0;
        self.upgrade = false;
        self.header_bytes = 0;
        handler.on_message_begin();
    }

    fn apply(&mut self, effect: HeaderEffect) -> Result<(), ErrorCode> {
        match effect {
            HeaderEffect::None => {}
            HeaderEffect::ContentLength(length) => match self.content_length {
                Some(previous) if previous != length => {
                    return Err(ErrorCode::InvalidContentLength);
                }
                _ => self.content_length = Some(length),
            },
            HeaderEffect::TransferEncoding { chunked } => {
                if chunked {
                    self.flags |= F_CHUNKED;
                } else {
                    self.flags &= !F_CHUNKED;
                }
            }
            HeaderEffect::Connection(tokens) => {
                if tokens & connection::KEEP_ALIVE != 0 {
                    self.flags |= F_CONNECTION_KEEP_ALIVE;
                }
                if tokens & connection::CLOSE != 0 {
                    self.flags |= F_CONNECTION_CLOSE;
                }
                if tokens & connection::UPGRADE != 0 {
                    self.flags |= F_CONNECTION_UPGRADE;
                }
            }
            HeaderEffect::Upgrade => self.flags |= F_UPGRADE,
        }
        Ok(())
    }

    /// The blank line ending a header block (or trailer block) was read.
    ///
    /// Returns true when the feed must stop after the current byte.
    fn headers_done<H: Handler + ?Sized>(&mut self, handler: &mut H) -> bool {
        self.header_bytes = 0;
        if self.flags & F_TRAILING != 0 {
            handler.on_chunk_complete();
            return self.message_complete(handler);
        }

        let framing = self.framing();
        self.upgrade = self.is_upgrade_head();
        let head = MessageHead {
            kind: self.kind,
            method: self.method,
            status_code: self.status_code(),
            version: self.http_version(),
            framing,
            keep_alive: self.should_keep_alive(),
            upgrade: self.upgrade,
        };
        trace!(
            kind = %self.kind,
            ?framing,
            keep_alive = head.keep_alive,
            upgrade = head.upgrade,
            "headers complete"
        );
        if handler.on_headers_complete(&head) == HeadersAction::SkipBody {
            self.flags |= F_SKIP_BODY;
        }

        if self.upgrade || self.flags & F_SKIP_BODY != 0 {
            return self.message_complete(handler);
        }
        match framing {
            BodyFraming::Empty | BodyFraming::ContentLength(0) => self.message_complete(handler),
            BodyFraming::ContentLength(length) => {
                self.remaining = length;
                self.state = State::BodyIdentity;
                false
            }
            BodyFraming::Chunked => {
                self.state = State::ChunkSizeStart;
                false
            }
            BodyFraming::UntilEof => {
                self.state = State::BodyIdentityEof;
                false
            }
        }
    }

    /// Returns true when the feed must stop after the current byte.
    fn message_complete<H: Handler + ?Sized>(&mut self, handler: &mut H) -> bool {
        let keep_alive = self.should_keep_alive();
        trace!(kind = %self.kind, keep_alive, "message complete");
        let flow = handler.on_message_complete();

        if self.upgrade {
            debug!(kind = %self.kind, method = ?self.method, "connection upgraded");
            self.state = State::Upgraded;
            return true;
        }
        self.state = if keep_alive {
            Self::start_state_for(self.kind)
        } else {
            State::Closed
        };
        if flow == Flow::Pause {
            debug!(kind = %self.kind, "parser paused");
            self.last_error = ErrorCode::Paused;
            return true;
        }
        false
    }

    fn chunk_size_done<H: Handler + ?Sized>(&mut self, handler: &mut H) {
        handler.on_chunk_header(self.remaining);
        if self.remaining == 0 {
            self.flags |= F_TRAILING;
            self.header_bytes = 0;
            self.state = State::HeaderFieldStart;
        } else {
            self.state = State::ChunkData;
        }
    }

    // ========================================================================
    // Byte Loop
    // ========================================================================

    #[allow(clippy::too_many_lines)]
    fn run<H: Handler + ?Sized>(
        &mut self,
        data: &[u8],
        handler: &mut H,
    ) -> Result<usize, ParseError> {
        let len = data.len();
        let strict = self.config.strict();
        let max_header_size = self.config.max_header_size();
        let mut mark = self.state.is_span().then_some(0);
        let mut i = 0;
        // Set when a byte is handed to another state without being consumed.
        let mut redo = false;

        // Failing flushes the pending data span up to the rejected byte.
        macro_rules! fail {
            ($code:expr) => {
                fail!($code, i)
            };
            ($code:expr, $position:expr) => {{
                let position = $position;
                if let Some(start) = mark.filter(|&start| start < position) {
                    self.emit_pending(handler, &data[start..position]);
                }
                return Err(self.fail($code, position));
            }};
        }
        macro_rules! bare_lf {
            () => {
                if strict {
                    fail!(ErrorCode::Strict);
                }
            };
        }

        while i < len {
            let c = data[i];
            if self.state.is_head() && !redo {
                self.header_bytes += 1;
                if self.header_bytes > max_header_size {
                    fail!(ErrorCode::HeaderOverflow);
                }
            }
            redo = false;

            match self.state {
                State::Dead | State::Upgraded => fail!(ErrorCode::InvalidInternalState),

                State::Closed => {
                    if c != CR && c != LF {
                        fail!(ErrorCode::ClosedConnection);
                    }
                }

                // ------------------------------------------------------------
                // Request line
                // ------------------------------------------------------------
                State::StartReq => {
                    if c != CR && c != LF {
                        self.begin_message(handler);
                        let Some(method) = Method::from_first_byte(c) else {
                            fail!(ErrorCode::InvalidMethod);
                        };
                        self.method = Some(method);
                        self.index = 1;
                        self.state = State::ReqMethod;
                    }
                }

                State::ReqMethod => {
                    let Some(method) = self.method else {
                        fail!(ErrorCode::InvalidInternalState);
                    };
                    let literal = method.as_bytes();
                    if c == b' ' && self.index == literal.len() {
                        self.state = State::ReqSpacesBeforeUrl;
                    } else if literal.get(self.index) == Some(&c) {
                        self.index += 1;
                    } else if let Some(repinned) = method.repin(self.index, c) {
                        self.method = Some(repinned);
                        self.index += 1;
                    } else {
                        fail!(ErrorCode::InvalidMethod);
                    }
                }

                State::ReqSpacesBeforeUrl => {
                    if c != b' ' {
                        let is_connect = self.method == Some(Method::Connect);
                        let next = parse_url_char(UrlState::SpacesBeforeUrl, c, is_connect);
                        if next == UrlState::Dead {
                            fail!(UrlState::SpacesBeforeUrl.error_code());
                        }
                        self.url_state = next;
                        mark = Some(i);
                        self.state = State::ReqUrl;
                    }
                }

                State::ReqUrl => match c {
                    b' ' | CR | LF => {
                        if !self.url_state.is_complete() {
                            fail!(self.url_state.error_code());
                        }
                        if let Some(url) = take_span(&mut mark, data, i) {
                            handler.on_url(url);
                        }
                        if c == b' ' {
                            self.state = State::ReqHttpStart;
                        } else {
                            // A request line without a version is HTTP/0.9.
                            self.http_major = 0;
                            self.http_minor = 9;
                            if c == CR {
                                self.state = State::ReqLineAlmostDone;
                            } else {
                                bare_lf!();
                                self.state = State::HeaderFieldStart;
                            }
                        }
                    }
                    _ => {
                        let is_connect = self.method == Some(Method::Connect);
                        let next = parse_url_char(self.url_state, c, is_connect);
                        if next == UrlState::Dead {
                            fail!(self.url_state.error_code());
                        }
                        self.url_state = next;
                    }
                },

                State::ReqHttpStart => match c {
                    b' ' => {}
                    b'H' => self.state = State::HttpH,
                    _ => fail!(ErrorCode::InvalidConstant),
                },

                State::ReqLineAlmostDone | State::ResLineAlmostDone => {
                    if c != LF {
                        fail!(ErrorCode::LfExpected);
                    }
                    self.state = State::HeaderFieldStart;
                }

                // ------------------------------------------------------------
                // Status line
                // ------------------------------------------------------------
                State::StartRes => match c {
                    CR | LF => {}
                    b'H' => {
                        self.begin_message(handler);
                        self.state = State::HttpH;
                    }
                    _ => fail!(ErrorCode::InvalidConstant),
                },

                State::ResFirstStatusCode => {
                    if c != b' ' {
                        let Some(digit) = dec_value(c) else {
                            fail!(ErrorCode::InvalidStatus);
                        };
                        self.status_code = u16::from(digit);
                        self.state = State::ResStatusCode;
                    }
                }

                State::ResStatusCode => match c {
                    b' ' => self.state = State::ResStatusStart,
                    CR => self.state = State::ResLineAlmostDone,
                    LF => {
                        bare_lf!();
                        self.state = State::HeaderFieldStart;
                    }
                    _ => {
                        let Some(digit) = dec_value(c) else {
                            fail!(ErrorCode::InvalidStatus);
                        };
                        self.status_code = self.status_code * 10 + u16::from(digit);
                        if self.status_code > MAX_STATUS {
                            fail!(ErrorCode::InvalidStatus);
                        }
                    }
                },

                State::ResStatusStart => match c {
                    CR => self.state = State::ResLineAlmostDone,
                    LF => {
                        bare_lf!();
                        self.state = State::HeaderFieldStart;
                    }
                    _ => {
                        mark = Some(i);
                        self.state = State::ResStatus;
                    }
                },

                State::ResStatus => {
                    if c == CR || c == LF {
                        if c == LF {
                            bare_lf!();
                        }
                        if let Some(reason) = take_span(&mut mark, data, i) {
                            handler.on_status(reason);
                        }
                        self.state = if c == CR {
                            State::ResLineAlmostDone
                        } else {
                            State::HeaderFieldStart
                        };
                    }
                }

                // ------------------------------------------------------------
                // Version, shared by both start lines
                // ------------------------------------------------------------
                State::HttpH => {
                    if c != b'T' {
                        fail!(ErrorCode::InvalidConstant);
                    }
                    self.state = State::HttpHT;
                }

                State::HttpHT => {
                    if c != b'T' {
                        fail!(ErrorCode::InvalidConstant);
                    }
                    self.state = State::HttpHTT;
                }

                State::HttpHTT => {
                    if c != b'P' {
                        fail!(ErrorCode::InvalidConstant);
                    }
                    self.state = State::HttpHTTP;
                }

                State::HttpHTTP => {
                    if c != b'/' {
                        fail!(ErrorCode::InvalidConstant);
                    }
                    self.state = State::HttpFirstMajor;
                }

                State::HttpFirstMajor => {
                    let Some(digit) = dec_value(c) else {
                        fail!(ErrorCode::InvalidVersion);
                    };
                    self.http_major = u16::from(digit);
                    self.state = State::HttpMajor;
                }

                State::HttpMajor => {
                    if c == b'.' {
                        self.state = State::HttpFirstMinor;
                    } else {
                        let Some(digit) = dec_value(c) else {
                            fail!(ErrorCode::InvalidVersion);
                        };
                        self.http_major = self.http_major * 10 + u16::from(digit);
                        if self.http_major > MAX_VERSION {
                            fail!(ErrorCode::InvalidVersion);
                        }
                    }
                }

                State::HttpFirstMinor => {
                    let Some(digit) = dec_value(c) else {
                        fail!(ErrorCode::InvalidVersion);
                    };
                    self.http_minor = u16::from(digit);
                    self.state = State::HttpMinor;
                }

                State::HttpMinor => {
                    if let Some(digit) = dec_value(c) {
                        self.http_minor = self.http_minor * 10 + u16::from(digit);
                        if self.http_minor > MAX_VERSION {
                            fail!(ErrorCode::InvalidVersion);
                        }
                    } else {
                        match (self.kind, c) {
                            (ParserType::Request, CR) => self.state = State::ReqLineAlmostDone,
                            (ParserType::Request, LF) => {
                                bare_lf!();
                                self.state = State::HeaderFieldStart;
                            }
                            (ParserType::Response, b' ') => {
                                self.state = State::ResFirstStatusCode;
                            }
                            _ => fail!(ErrorCode::InvalidVersion),
                        }
                    }
                }

                // ------------------------------------------------------------
                // Headers and trailers
                // ------------------------------------------------------------
                State::HeaderFieldStart => match c {
                    CR => self.state = State::HeadersAlmostDone,
                    LF => {
                        bare_lf!();
                        if self.headers_done(handler) {
                            return Ok(i + 1);
                        }
                    }
                    _ if is_token_char(c) => {
                        mark = Some(i);
                        self.name = NameMatcher::start(c);
                        self.state = State::HeaderField;
                    }
                    _ => fail!(ErrorCode::InvalidHeaderToken),
                },

                State::HeaderField => {
                    if c == b':' {
                        if let Some(name) = take_span(&mut mark, data, i) {
                            handler.on_header_field(name);
                        }
                        self.value = if self.flags & F_TRAILING == 0 {
                            ValueScanner::for_header(self.name.finish())
                        } else {
                            ValueScanner::Ignore
                        };
                        self.state = State::HeaderValueStart;
                    } else if is_token_char(c) {
                        self.name.push(c);
                    } else {
                        fail!(ErrorCode::InvalidHeaderToken);
                    }
                }

                State::HeaderValueStart => match c {
                    b' ' | b'\t' => {}
                    CR => {
                        handler.on_header_value(b"");
                        self.state = State::HeaderAlmostDone;
                    }
                    LF => {
                        bare_lf!();
                        handler.on_header_value(b"");
                        self.state = State::HeaderValueLws;
                    }
                    _ => {
                        mark = Some(i);
                        self.state = State::HeaderValue;
                        redo = true;
                        continue;
                    }
                },

                State::HeaderValue => match c {
                    CR | LF => {
                        if c == LF {
                            bare_lf!();
                        }
                        if let Some(value) = take_span(&mut mark, data, i) {
                            handler.on_header_value(value);
                        }
                        self.state = if c == CR {
                            State::HeaderAlmostDone
                        } else {
                            State::HeaderValueLws
                        };
                    }
                    _ if !is_value_char(c) => fail!(ErrorCode::InvalidHeaderToken),
                    _ => {
                        if let Err(code) = self.value.push(c) {
                            fail!(code);
                        }
                        if self.value.is_passive() {
                            // Skip ahead to the end of the line.
                            let rest = &data[i + 1..];
                            let run = memchr2(CR, LF, rest).unwrap_or(rest.len());
                            if let Some(bad) = rest[..run].iter().position(|&b| !is_value_char(b))
                            {
                                fail!(ErrorCode::InvalidHeaderToken, i + 1 + bad);
                            }
                            let room = max_header_size - self.header_bytes;
                            if run > room {
                                fail!(ErrorCode::HeaderOverflow, i + 1 + room);
                            }
                            self.header_bytes += run;
                            i += run;
                        }
                    }
                },

                State::HeaderAlmostDone => {
                    if c != LF {
                        fail!(ErrorCode::LfExpected);
                    }
                    self.state = State::HeaderValueLws;
                }

                State::HeaderValueLws => {
                    if c == b' ' || c == b'\t' {
                        handler.on_header_value(b" ");
                        if let Err(code) = self.value.push(b' ') {
                            fail!(code);
                        }
                        self.state = State::HeaderValueFold;
                    } else {
                        let scanner = std::mem::replace(&mut self.value, ValueScanner::Ignore);
                        if let Err(code) = scanner.finish().and_then(|effect| self.apply(effect)) {
                            fail!(code);
                        }
                        self.state = State::HeaderFieldStart;
                        redo = true;
                        continue;
                    }
                }

                State::HeaderValueFold => match c {
                    b' ' | b'\t' => {}
                    CR => self.state = State::HeaderAlmostDone,
                    LF => {
                        bare_lf!();
                        self.state = State::HeaderValueLws;
                    }
                    _ => {
                        mark = Some(i);
                        self.state = State::HeaderValue;
                        redo = true;
                        continue;
                    }
                },

                State::HeadersAlmostDone => {
                    if c != LF {
                        fail!(ErrorCode::LfExpected);
                    }
                    if self.headers_done(handler) {
                        return Ok(i + 1);
                    }
                }

                // ------------------------------------------------------------
                // Bodies
                // ------------------------------------------------------------
                State::BodyIdentity => {
                    let n = body_run(self.remaining, len - i);
                    handler.on_body(&data[i..i + n]);
                    self.remaining -= n as u64;
                    i += n;
                    if self.remaining == 0 && self.message_complete(handler) {
                        return Ok(i);
                    }
                    continue;
                }

                State::BodyIdentityEof => {
                    handler.on_body(&data[i..]);
                    i = len;
                    continue;
                }

                State::ChunkSizeStart => {
                    let Some(digit) = hex_value(c) else {
                        fail!(ErrorCode::InvalidChunkSize);
                    };
                    self.remaining = u64::from(digit);
                    self.state = State::ChunkSize;
                }

                State::ChunkSize => match c {
                    CR => self.state = State::ChunkSizeAlmostDone,
                    LF => {
                        bare_lf!();
                        self.chunk_size_done(handler);
                    }
                    b';' | b' ' | b'\t' => self.state = State::ChunkParameters,
                    _ => {
                        let size = hex_value(c).and_then(|digit| {
                            self.remaining
                                .checked_mul(16)?
                                .checked_add(u64::from(digit))
                        });
                        let Some(size) = size else {
                            fail!(ErrorCode::InvalidChunkSize);
                        };
                        self.remaining = size;
                    }
                },

                State::ChunkParameters => match c {
                    CR => self.state = State::ChunkSizeAlmostDone,
                    LF => {
                        bare_lf!();
                        self.chunk_size_done(handler);
                    }
                    _ => {}
                },

                State::ChunkSizeAlmostDone => {
                    if c != LF {
                        fail!(ErrorCode::LfExpected);
                    }
                    self.chunk_size_done(handler);
                }

                State::ChunkData => {
                    let n = body_run(self.remaining, len - i);
                    handler.on_body(&data[i..i + n]);
                    self.remaining -= n as u64;
                    i += n;
                    if self.remaining == 0 {
                        self.state = State::ChunkDataAlmostDone;
                    }
                    continue;
                }

                State::ChunkDataAlmostDone => match c {
                    CR => self.state = State::ChunkDataDone,
                    LF => {
                        bare_lf!();
                        handler.on_chunk_complete();
                        self.state = State::ChunkSizeStart;
                    }
                    _ => fail!(ErrorCode::LfExpected),
                },

                State::ChunkDataDone => {
                    if c != LF {
                        fail!(ErrorCode::LfExpected);
                    }
                    handler.on_chunk_complete();
                    self.state = State::ChunkSizeStart;
                }
            }
            i += 1;
        }

        if let Some(start) = mark.filter(|&start| start < len) {
            self.emit_pending(handler, &data[start..]);
        }
        Ok(len)
    }

    /// Deliver the unfinished data span of the current state.
    fn emit_pending<H: Handler + ?Sized>(&self, handler: &mut H, pending: &[u8]) {
        match self.state {
            State::ReqUrl => handler.on_url(pending),
            State::ResStatus => handler.on_status(pending),
            State::HeaderField => handler.on_header_field(pending),
            State::HeaderValue => handler.on_header_value(pending),
            _ => {}
        }
    }
}
