//! The callback surface.
//!
//! A [`Handler`] receives events synchronously from inside
//! [`Parser::feed`](crate::Parser::feed). Data events borrow the caller's
//! input for the duration of the call only; copy what must outlive it.
//! A single logical field may arrive as several slices when it straddles
//! feed boundaries.

use h1fsm_types::{HttpVersion, Method, ParserType};
use serde::Serialize;

/// How the body of a message is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFraming {
    /// No body.
    Empty,
    /// Exactly this many bytes.
    ContentLength(u64),
    /// `Transfer-Encoding: chunked`.
    Chunked,
    /// Everything until the connection closes (responses only).
    UntilEof,
}

/// Everything known about a message once its header block ends.
///
/// The request target is not repeated here; it arrives through
/// [`Handler::on_url`] as slices of the caller's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageHead {
    /// Request or response.
    pub kind: ParserType,
    /// Request method; `None` for responses.
    pub method: Option<Method>,
    /// Response status; `None` for requests.
    pub status_code: Option<u16>,
    /// Protocol version from the start line.
    pub version: HttpVersion,
    /// Body framing chosen from the headers.
    pub framing: BodyFraming,
    /// Whether the connection persists after this message.
    pub keep_alive: bool,
    /// Whether the connection switches protocols after this head.
    pub upgrade: bool,
}

/// Returned from [`Handler::on_headers_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadersAction {
    /// Read the body as framed.
    #[default]
    Continue,
    /// The message has no body regardless of its headers (a response to HEAD).
    SkipBody,
}

/// Returned from [`Handler::on_message_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Keep parsing.
    #[default]
    Continue,
    /// Stop right after this message until [`Parser::resume`](crate::Parser::resume).
    ///
    /// Bytes after the paused message are left unconsumed. Only
    /// [`Parser::execute`](crate::Parser::execute) and
    /// [`Parser::try_feed`](crate::Parser::try_feed) report how many bytes were
    /// used; pausing callers must use one of them, since
    /// [`Parser::feed`](crate::Parser::feed) only reports liveness.
    Pause,
}

/// Receiver of parser events.
///
/// Every method has a no-op default, so implementors override only what they
/// need and `()` serves as a handler that validates without observing.
#[allow(unused_variables)]
pub trait Handler {
    /// The first byte of a new message arrived.
    fn on_message_begin(&mut self) {}

    /// A slice of the request target.
    fn on_url(&mut self, url: &[u8]) {}

    /// A slice of the response reason phrase.
    fn on_status(&mut self, reason: &[u8]) {}

    /// A slice of a header name.
    fn on_header_field(&mut self, name: &[u8]) {}

    /// A slice of a header value.
    ///
    /// Empty values are reported once with an empty slice. A folded
    /// continuation line arrives as `b" "` followed by its text.
    fn on_header_value(&mut self, value: &[u8]) {}

    /// The header block ended.
    fn on_headers_complete(&mut self, head: &MessageHead) -> HeadersAction {
        HeadersAction::Continue
    }

    /// A chunk size line was read.
    fn on_chunk_header(&mut self, size: u64) {}

    /// A chunk, including the terminating zero-size chunk, ended.
    fn on_chunk_complete(&mut self) {}

    /// A slice of the (de-chunked) body.
    fn on_body(&mut self, body: &[u8]) {}

    /// The message ended.
    fn on_message_complete(&mut self) -> Flow {
        Flow::Continue
    }
}

impl Handler for () {}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn on_message_begin(&mut self) {
        (**self).on_message_begin();
    }

    fn on_url(&mut self, url: &[u8]) {
        (**self).on_url(url);
    }

    fn on_status(&mut self, reason: &[u8]) {
        (**self).on_status(reason);
    }

    fn on_header_field(&mut self, name: &[u8]) {
        (**self).on_header_field(name);
    }

    fn on_header_value(&mut self, value: &[u8]) {
        (**self).on_header_value(value);
    }

    fn on_headers_complete(&mut self, head: &MessageHead) -> HeadersAction {
        (**self).on_headers_complete(head)
    }

    fn on_chunk_header(&mut self, size: u64) {
        (**self).on_chunk_header(size);
    }

    fn on_chunk_complete(&mut self) {
        (**self).on_chunk_complete();
    }

    fn on_body(&mut self, body: &[u8]) {
        (**self).on_body(body);
    }

    fn on_message_complete(&mut self) -> Flow {
        (**self).on_message_complete()
    }
}
