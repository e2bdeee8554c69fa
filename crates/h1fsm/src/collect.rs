//! Owned views of parser output.
//!
//! [`MessageCollector`] assembles whole messages; [`EventRecorder`] keeps the
//! raw event sequence. Both copy data out of the borrowed slices, so they
//! are meant for tests, tooling and servers that want owned requests.

use h1fsm_types::{HttpVersion, Method};
use serde::{Serialize, Serializer};

use crate::handler::{BodyFraming, Flow, Handler, HeadersAction, MessageHead};

fn lossy<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// A header name and value pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Name as sent.
    #[serde(serialize_with = "lossy")]
    pub name: Vec<u8>,
    /// Value with folded lines joined by a space.
    #[serde(serialize_with = "lossy")]
    pub value: Vec<u8>,
}

/// One complete message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Request method.
    pub method: Option<Method>,
    /// Request target.
    #[serde(serialize_with = "lossy")]
    pub url: Vec<u8>,
    /// Response status code.
    pub status_code: Option<u16>,
    /// Response reason phrase.
    #[serde(serialize_with = "lossy")]
    pub reason: Vec<u8>,
    /// Protocol version.
    pub version: Option<HttpVersion>,
    /// Header block, in order.
    pub headers: Vec<Header>,
    /// Trailer block of a chunked body, in order.
    pub trailers: Vec<Header>,
    /// Size of each chunk of a chunked body, including the final zero.
    pub chunks: Vec<u64>,
    /// De-chunked body.
    #[serde(serialize_with = "lossy")]
    pub body: Vec<u8>,
    /// Framing announced by the headers.
    pub framing: Option<BodyFraming>,
    /// Whether the connection persists after this message.
    pub keep_alive: bool,
    /// Whether the connection switches protocols after this message.
    pub upgrade: bool,
}

impl Message {
    /// First header with this name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name.as_bytes()))
            .map(|h| h.value.as_slice())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Other,
    Field,
    Value,
}

/// Handler that assembles complete [`Message`]s.
///
/// Split data events are joined: a new header starts only when the previous
/// event was a value.
#[derive(Debug, Default)]
pub struct MessageCollector {
    messages: Vec<Message>,
    current: Message,
    in_trailers: bool,
    last: Option<Last>,
    skip_body: bool,
}

impl MessageCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `on_headers_complete` with [`HeadersAction::SkipBody`].
    #[must_use]
    pub fn with_skip_body(mut self, skip: bool) -> Self {
        self.skip_body = skip;
        self
    }

    /// Messages completed so far.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Take the completed messages, leaving the collector empty.
    pub fn take_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    /// The message being assembled.
    #[must_use]
    pub fn current(&self) -> &Message {
        &self.current
    }

    fn block(&mut self) -> &mut Vec<Header> {
        if self.in_trailers {
            &mut self.current.trailers
        } else {
            &mut self.current.headers
        }
    }
}

impl Handler for MessageCollector {
    fn on_message_begin(&mut self) {
        self.current = Message::default();
        self.in_trailers = false;
        self.last = None;
    }

    fn on_url(&mut self, url: &[u8]) {
        self.current.url.extend_from_slice(url);
        self.last = Some(Last::Other);
    }

    fn on_status(&mut self, reason: &[u8]) {
        self.current.reason.extend_from_slice(reason);
        self.last = Some(Last::Other);
    }

    fn on_header_field(&mut self, name: &[u8]) {
        let continuing = self.last == Some(Last::Field);
        let block = self.block();
        match block.last_mut() {
            Some(header) if continuing => header.name.extend_from_slice(name),
            _ => block.push(Header {
                name: name.to_vec(),
                value: Vec::new(),
            }),
        }
        self.last = Some(Last::Field);
    }

    fn on_header_value(&mut self, value: &[u8]) {
        if let Some(header) = self.block().last_mut() {
            header.value.extend_from_slice(value);
        }
        self.last = Some(Last::Value);
    }

    fn on_headers_complete(&mut self, head: &MessageHead) -> HeadersAction {
        self.current.method = head.method;
        self.current.status_code = head.status_code;
        self.current.version = Some(head.version);
        self.current.framing = Some(head.framing);
        self.current.keep_alive = head.keep_alive;
        self.current.upgrade = head.upgrade;
        self.in_trailers = true;
        self.last = Some(Last::Other);
        if self.skip_body {
            HeadersAction::SkipBody
        } else {
            HeadersAction::Continue
        }
    }

    fn on_chunk_header(&mut self, size: u64) {
        self.current.chunks.push(size);
    }

    fn on_body(&mut self, body: &[u8]) {
        self.current.body.extend_from_slice(body);
    }

    fn on_message_complete(&mut self) -> Flow {
        self.messages.push(std::mem::take(&mut self.current));
        Flow::Continue
    }
}

// ============================================================================
// Event Recording
// ============================================================================

/// One parser event, with owned data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// `on_message_begin`.
    MessageBegin,
    /// `on_url`.
    Url(Vec<u8>),
    /// `on_status`.
    Status(Vec<u8>),
    /// `on_header_field`.
    HeaderField(Vec<u8>),
    /// `on_header_value`.
    HeaderValue(Vec<u8>),
    /// `on_headers_complete`.
    HeadersComplete(MessageHead),
    /// `on_chunk_header`.
    ChunkHeader(u64),
    /// `on_chunk_complete`.
    ChunkComplete,
    /// `on_body`.
    Body(Vec<u8>),
    /// `on_message_complete`.
    MessageComplete,
}

/// Handler that records every event.
///
/// Adjacent data events of the same kind are merged, so a recording does not
/// depend on how the input was split into feeds.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<Event>,
    pause_on_complete: bool,
}

impl EventRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `on_message_complete` with [`Flow::Pause`].
    #[must_use]
    pub fn with_pause_on_complete(mut self, pause: bool) -> Self {
        self.pause_on_complete = pause;
        self
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take the recorded events, leaving the recorder empty.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn data(&mut self, make: fn(Vec<u8>) -> Event, bytes: &[u8]) {
        let merged = match (self.events.last_mut(), make(Vec::new())) {
            (Some(Event::Url(buf)), Event::Url(_))
            | (Some(Event::Status(buf)), Event::Status(_))
            | (Some(Event::HeaderField(buf)), Event::HeaderField(_))
            | (Some(Event::HeaderValue(buf)), Event::HeaderValue(_))
            | (Some(Event::Body(buf)), Event::Body(_)) => {
                buf.extend_from_slice(bytes);
                true
            }
            _ => false,
        };
        if !merged {
            self.events.push(make(bytes.to_vec()));
        }
    }
}

impl Handler for EventRecorder {
    fn on_message_begin(&mut self) {
        self.events.push(Event::MessageBegin);
    }

    fn on_url(&mut self, url: &[u8]) {
        self.data(Event::Url, url);
    }

    fn on_status(&mut self, reason: &[u8]) {
        self.data(Event::Status, reason);
    }

    fn on_header_field(&mut self, name: &[u8]) {
        self.data(Event::HeaderField, name);
    }

    fn on_header_value(&mut self, value: &[u8]) {
        self.data(Event::HeaderValue, value);
    }

    fn on_headers_complete(&mut self, head: &MessageHead) -> HeadersAction {
        self.events.push(Event::HeadersComplete(*head));
        HeadersAction::Continue
    }

    fn on_chunk_header(&mut self, size: u64) {
        self.events.push(Event::ChunkHeader(size));
    }

    fn on_chunk_complete(&mut self) {
        self.events.push(Event::ChunkComplete);
    }

    fn on_body(&mut self, body: &[u8]) {
        self.data(Event::Body, body);
    }

    fn on_message_complete(&mut self) -> Flow {
        self.events.push(Event::MessageComplete);
        if self.pause_on_complete {
            Flow::Pause
        } else {
            Flow::Continue
        }
    }
}
