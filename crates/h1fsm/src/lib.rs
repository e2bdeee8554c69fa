//! Incremental, zero-copy HTTP/1.x parser.
//!
//! The parser is a byte-at-a-time state machine. It accepts input in
//! arbitrarily small pieces, never buffers message data, and reports what it
//! finds through a [`Handler`] whose data callbacks borrow the caller's
//! buffer. Splitting a stream differently never changes the result.
//!
//! # Features
//!
//! - Requests and responses, HTTP/0.9 through HTTP/1.x
//! - Content-Length, chunked (with trailers) and read-until-EOF bodies
//! - Keep-alive, pipelining, protocol upgrades and `CONNECT`
//! - Pause/resume between messages
//! - Request-target splitting with [`parse_url`]
//!
//! [`Parser::feed`] panics on a range outside the buffer; [`Parser::try_feed`]
//! and [`Parser::execute`] never panic and report consumed bytes.
//!
//! # Example
//!
//! ```
//! use h1fsm::{EventRecorder, Event, Parser, ParserType};
//!
//! let mut parser = Parser::new(ParserType::Request);
//! let mut recorder = EventRecorder::new();
//!
//! for piece in [&b"GET /in"[..], b"dex HTTP/1.1\r\nHo", b"st: example.com\r\n\r\n"] {
//!     assert!(parser.feed(piece, 0, piece.len(), &mut recorder));
//! }
//!
//! assert_eq!(recorder.events()[1], Event::Url(b"/index".to_vec()));
//! assert_eq!(recorder.events().last(), Some(&Event::MessageComplete));
//! ```

#![forbid(unsafe_code)]

mod collect;
mod config;
mod handler;
mod header;
mod parser;
mod state;
mod url;

pub use collect::{Event, EventRecorder, Header, Message, MessageCollector};
pub use config::{DEFAULT_MAX_HEADER_SIZE, ParserConfig};
pub use handler::{BodyFraming, Flow, Handler, HeadersAction, MessageHead};
pub use parser::{FeedError, Parser};
pub use state::State;
pub use url::{Url, UrlState, parse_url, parse_url_char};

pub use h1fsm_types::{
    ErrorCode, HttpVersion, Method, ParseError, ParserType, UnknownMethod, chars,
};
