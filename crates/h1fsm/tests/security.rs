//! Adversarial input tests.
//!
//! Malformed, oversized and smuggling-shaped input must end in a clean,
//! terminal error and never in a panic or a callback after death.

use h1fsm::{
    ErrorCode, Event, EventRecorder, Handler, MessageCollector, Parser, ParserConfig, ParserType,
    State,
};
use proptest::prelude::*;

/// Handler that fails the test if any callback fires.
struct Silent;

impl Handler for Silent {
    fn on_message_begin(&mut self) {
        panic!("on_message_begin after death");
    }

    fn on_url(&mut self, _: &[u8]) {
        panic!("on_url after death");
    }

    fn on_header_field(&mut self, _: &[u8]) {
        panic!("on_header_field after death");
    }

    fn on_body(&mut self, _: &[u8]) {
        panic!("on_body after death");
    }

    fn on_message_complete(&mut self) -> h1fsm::Flow {
        panic!("on_message_complete after death");
    }
}

fn dead_request(data: &[u8]) -> Parser {
    let mut parser = Parser::new(ParserType::Request);
    assert!(!parser.feed(data, 0, data.len(), &mut ()));
    parser
}

// ============================================================================
// Terminal State
// ============================================================================

#[test]
fn dead_is_idempotent() {
    let mut parser = dead_request(b"XXX / HTTP/1.1\r\n");
    assert_eq!(parser.last_error(), ErrorCode::InvalidMethod);

    for chunk in [&b"GET / HTTP/1.1\r\n\r\n"[..], b"\r\n", b"\n", b"anything"] {
        assert!(!parser.feed(chunk, 0, chunk.len(), &mut Silent));
        assert_eq!(parser.last_error(), ErrorCode::InvalidMethod);
        assert!(parser.is_dead());
    }
}

#[test]
fn dead_execute_reports_recorded_error() {
    let mut parser = dead_request(b"GET /\x00 HTTP/1.1\r\n");
    let err = parser.execute(b"\r\n", &mut Silent).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPath);
    assert_eq!(err.position, 0);
    assert_eq!(parser.finish(&mut Silent).unwrap_err().code, ErrorCode::InvalidPath);
}

#[test]
fn events_stop_at_error() {
    let data = b"GET /ok HTTP/1.1\r\nGood: yes\r\nBad\x01: no\r\n\r\n";
    let mut parser = Parser::new(ParserType::Request);
    let mut recorder = EventRecorder::new();
    assert!(!parser.feed(data, 0, data.len(), &mut recorder));

    let events = recorder.events();
    assert_eq!(events.last(), Some(&Event::HeaderField(b"Bad".to_vec())));
    assert!(!events.contains(&Event::MessageComplete));
}

// ============================================================================
// Resource Limits
// ============================================================================

#[test]
fn oversized_header_block() {
    let mut data = b"GET / HTTP/1.1\r\n".to_vec();
    for i in 0..2000 {
        data.extend_from_slice(format!("X-Header-{i}: {}\r\n", "v".repeat(40)).as_bytes());
    }
    data.extend_from_slice(b"\r\n");

    let parser = dead_request(&data);
    assert_eq!(parser.last_error(), ErrorCode::HeaderOverflow);
}

#[test]
fn oversized_single_value() {
    let config = ParserConfig::new().with_max_header_size(1024);
    let mut parser = Parser::with_config(ParserType::Request, config);
    let mut data = b"GET / HTTP/1.1\r\nCookie: ".to_vec();
    data.resize(data.len() + 4096, b'a');

    let err = parser.execute(&data, &mut ()).unwrap_err();
    assert_eq!(err.code, ErrorCode::HeaderOverflow);
    assert!(err.position <= 1025);
}

#[test]
fn header_limit_resets_per_message() {
    let config = ParserConfig::new().with_max_header_size(64);
    let mut parser = Parser::with_config(ParserType::Request, config);
    let one = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let data = one.repeat(20);
    let mut collector = MessageCollector::new();
    assert!(parser.feed(&data, 0, data.len(), &mut collector));
    assert_eq!(collector.messages().len(), 20);
}

#[test]
fn large_body_is_not_counted_as_header() {
    let config = ParserConfig::new().with_max_header_size(64);
    let mut parser = Parser::with_config(ParserType::Request, config);
    let mut data = b"POST / HTTP/1.1\r\nContent-Length: 10000\r\n\r\n".to_vec();
    data.resize(data.len() + 10_000, b'x');
    let mut collector = MessageCollector::new();
    assert!(parser.feed(&data, 0, data.len(), &mut collector));
    assert_eq!(collector.messages()[0].body.len(), 10_000);
}

#[test]
fn huge_content_length_is_streamed_not_allocated() {
    let data = b"POST / HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\nabc";
    let mut parser = Parser::new(ParserType::Request);
    assert!(parser.feed(data, 0, data.len(), &mut ()));
    assert_eq!(parser.content_length(), Some(u64::MAX));
    assert_eq!(parser.state(), State::BodyIdentity);
}

// ============================================================================
// Smuggling Shapes
// ============================================================================

#[test]
fn duplicate_conflicting_lengths() {
    let parser =
        dead_request(b"POST / HTTP/1.1\r\nContent-Length: 6\r\nContent-Length: 5\r\n\r\n");
    assert_eq!(parser.last_error(), ErrorCode::InvalidContentLength);
}

#[test]
fn space_before_colon_rejected() {
    let parser = dead_request(b"POST / HTTP/1.1\r\nContent-Length : 5\r\n\r\n");
    assert_eq!(parser.last_error(), ErrorCode::InvalidHeaderToken);
}

#[test]
fn bare_cr_in_value_rejected() {
    let parser = dead_request(b"GET / HTTP/1.1\r\nX: a\rb\r\n\r\n");
    assert_eq!(parser.last_error(), ErrorCode::LfExpected);
}

#[test]
fn nul_in_value_rejected() {
    let parser = dead_request(b"GET / HTTP/1.1\r\nX: a\x00b\r\n\r\n");
    assert_eq!(parser.last_error(), ErrorCode::InvalidHeaderToken);
}

#[test]
fn chunk_size_overflow() {
    let parser = dead_request(
        b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n1ffffffffffffffff\r\n",
    );
    assert_eq!(parser.last_error(), ErrorCode::InvalidChunkSize);
}

#[test]
fn data_after_close_rejected() {
    let data = b"GET / HTTP/1.1\r\nConnection: close\r\n\r\nGET /smuggled HTTP/1.1\r\n\r\n";
    let mut parser = Parser::new(ParserType::Request);
    let mut collector = MessageCollector::new();
    assert!(!parser.feed(data, 0, data.len(), &mut collector));
    assert_eq!(parser.last_error(), ErrorCode::ClosedConnection);
    assert_eq!(collector.messages().len(), 1);
}

#[test]
fn raw_utf8_target_rejected() {
    let parser = dead_request("GET /caf\u{e9} HTTP/1.1\r\n\r\n".as_bytes());
    assert_eq!(parser.last_error(), ErrorCode::InvalidPath);
}

// ============================================================================
// Fuzz-style Properties
// ============================================================================

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        for kind in [ParserType::Request, ParserType::Response] {
            let mut parser = Parser::new(kind);
            let mut collector = MessageCollector::new();
            let ok = parser.feed(&data, 0, data.len(), &mut collector);
            prop_assert_eq!(ok, !parser.is_dead());
            let _ = parser.finish(&mut collector);
        }
    }

    #[test]
    fn mutated_requests_never_panic(
        position in 0usize..64,
        byte in any::<u8>(),
    ) {
        let mut data = b"POST /a?b#c HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n1\r\nx\r\n0\r\n\r\n".to_vec();
        let position = position % data.len();
        data[position] = byte;
        let mut parser = Parser::new(ParserType::Request);
        let result = parser.execute(&data, &mut ());
        match result {
            Ok(consumed) => prop_assert!(consumed <= data.len()),
            Err(err) => {
                prop_assert!(err.position < data.len());
                prop_assert!(parser.is_dead());
                prop_assert_ne!(err.code, ErrorCode::Ok);
            }
        }
    }
}
