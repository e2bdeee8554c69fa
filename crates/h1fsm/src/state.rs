//! Message-level parser states.

use serde::Serialize;

/// Where the message parser is within the byte stream.
///
/// The request target is parsed by a nested machine while the parser sits
/// in [`State::ReqUrl`]; see [`crate::UrlState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum State {
    /// A protocol error was found. Terminal until reset.
    Dead,
    /// The previous message closed the connection; only CR/LF may follow.
    Closed,
    /// A protocol upgrade completed; remaining bytes are not HTTP.
    Upgraded,

    /// Waiting for the first byte of a request.
    StartReq,
    /// Matching the request method.
    ReqMethod,
    /// Between the method and the target.
    ReqSpacesBeforeUrl,
    /// Inside the request target.
    ReqUrl,
    /// Between the target and the version.
    ReqHttpStart,
    /// Request line CR seen, LF expected.
    ReqLineAlmostDone,

    /// Waiting for the first byte of a response.
    StartRes,
    /// Before the status code.
    ResFirstStatusCode,
    /// Inside the status code.
    ResStatusCode,
    /// Between the status code and the reason phrase.
    ResStatusStart,
    /// Inside the reason phrase.
    ResStatus,
    /// Status line CR seen, LF expected.
    ResLineAlmostDone,

    /// Matched `H` of `HTTP/`.
    HttpH,
    /// Matched `HT`.
    HttpHT,
    /// Matched `HTT`.
    HttpHTT,
    /// Matched `HTTP`.
    HttpHTTP,
    /// Matched `HTTP/`; major version digit expected.
    HttpFirstMajor,
    /// Inside the major version.
    HttpMajor,
    /// Minor version digit expected.
    HttpFirstMinor,
    /// Inside the minor version.
    HttpMinor,

    /// At the start of a header line.
    HeaderFieldStart,
    /// Inside a header name.
    HeaderField,
    /// Skipping whitespace before a header value.
    HeaderValueStart,
    /// Inside a header value.
    HeaderValue,
    /// Header line CR seen, LF expected.
    HeaderAlmostDone,
    /// After a header line; a leading SP/HT continues the value.
    HeaderValueLws,
    /// Skipping whitespace at the start of a continuation line.
    HeaderValueFold,
    /// Blank line CR seen, LF expected.
    HeadersAlmostDone,

    /// Chunk size, first hex digit expected.
    ChunkSizeStart,
    /// Inside a chunk size.
    ChunkSize,
    /// Skipping chunk extensions.
    ChunkParameters,
    /// Chunk size line CR seen, LF expected.
    ChunkSizeAlmostDone,
    /// Inside chunk data.
    ChunkData,
    /// Chunk data complete, CR expected.
    ChunkDataAlmostDone,
    /// Chunk data CR seen, LF expected.
    ChunkDataDone,

    /// Inside a body of known length.
    BodyIdentity,
    /// Inside a body that ends at EOF.
    BodyIdentityEof,
}

impl State {
    /// Returns true while the parser is inside a start line or header block.
    ///
    /// Bytes consumed in these states count toward the header size limit.
    #[must_use]
    pub const fn is_head(self) -> bool {
        matches!(
            self,
            Self::ReqMethod
                | Self::ReqSpacesBeforeUrl
                | Self::ReqUrl
                | Self::ReqHttpStart
                | Self::ReqLineAlmostDone
                | Self::ResFirstStatusCode
                | Self::ResStatusCode
                | Self::ResStatusStart
                | Self::ResStatus
                | Self::ResLineAlmostDone
                | Self::HttpH
                | Self::HttpHT
                | Self::HttpHTT
                | Self::HttpHTTP
                | Self::HttpFirstMajor
                | Self::HttpMajor
                | Self::HttpFirstMinor
                | Self::HttpMinor
                | Self::HeaderFieldStart
                | Self::HeaderField
                | Self::HeaderValueStart
                | Self::HeaderValue
                | Self::HeaderAlmostDone
                | Self::HeaderValueLws
                | Self::HeaderValueFold
                | Self::HeadersAlmostDone
        )
    }

    /// Returns true between messages.
    #[must_use]
    pub const fn is_message_boundary(self) -> bool {
        matches!(self, Self::StartReq | Self::StartRes | Self::Closed)
    }

    /// Returns true in states whose bytes are delivered as data slices.
    pub(crate) const fn is_span(self) -> bool {
        matches!(
            self,
            Self::ReqUrl | Self::ResStatus | Self::HeaderField | Self::HeaderValue
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_states() {
        assert!(State::ReqMethod.is_head());
        assert!(State::HeaderValue.is_head());
        assert!(State::HttpMinor.is_head());
        assert!(!State::StartReq.is_head());
        assert!(!State::ChunkData.is_head());
        assert!(!State::BodyIdentity.is_head());
        assert!(!State::Dead.is_head());
    }

    #[test]
    fn boundaries() {
        assert!(State::StartReq.is_message_boundary());
        assert!(State::Closed.is_message_boundary());
        assert!(!State::ReqUrl.is_message_boundary());
        assert!(!State::Upgraded.is_message_boundary());
    }
}
