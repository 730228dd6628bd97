//! Response body types supporting buffered, streaming, and empty modes.
//!
//! [`ProxyBody`] is the HTTP response body used by every Crawlspace response:
//!
//! - **Buffered**: small JSON payloads such as error bodies and service metadata.
//! - **Streaming**: object bodies read chunk by chunk from the storage backend.
//! - **Empty**: `HEAD` and `304 Not Modified` responses.
//!
//! A streaming body owns the backend [`ObjectStream`]. When hyper drops the
//! body, because the response finished or the client went away, the stream
//! and whatever backend resource it holds are released with it.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use crawlspace_storage::ObjectStream;
use futures::Stream;
use http_body::Frame;
use http_body_util::Full;

/// Crawlspace response body.
#[derive(Debug, Default)]
pub enum ProxyBody {
    /// Buffered body for small responses.
    Buffered(Full<Bytes>),
    /// Object body streamed from storage.
    Streaming(ObjectStream),
    /// Empty body.
    #[default]
    Empty,
}

impl ProxyBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create a body that streams an object.
    #[must_use]
    pub fn streaming(stream: ObjectStream) -> Self {
        Self::Streaming(stream)
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for ProxyBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming(stream) => Pin::new(stream)
                .poll_next(cx)
                .map(|chunk| chunk.map(|res| res.map(Frame::data))),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming(_) => false,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming(_) => http_body::SizeHint::default(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
