use std::{
    convert::Infallible,
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::body::{Body, Bytes, Frame, SizeHint};

use crate::{BoxError, BoxResult};

/// Request and response body of the host.
///
/// A body built from bytes keeps them aside, they can be read back without polling.
pub struct HgBody {
    inner: BoxBody<Bytes, BoxError>,
    buffered: Option<Bytes>,
}

impl fmt::Debug for HgBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HgBody").field("buffered", &self.buffered.as_ref().map(Bytes::len)).finish_non_exhaustive()
    }
}

impl Default for HgBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Body for HgBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        Pin::new(&mut self.inner).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl HgBody {
    /// Wrap a streaming body, e.g. the incoming body of a connection.
    pub fn new<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<BoxError>,
    {
        Self {
            inner: BoxBody::new(body.map_err(Into::into)),
            buffered: None,
        }
    }
    pub fn empty() -> Self {
        Self {
            inner: BoxBody::new(Empty::new().map_err(|never: Infallible| -> BoxError { match never {} })),
            buffered: Some(Bytes::new()),
        }
    }
    pub fn full(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            inner: BoxBody::new(Full::new(data.clone()).map_err(|never: Infallible| -> BoxError { match never {} })),
            buffered: Some(data),
        }
    }
    /// The bytes the body was built from, `None` for a streaming body.
    pub fn buffered(&self) -> Option<&Bytes> {
        self.buffered.as_ref()
    }
    /// Read the whole body.
    ///
    /// # Errors
    /// The underlying stream fails.
    pub async fn collect(self) -> BoxResult<Bytes> {
        match self.buffered {
            Some(data) => Ok(data),
            None => Ok(self.inner.collect().await?.to_bytes()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_collect() {
        let streaming = HgBody::new(Full::new(Bytes::from_static(b"hello")));
        assert!(streaming.buffered().is_none());
        assert_eq!(streaming.collect().await.expect("full body"), Bytes::from_static(b"hello"));

        let full = HgBody::full("hello");
        assert_eq!(full.buffered(), Some(&Bytes::from_static(b"hello")));
        assert_eq!(full.collect().await.expect("full body"), Bytes::from_static(b"hello"));
        assert!(HgBody::empty().buffered().is_some_and(Bytes::is_empty));
    }
}
