//! # Hellogate kernel crate.
//!
//! What a plugin host needs from http: a body, a cloneable type-erased service,
//! an echo upstream and a tcp listener.

#![deny(clippy::unwrap_used, clippy::dbg_macro, clippy::unimplemented, clippy::todo, clippy::missing_safety_doc)]
#![warn(clippy::missing_errors_doc, clippy::indexing_slicing, missing_debug_implementations)]
pub mod body;
pub mod listener;
pub mod service;

pub use body::HgBody;
use hyper::{
    body::Bytes,
    header::{HeaderValue, CONTENT_TYPE},
    Request, Response, StatusCode,
};
pub use service::SharedService;
pub use tokio_util::sync::CancellationToken;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type BoxResult<T> = Result<T, BoxError>;

pub type HgRequest = Request<HgBody>;
pub type HgResponse = Response<HgBody>;

/// Responses the host answers by itself.
pub trait HgResponseExt {
    /// A plain text response.
    fn with_code_message(code: StatusCode, message: impl Into<Bytes>) -> Self;
}

impl HgResponseExt for HgResponse {
    fn with_code_message(code: StatusCode, message: impl Into<Bytes>) -> Self {
        let mut resp = Response::new(HgBody::full(message));
        *resp.status_mut() = code;
        resp.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        resp
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_with_code_message() {
        let resp = HgResponse::with_code_message(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers().get(CONTENT_TYPE).map(HeaderValue::as_bytes), Some(&b"text/plain; charset=utf-8"[..]));
        assert_eq!(resp.into_body().collect().await.expect("full body"), Bytes::from_static(b"boom"));
    }
}
