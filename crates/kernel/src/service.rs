use std::{convert::Infallible, fmt, sync::Arc};

use futures_util::future::BoxFuture;
use hyper::service::Service;

use crate::{HgRequest, HgResponse};

pub mod echo;

pub type HgResponseFuture = BoxFuture<'static, Result<HgResponse, Infallible>>;

trait ErasedService: Send + Sync {
    fn call_boxed(&self, req: HgRequest) -> HgResponseFuture;
}

impl<S> ErasedService for S
where
    S: Service<HgRequest, Response = HgResponse, Error = Infallible> + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    fn call_boxed(&self, req: HgRequest) -> HgResponseFuture {
        Box::pin(self.call(req))
    }
}

/// A type-erased service, cheap to clone and to share between connections.
#[derive(Clone)]
pub struct SharedService {
    inner: Arc<dyn ErasedService>,
}

impl fmt::Debug for SharedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedService").finish_non_exhaustive()
    }
}

impl SharedService {
    pub fn new<S>(service: S) -> Self
    where
        S: Service<HgRequest, Response = HgResponse, Error = Infallible> + Send + Sync + 'static,
        S::Future: Send + 'static,
    {
        Self { inner: Arc::new(service) }
    }
}

impl Service<HgRequest> for SharedService {
    type Response = HgResponse;
    type Error = Infallible;
    type Future = HgResponseFuture;

    #[inline]
    fn call(&self, req: HgRequest) -> Self::Future {
        self.inner.call_boxed(req)
    }
}
