use std::{convert::Infallible, sync::Arc};

use arc_swap::ArcSwap;
use hellogate_kernel::{service::HgResponseFuture, HgRequest, HgResponse, HgResponseExt, SharedService};
use hellogate_model::PluginInstanceId;
use hyper::{service::Service, Request, StatusCode};
use tower_layer::Layer;

use crate::exchange::{Exchange, HttpExchange};

/// The access phase entry point of one plugin instance.
pub type BoxAccessFn = Box<dyn Fn(&mut dyn Exchange) + Send + Sync + 'static>;

/// A hot-swappable access function, every clone observes a [`swap`](PluginFunction::swap).
#[derive(Clone)]
pub struct PluginFunction {
    f: Arc<ArcSwap<BoxAccessFn>>,
}

impl std::fmt::Debug for PluginFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginFunction").finish_non_exhaustive()
    }
}

impl PluginFunction {
    pub fn new(f: BoxAccessFn) -> Self {
        Self {
            f: Arc::new(ArcSwap::from_pointee(f)),
        }
    }
    pub fn swap(&self, f: BoxAccessFn) {
        self.f.store(Arc::new(f));
    }
    #[inline]
    pub fn call(&self, exchange: &mut dyn Exchange) {
        (self.f.load())(exchange)
    }
}

/// Plugin instances run one after another on the access phase of each request.
///
/// Entries run in the order they are given, [`PluginRepository::access_chain`](crate::PluginRepository::access_chain)
/// orders them by priority. As a [`Layer`] the chain wraps the upstream service.
#[derive(Debug, Clone, Default)]
pub struct AccessChain {
    entries: Arc<[(PluginInstanceId, PluginFunction)]>,
}

impl AccessChain {
    pub fn new(entries: impl IntoIterator<Item = (PluginInstanceId, PluginFunction)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
    pub fn ids(&self) -> impl Iterator<Item = &PluginInstanceId> {
        self.entries.iter().map(|(id, _)| id)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Run the access phase of every plugin of the chain against one exchange.
    pub fn run(&self, exchange: &mut dyn Exchange) {
        for (id, function) in self.entries.iter() {
            tracing::trace!(plugin = %id, "[Hg.Plugin] access");
            function.call(exchange);
        }
    }
}

impl<S> Layer<S> for AccessChain
where
    S: Service<HgRequest, Response = HgResponse, Error = Infallible> + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Service = AccessService;

    fn layer(&self, upstream: S) -> Self::Service {
        AccessService {
            chain: self.clone(),
            upstream: SharedService::new(upstream),
        }
    }
}

/// An upstream behind an [`AccessChain`].
#[derive(Debug, Clone)]
pub struct AccessService {
    chain: AccessChain,
    upstream: SharedService,
}

impl Service<HgRequest> for AccessService {
    type Response = HgResponse;
    type Error = Infallible;
    type Future = HgResponseFuture;

    fn call(&self, req: HgRequest) -> Self::Future {
        let (parts, body) = req.into_parts();
        let mut exchange = HttpExchange::new(&parts);
        self.chain.run(&mut exchange);
        let response_headers = exchange.into_response_headers();
        let upstream = self.upstream.clone();
        Box::pin(async move {
            let mut resp = match upstream.call(Request::from_parts(parts, body)).await {
                Ok(resp) => resp,
                Err(never) => match never {},
            };
            if let Err(e) = response_headers.apply(resp.headers_mut()) {
                tracing::error!("{e}");
                return Ok(HgResponse::with_code_message(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
            }
            Ok::<_, Infallible>(resp)
        })
    }
}
