//! Run a plugin against a simulated gateway request, without a host process.
//!
//! ```rust
//! # use hellogate_plugin::{plugins::hello_world::HelloWorldPlugin, test_env::{TestEnv, TestRequest}};
//! # tokio_test_block(async {
//! let mut env = TestEnv::new(TestRequest::get("http://example.com").header("x-hi", "hello"))?;
//! env.do_https(HelloWorldPlugin::default()).await?;
//! assert_eq!(env.client_res.header("x-plugin"), Some("hello"));
//! # Ok::<_, hellogate_plugin::BoxError>(())
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(f)
//! # }
//! ```
use hellogate_kernel::{service::echo::echo_service, HgBody};
use hyper::{
    body::Bytes,
    header::{HeaderName, HeaderValue},
    http::uri::Scheme,
    service::Service,
    HeaderMap, Method, Request, StatusCode, Uri,
};
use tower_layer::Layer;

use crate::{
    layer::{AccessChain, PluginFunction},
    BoxResult, Exchange, Plugin, PluginInstanceId, PluginInstanceName,
};

/// The request a test sends to the gateway.
#[derive(Debug, Clone)]
pub struct TestRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Default for TestRequest {
    fn default() -> Self {
        Self {
            method: Method::GET,
            url: "http://example.com".to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }
}

impl TestRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// The response a client receives from the gateway.
#[derive(Debug, Clone, Default)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// First value of a header, decoded as utf-8 with no other transformation.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
    }
}

/// A simulated gateway: the access phase of one plugin, in front of an upstream echoing the request body.
#[derive(Debug)]
pub struct TestEnv {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    /// response of the last run, default until a run happens
    pub client_res: TestResponse,
}

impl TestEnv {
    /// # Errors
    /// The url is not absolute, or some header is invalid.
    pub fn new(request: TestRequest) -> BoxResult<Self> {
        let uri: Uri = request.url.parse()?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(format!("[Hg.Plugin.Test] url should be absolute: {}", request.url).into());
        }
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            headers.append(HeaderName::from_bytes(name.as_bytes())?, HeaderValue::from_str(value)?);
        }
        Ok(Self {
            method: request.method,
            uri,
            headers,
            body: request.body,
            client_res: TestResponse::default(),
        })
    }

    /// Send the request over https through the access phase of `plugin`.
    ///
    /// # Errors
    /// Fail to build the request or to read the response body.
    pub async fn do_https<P: Plugin>(&mut self, plugin: P) -> BoxResult<&TestResponse> {
        let mut uri_parts = self.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTPS);
        let uri = Uri::from_parts(uri_parts)?;
        self.run(plugin, uri).await
    }

    /// Send the request over http through the access phase of `plugin`.
    ///
    /// # Errors
    /// Fail to build the request or to read the response body.
    pub async fn do_http<P: Plugin>(&mut self, plugin: P) -> BoxResult<&TestResponse> {
        let mut uri_parts = self.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        let uri = Uri::from_parts(uri_parts)?;
        self.run(plugin, uri).await
    }

    async fn run<P: Plugin>(&mut self, plugin: P, uri: Uri) -> BoxResult<&TestResponse> {
        let function = PluginFunction::new(Box::new(move |exchange: &mut dyn Exchange| plugin.access(exchange)));
        let chain = AccessChain::new([(PluginInstanceId::new(P::CODE, PluginInstanceName::mono()), function)]);
        let service = chain.layer(echo_service());

        let mut request = Request::builder().method(self.method.clone()).uri(uri).body(HgBody::full(self.body.clone()))?;
        *request.headers_mut() = self.headers.clone();
        let response = match service.call(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let (parts, body) = response.into_parts();
        let body = body.collect().await?;
        self.client_res = TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        };
        Ok(&self.client_res)
    }
}
