use std::convert::Infallible;

use hyper::{service::service_fn, Response};
use tracing::instrument;

use crate::{HgRequest, HgResponse, SharedService};

/// Answer with the request body, the upstream of the demonstration host and of tests.
#[instrument(skip_all, fields(method = %req.method(), uri = %req.uri()))]
pub async fn echo(req: HgRequest) -> Result<HgResponse, Infallible> {
    Ok(Response::new(req.into_body()))
}

pub fn echo_service() -> SharedService {
    SharedService::new(service_fn(echo))
}
