use std::net::SocketAddr;

use hyper::{body::Incoming, service::service_fn, service::Service, Request};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::{BoxResult, HgBody, SharedService};

/// Serves one [`SharedService`] over http/1 and http/2 until cancelled.
#[derive(Debug)]
pub struct HgListen {
    addr: SocketAddr,
    service: SharedService,
    cancel_token: CancellationToken,
}

impl HgListen {
    pub fn new(addr: SocketAddr, service: SharedService, cancel_token: CancellationToken) -> Self {
        Self { addr, service, cancel_token }
    }

    /// Bind the configured address, then [`serve`](HgListen::serve).
    ///
    /// # Errors
    /// The address can't be bound.
    pub async fn listen(self) -> BoxResult<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Accept connections from a bound listener until the cancel token fires.
    ///
    /// # Errors
    /// The local address of the listener can't be read. Failed accepts are only logged.
    pub async fn serve(self, listener: TcpListener) -> BoxResult<()> {
        tracing::info!(addr = %listener.local_addr()?, "[Hg.Listen] serving");
        let builder = auto::Builder::new(TokioExecutor::new());
        loop {
            let (stream, peer) = tokio::select! {
                () = self.cancel_token.cancelled() => {
                    tracing::info!("[Hg.Listen] cancelled");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!("[Hg.Listen] fail to accept connection: {e}");
                        continue;
                    }
                }
            };
            tokio::spawn(serve_connection(builder.clone(), stream, peer, self.service.clone()));
        }
    }
}

async fn serve_connection(builder: auto::Builder<TokioExecutor>, stream: TcpStream, peer: SocketAddr, service: SharedService) {
    tracing::trace!(%peer, "[Hg.Listen] connection accepted");
    let service = service_fn(move |req: Request<Incoming>| service.call(req.map(HgBody::new)));
    match builder.serve_connection(TokioIo::new(stream), service).await {
        Ok(()) => tracing::trace!(%peer, "[Hg.Listen] connection closed"),
        Err(e) => tracing::debug!(%peer, "[Hg.Listen] connection closed with error: {e}"),
    }
}
