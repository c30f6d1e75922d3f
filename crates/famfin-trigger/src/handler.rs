//! Local HTTP trigger.
//!
//! `HttpTrigger` runs a hyper HTTP server that hands every request to the
//! [`Bridge`] as an [`Envelope::Request`], so the application can be
//! exercised without the hosting platform.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use famfin_core::ErrorEnvelope;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::bridge::Bridge;
use crate::convert::{buffer_request, result_to_response};
use crate::normalize::Envelope;

/// HTTP trigger server.
///
/// Binds to a TCP port and drives one bridge invocation per request.
pub struct HttpTrigger {
    bind_addr: SocketAddr,
    bridge: Arc<Bridge>,
}

impl HttpTrigger {
    pub fn new(bind_addr: SocketAddr, bridge: Arc<Bridge>) -> Self {
        Self { bind_addr, bridge }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Bind and serve until the shutdown signal is received.
    pub async fn serve(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .context("failed to bind HTTP trigger")?;
        serve_listener(listener, self.bridge, shutdown).await
    }
}

/// Serve on an already bound listener. Spawns a tokio task per connection
/// using HTTP/1.1.
pub async fn serve_listener(
    listener: TcpListener,
    bridge: Arc<Bridge>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let local_addr = listener.local_addr().context("listener has no address")?;
    info!(addr = %local_addr, "HTTP trigger listening");

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                let (stream, peer_addr) = accept_result.context("accept failed")?;
                let bridge = Arc::clone(&bridge);

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let bridge = Arc::clone(&bridge);
                        async move {
                            Ok::<_, hyper::Error>(handle_request(&bridge, peer_addr, req).await)
                        }
                    });

                    if let Err(e) = http1::Builder::new()
                        .serve_connection(io, svc)
                        .await
                    {
                        error!(%peer_addr, error = %e, "connection error");
                    }
                });
            }
            _ = shutdown.changed() => {
                info!("HTTP trigger shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_request(
    bridge: &Bridge,
    peer_addr: SocketAddr,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    debug!(%peer_addr, method = %req.method(), uri = %req.uri(), "request received");

    let result = match buffer_request(req).await {
        Ok(req) => bridge.handle(Envelope::Request(req)).await,
        Err(e) => {
            warn!(%peer_addr, error = %e, "failed to read request body");
            ErrorEnvelope::bad_request("Request body could not be read").into_result(400)
        }
    };

    result_to_response(result)
}
