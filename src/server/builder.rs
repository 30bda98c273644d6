// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use anyhow::{Context, Result};
use hyper::{server::conn::Http, Body, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::Service;

/// Builder pattern so `main.rs` can inject the endpoints handler (or any
/// handler wrapping it).
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind, then serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let handler = self
            .handler
            .context("handler must be set via with_handler()")?;
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;

        serve_listener(listener, handler, shutdown).await
    }
}

/// Accept loop over an already bound listener; one Tokio task per connection.
/// Connections in flight are left to finish on their own after shutdown.
pub async fn serve_listener<H, F>(listener: TcpListener, handler: H, shutdown: F) -> Result<()>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
    F: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;
    tracing::info!("HTTP server listening on {}", local_addr);

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let svc = handler.clone();

                tokio::spawn(async move {
                    let http = Http::new();
                    if let Err(err) = http.serve_connection(stream, svc).await {
                        tracing::warn!(%peer, %err, "connection error");
                    }
                });
            }
            _ = &mut shutdown => {
                tracing::info!("HTTP server on {} stopped accepting connections", local_addr);
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::StandardEndpoints;
    use hyper::{Client, StatusCode};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_serves_endpoints_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoints = StandardEndpoints::new();
        endpoints.set_service_canary_func(|| false);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_listener(
            listener,
            endpoints.handler("/service"),
            async move {
                let _ = stop_rx.await;
            },
        ));

        let client = Client::new();
        let gtg = client
            .get(format!("http://{}/service/healthcheck/gtg", addr).parse().unwrap())
            .await
            .unwrap();
        assert_eq!(gtg.status(), StatusCode::OK);
        assert_eq!(hyper::body::to_bytes(gtg.into_body()).await.unwrap(), "OK");

        let asg = client
            .get(format!("http://{}/service/healthcheck/asg", addr).parse().unwrap())
            .await
            .unwrap();
        assert_eq!(asg.status(), StatusCode::SERVICE_UNAVAILABLE);

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_serve_requires_handler() {
        let builder: ServerBuilder<crate::server::RequestHandler> =
            ServerBuilder::new("127.0.0.1:0".parse().unwrap());
        assert!(builder.serve(async {}).await.is_err());
    }
}
