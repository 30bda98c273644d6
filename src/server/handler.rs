// src/server/handler.rs
use hyper::{Body, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tracing::debug;
use uuid::Uuid;

use super::routes::{normalize_prefix, not_found, route_response, Route};
use crate::endpoints::StandardEndpoints;

/// Serves the five SE4 routes under a path prefix; anything else is a 404.
#[derive(Clone)]
pub struct RequestHandler {
    endpoints: StandardEndpoints,
    prefix: Arc<str>,
}

impl RequestHandler {
    pub fn new(endpoints: StandardEndpoints, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            endpoints,
            prefix: normalize_prefix(&prefix).into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn endpoints(&self) -> &StandardEndpoints {
        &self.endpoints
    }

    pub fn handle<B>(&self, req: &Request<B>) -> Response<Body> {
        let span = tracing::debug_span!(
            "se4_request",
            request_id = %Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path()
        );
        let _enter = span.enter();

        let route = Route::resolve(&self.prefix, req.uri().path());
        let response = match route {
            Some(route) => route_response(&self.endpoints, route, req.method()),
            None => not_found(),
        };

        let status = response.status().as_u16();
        debug!(status, "request served");
        if let (Some(metrics), Some(route)) = (self.endpoints.metrics(), route) {
            metrics.record_request(route.name(), status);
        }

        response
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(&req)) })
    }
}
