// src/server/routes.rs
use crate::endpoints::StandardEndpoints;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use tracing::error;

pub const DEFAULT_PATH_PREFIX: &str = "/service";

pub const MIME_JSON: &str = "application/json";
pub const MIME_TEXT_PLAIN: &str = "text/plain; charset=UTF-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Status,
    Config,
    HealthCheck,
    GoodToGo,
    ServiceCanary,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Status,
        Route::Config,
        Route::HealthCheck,
        Route::GoodToGo,
        Route::ServiceCanary,
    ];

    /// Path relative to the mount prefix.
    pub fn path(self) -> &'static str {
        match self {
            Route::Status => "/status",
            Route::Config => "/config",
            Route::HealthCheck => "/healthcheck",
            Route::GoodToGo => "/healthcheck/gtg",
            Route::ServiceCanary => "/healthcheck/asg",
        }
    }

    /// Short label used in logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            Route::Status => "status",
            Route::Config => "config",
            Route::HealthCheck => "healthcheck",
            Route::GoodToGo => "gtg",
            Route::ServiceCanary => "asg",
        }
    }

    pub fn resolve(prefix: &str, path: &str) -> Option<Route> {
        let rest = path.strip_prefix(prefix)?;
        Route::ALL.into_iter().find(|route| route.path() == rest)
    }
}

/// Trim a configured prefix to the form routes are matched against:
/// a leading slash and no trailing slash (`""` mounts at the root).
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Answer `req` if it targets one of the endpoints under `prefix`.
///
/// `prefix` is normalized the same way [`RequestHandler`] does it. Returns
/// `None` for any other path so a host service can fall through to its own
/// routes.
///
/// [`RequestHandler`]: super::RequestHandler
pub fn dispatch<B>(
    endpoints: &StandardEndpoints,
    prefix: &str,
    req: &Request<B>,
) -> Option<Response<Body>> {
    let route = Route::resolve(&normalize_prefix(prefix), req.uri().path())?;
    Some(route_response(endpoints, route, req.method()))
}

pub(crate) fn route_response(
    endpoints: &StandardEndpoints,
    route: Route,
    method: &Method,
) -> Response<Body> {
    if method != Method::GET {
        let mut response = empty(StatusCode::METHOD_NOT_ALLOWED);
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET"));
        return response;
    }
    respond(endpoints, route)
}

pub fn respond(endpoints: &StandardEndpoints, route: Route) -> Response<Body> {
    match route {
        Route::Status => json(&endpoints.status()),
        Route::Config => match endpoints.config() {
            Some(config) => json(&config),
            None => with_content_type(Response::new(Body::empty()), MIME_JSON),
        },
        Route::HealthCheck => json(endpoints.health_report().as_ref()),
        Route::GoodToGo => ok_text(endpoints.good_to_go()),
        Route::ServiceCanary => ok_text(endpoints.service_canary()),
    }
}

pub(crate) fn not_found() -> Response<Body> {
    let mut response = Response::new(Body::from("Not Found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn json<T: Serialize + ?Sized>(value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(body) => with_content_type(Response::new(Body::from(body)), MIME_JSON),
        Err(e) => {
            error!("Failed to serialize endpoint response: {}", e);
            empty(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// 200 "OK" when healthy, 503 with no body otherwise; always text/plain.
fn ok_text(healthy: bool) -> Response<Body> {
    let response = if healthy {
        Response::new(Body::from("OK"))
    } else {
        empty(StatusCode::SERVICE_UNAVAILABLE)
    };
    with_content_type(response, MIME_TEXT_PLAIN)
}

fn empty(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn with_content_type(mut response: Response<Body>, mime: &'static str) -> Response<Body> {
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(mime));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_routes_under_prefix() {
        assert_eq!(Route::resolve("/service", "/service/status"), Some(Route::Status));
        assert_eq!(
            Route::resolve("/service", "/service/healthcheck"),
            Some(Route::HealthCheck)
        );
        assert_eq!(
            Route::resolve("/service", "/service/healthcheck/gtg"),
            Some(Route::GoodToGo)
        );
        assert_eq!(
            Route::resolve("/service", "/service/healthcheck/asg"),
            Some(Route::ServiceCanary)
        );
        assert_eq!(Route::resolve("", "/config"), Some(Route::Config));
    }

    #[test]
    fn test_resolve_rejects_other_paths() {
        assert_eq!(Route::resolve("/service", "/status"), None);
        assert_eq!(Route::resolve("/service", "/service/status/"), None);
        assert_eq!(Route::resolve("/service", "/servicestatus"), None);
        assert_eq!(Route::resolve("/service", "/service/healthcheck/other"), None);
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/service"), "/service");
        assert_eq!(normalize_prefix("service/"), "/service");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }

    #[test]
    fn test_text_routes_always_plain_text() {
        let endpoints = StandardEndpoints::new();
        endpoints.set_good_to_go_func(|| false);

        let ok = respond(&endpoints, Route::ServiceCanary);
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.headers()[CONTENT_TYPE], MIME_TEXT_PLAIN);

        let unavailable = respond(&endpoints, Route::GoodToGo);
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.headers()[CONTENT_TYPE], MIME_TEXT_PLAIN);
    }

    #[test]
    fn test_dispatch_falls_through_outside_prefix() {
        let endpoints = StandardEndpoints::new();
        let req = Request::get("/api/users").body(Body::empty()).unwrap();
        assert!(dispatch(&endpoints, "/service", &req).is_none());

        let req = Request::post("/service/status").body(Body::empty()).unwrap();
        let response = dispatch(&endpoints, "/service", &req).unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");
    }

    #[test]
    fn test_dispatch_normalizes_prefix() {
        let endpoints = StandardEndpoints::new();
        for prefix in ["/service/", "service", "/service"] {
            let req = Request::get("/service/status").body(Body::empty()).unwrap();
            let response = dispatch(&endpoints, prefix, &req).unwrap();
            assert_eq!(response.status(), StatusCode::OK, "prefix {prefix:?}");
        }

        let req = Request::get("/healthcheck/gtg").body(Body::empty()).unwrap();
        assert!(dispatch(&endpoints, "/", &req).is_some());
    }
}
