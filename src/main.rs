// src/main.rs
use anyhow::Result;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Request, Response, Server, StatusCode};
use se4_endpoints::{
    config::{self, Config},
    health_check,
    metrics::MetricsRegistry,
    server::ServerBuilder,
    to_config_source, BuildInfo, HealthCheckResult, StandardEndpoints,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("se4_endpoints=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "se4.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config_or_default(&config_path).await?;

    let build_info = if config.build_info == BuildInfo::default() {
        BuildInfo::from_cargo_env()
    } else {
        config.build_info.clone()
    };
    let mut endpoints = StandardEndpoints::with_build_info(build_info);

    // Start metrics server if enabled
    if config.metrics.enabled {
        let metrics_registry = MetricsRegistry::new()?;
        endpoints = endpoints.with_metrics(metrics_registry.collector());

        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(metrics_addr, metrics_registry, config.metrics.path.clone()).await?;
    }

    register_demo_checks(&endpoints, &config)?;

    let addr = config.server.listen_addr;
    let prefix = config.server.path_prefix.clone();
    info!("Starting SE4 endpoints on {}{}", addr, prefix);
    for route in se4_endpoints::server::Route::ALL {
        info!("  curl -v http://localhost:{}{}{}", addr.port(), prefix, route.path());
    }

    ServerBuilder::new(addr)
        .with_handler(endpoints.handler(prefix))
        .serve(shutdown_signal())
        .await?;

    // Stop the scheduler before the runtime goes away.
    endpoints.set_health_check_funcs(Duration::ZERO, Vec::new())?;
    Ok(())
}

fn register_demo_checks(endpoints: &StandardEndpoints, config: &Config) -> Result<()> {
    let started = Instant::now();

    endpoints.set_health_check_funcs(
        config.health_check.interval(),
        vec![
            health_check(move || {
                HealthCheckResult::timed("process uptime", || started.elapsed() > Duration::ZERO)
            }),
            // Stands in for a downstream dependency that is currently down.
            health_check(|| HealthCheckResult::timed("example downstream", || false)),
        ],
    )?;

    endpoints.set_good_to_go_func(|| true);
    endpoints.set_service_canary_func(|| true);
    endpoints.set_config_source_func(to_config_source(config)?);
    Ok(())
}

async fn start_metrics_server(
    addr: SocketAddr,
    registry: MetricsRegistry,
    path: String,
) -> Result<()> {
    let registry = Arc::new(registry);
    let metrics_path = Arc::new(path); // keep this for logging
    let service_path = metrics_path.clone(); // clone for the service closure

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move {
                    if req.uri().path() != path.as_str() {
                        let mut response = Response::new(Body::from("Not Found"));
                        *response.status_mut() = StatusCode::NOT_FOUND;
                        return Ok::<_, Infallible>(response);
                    }

                    let response = match registry.gather() {
                        Ok(metrics) => {
                            let mut response = Response::new(Body::from(metrics));
                            response.headers_mut().insert(
                                CONTENT_TYPE,
                                HeaderValue::from_static("text/plain; version=0.0.4"),
                            );
                            response
                        }
                        Err(e) => {
                            error!("Failed to encode metrics: {}", e);
                            let mut response = Response::new(Body::empty());
                            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                            response
                        }
                    };
                    Ok::<_, Infallible>(response)
                }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_service);

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
