// Framework bootstrap for the fleet gateway runtime.

use crate::domain::FleetDirectory;
use crate::frameworks::config::{DEFAULT_LOG_FILTER, GatewayConfig, LogFormat, LogSettings};
use crate::interface_adapters::clients::vendor::VendorHttpClient;
use crate::interface_adapters::routes;
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::{FleetService, SessionBroker};

use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tracing_subscriber::EnvFilter;

fn init_runtime() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();

    let log = LogSettings::from_lookup(|key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&log.filter).unwrap_or_else(|e| {
        eprintln!("invalid RUST_LOG {:?} ({e}); using {DEFAULT_LOG_FILTER}", log.filter);
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match log.format {
        LogFormat::Json => subscriber.json().with_current_span(true).init(),
        LogFormat::Compact => subscriber.compact().init(),
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, config: GatewayConfig) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(&config)?;
    let app = routes::app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = GatewayConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "failed to load configuration");
        std::io::Error::other(e)
    })?;

    let address = SocketAddr::from(([127, 0, 0, 1], config.http_port));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, config).await
}

fn build_state(config: &GatewayConfig) -> Result<Arc<AppState>> {
    let vendor = VendorHttpClient::new(
        config.base_url.clone(),
        config.request_timeout(),
        config.tuning.accept_invalid_certs,
    )
    .map_err(|e| std::io::Error::other(format!("failed to initialize vendor client: {e}")))?;

    let settings = config.broker_settings();
    tracing::debug!(
        base_url = %vendor.base_url(),
        max_attempts = settings.max_attempts,
        reauth_backoff_ms = settings.reauth_backoff.as_millis(),
        session_ttl_secs = settings.session_ttl.as_secs(),
        request_timeout_ms = config.request_timeout().as_millis(),
        "fleet vendor client configured"
    );
    if config.tuning.accept_invalid_certs {
        tracing::warn!("fleet vendor TLS certificate validation is disabled");
    }

    let broker = SessionBroker::new(vendor, SystemClock, config.credentials.clone(), settings);
    let fleet: Arc<dyn FleetDirectory> = Arc::new(FleetService::new(broker));

    Ok(Arc::new(AppState { fleet }))
}
