use std::sync::Arc;

use quotehub_market_data::AggregationService;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};

pub struct AppState {
    pub market_data: Arc<AggregationService>,
}

impl AppState {
    pub fn new(market_data: Arc<AggregationService>) -> Arc<Self> {
        Arc::new(Self { market_data })
    }
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let service = Arc::new(AggregationService::from_config(&config.market_data)?);

    let providers: Vec<&str> = service.registry().all().iter().map(|p| p.id()).collect();
    tracing::info!(?providers, "Market data service ready");

    if let Some(every) = config.market_data.sweep_interval() {
        service.spawn_cache_sweeper(every);
    }

    Ok(AppState::new(service))
}
