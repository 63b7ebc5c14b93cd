// Wildlife Dashboard v0.1
//! Headless run: loads the configured years and prints one dashboard view as JSON.
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wildlife_dashboard::config::AppConfig;
use wildlife_dashboard::services::inat::INatClient;
use wildlife_dashboard::{Dashboard, FilterCriteria, FilterEngine, Rosters, YearlyCache};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wildlife_dashboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        "Loading years {:?} (available: {:?})",
        config.years,
        AppConfig::years_available()
    );

    let rosters = match &config.roster_dir {
        Some(dir) => Rosters::load_dir(dir).unwrap_or_else(|e| {
            tracing::error!(
                "Failed to load rosters from {}: {}, using built-in lists",
                dir.display(),
                e
            );
            Rosters::builtin()
        }),
        None => Rosters::builtin(),
    };

    let source = config
        .data_source()
        .expect("Failed to build observation data source");
    let cache = Arc::new(YearlyCache::new(source));
    let mut dashboard = Dashboard::new(cache, FilterEngine::new(Arc::new(rosters)));

    match INatClient::new(&config.inat_api_url, &config.user_agent) {
        Ok(client) => dashboard = dashboard.with_inat(client, config.inat_place_id),
        Err(e) => tracing::warn!("iNaturalist client unavailable: {}", e),
    }

    let view = dashboard
        .view(&config.years, &FilterCriteria::default())
        .await;
    if view.total_records == 0 {
        tracing::warn!("No observations loaded for {:?}", config.years);
    } else {
        tracing::info!(
            "Loaded {} observations of {} species",
            view.total_records,
            view.stats.total_unique_species
        );
    }

    let current_month = dashboard
        .current_month(chrono::Utc::now().date_naive())
        .await;

    let output = serde_json::json!({
        "view": view,
        "current_month": current_month,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize dashboard view: {}", e),
    }
}
