mod config;
mod db;
mod error;
mod models;
mod routes;
mod schedule;
mod store;

use std::sync::Arc;

use crate::{
    config::Config,
    models::AppState,
    schedule::ClinicClock,
    store::{MemoryStore, PgStore, ScheduleStore},
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let clock = ClinicClock::new(cfg.clinic_timezone);
    let demo = cfg
        .seed_demo_data
        .then(|| store::seed::demo(&clock, clock.local_date(chrono::Utc::now())));

    let store: Arc<dyn ScheduleStore> = match &cfg.database_url {
        Some(url) => {
            let pool = db::connect_pg(url).await?;
            if let Some(data) = &demo {
                db::seed_demo(&pool, data).await?;
            }
            tracing::info!("using postgres store");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on exit)");
            Arc::new(MemoryStore::new(demo.unwrap_or_default()))
        }
    };

    let state = AppState {
        store,
        clock,
        slot_cadence_min: cfg.slot_cadence_min,
        max_slot_range_days: cfg.max_slot_range_days,
        closed_dates: Arc::new(cfg.closed_dates.clone()),
    };

    // Browser booking client runs on another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!(
        timezone = %cfg.clinic_timezone,
        cadence_min = cfg.slot_cadence_min,
        "Listening on http://{}",
        cfg.bind_addr
    );
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
