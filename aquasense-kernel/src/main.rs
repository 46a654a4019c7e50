/**
 * AQUASENSE KERNEL - Point d'entrée du service capteurs qualité de l'eau
 *
 * RÔLE : Assemble config, data store, simulateur, scheduler et API HTTP.
 * Chaque tick synthétise une lecture par site surveillé, en dérive les alertes
 * et persiste l'historique borné ; l'API en sert des vues en lecture seule.
 *
 * ARCHITECTURE : une tâche scheduler en arrière-plan (seul écrivain) + handlers
 * Axum (lecteurs) partageant un unique DataStore construit explicitement.
 */

mod alerts;
mod config;
mod health;
mod http;
mod models;
mod scenarios;
mod scheduler;
mod simulator;
mod store;

use crate::config::load_config;
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::simulator::Simulator;
use crate::store::{DataStore, SharedStore};

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env peut fournir AQUASENSE_CONFIG / RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aquasense_kernel=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = load_config().await;

    let store: SharedStore = Arc::new(DataStore::open(&cfg.store.data_file));

    let simulator = Simulator::new(cfg.simulator.noise_level)
        .context("invalid simulator configuration")?;

    let health = HealthTracker::new();

    scheduler::spawn_scheduler(
        store.clone(),
        Arc::new(simulator),
        health.clone(),
        Duration::from_secs(cfg.scheduler.interval_secs),
    );

    let app = http::build_router(AppState { store, health }, &cfg.http.cors);

    let addr: SocketAddr = format!("{}:{}", cfg.http.host, cfg.http.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.http.host, cfg.http.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on http://{addr}");

    axum::serve(listener, app).await.context("http server error")?;
    Ok(())
}
