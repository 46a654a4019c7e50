//! Boucle de génération périodique : une lecture par site à chaque tick.

use crate::health::HealthTracker;
use crate::scenarios::{self, E_COLI, PH, RESIDUAL_CHLORINE, TURBIDITY};
use crate::simulator::{Simulator, SimulatorError};
use crate::store::SharedStore;
use std::sync::Arc;
use std::time::Duration;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Default)]
pub struct TickReport {
    pub readings: usize,
    pub alerts: usize,
}

/// Génère et stocke une lecture pour chaque scénario, dans l'ordre déclaré.
///
/// Bloquant : chaque append réécrit le fichier du store.
pub fn run_tick(store: &SharedStore, simulator: &Simulator) -> Result<TickReport, SimulatorError> {
    let mut report = TickReport::default();

    for scenario in scenarios::all() {
        let reading = simulator.generate(Some(scenario.key))?;
        let value = |param: &str| reading.value(param).unwrap_or(f64::NAN);

        info!(
            location = %reading.location,
            status = %reading.name,
            timestamp = %reading.timestamp,
            ph = %format!("{:.1}", value(PH)),
            turbidity_ntu = %format!("{:.1}", value(TURBIDITY)),
            e_coli_cfu = value(E_COLI),
            chlorine_mg_l = %format!("{:.2}", value(RESIDUAL_CHLORINE)),
            "new reading generated"
        );

        let raised = store.append(reading);
        report.readings += 1;
        report.alerts += raised.len();
    }

    Ok(report)
}

/// Démarre la boucle de génération sur le runtime. Elle ne s'arrête jamais
/// d'elle-même ; un tick en erreur ou qui panique est loggé et le suivant tourne.
pub fn spawn_scheduler(
    store: SharedStore,
    simulator: Arc<Simulator>,
    health: HealthTracker,
    interval: Duration,
) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "starting sensor scheduler");
    spawn_loop(interval, health, move || run_tick(&store, &simulator))
}

/// Exécute `tick` sur un thread bloquant, comptabilise l'issue, puis dort `interval`.
fn spawn_loop<F>(interval: Duration, health: HealthTracker, tick: F) -> JoinHandle<()>
where
    F: Fn() -> Result<TickReport, SimulatorError> + Send + Sync + 'static,
{
    let tick = Arc::new(tick);

    tokio::spawn(async move {
        loop {
            let run = tick.clone();
            let outcome = tokio::task::spawn_blocking(move || (*run)()).await;

            match outcome {
                Ok(Ok(report)) => {
                    let now = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
                    info!(readings = report.readings, alerts = report.alerts, "tick complete");
                    health.record_tick(now);
                }
                Ok(Err(e)) => {
                    error!(error = %e, "error updating sensor data");
                    health.record_failure();
                }
                Err(e) => {
                    error!(error = ?e, "sensor tick panicked");
                    health.record_failure();
                }
            }

            // mesuré depuis la fin du tick, la dérive n'est pas corrigée
            tokio::time::sleep(interval).await;
        }
    })
}
