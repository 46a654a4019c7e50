use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use crate::store::DataStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub status: String, // starting | ok | degraded
    pub uptime_seconds: u64,
    pub ticks_completed: u64,
    pub ticks_failed: u64,
    pub last_tick_at: Option<String>,
    pub readings_stored: usize,
    pub alerts_stored: usize,
}

/// Compteurs du scheduler partagés avec la couche HTTP.
#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    ticks_completed: Arc<AtomicU64>,
    ticks_failed: Arc<AtomicU64>,
    last_tick_failed: Arc<AtomicBool>,
    last_tick_at: Arc<parking_lot::Mutex<Option<String>>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ticks_completed: Arc::new(AtomicU64::new(0)),
            ticks_failed: Arc::new(AtomicU64::new(0)),
            last_tick_failed: Arc::new(AtomicBool::new(false)),
            last_tick_at: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    pub fn record_tick(&self, finished_at: String) {
        self.ticks_completed.fetch_add(1, Ordering::Relaxed);
        self.last_tick_failed.store(false, Ordering::Relaxed);
        *self.last_tick_at.lock() = Some(finished_at);
    }

    pub fn record_failure(&self) {
        self.ticks_failed.fetch_add(1, Ordering::Relaxed);
        self.last_tick_failed.store(true, Ordering::Relaxed);
    }

    pub fn get_health(&self, store: &DataStore) -> KernelHealth {
        let completed = self.ticks_completed.load(Ordering::Relaxed);
        let failed = self.ticks_failed.load(Ordering::Relaxed);
        let (readings, alerts) = store.counts();

        let status = if self.last_tick_failed.load(Ordering::Relaxed) {
            "degraded"
        } else if completed == 0 {
            "starting"
        } else {
            "ok"
        };

        KernelHealth {
            status: status.to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            ticks_completed: completed,
            ticks_failed: failed,
            last_tick_at: self.last_tick_at.lock().clone(),
            readings_stored: readings,
            alerts_stored: alerts,
        }
    }
}
