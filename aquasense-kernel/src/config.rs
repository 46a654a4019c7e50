use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "AQUASENSE_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KernelConfig {
    pub http: HttpConf,
    pub store: StoreConf,
    pub simulator: SimulatorConf,
    pub scheduler: SchedulerConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConf {
    pub host: String,
    pub port: u16,
    pub cors: CorsConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CorsConf {
    pub allowed_origins: Vec<String>, // "*" = toute origine
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConf {
    pub data_file: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SimulatorConf {
    pub noise_level: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerConf {
    pub interval_secs: u64,
}

impl Default for HttpConf {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            cors: CorsConf::default(),
        }
    }
}

impl Default for CorsConf {
    fn default() -> Self {
        Self { allowed_origins: vec!["*".into()] }
    }
}

impl Default for StoreConf {
    fn default() -> Self {
        Self { data_file: "sensor_data.json".into() }
    }
}

impl Default for SimulatorConf {
    fn default() -> Self {
        Self { noise_level: crate::simulator::DEFAULT_NOISE_LEVEL }
    }
}

impl Default for SchedulerConf {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "kernel.yaml".into());
    load_config_from(&path).await
}

pub async fn load_config_from(path: &str) -> KernelConfig {
    if !Path::new(path).exists() {
        info!(path, "no config file, using defaults");
        return KernelConfig::default();
    }
    let txt = fs::read_to_string(path).await.unwrap_or_default();
    if txt.trim().is_empty() {
        return KernelConfig::default();
    }
    serde_yaml::from_str(&txt).unwrap_or_else(|e| {
        warn!(path, error = %e, "invalid config, using defaults");
        KernelConfig::default()
    })
}
