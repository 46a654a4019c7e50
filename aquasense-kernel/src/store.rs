/**
 * DATA STORE - Historique borné et persisté des lectures capteurs et alertes
 *
 * RÔLE :
 * Détient la dernière lecture, les 1000 dernières lectures et les 100 dernières alertes.
 * Écrit par le scheduler, lu en parallèle par les handlers HTTP.
 *
 * FONCTIONNEMENT :
 * - État derrière un RwLock parking_lot : un lecteur ne voit jamais un append à moitié appliqué
 * - Écrivains sérialisés par un mutex de persistance : les snapshots arrivent sur disque dans l'ordre
 * - Document complet réécrit après chaque mutation (fichier temporaire + fsync + rename)
 * - Le chargement n'échoue jamais : fichier absent ou corrompu = store vide
 * - Au chargement, latest_reading est réaligné sur la dernière entrée de l'historique
 */

use crate::alerts;
use crate::models::{Alert, Reading};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const HISTORY_CAPACITY: usize = 1000;
pub const ALERT_CAPACITY: usize = 100;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const DEFAULT_ALERT_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] io::Error),
    #[error("Corrupt store document: {0}")]
    CorruptDocument(#[from] serde_json::Error),
}

/// Format du document sur disque. Chaque champ a une valeur par défaut (fichiers partiels acceptés).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub latest_reading: Option<Reading>,
    #[serde(default)]
    pub historical_readings: VecDeque<Reading>,
    #[serde(default)]
    pub alerts: VecDeque<Alert>,
}

impl StoreState {
    fn enforce_bounds(&mut self) {
        trim_front(&mut self.historical_readings, HISTORY_CAPACITY);
        trim_front(&mut self.alerts, ALERT_CAPACITY);
    }

    /// Rétablit `latest == dernière entrée de l'historique` sur un document chargé.
    /// Une lecture "latest" seule est reprise dans l'historique.
    fn reconcile_latest(&mut self) {
        if self.historical_readings.is_empty() {
            if let Some(reading) = self.latest_reading.take() {
                self.historical_readings.push_back(reading);
            }
        }
        self.latest_reading = self.historical_readings.back().cloned();
    }
}

fn trim_front<T>(items: &mut VecDeque<T>, cap: usize) {
    while items.len() > cap {
        items.pop_front();
    }
}

/// Les `limit` éléments les plus récents, du plus ancien au plus récent. `0` = tout.
fn tail<T: Clone>(items: &VecDeque<T>, limit: usize) -> Vec<T> {
    let skip = match limit {
        0 => 0,
        n => items.len().saturating_sub(n),
    };
    items.iter().skip(skip).cloned().collect()
}

/// Vue `/api/all-locations`, calculée sous un seul verrou de lecture.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationsView {
    pub locations: Vec<Reading>,
    pub timestamp: Option<String>,
}

pub struct DataStore {
    path: PathBuf,
    state: RwLock<StoreState>,
    persist_lock: Mutex<()>,
}

pub type SharedStore = Arc<DataStore>;

impl DataStore {
    /// Ouvre le store à `path` en chargeant l'état valide qui s'y trouve.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let state = match read_state(&path) {
            Ok(Some(state)) => {
                info!(
                    path = %path.display(),
                    readings = state.historical_readings.len(),
                    alerts = state.alerts.len(),
                    "loaded persisted sensor data"
                );
                state
            }
            Ok(None) => {
                info!(path = %path.display(), "no data file yet, creating new data store");
                StoreState::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load data file, starting fresh");
                StoreState::default()
            }
        };

        Self {
            path,
            state: RwLock::new(state),
            persist_lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enregistre une lecture, en dérive les alertes et persiste le nouvel état.
    ///
    /// Retourne les alertes levées par cette lecture. Un échec de persistance
    /// est loggé ; l'état mémoire garde la lecture dans tous les cas.
    pub fn append(&self, reading: Reading) -> Vec<Alert> {
        let raised = match alerts::evaluate(&reading) {
            Ok(raised) => raised,
            Err(e) => {
                error!(location = %reading.location, error = %e, "alert evaluation skipped");
                Vec::new()
            }
        };

        let _writer = self.persist_lock.lock();
        let snapshot = {
            let mut state = self.state.write();
            state.latest_reading = Some(reading.clone());
            state.historical_readings.push_back(reading);
            state.alerts.extend(raised.iter().cloned());
            state.enforce_bounds();
            serde_json::to_string_pretty(&*state)
        };

        match snapshot {
            Ok(json) => self.persist(&json),
            Err(e) => error!(error = %e, "failed to serialize store state"),
        }
        raised
    }

    /// Vide lectures et alertes puis persiste le document vide.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn clear(&self) {
        let _writer = self.persist_lock.lock();
        let snapshot = {
            let mut state = self.state.write();
            *state = StoreState::default();
            serde_json::to_string_pretty(&*state)
        };
        match snapshot {
            Ok(json) => self.persist(&json),
            Err(e) => error!(error = %e, "failed to serialize store state"),
        }
        info!(path = %self.path.display(), "data store cleared");
    }

    pub fn get_latest(&self) -> Option<Reading> {
        self.state.read().latest_reading.clone()
    }

    pub fn get_history(&self, limit: usize) -> Vec<Reading> {
        tail(&self.state.read().historical_readings, limit)
    }

    pub fn get_alerts(&self, limit: usize) -> Vec<Alert> {
        tail(&self.state.read().alerts, limit)
    }

    /// Une lecture par site distinct parmi les `window` dernières lectures,
    /// dans l'ordre de première apparition, avec l'horodatage de la dernière
    /// lecture. Les deux viennent du même verrou de lecture.
    pub fn latest_by_location(&self, window: usize) -> LocationsView {
        let state = self.state.read();
        let mut seen = HashSet::new();
        let locations = tail(&state.historical_readings, window)
            .into_iter()
            .filter(|r| seen.insert(r.location.clone()))
            .collect();
        LocationsView {
            locations,
            timestamp: state.latest_reading.as_ref().map(|r| r.timestamp.clone()),
        }
    }

    /// (lectures conservées, alertes conservées)
    pub fn counts(&self) -> (usize, usize) {
        let state = self.state.read();
        (state.historical_readings.len(), state.alerts.len())
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }

    fn persist(&self, json: &str) {
        match write_atomic(&self.path, json) {
            Ok(()) => debug!(path = %self.path.display(), bytes = json.len(), "store persisted"),
            Err(e) => error!(path = %self.path.display(), error = %e, "failed to save sensor data"),
        }
    }
}

fn read_state(path: &Path) -> Result<Option<StoreState>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut state: StoreState = serde_json::from_str(&content)?;
    state.enforce_bounds();
    state.reconcile_latest();
    Ok(Some(state))
}

fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp)?;
    file.write_all(content.as_bytes())?;
    // le contenu doit être sur disque avant que le rename ne le publie
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::tests::{quiet_reading, with};
    use crate::models::{AlertCategory, AlertLevel, ParamValue};
    use crate::scenarios::{self, E_COLI, PH, RESIDUAL_CHLORINE};
    use crate::simulator::Simulator;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn numbered(i: usize) -> Reading {
        let mut r = quiet_reading();
        r.timestamp = format!("2025-03-01T10:00:00.{:06}Z", i);
        r
    }

    fn store_in(dir: &TempDir) -> DataStore {
        DataStore::open(dir.path().join("sensor_data.json"))
    }

    #[test]
    fn test_empty_store_reads() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.get_latest().is_none());
        assert!(store.get_history(DEFAULT_HISTORY_LIMIT).is_empty());
        assert!(store.get_alerts(DEFAULT_ALERT_LIMIT).is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_history_is_capped_and_evicts_oldest() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for i in 1..=1001 {
            store.append(numbered(i));
        }
        let all = store.get_history(0);
        assert_eq!(all.len(), HISTORY_CAPACITY);
        assert_eq!(all[0], numbered(2));
        assert_eq!(all[999], numbered(1001));
        assert_eq!(store.get_latest(), Some(numbered(1001)));
    }

    #[test]
    fn test_history_limit_returns_most_recent_oldest_first() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for i in 1..=5 {
            store.append(numbered(i));
        }
        assert_eq!(store.get_history(2), vec![numbered(4), numbered(5)]);
        assert_eq!(store.get_history(50).len(), 5);
        assert_eq!(store.get_history(0).len(), 5);
    }

    #[test]
    fn test_alerts_are_derived_on_append() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let raised = store.append(with(quiet_reading(), E_COLI, ParamValue::Count(150)));
        assert_eq!(raised.len(), 1);
        let stored = store.get_alerts(DEFAULT_ALERT_LIMIT);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].level, AlertLevel::Critical);
        assert_eq!(stored[0].category, AlertCategory::Biological);
        assert!(stored[0].message.contains("150"));

        let mut clean = quiet_reading();
        clean = with(clean, PH, ParamValue::Measure(7.0));
        clean = with(clean, RESIDUAL_CHLORINE, ParamValue::Measure(0.5));
        clean = with(clean, E_COLI, ParamValue::Count(0));
        assert!(store.append(clean).is_empty());
        assert_eq!(store.get_alerts(DEFAULT_ALERT_LIMIT).len(), 1);
    }

    #[test]
    fn test_alert_log_is_capped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for i in 0..101u64 {
            store.append(with(quiet_reading(), E_COLI, ParamValue::Count(101 + i)));
        }
        let alerts = store.get_alerts(0);
        assert_eq!(alerts.len(), ALERT_CAPACITY);
        assert_eq!(alerts[0].message, "High E.coli levels detected: 102 CFU/100mL");
        assert_eq!(alerts[99].message, "High E.coli levels detected: 201 CFU/100mL");
        assert_eq!(store.get_alerts(DEFAULT_ALERT_LIMIT).len(), 10);
    }

    #[test]
    fn test_malformed_reading_is_stored_without_alerts() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut reading = with(quiet_reading(), E_COLI, ParamValue::Count(900));
        reading.data.remove(PH);
        assert!(store.append(reading.clone()).is_empty());
        assert_eq!(store.get_latest(), Some(reading));
        assert!(store.get_alerts(0).is_empty());
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let sim = Simulator::default();
        let before = {
            let store = store_in(&dir);
            for scenario in scenarios::all() {
                store.append(sim.generate(Some(scenario.key)).unwrap());
            }
            store.append(with(quiet_reading(), E_COLI, ParamValue::Count(150)));
            store.snapshot()
        };

        let reopened = store_in(&dir);
        assert_eq!(reopened.snapshot(), before);
        assert_eq!(reopened.get_latest(), before.latest_reading);
    }

    #[test]
    fn test_document_layout() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(with(quiet_reading(), E_COLI, ParamValue::Count(150)));

        let raw = fs::read_to_string(store.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(doc["latest_reading"].is_object());
        assert_eq!(doc["historical_readings"].as_array().unwrap().len(), 1);
        assert_eq!(doc["alerts"][0]["type"], "biological");
        assert_eq!(doc["latest_reading"]["data"][E_COLI], 150);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sensor_data.json");
        fs::write(&path, "{ not json").unwrap();
        let store = DataStore::open(&path);
        assert!(store.get_latest().is_none());
        assert_eq!(store.counts(), (0, 0));

        // le prochain append remplace le document corrompu
        store.append(quiet_reading());
        assert_eq!(DataStore::open(&path).counts(), (1, 0));
    }

    #[test]
    fn test_partial_document_loads_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sensor_data.json");
        fs::write(&path, r#"{"latest_reading": null}"#).unwrap();
        let store = DataStore::open(&path);
        assert_eq!(store.snapshot(), StoreState::default());
    }

    #[test]
    fn test_latest_without_history_is_reconciled_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sensor_data.json");
        let doc = serde_json::json!({ "latest_reading": quiet_reading() });
        fs::write(&path, doc.to_string()).unwrap();

        let snap = DataStore::open(&path).snapshot();
        assert_eq!(snap.latest_reading.as_ref(), snap.historical_readings.back());
        assert_eq!(snap.historical_readings.len(), 1);
        assert_eq!(snap.latest_reading, Some(quiet_reading()));
    }

    #[test]
    fn test_stale_latest_is_realigned_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sensor_data.json");
        let doc = serde_json::json!({
            "latest_reading": numbered(1),
            "historical_readings": [numbered(1), numbered(2)],
        });
        fs::write(&path, doc.to_string()).unwrap();

        let store = DataStore::open(&path);
        assert_eq!(store.get_latest(), Some(numbered(2)));
        assert_eq!(store.counts(), (2, 0));
    }

    #[test]
    fn test_persist_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(quiet_reading());
        store.append(quiet_reading());

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["sensor_data.json"]);
        assert_eq!(store_in(&dir).counts(), (2, 0));
    }

    #[test]
    fn test_clear_resets_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(with(quiet_reading(), E_COLI, ParamValue::Count(150)));
        store.clear();
        assert_eq!(store.snapshot(), StoreState::default());
        assert_eq!(store_in(&dir).snapshot(), StoreState::default());
    }

    #[test]
    fn test_unwritable_path_keeps_memory_state() {
        let dir = TempDir::new().unwrap();
        // un dossier à la place du fichier fait échouer chaque rename
        let path = dir.path().join("occupied");
        fs::create_dir_all(path.join("child")).unwrap();
        let store = DataStore::open(&path);
        store.append(quiet_reading());
        assert_eq!(store.counts(), (1, 0));
        assert_eq!(store.get_latest(), Some(quiet_reading()));
    }

    #[test]
    fn test_latest_by_location_dedupes_window() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut a = quiet_reading();
        a.location = "A".into();
        let mut b = quiet_reading();
        b.location = "B".into();
        for r in [a.clone(), b.clone(), a.clone(), a.clone()] {
            store.append(r);
        }
        let view = store.latest_by_location(3);
        let locations: Vec<_> = view.locations.into_iter().map(|r| r.location).collect();
        assert_eq!(locations, vec!["B", "A"]);
        assert_eq!(view.timestamp, Some(a.timestamp));
    }

    #[test]
    fn test_locations_view_matches_window_under_appends() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));
        let located = |i: usize| {
            let mut r = numbered(i);
            r.location = format!("site-{}", i % 7);
            r
        };
        for i in 0..7 {
            store.append(located(i));
        }
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let store = store.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let view = store.latest_by_location(7);
                    assert_eq!(view.locations.len(), 7);
                    // 7 sites distincts : la plus récente de la fenêtre est la dernière
                    let newest = view.locations.last().map(|r| r.timestamp.clone());
                    assert_eq!(view.timestamp, newest);
                }
            })
        };

        for i in 7..200 {
            store.append(located(i));
        }
        done.store(true, Ordering::Relaxed);
        reader.join().unwrap();
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_state() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));
        for i in 0..995 {
            store.append(numbered(i));
        }
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let done = done.clone();
                std::thread::spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        let history = store.get_history(0);
                        assert!(history.len() <= HISTORY_CAPACITY);
                        // appends strictement croissants : toute fenêtre contiguë est ordonnée
                        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
                        let snap = store.snapshot();
                        assert_eq!(
                            snap.latest_reading.as_ref(),
                            snap.historical_readings.back()
                        );
                    }
                })
            })
            .collect();

        for i in 995..1030 {
            store.append(numbered(i));
        }
        done.store(true, Ordering::Relaxed);
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.counts().0, HISTORY_CAPACITY);
    }
}
