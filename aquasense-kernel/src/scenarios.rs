//! Profils environnementaux statiques utilisés par le simulateur.
//!
//! Chaque scénario correspond à exactement un site surveillé. La table est
//! compilée et jamais modifiée ; l'ordre déclaré est celui dans lequel le
//! scheduler visite les sites à chaque tick.

pub const E_COLI: &str = "e_coli_ctu_100ml";
pub const FAECAL_COLIFORMS: &str = "faecal_coliforms_ctu_100ml";
pub const TOTAL_COLIFORMS: &str = "total_coliforms_ctu_100ml";
pub const PH: &str = "ph";
pub const TURBIDITY: &str = "turbidity_ntu";
pub const TEMPERATURE: &str = "temperature_c";
pub const RESIDUAL_CHLORINE: &str = "residual_chlorine_mg_l";
pub const IRON: &str = "iron_fe_mg_l";
pub const MANGANESE: &str = "manganese_mn_mg_l";
pub const AMMONIA: &str = "ammonia_nh3_mg_l";

/// Classe d'arrondi appliquée à une valeur échantillonnée.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Integer,
    OneDecimal,
    TwoDecimals,
}

pub fn precision_of(param: &str) -> Precision {
    match param {
        E_COLI | FAECAL_COLIFORMS | TOTAL_COLIFORMS => Precision::Integer,
        PH | TURBIDITY | TEMPERATURE => Precision::OneDecimal,
        _ => Precision::TwoDecimals,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub param: &'static str,
    pub min: f64,
    pub max: f64,
}

const fn r(param: &'static str, min: f64, max: f64) -> ParamRange {
    ParamRange { param, min, max }
}

#[derive(Debug, PartialEq)]
pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub location: &'static str,
    /// Probabilité relative quand aucun scénario n'est demandé.
    pub weight: f64,
    pub ranges: &'static [ParamRange],
}

impl Scenario {
    #[cfg(test)]
    pub fn range(&self, param: &str) -> Option<&ParamRange> {
        self.ranges.iter().find(|r| r.param == param)
    }
}

const CLEAN: &[ParamRange] = &[
    r(TEMPERATURE, 20.0, 25.0),
    r(TURBIDITY, 0.5, 3.0),
    r("electrical_conductivity_us_cm", 500.0, 800.0),
    r("total_suspended_solids_mg_l", 1.0, 5.0),
    r(PH, 7.0, 8.0),
    r(RESIDUAL_CHLORINE, 0.2, 0.6),
    r("dissolved_oxygen_mg_l", 7.0, 9.0),
    r("nitrates_no3_mg_l", 2.0, 8.0),
    r("nitrites_no2_mg_l", 0.01, 0.05),
    r(AMMONIA, 0.05, 0.15),
    r("phosphates_po4_mg_l", 0.05, 0.20),
    r("hardness_mg_l", 80.0, 150.0),
    r(IRON, 0.05, 0.15),
    r(MANGANESE, 0.01, 0.05),
    r(E_COLI, 0.0, 0.0),
    r(FAECAL_COLIFORMS, 0.0, 0.0),
    r(TOTAL_COLIFORMS, 0.0, 1.0),
    r("water_pressure_bar", 3.0, 4.0),
    r("flow_rate_l_s", 20.0, 28.0),
    r("alkalinity_mgL", 80.0, 120.0),
    r("color_ptco", 5.0, 15.0),
];

const TURBID: &[ParamRange] = &[
    r(TEMPERATURE, 22.0, 27.0),
    r(TURBIDITY, 15.0, 35.0),
    r("electrical_conductivity_us_cm", 800.0, 1200.0),
    r("total_suspended_solids_mg_l", 20.0, 50.0),
    r(PH, 6.5, 7.5),
    r(RESIDUAL_CHLORINE, 0.1, 0.3),
    r("dissolved_oxygen_mg_l", 5.0, 7.0),
    r("nitrates_no3_mg_l", 5.0, 15.0),
    r("nitrites_no2_mg_l", 0.05, 0.15),
    r(AMMONIA, 0.2, 0.5),
    r("phosphates_po4_mg_l", 0.2, 0.5),
    r("hardness_mg_l", 150.0, 250.0),
    r(IRON, 0.2, 0.5),
    r(MANGANESE, 0.1, 0.3),
    r(E_COLI, 0.0, 2.0),
    r(FAECAL_COLIFORMS, 0.0, 2.0),
    r(TOTAL_COLIFORMS, 1.0, 5.0),
    r("water_pressure_bar", 2.8, 3.5),
    r("flow_rate_l_s", 18.0, 25.0),
    r("alkalinity_mgL", 60.0, 90.0),
    r("color_ptco", 20.0, 40.0),
];

const CONTAMINATED: &[ParamRange] = &[
    r(TEMPERATURE, 22.0, 26.0),
    r(TURBIDITY, 5.0, 12.0),
    r("electrical_conductivity_us_cm", 1500.0, 2200.0),
    r("total_suspended_solids_mg_l", 8.0, 18.0),
    r(PH, 6.2, 7.0),
    r(RESIDUAL_CHLORINE, 0.2, 0.4),
    r("dissolved_oxygen_mg_l", 6.0, 8.0),
    r("nitrates_no3_mg_l", 4.0, 10.0),
    r("nitrites_no2_mg_l", 0.08, 0.2),
    r(AMMONIA, 0.15, 0.4),
    r("phosphates_po4_mg_l", 0.15, 0.35),
    r("hardness_mg_l", 250.0, 350.0),
    r(IRON, 0.5, 1.2),
    r(MANGANESE, 0.2, 0.5),
    r(E_COLI, 0.0, 0.0),
    r(FAECAL_COLIFORMS, 0.0, 1.0),
    r(TOTAL_COLIFORMS, 0.0, 3.0),
    r("water_pressure_bar", 3.2, 4.2),
    r("flow_rate_l_s", 17.0, 23.0),
    r("alkalinity_mgL", 100.0, 150.0),
    r("color_ptco", 50.0, 80.0),
];

const INDUSTRIAL: &[ParamRange] = &[
    r(TEMPERATURE, 24.0, 30.0),
    r(TURBIDITY, 8.0, 20.0),
    r("electrical_conductivity_us_cm", 1200.0, 1800.0),
    r("total_suspended_solids_mg_l", 15.0, 35.0),
    r(PH, 6.0, 7.5),
    r(RESIDUAL_CHLORINE, 0.1, 0.4),
    r("dissolved_oxygen_mg_l", 4.0, 7.0),
    r("nitrates_no3_mg_l", 8.0, 18.0),
    r("nitrites_no2_mg_l", 0.1, 0.3),
    r(AMMONIA, 0.3, 0.8),
    r("phosphates_po4_mg_l", 0.3, 0.8),
    r("hardness_mg_l", 200.0, 400.0),
    r(IRON, 0.3, 0.8),
    r(MANGANESE, 0.15, 0.4),
    r(E_COLI, 0.0, 1.0),
    r(FAECAL_COLIFORMS, 0.0, 2.0),
    r(TOTAL_COLIFORMS, 1.0, 4.0),
    r("water_pressure_bar", 2.5, 3.8),
    r("flow_rate_l_s", 15.0, 22.0),
    r("alkalinity_mgL", 90.0, 140.0),
    r("color_ptco", 25.0, 50.0),
];

const RESERVOIR: &[ParamRange] = &[
    r(TEMPERATURE, 21.0, 26.0),
    r(TURBIDITY, 2.0, 8.0),
    r("electrical_conductivity_us_cm", 600.0, 1000.0),
    r("total_suspended_solids_mg_l", 3.0, 12.0),
    r(PH, 6.8, 7.8),
    r(RESIDUAL_CHLORINE, 0.15, 0.5),
    r("dissolved_oxygen_mg_l", 6.5, 8.5),
    r("nitrates_no3_mg_l", 3.0, 9.0),
    r("nitrites_no2_mg_l", 0.02, 0.08),
    r(AMMONIA, 0.08, 0.25),
    r("phosphates_po4_mg_l", 0.08, 0.25),
    r("hardness_mg_l", 120.0, 200.0),
    r(IRON, 0.08, 0.25),
    r(MANGANESE, 0.02, 0.08),
    r(E_COLI, 0.0, 0.0),
    r(FAECAL_COLIFORMS, 0.0, 1.0),
    r(TOTAL_COLIFORMS, 0.0, 2.0),
    r("water_pressure_bar", 3.5, 4.5),
    r("flow_rate_l_s", 18.0, 26.0),
    r("alkalinity_mgL", 100.0, 160.0),
    r("color_ptco", 8.0, 20.0),
];

// Les deux stations de pompage tirent sur le même réseau de distribution.
const PUMP_STATION: &[ParamRange] = &[
    r(TEMPERATURE, 22.0, 27.0),
    r(TURBIDITY, 1.5, 6.0),
    r("electrical_conductivity_us_cm", 700.0, 1100.0),
    r("total_suspended_solids_mg_l", 2.0, 8.0),
    r(PH, 7.0, 8.2),
    r(RESIDUAL_CHLORINE, 0.2, 0.7),
    r("dissolved_oxygen_mg_l", 7.0, 9.0),
    r("nitrates_no3_mg_l", 2.5, 7.0),
    r("nitrites_no2_mg_l", 0.01, 0.06),
    r(AMMONIA, 0.06, 0.18),
    r("phosphates_po4_mg_l", 0.06, 0.22),
    r("hardness_mg_l", 90.0, 170.0),
    r(IRON, 0.06, 0.18),
    r(MANGANESE, 0.01, 0.06),
    r(E_COLI, 0.0, 0.0),
    r(FAECAL_COLIFORMS, 0.0, 0.0),
    r(TOTAL_COLIFORMS, 0.0, 1.0),
    r("water_pressure_bar", 4.0, 5.0),
    r("flow_rate_l_s", 22.0, 30.0),
    r("alkalinity_mgL", 110.0, 170.0),
    r("color_ptco", 6.0, 18.0),
];

static SCENARIOS: [Scenario; 7] = [
    Scenario {
        key: "clean",
        name: "✅ CLEAN DRINKING WATER",
        location: "Ggaba III Plant",
        weight: 0.25,
        ranges: CLEAN,
    },
    Scenario {
        key: "turbid",
        name: "🌀 HIGH TURBIDITY WATER",
        location: "Nakasero Hill Tank",
        weight: 0.15,
        ranges: TURBID,
    },
    Scenario {
        key: "contaminated",
        name: "⚠️ CONTAMINATED WATER",
        location: "Kyanja Reservoir",
        weight: 0.10,
        ranges: CONTAMINATED,
    },
    Scenario {
        key: "industrial",
        name: "🏭 INDUSTRIAL WATER",
        location: "Industrial Area Namanve",
        weight: 0.20,
        ranges: INDUSTRIAL,
    },
    Scenario {
        key: "reservoir",
        name: "💧 RESERVOIR WATER",
        location: "Mutungo Reservoir",
        weight: 0.15,
        ranges: RESERVOIR,
    },
    Scenario {
        key: "pump_kurambiro",
        name: "⚙️ PUMP STATION WATER",
        location: "Kurambiro Water Pump",
        weight: 0.10,
        ranges: PUMP_STATION,
    },
    Scenario {
        key: "pump_lubigi",
        name: "⚙️ PUMP STATION WATER",
        location: "Lubigi Water Pump",
        weight: 0.05,
        ranges: PUMP_STATION,
    },
];

/// Tous les scénarios, dans l'ordre déclaré.
pub fn all() -> &'static [Scenario] {
    &SCENARIOS
}

pub fn find(key: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.key == key)
}

pub fn keys() -> Vec<&'static str> {
    SCENARIOS.iter().map(|s| s.key).collect()
}
