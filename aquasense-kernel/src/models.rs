use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Valeur échantillonnée d'un paramètre.
///
/// Les comptages microbiens sont des nombres entiers de colonies (entiers JSON) ;
/// tous les autres paramètres sont des mesures sérialisées en flottant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Count(u64),
    Measure(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Count(c) => c as f64,
            ParamValue::Measure(v) => v,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParamValue::Count(c) => write!(f, "{}", c),
            // une décimale sur les mesures entières ("35.0 NTU", pas "35 NTU")
            ParamValue::Measure(v) if v.fract() == 0.0 => write!(f, "{:.1}", v),
            ParamValue::Measure(v) => write!(f, "{}", v),
        }
    }
}

/// Échantillon capteur synthétisé pour un scénario / site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub scenario: String,
    pub name: String,
    pub location: String,
    pub timestamp: String, // RFC3339, heure de génération
    pub data: BTreeMap<String, ParamValue>,
}

impl Reading {
    pub fn value(&self, param: &str) -> Option<f64> {
        self.data.get(param).map(ParamValue::as_f64)
    }

    pub fn param(&self, param: &str) -> Option<&ParamValue> {
        self.data.get(param)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Biological,
    Physical,
    Chemical,
}

/// Dépassement de seuil dérivé d'une lecture au moment de l'append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    #[serde(rename = "type")]
    pub category: AlertCategory,
    pub message: String,
    pub timestamp: String,
    pub location: String,
}
