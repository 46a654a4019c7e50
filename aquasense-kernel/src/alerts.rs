//! Règles de seuil évaluées sur chaque lecture stockée.
//!
//! Les règles sont indépendantes : une même lecture peut lever plusieurs
//! alertes, y compris un critique et un warning sur le même paramètre (pH).

use crate::models::{Alert, AlertCategory, AlertLevel, Reading};
use crate::scenarios::{AMMONIA, E_COLI, IRON, MANGANESE, PH, RESIDUAL_CHLORINE, TOTAL_COLIFORMS, TURBIDITY};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AlertError {
    #[error("Malformed reading: missing parameter '{parameter}'")]
    MalformedReading { parameter: &'static str },
}

struct AlertRule {
    level: AlertLevel,
    category: AlertCategory,
    param: &'static str,
    breached: fn(f64) -> bool,
    prefix: &'static str,
    suffix: &'static str,
}

const RULES: &[AlertRule] = &[
    AlertRule {
        level: AlertLevel::Critical,
        category: AlertCategory::Biological,
        param: E_COLI,
        breached: |v| v > 100.0,
        prefix: "High E.coli levels detected: ",
        suffix: " CFU/100mL",
    },
    AlertRule {
        level: AlertLevel::Critical,
        category: AlertCategory::Physical,
        param: TURBIDITY,
        breached: |v| v > 30.0,
        prefix: "Critical turbidity levels: ",
        suffix: " NTU",
    },
    AlertRule {
        level: AlertLevel::Critical,
        category: AlertCategory::Chemical,
        param: PH,
        breached: |v| v < 5.0 || v > 9.0,
        prefix: "pH out of safe range: ",
        suffix: "",
    },
    AlertRule {
        level: AlertLevel::Critical,
        category: AlertCategory::Biological,
        param: TOTAL_COLIFORMS,
        breached: |v| v > 50.0,
        prefix: "High total coliforms: ",
        suffix: " CFU/100mL",
    },
    AlertRule {
        level: AlertLevel::Warning,
        category: AlertCategory::Physical,
        param: TURBIDITY,
        breached: |v| v > 10.0 && v <= 30.0,
        prefix: "Elevated turbidity: ",
        suffix: " NTU",
    },
    AlertRule {
        level: AlertLevel::Warning,
        category: AlertCategory::Chemical,
        param: RESIDUAL_CHLORINE,
        breached: |v| v < 0.2,
        prefix: "Low residual chlorine: ",
        suffix: " mg/L",
    },
    AlertRule {
        level: AlertLevel::Warning,
        category: AlertCategory::Chemical,
        param: PH,
        breached: |v| v < 6.5 || v > 8.5,
        prefix: "pH outside optimal range: ",
        suffix: "",
    },
    AlertRule {
        level: AlertLevel::Warning,
        category: AlertCategory::Chemical,
        param: IRON,
        breached: |v| v > 0.3,
        prefix: "High iron content: ",
        suffix: " mg/L",
    },
    AlertRule {
        level: AlertLevel::Warning,
        category: AlertCategory::Chemical,
        param: MANGANESE,
        breached: |v| v > 0.1,
        prefix: "Elevated manganese: ",
        suffix: " mg/L",
    },
    AlertRule {
        level: AlertLevel::Warning,
        category: AlertCategory::Chemical,
        param: AMMONIA,
        breached: |v| v > 0.5,
        prefix: "High ammonia levels: ",
        suffix: " mg/L",
    },
];

/// Évalue toutes les règles dans l'ordre déclaré.
///
/// Chaque paramètre référencé par une règle doit être présent ; sinon rien
/// n'est émis et `MalformedReading` nomme le premier manquant.
pub fn evaluate(reading: &Reading) -> Result<Vec<Alert>, AlertError> {
    if let Some(rule) = RULES.iter().find(|rule| reading.param(rule.param).is_none()) {
        return Err(AlertError::MalformedReading { parameter: rule.param });
    }

    let alerts = RULES
        .iter()
        .filter_map(|rule| {
            let value = reading.param(rule.param)?;
            (rule.breached)(value.as_f64()).then(|| Alert {
                level: rule.level,
                category: rule.category,
                message: format!("{}{}{}", rule.prefix, value, rule.suffix),
                timestamp: reading.timestamp.clone(),
                location: reading.location.clone(),
            })
        })
        .collect();

    Ok(alerts)
}
