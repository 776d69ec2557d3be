use std::fmt;

use serde_json::Value;

/// The three risk models served by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelDomain {
    Supplier,
    Shipment,
    Inventory,
}

impl ModelDomain {
    pub const ALL: [ModelDomain; 3] =
        [ModelDomain::Supplier, ModelDomain::Shipment, ModelDomain::Inventory];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelDomain::Supplier => "supplier",
            ModelDomain::Shipment => "shipment",
            ModelDomain::Inventory => "inventory",
        }
    }

    /// Artifact file name inside the models directory
    pub fn artifact_file(&self) -> &'static str {
        match self {
            ModelDomain::Supplier => "supplier_model.json",
            ModelDomain::Shipment => "shipment_model.json",
            ModelDomain::Inventory => "inventory_model.json",
        }
    }

    pub fn schema(&self) -> &'static [FeatureSpec] {
        match self {
            ModelDomain::Supplier => SUPPLIER_SCHEMA,
            ModelDomain::Shipment => SHIPMENT_SCHEMA,
            ModelDomain::Inventory => INVENTORY_SCHEMA,
        }
    }
}

impl fmt::Display for ModelDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Continuous,
    /// Must be exactly 0 or 1
    Binary,
    /// Integer-valued within range
    Ordinal,
}

/// One feature the model expects: name, kind, and the inclusive range
/// enforced at the API boundary.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
    pub min: f64,
    pub max: f64,
}

const fn cont(name: &'static str, min: f64, max: f64) -> FeatureSpec {
    FeatureSpec { name, kind: FeatureKind::Continuous, min, max }
}

const fn binary(name: &'static str) -> FeatureSpec {
    FeatureSpec { name, kind: FeatureKind::Binary, min: 0.0, max: 1.0 }
}

const fn ordinal(name: &'static str, min: f64, max: f64) -> FeatureSpec {
    FeatureSpec { name, kind: FeatureKind::Ordinal, min, max }
}

/// Supplier risk features with the ranges documented by the upstream model
/// training pipeline.
pub static SUPPLIER_SCHEMA: &[FeatureSpec] = &[
    cont("onTimeDeliveryRate", 0.0, 99.99),
    cont("financialScore", 0.0, 99.99),
    cont("defectRate", 0.0, 30.0),
    cont("disputeFrequency", 0.0, 20.0),
    binary("geopoliticalRiskFlag"),
    ordinal("totalShipments", 1.0, 299.0),
    cont("averageDelayDays", 0.0, 20.0),
    ordinal("daysSinceLastShip", 0.0, 180.0),
    ordinal("activeShipmentCount", 0.0, 49.0),
    ordinal("categoryRisk", 0.0, 3.0),
];

/// Shipment delay/cancellation risk features.
pub static SHIPMENT_SCHEMA: &[FeatureSpec] = &[
    cont("etaDeviationHours", 0.0, 240.0),
    ordinal("weatherLevel", 0.0, 5.0),
    cont("carrierReliability", 0.0, 99.99),
    ordinal("routeRisk", 0.0, 3.0),
    cont("transitDays", 0.0, 60.0),
    cont("distanceKm", 1.0, 20_000.0),
    ordinal("handoffCount", 0.0, 10.0),
    binary("customsFlag"),
    cont("priorDelayRate", 0.0, 100.0),
    cont("valueUsd", 0.0, 1_000_000.0),
];

/// Inventory stockout/overstock risk features.
pub static INVENTORY_SCHEMA: &[FeatureSpec] = &[
    cont("currentStock", 0.0, 100_000.0),
    cont("averageDailyDemand", 0.0, 5_000.0),
    cont("leadTimeDays", 0.0, 90.0),
    cont("safetyStock", 0.0, 50_000.0),
    cont("reorderPoint", 0.0, 50_000.0),
    cont("demandVolatility", 0.0, 100.0),
    cont("daysOfSupply", 0.0, 365.0),
    ordinal("openPurchaseOrders", 0.0, 50.0),
    ordinal("shelfLifeDays", 0.0, 3_650.0),
    cont("seasonalityIndex", 0.0, 3.0),
];

/// Feature values in schema order, ready for model input.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    pub domain: ModelDomain,
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Min-max scale each value into [0,1] against its schema range.
    pub fn normalized(&self) -> Vec<f64> {
        self.domain
            .schema()
            .iter()
            .zip(&self.values)
            .map(|(spec, v)| {
                let span = spec.max - spec.min;
                if span > 0.0 { (v - spec.min) / span } else { 0.0 }
            })
            .collect()
    }
}

/// All problems found in one payload, reported together so a caller can fix
/// them in a single round trip.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub domain: ModelDomain,
    pub problems: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} features: {}", self.domain, self.problems.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Validate a raw JSON payload against the domain schema and extract the
/// ordered feature vector. Unknown keys are ignored.
pub fn validate(domain: ModelDomain, payload: &Value) -> Result<FeatureVector, ValidationError> {
    let obj = match payload.as_object() {
        Some(obj) => obj,
        None => {
            return Err(ValidationError {
                domain,
                problems: vec!["request body must be a JSON object of feature values".to_string()],
            });
        }
    };

    let schema = domain.schema();
    let mut values = Vec::with_capacity(schema.len());
    let mut problems = Vec::new();

    for spec in schema {
        let raw = match obj.get(spec.name) {
            Some(raw) => raw,
            None => {
                problems.push(format!("{}: missing", spec.name));
                values.push(f64::NAN);
                continue;
            }
        };

        let v = match raw.as_f64() {
            Some(v) if v.is_finite() => v,
            _ => {
                problems.push(format!("{}: must be a finite number", spec.name));
                values.push(f64::NAN);
                continue;
            }
        };

        if v < spec.min || v > spec.max {
            problems.push(format!(
                "{}: {} outside range [{}, {}]",
                spec.name, v, spec.min, spec.max
            ));
        } else {
            match spec.kind {
                FeatureKind::Binary if v != 0.0 && v != 1.0 => {
                    problems.push(format!("{}: must be 0 or 1", spec.name));
                }
                FeatureKind::Ordinal if v.fract() != 0.0 => {
                    problems.push(format!("{}: must be an integer", spec.name));
                }
                _ => {}
            }
        }
        values.push(v);
    }

    if problems.is_empty() {
        Ok(FeatureVector { domain, values })
    } else {
        Err(ValidationError { domain, problems })
    }
}
