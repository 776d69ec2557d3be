use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::explain::{self, ShapValue};
use crate::features::{self, ModelDomain, ValidationError};
use crate::journal::Journal;
use crate::placeholder;
use crate::recommend;
use crate::registry::ModelRegistry;
use crate::tier::RiskTier;

/// A completed risk prediction, serialized in the wire shape the dashboard
/// frontend consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub risk_score: f64,
    pub risk_tier: RiskTier,
    pub model_version: String,
    pub recommendations: Vec<String>,
    pub shap_values: Vec<ShapValue>,
}

#[derive(Debug)]
pub enum ScoreError {
    Validation(ValidationError),
    /// No artifact loaded and the placeholder scorer is disabled
    ModelUnavailable(ModelDomain),
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::Validation(e) => e.fmt(f),
            ScoreError::ModelUnavailable(domain) => {
                write!(f, "no model loaded for {} and placeholder scoring is disabled", domain)
            }
        }
    }
}

impl std::error::Error for ScoreError {}

/// Core scoring engine - validate, infer, tier, explain, recommend, journal.
pub struct ScoringEngine {
    pub config: Arc<Config>,
    pub registry: Arc<ModelRegistry>,
    pub journal: Arc<Journal>,
    predictions_total: AtomicU64,
    supplier_predictions: AtomicU64,
    shipment_predictions: AtomicU64,
    inventory_predictions: AtomicU64,
    model_served: AtomicU64,
    placeholder_served: AtomicU64,
    validation_failures: AtomicU64,
    latency_sum_us: AtomicU64,
    latency_count: AtomicU64,
}

impl ScoringEngine {
    pub fn new(config: Arc<Config>) -> Self {
        let registry = Arc::new(ModelRegistry::new(&config.models));
        registry.load_all();
        let journal = Arc::new(Journal::new(&config.journal));
        Self {
            config,
            registry,
            journal,
            predictions_total: AtomicU64::new(0),
            supplier_predictions: AtomicU64::new(0),
            shipment_predictions: AtomicU64::new(0),
            inventory_predictions: AtomicU64::new(0),
            model_served: AtomicU64::new(0),
            placeholder_served: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
        }
    }

    /// Handle one prediction request for a domain.
    pub fn predict(&self, domain: ModelDomain, payload: &Value) -> Result<Prediction, ScoreError> {
        let start = std::time::Instant::now();

        // Validation runs on every path, including placeholder
        let fv = features::validate(domain, payload).map_err(|e| {
            self.validation_failures.fetch_add(1, Ordering::Relaxed);
            debug!("{}: validation failed: {}", domain, e);
            ScoreError::Validation(e)
        })?;

        let prediction = match self.registry.get(domain) {
            Some(loaded) => {
                let score = loaded.model.predict_score(&fv);
                let attributions = explain::attribute(&loaded.model, &fv);
                let shap = explain::shap_values(&attributions, &self.config.explain);
                let recommendations =
                    recommend::for_attributions(domain, &attributions, self.config.explain.top_k);
                self.model_served.fetch_add(1, Ordering::Relaxed);
                Prediction {
                    risk_score: score,
                    risk_tier: RiskTier::from_score(score),
                    model_version: loaded.model.version.clone(),
                    recommendations,
                    shap_values: shap,
                }
            }
            None if self.config.scoring.allow_placeholder => {
                let score = placeholder::random_score();
                self.placeholder_served.fetch_add(1, Ordering::Relaxed);
                Prediction {
                    risk_score: score,
                    risk_tier: RiskTier::from_score(score),
                    model_version: placeholder::PLACEHOLDER_VERSION.to_string(),
                    recommendations: placeholder::recommendations(domain),
                    shap_values: placeholder::shap_values(domain),
                }
            }
            None => return Err(ScoreError::ModelUnavailable(domain)),
        };

        let latency = start.elapsed();
        self.predictions_total.fetch_add(1, Ordering::Relaxed);
        self.domain_counter(domain).fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);

        self.journal.record(
            domain,
            prediction.risk_score,
            prediction.risk_tier,
            &prediction.model_version,
            latency,
        );

        debug!(
            "{}: score={:.1} tier={} model={} ({}us)",
            domain,
            prediction.risk_score,
            prediction.risk_tier.as_str(),
            prediction.model_version,
            latency.as_micros()
        );
        Ok(prediction)
    }

    fn domain_counter(&self, domain: ModelDomain) -> &AtomicU64 {
        match domain {
            ModelDomain::Supplier => &self.supplier_predictions,
            ModelDomain::Shipment => &self.shipment_predictions,
            ModelDomain::Inventory => &self.inventory_predictions,
        }
    }

    /// Engine counters for the stats API.
    pub fn get_stats(&self) -> serde_json::Value {
        let count = self.latency_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let avg_latency_us = if count > 0 { sum / count } else { 0 };
        serde_json::json!({
            "predictions_total": self.predictions_total.load(Ordering::Relaxed),
            "by_domain": {
                "supplier": self.supplier_predictions.load(Ordering::Relaxed),
                "shipment": self.shipment_predictions.load(Ordering::Relaxed),
                "inventory": self.inventory_predictions.load(Ordering::Relaxed),
            },
            "model_served": self.model_served.load(Ordering::Relaxed),
            "placeholder_served": self.placeholder_served.load(Ordering::Relaxed),
            "validation_failures": self.validation_failures.load(Ordering::Relaxed),
            "avg_latency_us": avg_latency_us,
            "registry": self.registry.get_stats(),
            "journal": self.journal.get_stats(),
        })
    }
}
