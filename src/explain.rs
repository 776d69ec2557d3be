use serde::Serialize;

use crate::config::ExplainConfig;
use crate::features::FeatureVector;
use crate::model::GbtModel;

/// Per-feature attribution pipeline (Saabas path attribution).
///
/// Walking each tree from root to leaf, every split moves the running
/// expectation from the current node to the taken child; that delta is
/// credited to the split feature. Summed over all trees, the credited
/// deltas plus the base score and root expectations reproduce the margin
/// exactly, so attributions are consistent with the prediction by
/// construction. Positive contribution pushes risk up.
#[derive(Debug, Clone)]
pub struct Attribution {
    pub feature: String,
    /// Raw log-odds contribution
    pub contribution: f64,
    /// Signed share of total absolute contribution, in [-1, 1]
    pub fraction: f64,
}

/// Wire entry, shape shared with the dashboard frontend.
#[derive(Debug, Clone, Serialize)]
pub struct ShapValue {
    pub feature: String,
    pub value: f64,
    pub impact: String,
}

/// Attribute a single prediction. Returns one entry per feature, sorted by
/// absolute contribution, largest first. A degenerate ensemble where no
/// split fires (all contributions zero) has no signal to rank by; the
/// ordering then falls back to the normalized feature values so the output
/// stays deterministic.
pub fn attribute(model: &GbtModel, fv: &FeatureVector) -> Vec<Attribution> {
    let mut contributions = vec![0.0f64; model.features.len()];

    for tree in &model.trees {
        let mut idx = 0;
        loop {
            let node = &tree.nodes[idx];
            let feature = match node.feature {
                None => break,
                Some(f) => f,
            };
            let next = if fv.values[feature] < node.threshold { node.left } else { node.right };
            contributions[feature] += tree.nodes[next].value - node.value;
            idx = next;
        }
    }

    let total: f64 = contributions.iter().map(|c| c.abs()).sum();
    let normalized = fv.normalized();
    let mut ranked: Vec<(f64, Attribution)> = model
        .features
        .iter()
        .zip(&contributions)
        .zip(&normalized)
        .map(|((name, &c), &n)| {
            let rank = if total > 0.0 { c.abs() } else { n };
            let attribution = Attribution {
                feature: name.clone(),
                contribution: c,
                fraction: if total > 0.0 { c / total } else { 0.0 },
            };
            (rank, attribution)
        })
        .collect();

    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(_, a)| a).collect()
}

/// Top-k attributions formatted for the response payload.
pub fn shap_values(attributions: &[Attribution], config: &ExplainConfig) -> Vec<ShapValue> {
    attributions
        .iter()
        .take(config.top_k)
        .map(|a| ShapValue {
            feature: a.feature.clone(),
            value: round4(a.fraction),
            impact: impact_label(a.fraction, config).to_string(),
        })
        .collect()
}

pub fn impact_label(fraction: f64, config: &ExplainConfig) -> &'static str {
    let magnitude = fraction.abs();
    if magnitude >= config.high_impact {
        "high"
    } else if magnitude >= config.medium_impact {
        "medium"
    } else {
        "low"
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{validate, ModelDomain};
    use crate::model::tests::{risky_supplier_payload, safe_supplier_payload, toy_supplier_model};
    use crate::model::{Node, Tree};

    #[test]
    fn test_attributions_reconstruct_margin() {
        let model = toy_supplier_model();
        for payload in [risky_supplier_payload(), safe_supplier_payload()] {
            let fv = validate(ModelDomain::Supplier, &payload).unwrap();
            let attributions = attribute(&model, &fv);
            let credited: f64 = attributions.iter().map(|a| a.contribution).sum();
            let roots: f64 = model.trees.iter().map(|t| t.nodes[0].value).sum();
            let margin = model.predict_margin(&fv.values);
            assert!(
                (model.base_score + roots + credited - margin).abs() < 1e-9,
                "attribution does not reconstruct margin"
            );
        }
    }

    #[test]
    fn test_risky_input_attributes_positive_to_risk_drivers() {
        let model = toy_supplier_model();
        let fv = validate(ModelDomain::Supplier, &risky_supplier_payload()).unwrap();
        let attributions = attribute(&model, &fv);
        let on_time = attributions.iter().find(|a| a.feature == "onTimeDeliveryRate").unwrap();
        assert!(on_time.contribution > 0.0, "low on-time rate should push risk up");
    }

    #[test]
    fn test_sorted_by_absolute_contribution() {
        let model = toy_supplier_model();
        let fv = validate(ModelDomain::Supplier, &risky_supplier_payload()).unwrap();
        let attributions = attribute(&model, &fv);
        for pair in attributions.windows(2) {
            assert!(pair[0].contribution.abs() >= pair[1].contribution.abs());
        }
    }

    #[test]
    fn test_zero_contribution_orders_by_normalized_value() {
        // Every tree a single leaf: no split fires, all contributions zero
        let mut model = toy_supplier_model();
        model.trees = vec![Tree {
            nodes: vec![Node { feature: None, threshold: 0.0, left: 0, right: 0, value: 0.3 }],
        }];
        let fv = validate(ModelDomain::Supplier, &risky_supplier_payload()).unwrap();
        let attributions = attribute(&model, &fv);

        assert!(attributions.iter().all(|a| a.contribution == 0.0 && a.fraction == 0.0));
        // geopoliticalRiskFlag and categoryRisk both normalize to 1.0 for
        // this payload; the sort is stable so schema order breaks the tie
        assert_eq!(attributions[0].feature, "geopoliticalRiskFlag");
        assert_eq!(attributions[1].feature, "categoryRisk");
        let normalized = fv.normalized();
        let rank_of = |name: &str| {
            let idx = ModelDomain::Supplier
                .schema()
                .iter()
                .position(|s| s.name == name)
                .unwrap();
            normalized[idx]
        };
        for pair in attributions.windows(2) {
            assert!(rank_of(&pair[0].feature) >= rank_of(&pair[1].feature));
        }
    }

    #[test]
    fn test_fractions_sum_to_at_most_one() {
        let model = toy_supplier_model();
        let fv = validate(ModelDomain::Supplier, &risky_supplier_payload()).unwrap();
        let total: f64 = attribute(&model, &fv).iter().map(|a| a.fraction.abs()).sum();
        assert!(total <= 1.0 + 1e-9);
    }

    #[test]
    fn test_shap_values_respect_top_k() {
        let model = toy_supplier_model();
        let fv = validate(ModelDomain::Supplier, &risky_supplier_payload()).unwrap();
        let attributions = attribute(&model, &fv);
        let config = ExplainConfig { top_k: 2, ..Default::default() };
        let shap = shap_values(&attributions, &config);
        assert_eq!(shap.len(), 2);
    }

    #[test]
    fn test_impact_labels() {
        let config = ExplainConfig::default();
        assert_eq!(impact_label(0.40, &config), "high");
        assert_eq!(impact_label(-0.30, &config), "high");
        assert_eq!(impact_label(0.15, &config), "medium");
        assert_eq!(impact_label(0.02, &config), "low");
    }
}
