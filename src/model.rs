use serde::{Deserialize, Serialize};

use crate::features::{FeatureVector, ModelDomain};

/// Gradient-boosted tree ensemble in a flat-array layout.
///
/// Artifact format (JSON, one file per domain):
/// ```json
/// {
///   "version": "supplier-2024.06.1",
///   "trained_at": "2024-06-14T09:30:00Z",
///   "base_score": -1.2,
///   "features": ["onTimeDeliveryRate", ...],
///   "trees": [
///     { "nodes": [
///       { "feature": 0, "threshold": 85.0, "left": 1, "right": 2,
///         "value": 0.02 },
///       { "feature": null, "threshold": 0.0, "left": 0, "right": 0,
///         "value": -0.31 },
///       ...
///     ]}
///   ]
/// }
/// ```
/// `value` on an internal node is the training-set expectation of its
/// subtree (used by the attribution walk); on a leaf it is the leaf weight.
/// Splits test `x[feature] < threshold`: true goes left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// None (or absent) marks a leaf
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk to the leaf for this input and return its weight.
    pub fn leaf_value(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            match node.feature {
                None => return node.value,
                Some(f) => {
                    idx = if x[f] < node.threshold { node.left } else { node.right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbtModel {
    pub version: String,
    #[serde(default)]
    pub trained_at: Option<String>,
    /// Log-odds prior added to every margin
    pub base_score: f64,
    /// Must match the domain schema, in order
    pub features: Vec<String>,
    pub trees: Vec<Tree>,
}

impl GbtModel {
    /// Raw log-odds margin for an input vector.
    pub fn predict_margin(&self, x: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.leaf_value(x)).sum::<f64>()
    }

    /// Risk score in [0, 100]: sigmoid of the margin, scaled.
    pub fn predict_score(&self, fv: &FeatureVector) -> f64 {
        sigmoid(self.predict_margin(&fv.values)) * 100.0
    }

    /// Structural validation against the domain schema. A bad artifact must
    /// never be swapped into the registry.
    pub fn validate(&self, domain: ModelDomain) -> anyhow::Result<()> {
        let schema = domain.schema();
        if self.features.len() != schema.len() {
            anyhow::bail!(
                "artifact lists {} features, {} schema has {}",
                self.features.len(),
                domain,
                schema.len()
            );
        }
        for (i, (artifact, spec)) in self.features.iter().zip(schema).enumerate() {
            if artifact.as_str() != spec.name {
                anyhow::bail!(
                    "feature {} is '{}', schema expects '{}'",
                    i,
                    artifact,
                    spec.name
                );
            }
        }
        if self.trees.is_empty() {
            anyhow::bail!("artifact has no trees");
        }
        for (ti, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                anyhow::bail!("tree {} is empty", ti);
            }
            for (ni, node) in tree.nodes.iter().enumerate() {
                if let Some(f) = node.feature {
                    if f >= schema.len() {
                        anyhow::bail!("tree {} node {}: feature index {} out of range", ti, ni, f);
                    }
                    // Children must come after their parent so traversal
                    // cannot loop.
                    if node.left <= ni || node.right <= ni {
                        anyhow::bail!("tree {} node {}: child index does not advance", ti, ni);
                    }
                    if node.left >= tree.nodes.len() || node.right >= tree.nodes.len() {
                        anyhow::bail!("tree {} node {}: child index out of bounds", ti, ni);
                    }
                    if !node.threshold.is_finite() {
                        anyhow::bail!("tree {} node {}: non-finite threshold", ti, ni);
                    }
                }
                if !node.value.is_finite() {
                    anyhow::bail!("tree {} node {}: non-finite value", ti, ni);
                }
            }
        }
        Ok(())
    }
}

pub fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}
