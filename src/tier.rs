use serde::Serialize;

/// Categorical risk bucket. Thresholds are fixed contract values shared
/// with the dashboard frontend: 30 / 60 / 80.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            RiskTier::Low
        } else if score < 60.0 {
            RiskTier::Medium
        } else if score < 80.0 {
            RiskTier::High
        } else {
            RiskTier::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_score(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(29.99), RiskTier::Low);
        assert_eq!(RiskTier::from_score(30.0), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(59.99), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(60.0), RiskTier::High);
        assert_eq!(RiskTier::from_score(79.99), RiskTier::High);
        assert_eq!(RiskTier::from_score(80.0), RiskTier::Critical);
        assert_eq!(RiskTier::from_score(100.0), RiskTier::Critical);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskTier::Critical).unwrap(), "\"critical\"");
    }
}
