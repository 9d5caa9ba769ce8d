//! Fire danger bands for a predicted FWI value

use serde::{Deserialize, Serialize};

/// Danger class shown to users alongside the raw index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskLevel {
    /// Classify an FWI value; bands are half-open at 6, 12 and 20
    pub fn from_fwi(fwi: f64) -> Self {
        if fwi < 6.0 {
            RiskLevel::Low
        } else if fwi < 12.0 {
            RiskLevel::Moderate
        } else if fwi < 20.0 {
            RiskLevel::High
        } else {
            RiskLevel::Extreme
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Extreme => "Extreme",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        assert_eq!(RiskLevel::from_fwi(-0.5), RiskLevel::Low);
        assert_eq!(RiskLevel::from_fwi(5.999), RiskLevel::Low);
        assert_eq!(RiskLevel::from_fwi(6.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_fwi(12.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_fwi(19.999), RiskLevel::High);
        assert_eq!(RiskLevel::from_fwi(20.0), RiskLevel::Extreme);
    }

    #[test]
    fn bands_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Extreme);
        assert_eq!(RiskLevel::Moderate.to_string(), "Moderate");
    }
}
