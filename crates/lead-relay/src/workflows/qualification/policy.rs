use crate::config::QualificationConfig;

/// Result of applying the revenue rule to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualificationDecision {
    Qualified,
    Disqualified,
}

/// Revenue-tier rule. Tiers are compared exactly; anything not listed qualifies.
#[derive(Debug, Clone)]
pub struct QualificationPolicy {
    disqualifying_tiers: Vec<String>,
}

impl QualificationPolicy {
    pub fn new(disqualifying_tiers: Vec<String>) -> Self {
        Self {
            disqualifying_tiers,
        }
    }

    pub fn decide(&self, monthly_revenue: &str) -> QualificationDecision {
        if self
            .disqualifying_tiers
            .iter()
            .any(|tier| tier == monthly_revenue)
        {
            QualificationDecision::Disqualified
        } else {
            QualificationDecision::Qualified
        }
    }
}

impl Default for QualificationPolicy {
    fn default() -> Self {
        Self::from(&QualificationConfig::default())
    }
}

impl From<&QualificationConfig> for QualificationPolicy {
    fn from(config: &QualificationConfig) -> Self {
        Self::new(config.disqualifying_tiers.clone())
    }
}
