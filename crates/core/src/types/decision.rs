//! Advisor decision payloads.
//!
//! The advisor produces loosely structured JSON. It is parsed and validated
//! here, once, into an [`AdvisorDecision`]; everything downstream works with
//! the typed record and never looks at the raw payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default proposed position size when the advisor does not supply one.
pub const DEFAULT_POSITION_SIZE: f64 = 0.1;

/// What the advisor wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl FromStr for Action {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Action::Buy),
            "sell" => Ok(Action::Sell),
            "hold" => Ok(Action::Hold),
            _ => Err(DecisionError::UnknownAction(s.to_string())),
        }
    }
}

/// Advisor's qualitative risk tag for a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskAssessment {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskAssessment::Low => write!(f, "low"),
            RiskAssessment::Medium => write!(f, "medium"),
            RiskAssessment::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskAssessment {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskAssessment::Low),
            "medium" => Ok(RiskAssessment::Medium),
            "high" => Ok(RiskAssessment::High),
            _ => Err(DecisionError::UnknownRiskAssessment(s.to_string())),
        }
    }
}

/// Context attached to every trade record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Free-text reasoning from the advisor.
    pub reasoning: String,
    pub risk_assessment: RiskAssessment,
    /// Proposed position size as a fraction of NAV, in `(0, 1]`.
    pub position_size: f64,
}

impl Default for DecisionContext {
    fn default() -> Self {
        Self {
            reasoning: String::new(),
            risk_assessment: RiskAssessment::Medium,
            position_size: DEFAULT_POSITION_SIZE,
        }
    }
}

/// A validated advisor decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorDecision {
    pub action: Action,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub context: DecisionContext,
}

/// Reasons an advisor payload is refused at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("malformed decision payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown action: {0:?}")]
    UnknownAction(String),
    #[error("unknown risk assessment: {0:?}")]
    UnknownRiskAssessment(String),
    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("position size {0} outside (0, 1]")]
    PositionSizeOutOfRange(f64),
}

/// Wire shape of the advisor payload; every context field is optional.
#[derive(Debug, Deserialize)]
struct RawDecision {
    action: String,
    confidence: f64,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    risk_assessment: Option<String>,
    #[serde(default)]
    position_size: Option<f64>,
}

impl AdvisorDecision {
    /// Parse and validate a raw advisor payload.
    ///
    /// Missing context fields take the [`DecisionContext`] defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DecisionError> {
        let raw: RawDecision = serde_json::from_value(value)?;

        let action = raw.action.parse::<Action>()?;

        if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
            return Err(DecisionError::ConfidenceOutOfRange(raw.confidence));
        }

        let risk_assessment = match raw.risk_assessment.as_deref() {
            Some(tag) => tag.parse::<RiskAssessment>()?,
            None => RiskAssessment::default(),
        };

        let position_size = raw.position_size.unwrap_or(DEFAULT_POSITION_SIZE);
        if !position_size.is_finite() || position_size <= 0.0 || position_size > 1.0 {
            return Err(DecisionError::PositionSizeOutOfRange(position_size));
        }

        Ok(Self {
            action,
            confidence: raw.confidence,
            context: DecisionContext {
                reasoning: raw.reasoning.unwrap_or_default(),
                risk_assessment,
                position_size,
            },
        })
    }
}
