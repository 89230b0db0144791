//! Assessment payloads returned by the AI service.
//!
//! Two response generations coexist in stored history: the current shape
//! carries four numeric risk scores, the legacy shape a single categorical
//! urgency string. `AiResponse` keeps that distinction as an explicit tagged
//! union so every consumer matches exhaustively instead of probing optional
//! fields ad hoc.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Bucket thresholds for the overall risk score.
const HIGH_THRESHOLD: f64 = 0.75;
const MODERATE_THRESHOLD: f64 = 0.5;
const LOW_THRESHOLD: f64 = 0.25;

/// The four risk likelihoods produced by the assessment step, each in [0, 1].
///
/// Field names mirror the wire contract (`overallRisk` etc.) — stored
/// documents and AI replies both use this spelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScores {
    pub overall_risk: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preeclampsia: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gestational_diabetes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anemia: Option<f64>,
}

/// Lab values the assessment step recognized in the submitted data and
/// echoed back. Parsed leniently — a missing or malformed echo never fails
/// an otherwise valid reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedLabs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hemoglobin: Option<f64>,
}

/// Current-generation assessment: scores + Arabic summary and report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredAssessment {
    #[serde(rename = "riskScores")]
    pub risk_scores: RiskScores,
    pub brief_summary: String,
    pub detailed_report: String,
    #[serde(default)]
    pub extracted_labs: ExtractedLabs,
}

/// Legacy-generation assessment: one categorical urgency value.
///
/// The urgency string is displayed verbatim — older records wrote
/// `High`/`Medium`/`Low`/`Normal` and no numeric bucketing applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAssessment {
    pub urgency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_report: Option<String>,
}

/// An AI assessment as read back from storage or fresh from the service.
#[derive(Debug, Clone)]
pub enum AiResponse {
    /// Current shape with numeric risk scores.
    Scored(ScoredAssessment),
    /// Older stored shape with a single urgency string.
    Legacy(LegacyAssessment),
    /// No assessment attached (or an unrecognizable stored payload).
    Absent,
}

impl AiResponse {
    /// Classify a raw JSON payload into the tagged union.
    ///
    /// Precedence: a numeric `riskScores.overallRisk` wins, then a string
    /// `urgency`, then `Absent`. Classification never fails — unknown shapes
    /// degrade to `Absent` rather than erroring a whole record read.
    pub fn from_value(value: &serde_json::Value) -> AiResponse {
        let overall = value
            .get("riskScores")
            .and_then(|rs| rs.get("overallRisk"))
            .and_then(|v| v.as_f64());
        if overall.is_some() {
            if let Ok(scored) = serde_json::from_value::<ScoredAssessment>(value.clone()) {
                return AiResponse::Scored(scored);
            }
        }
        if value.get("urgency").and_then(|v| v.as_str()).is_some() {
            if let Ok(legacy) = serde_json::from_value::<LegacyAssessment>(value.clone()) {
                return AiResponse::Legacy(legacy);
            }
        }
        AiResponse::Absent
    }

    /// The single reconciliation point every display site goes through.
    pub fn risk_display(&self) -> RiskDisplay<'_> {
        match self {
            AiResponse::Scored(s) => RiskDisplay::Bucketed(risk_bucket(s.risk_scores.overall_risk)),
            AiResponse::Legacy(l) => RiskDisplay::Legacy(&l.urgency),
            AiResponse::Absent => RiskDisplay::Unavailable,
        }
    }

    /// Short summary text, when either shape carries one.
    pub fn brief_summary(&self) -> Option<&str> {
        match self {
            AiResponse::Scored(s) => Some(s.brief_summary.as_str()),
            AiResponse::Legacy(l) => l.brief_summary.as_deref(),
            AiResponse::Absent => None,
        }
    }

    /// Long-form report text, when either shape carries one.
    pub fn detailed_report(&self) -> Option<&str> {
        match self {
            AiResponse::Scored(s) => Some(s.detailed_report.as_str()),
            AiResponse::Legacy(l) => l.detailed_report.as_deref(),
            AiResponse::Absent => None,
        }
    }
}

impl Serialize for AiResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AiResponse::Scored(s) => s.serialize(serializer),
            AiResponse::Legacy(l) => l.serialize(serializer),
            AiResponse::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for AiResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(AiResponse::from_value(&value))
    }
}

/// How a record's risk is presented, after legacy/current reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskDisplay<'a> {
    /// Current shape — show the bucket for the overall score.
    Bucketed(RiskBucket),
    /// Legacy shape — show the stored urgency string verbatim, neutral style.
    Legacy(&'a str),
    /// No assessment available for this record.
    Unavailable,
}

/// Display bucket for an overall risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    High,
    Moderate,
    Low,
    Normal,
}

impl RiskBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::Normal => "Normal",
        }
    }
}

impl std::fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bucket an overall risk score. Boundaries are inclusive on the lower
/// bound of each bucket: High ≥ 0.75, Moderate ≥ 0.5, Low ≥ 0.25.
pub fn risk_bucket(overall: f64) -> RiskBucket {
    if overall >= HIGH_THRESHOLD {
        RiskBucket::High
    } else if overall >= MODERATE_THRESHOLD {
        RiskBucket::Moderate
    } else if overall >= LOW_THRESHOLD {
        RiskBucket::Low
    } else {
        RiskBucket::Normal
    }
}
