//! Shared API types: request context, authenticated user, and the record
//! view every listing endpoint returns.

use std::sync::Arc;

use serde::Serialize;

use crate::core_state::AppState;
use crate::models::{AiResponse, PatientRecord, RiskDisplay, Role};

/// Shared context handed to every endpoint.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
}

impl ApiContext {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

/// The authenticated user, resolved by the auth middleware from the
/// provider-established claims plus the mirrored role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub name: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), crate::api::ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(crate::api::ApiError::Forbidden)
        }
    }
}

/// Reconciled risk indicator, identical across every view that renders an
/// assessment (home summary, admin table, chat context).
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskIndicator {
    /// Current shape: the overall score's display bucket.
    Scored { bucket: String, overall: f64 },
    /// Legacy shape: the stored urgency string, verbatim.
    Legacy { urgency: String },
    /// No assessment available.
    None,
}

impl RiskIndicator {
    pub fn for_assessment(assessment: &AiResponse) -> Self {
        match assessment.risk_display() {
            RiskDisplay::Bucketed(bucket) => {
                let overall = match assessment {
                    AiResponse::Scored(s) => s.risk_scores.overall_risk,
                    _ => 0.0,
                };
                RiskIndicator::Scored {
                    bucket: bucket.as_str().to_string(),
                    overall,
                }
            }
            RiskDisplay::Legacy(urgency) => RiskIndicator::Legacy {
                urgency: urgency.to_string(),
            },
            RiskDisplay::Unavailable => RiskIndicator::None,
        }
    }
}

/// One record plus its reconciled risk indicator.
#[derive(Debug, Serialize)]
pub struct RecordView {
    pub record: PatientRecord,
    pub risk: RiskIndicator,
}

impl RecordView {
    pub fn from_record(record: PatientRecord) -> Self {
        let risk = RiskIndicator::for_assessment(&record.assessment);
        Self { record, risk }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LegacyAssessment, RiskScores, ScoredAssessment};

    #[test]
    fn scored_indicator_carries_bucket_and_score() {
        let assessment = AiResponse::Scored(ScoredAssessment {
            risk_scores: RiskScores {
                overall_risk: 0.8,
                preeclampsia: None,
                gestational_diabetes: None,
                anemia: None,
            },
            brief_summary: "s".into(),
            detailed_report: "r".into(),
            extracted_labs: Default::default(),
        });
        let json = serde_json::to_value(RiskIndicator::for_assessment(&assessment)).unwrap();
        assert_eq!(json["kind"], "scored");
        assert_eq!(json["bucket"], "High");
    }

    #[test]
    fn legacy_indicator_is_verbatim() {
        let assessment = AiResponse::Legacy(LegacyAssessment {
            urgency: "Medium".into(),
            brief_summary: None,
            detailed_report: None,
        });
        let json = serde_json::to_value(RiskIndicator::for_assessment(&assessment)).unwrap();
        assert_eq!(json["kind"], "legacy");
        assert_eq!(json["urgency"], "Medium");
    }

    #[test]
    fn absent_indicator_is_none() {
        let json = serde_json::to_value(RiskIndicator::for_assessment(&AiResponse::Absent)).unwrap();
        assert_eq!(json["kind"], "none");
    }
}
