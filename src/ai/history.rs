//! History summarizer.
//!
//! Reduces a patient's prior records into a compact textual digest for prompt
//! inclusion. The digest is natural-language context for the AI call, never
//! parsed back programmatically. Input order is preserved; callers pass
//! newest-first history straight from the store.

use crate::models::{AiResponse, PatientRecord};

/// Fixed sentinel returned for an empty history.
pub const FIRST_VISIT_SENTINEL: &str =
    "First visit: no prior records exist for this patient.";

const HISTORY_HEADER: &str = "Previous visits (most recent first):";

/// One line per record: date, current weight, and the risk indicator.
///
/// The indicator is three-way because both response generations coexist in
/// stored history: a numeric overall score renders to two decimals, a legacy
/// urgency renders verbatim, anything else renders as not available.
pub fn summarize_history(records: &[PatientRecord]) -> String {
    if records.is_empty() {
        return FIRST_VISIT_SENTINEL.to_string();
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(HISTORY_HEADER.to_string());
    for record in records {
        let risk = match &record.assessment {
            AiResponse::Scored(s) => {
                format!("overall risk {:.2}", s.risk_scores.overall_risk)
            }
            AiResponse::Legacy(l) => format!("risk level {}", l.urgency),
            AiResponse::Absent => "risk not available".to_string(),
        };
        lines.push(format!(
            "- {}: weight {} kg, {}",
            record.created_at.format("%Y-%m-%d"),
            record.measurements.current_weight_kg,
            risk,
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AiResponse, LabResults, LegacyAssessment, Measurements, PatientRecord, PersonalInfo,
        PregnancyHistory, RiskScores, ScoredAssessment,
    };
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn record(day: u32, weight: f64, assessment: AiResponse) -> PatientRecord {
        PatientRecord {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap(),
            personal: PersonalInfo {
                name: "Amira".into(),
                age: 25,
            },
            pregnancy: PregnancyHistory {
                gravidity: 2,
                parity: 1,
                abortions: 0,
            },
            measurements: Measurements {
                height_cm: 165.0,
                pre_pregnancy_weight_kg: 60.0,
                current_weight_kg: weight,
            },
            symptoms: Default::default(),
            labs: LabResults::default(),
            ocr_text: None,
            assessment,
        }
    }

    fn scored(overall: f64) -> AiResponse {
        AiResponse::Scored(ScoredAssessment {
            risk_scores: RiskScores {
                overall_risk: overall,
                preeclampsia: None,
                gestational_diabetes: None,
                anemia: None,
            },
            brief_summary: "ملخص".into(),
            detailed_report: "تقرير".into(),
            extracted_labs: Default::default(),
        })
    }

    #[test]
    fn empty_history_returns_sentinel() {
        assert_eq!(summarize_history(&[]), FIRST_VISIT_SENTINEL);
    }

    #[test]
    fn non_empty_history_never_returns_sentinel() {
        let summary = summarize_history(&[record(1, 68.0, AiResponse::Absent)]);
        assert_ne!(summary, FIRST_VISIT_SENTINEL);
        assert!(summary.starts_with(HISTORY_HEADER));
    }

    #[test]
    fn scored_record_renders_two_decimal_score() {
        let summary = summarize_history(&[record(5, 68.5, scored(0.3))]);
        assert!(summary.contains("2026-03-05"), "{summary}");
        assert!(summary.contains("weight 68.5 kg"), "{summary}");
        assert!(summary.contains("overall risk 0.30"), "{summary}");
    }

    #[test]
    fn legacy_record_renders_urgency_verbatim() {
        let legacy = AiResponse::Legacy(LegacyAssessment {
            urgency: "Medium".into(),
            brief_summary: None,
            detailed_report: None,
        });
        let summary = summarize_history(&[record(2, 70.0, legacy)]);
        assert!(summary.contains("risk level Medium"), "{summary}");
        assert!(!summary.contains("0.") && !summary.contains("Moderate"), "{summary}");
    }

    #[test]
    fn missing_assessment_renders_not_available() {
        let summary = summarize_history(&[record(3, 71.0, AiResponse::Absent)]);
        assert!(summary.contains("risk not available"), "{summary}");
    }

    #[test]
    fn one_line_per_record_in_input_order() {
        let records = vec![
            record(9, 70.0, scored(0.8)),
            record(2, 68.0, AiResponse::Absent),
        ];
        let summary = summarize_history(&records);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("2026-03-09"));
        assert!(lines[2].contains("2026-03-02"));
    }
}
