//! CSV export of the record collection (admin report).
//!
//! The file starts with a UTF-8 byte-order mark so spreadsheet tools pick up
//! the encoding, followed by a fixed header row. Free-text fields are quoted
//! with embedded double quotes doubled.

use crate::models::{PatientRecord, RiskDisplay};

/// UTF-8 byte-order mark.
const BOM: &str = "\u{feff}";

const HEADER: &str = "ID,UserID,Timestamp,Name,Age,Gravidity,Parity,Abortions,HeightCm,\
PrePregnancyWeightKg,CurrentWeightKg,Symptoms,OtherSymptoms,BloodPressure,GlucoseMgDl,\
HemoglobinGDl,OcrText,AiUrgency,AiSummary,AiReport";

/// Render the full record collection as CSV text.
pub fn export_records_csv(records: &[PatientRecord]) -> String {
    let mut out = String::from(BOM);
    out.push_str(HEADER);
    out.push_str("\r\n");

    for record in records {
        let urgency = match record.assessment.risk_display() {
            RiskDisplay::Bucketed(bucket) => bucket.as_str().to_string(),
            RiskDisplay::Legacy(urgency) => urgency.to_string(),
            RiskDisplay::Unavailable => String::new(),
        };

        let fields = [
            record.id.to_string(),
            record.user_id.clone(),
            record.created_at.to_rfc3339(),
            record.personal.name.clone(),
            record.personal.age.to_string(),
            record.pregnancy.gravidity.to_string(),
            record.pregnancy.parity.to_string(),
            record.pregnancy.abortions.to_string(),
            record.measurements.height_cm.to_string(),
            record.measurements.pre_pregnancy_weight_kg.to_string(),
            record.measurements.current_weight_kg.to_string(),
            record.symptoms.checked_labels().join("; "),
            record.symptoms.other.clone().unwrap_or_default(),
            record.labs.blood_pressure.clone().unwrap_or_default(),
            record
                .labs
                .glucose_mg_dl
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record
                .labs
                .hemoglobin_g_dl
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record.ocr_text.clone().unwrap_or_default(),
            urgency,
            record.assessment.brief_summary().unwrap_or_default().to_string(),
            record
                .assessment
                .detailed_report()
                .unwrap_or_default()
                .to_string(),
        ];

        let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }

    out
}

/// Quote a field when it needs quoting; double any embedded double quotes.
fn escape_field(field: &str) -> String {
    if field.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
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

    fn record(assessment: AiResponse) -> PatientRecord {
        PatientRecord {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap(),
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
                current_weight_kg: 68.0,
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
    fn csv_starts_with_bom_then_header() {
        let csv = export_records_csv(&[]);
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv[3..].starts_with("ID,UserID,Timestamp,"));
    }

    #[test]
    fn one_row_per_record() {
        let csv = export_records_csv(&[record(scored(0.3)), record(AiResponse::Absent)]);
        let rows: Vec<&str> = csv.trim_end().split("\r\n").collect();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn embedded_quotes_doubled() {
        let mut r = record(AiResponse::Absent);
        r.symptoms.other = Some("pain when \"walking\"".into());
        let csv = export_records_csv(&[r]);
        assert!(csv.contains("\"pain when \"\"walking\"\"\""));
    }

    #[test]
    fn commas_and_newlines_force_quoting() {
        let mut r = record(AiResponse::Absent);
        r.ocr_text = Some("Hb 10.2, low\nrepeat test".into());
        let csv = export_records_csv(&[r]);
        assert!(csv.contains("\"Hb 10.2, low\nrepeat test\""));
    }

    #[test]
    fn scored_record_exports_bucket_label() {
        let csv = export_records_csv(&[record(scored(0.8))]);
        assert!(csv.contains(",High,"), "{csv}");
    }

    #[test]
    fn legacy_record_exports_urgency_verbatim() {
        let legacy = AiResponse::Legacy(LegacyAssessment {
            urgency: "Medium".into(),
            brief_summary: None,
            detailed_report: None,
        });
        let csv = export_records_csv(&[record(legacy)]);
        assert!(csv.contains(",Medium,"), "{csv}");
        assert!(!csv.contains("Moderate"), "legacy must not be bucketed");
    }

    #[test]
    fn absent_assessment_exports_empty_ai_cells() {
        let csv = export_records_csv(&[record(AiResponse::Absent)]);
        let data_row = csv.trim_end().split("\r\n").nth(1).unwrap();
        assert!(data_row.ends_with(",,,"), "{data_row}");
    }
}
