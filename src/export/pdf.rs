//! Assessment report PDF.
//!
//! One A4 page with builtin fonts: header, visit facts, risk line, then the
//! wrapped report text. Content that does not fit the page is cut off —
//! single-page output is an accepted limitation of this export.

use std::io::BufWriter;

use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::ExportError;
use crate::models::{PatientRecord, RiskDisplay};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const BOTTOM_MM: f32 = 20.0;
const WRAP_COLUMNS: usize = 90;

/// Render one record's assessment as PDF bytes.
pub fn record_report_pdf(record: &PatientRecord) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(
        "Assessment Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    layer.use_text("Assessment Report", 16.0, Mm(MARGIN_MM), Mm(y), &bold);
    y -= 10.0;

    let facts = [
        format!("Patient: {}", record.personal.name),
        format!("Visit date: {}", record.created_at.format("%Y-%m-%d")),
        format!(
            "Pregnancy history: G{} P{} A{}",
            record.pregnancy.gravidity, record.pregnancy.parity, record.pregnancy.abortions
        ),
        format!(
            "Weight: {} kg (pre-pregnancy {} kg)",
            record.measurements.current_weight_kg, record.measurements.pre_pregnancy_weight_kg
        ),
    ];
    for fact in facts {
        layer.use_text(fact, 10.0, Mm(MARGIN_MM), Mm(y), &font);
        y -= 5.5;
    }
    y -= 3.0;

    let risk_line = match record.assessment.risk_display() {
        RiskDisplay::Bucketed(bucket) => format!("Risk level: {bucket}"),
        RiskDisplay::Legacy(urgency) => format!("Risk level: {urgency}"),
        RiskDisplay::Unavailable => "Risk level: not available".to_string(),
    };
    layer.use_text(risk_line, 12.0, Mm(MARGIN_MM), Mm(y), &bold);
    y -= 9.0;

    if let Some(summary) = record.assessment.brief_summary() {
        layer.use_text("Summary", 11.0, Mm(MARGIN_MM), Mm(y), &bold);
        y -= 6.0;
        for line in wrap_text(summary, WRAP_COLUMNS) {
            if y < BOTTOM_MM {
                break;
            }
            layer.use_text(line, 9.0, Mm(MARGIN_MM), Mm(y), &font);
            y -= 4.5;
        }
        y -= 4.0;
    }

    if let Some(report) = record.assessment.detailed_report() {
        layer.use_text("Report", 11.0, Mm(MARGIN_MM), Mm(y), &bold);
        y -= 6.0;
        for paragraph in report.lines() {
            for line in wrap_text(paragraph, WRAP_COLUMNS) {
                if y < BOTTOM_MM {
                    break;
                }
                layer.use_text(line, 9.0, Mm(MARGIN_MM), Mm(y), &font);
                y -= 4.5;
            }
        }
    }

    let mut bytes = Vec::new();
    doc.save(&mut BufWriter::new(&mut bytes))
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(bytes)
}

/// Greedy word wrap at a character-column limit.
fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AiResponse, LabResults, Measurements, PersonalInfo, PregnancyHistory, RiskScores,
        ScoredAssessment,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn record() -> PatientRecord {
        PatientRecord {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            created_at: Utc::now(),
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
            assessment: AiResponse::Scored(ScoredAssessment {
                risk_scores: RiskScores {
                    overall_risk: 0.3,
                    preeclampsia: None,
                    gestational_diabetes: None,
                    anemia: None,
                },
                brief_summary: "stable".into(),
                detailed_report: "all measurements within expected ranges".into(),
                extracted_labs: Default::default(),
            }),
        }
    }

    #[test]
    fn produces_pdf_bytes() {
        let bytes = record_report_pdf(&record()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn handles_record_without_assessment() {
        let mut r = record();
        r.assessment = AiResponse::Absent;
        let bytes = record_report_pdf(&r).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_report_stays_single_page() {
        let mut r = record();
        if let AiResponse::Scored(ref mut s) = r.assessment {
            s.detailed_report = "word ".repeat(5000);
        }
        let bytes = record_report_pdf(&r).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        // One page object only — overflow is truncated, not paginated.
        assert_eq!(text.matches("/Type /Page").count() - text.matches("/Type /Pages").count(), 1);
    }

    #[test]
    fn wrap_respects_column_limit() {
        let lines = wrap_text(&"word ".repeat(40), 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert!(lines.len() > 5);
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap_text("short text", 80), vec!["short text".to_string()]);
    }
}

