//! Assessment requester: build the prompt, call the service once, validate
//! the structured reply.
//!
//! Stateless per call, no retry. Failures keep their category (unreachable vs
//! unexpected shape vs other) all the way to the caller.

use serde_json::Value;

use super::client::{GenAiClient, GenerationOptions};
use super::prompt::{assessment_format_schema, build_assessment_prompt, ASSESSMENT_SYSTEM_PROMPT};
use super::AiError;
use crate::models::{ExtractedLabs, NewRecord, RiskScores, ScoredAssessment};

/// Run one assessment request for a candidate record.
///
/// `history_summary` is the summarizer output for this user's prior records
/// (the first-visit sentinel when there are none).
pub fn request_assessment<C: GenAiClient + ?Sized>(
    client: &C,
    model: &str,
    candidate: &NewRecord,
    history_summary: &str,
) -> Result<ScoredAssessment, AiError> {
    let prompt = build_assessment_prompt(candidate, history_summary);
    let schema = assessment_format_schema();
    let raw = client.generate_structured(
        model,
        ASSESSMENT_SYSTEM_PROMPT,
        &prompt,
        &schema,
        &GenerationOptions::default(),
    )?;
    parse_assessment_reply(&raw)
}

/// Parse and validate the raw reply text.
///
/// Rejects: non-JSON, a non-object top level, missing `riskScores` or
/// non-numeric `riskScores.overallRisk`, missing `brief_summary` or
/// `detailed_report`. The lab echo parses leniently and scores are clamped
/// into [0, 1].
pub fn parse_assessment_reply(raw: &str) -> Result<ScoredAssessment, AiError> {
    let text = strip_code_fence(raw.trim());
    let value: Value =
        serde_json::from_str(text).map_err(|e| AiError::MalformedReply(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| AiError::MalformedReply("top-level value is not an object".into()))?;

    let scores = object
        .get("riskScores")
        .and_then(Value::as_object)
        .ok_or(AiError::MissingField("riskScores"))?;
    let overall = scores
        .get("overallRisk")
        .and_then(Value::as_f64)
        .ok_or(AiError::MissingField("riskScores.overallRisk"))?;

    let brief_summary = object
        .get("brief_summary")
        .and_then(Value::as_str)
        .ok_or(AiError::MissingField("brief_summary"))?
        .to_string();
    let detailed_report = object
        .get("detailed_report")
        .and_then(Value::as_str)
        .ok_or(AiError::MissingField("detailed_report"))?
        .to_string();

    let extracted_labs: ExtractedLabs = object
        .get("extracted_labs")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    Ok(ScoredAssessment {
        risk_scores: RiskScores {
            overall_risk: clamp_unit(overall),
            preeclampsia: scores.get("preeclampsia").and_then(Value::as_f64).map(clamp_unit),
            gestational_diabetes: scores
                .get("gestationalDiabetes")
                .and_then(Value::as_f64)
                .map(clamp_unit),
            anemia: scores.get("anemia").and_then(Value::as_f64).map(clamp_unit),
        },
        brief_summary,
        detailed_report,
        extracted_labs,
    })
}

/// Models occasionally wrap the object in a Markdown fence despite the
/// contract; tolerate that one deviation.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim().trim_end_matches("```").trim()
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
