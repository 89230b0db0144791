//! Prompt construction for the assessment request and the chat assistant.
//!
//! The output contract lives here in one place: the schema handed to the
//! service's structured-generation parameter and the textual contract in the
//! prompt must stay in sync with `parse_assessment_reply`.

use crate::models::NewRecord;

/// System role for the assessment call.
pub const ASSESSMENT_SYSTEM_PROMPT: &str = "\
You are an obstetric risk-assessment assistant for antenatal care. You \
evaluate one pregnant patient's submitted data against the clinical \
guidance you are given. You never invent measurements that were not \
submitted. You respond with a single JSON object and no other text. All \
free-text fields of your reply (brief_summary, detailed_report) must be \
written in Arabic.";

/// Fixed clinical guidance included ahead of the patient data.
const DOMAIN_PREAMBLE: &str = "\
Clinical guidance for this assessment:
- Preeclampsia warning signs: blood pressure at or above 140/90, severe \
headache, blurred vision, marked swelling, epigastric pain, especially \
after 20 weeks or with a prior preeclamptic pregnancy.
- Gestational diabetes indicators: fasting glucose at or above 92 mg/dL, \
excessive thirst, frequent urination, unusual fatigue, prior gestational \
diabetes, or pre-pregnancy BMI at or above 30.
- Anemia indicators: hemoglobin below 11 g/dL in pregnancy, dizziness, \
pallor, shortness of breath, palpitations.
- Rapid or excessive weight change relative to the pre-pregnancy baseline \
raises concern in combination with the signs above.
- A history of repeated pregnancy loss (abortions relative to gravidity) \
warrants closer follow-up.";

/// Output contract appended after the patient data.
const OUTPUT_CONTRACT: &str = "\
Reply with ONE JSON object and nothing else, using exactly this shape:
{
  \"riskScores\": {
    \"overallRisk\": <number 0..1>,
    \"preeclampsia\": <number 0..1>,
    \"gestationalDiabetes\": <number 0..1>,
    \"anemia\": <number 0..1>
  },
  \"brief_summary\": <short Arabic summary, 1-2 sentences>,
  \"detailed_report\": <detailed Arabic report for the patient>,
  \"extracted_labs\": {
    \"blood_pressure\": <string or null>,
    \"glucose\": <number or null>,
    \"hemoglobin\": <number or null>
  }
}
extracted_labs must echo only lab values you recognized in the submitted \
data or the attached document text.";

/// JSON schema enforced through the service's structured-output parameter.
pub fn assessment_format_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "riskScores": {
                "type": "object",
                "properties": {
                    "overallRisk": {"type": "number", "minimum": 0.0, "maximum": 1.0},
                    "preeclampsia": {"type": "number", "minimum": 0.0, "maximum": 1.0},
                    "gestationalDiabetes": {"type": "number", "minimum": 0.0, "maximum": 1.0},
                    "anemia": {"type": "number", "minimum": 0.0, "maximum": 1.0}
                },
                "required": ["overallRisk", "preeclampsia", "gestationalDiabetes", "anemia"]
            },
            "brief_summary": {"type": "string"},
            "detailed_report": {"type": "string"},
            "extracted_labs": {
                "type": "object",
                "properties": {
                    "blood_pressure": {"type": ["string", "null"]},
                    "glucose": {"type": ["number", "null"]},
                    "hemoglobin": {"type": ["number", "null"]}
                }
            }
        },
        "required": ["riskScores", "brief_summary", "detailed_report", "extracted_labs"]
    })
}

/// Assemble the full assessment prompt for one candidate record.
pub fn build_assessment_prompt(candidate: &NewRecord, history_summary: &str) -> String {
    let mut sections = Vec::new();

    sections.push(DOMAIN_PREAMBLE.to_string());

    let mut patient = String::from("Patient data for this visit:\n");
    patient.push_str(&format!(
        "- Name: {}\n- Age: {} years\n",
        candidate.personal.name, candidate.personal.age
    ));
    patient.push_str(&format!(
        "- Pregnancy history: gravidity {}, parity {}, abortions {}\n",
        candidate.pregnancy.gravidity, candidate.pregnancy.parity, candidate.pregnancy.abortions
    ));
    patient.push_str(&format!(
        "- Measurements: height {} cm, pre-pregnancy weight {} kg, current weight {} kg\n",
        candidate.measurements.height_cm,
        candidate.measurements.pre_pregnancy_weight_kg,
        candidate.measurements.current_weight_kg
    ));

    let checked = candidate.symptoms.checked_labels();
    if checked.is_empty() {
        patient.push_str("- Reported symptoms: none checked\n");
    } else {
        patient.push_str(&format!("- Reported symptoms: {}\n", checked.join(", ")));
    }
    if let Some(other) = candidate.symptoms.other.as_deref() {
        patient.push_str(&format!("- Other symptoms (patient's words): {other}\n"));
    }

    if candidate.labs.is_empty() {
        patient.push_str("- Lab results: none submitted\n");
    } else {
        if let Some(bp) = candidate.labs.blood_pressure.as_deref() {
            patient.push_str(&format!("- Blood pressure: {bp}\n"));
        }
        if let Some(glucose) = candidate.labs.glucose_mg_dl {
            patient.push_str(&format!("- Glucose: {glucose} mg/dL\n"));
        }
        if let Some(hemoglobin) = candidate.labs.hemoglobin_g_dl {
            patient.push_str(&format!("- Hemoglobin: {hemoglobin} g/dL\n"));
        }
    }
    sections.push(patient);

    if let Some(ocr) = candidate.ocr_text.as_deref() {
        sections.push(format!("Text extracted from an attached document:\n{ocr}"));
    }

    sections.push(format!("Patient history:\n{history_summary}"));
    sections.push(OUTPUT_CONTRACT.to_string());

    sections.join("\n\n")
}

/// System instruction for a chat session, seeded with the user's history
/// summary at session-creation time.
pub fn chat_system_instruction(history_summary: &str) -> String {
    format!(
        "أنتِ مساعدة صحية متخصصة في متابعة الحمل ضمن تطبيق حواء. أجيبي فقط \
على الأسئلة المتعلقة بصحة الحمل والمتابعة الواردة في قاعدة المعرفة الخاصة \
بالتطبيق، واعتذري بلطف عن أي موضوع خارجها. لا تقدمي تشخيصاً طبياً نهائياً \
وذكّري المريضة دائماً بمراجعة طبيبها عند القلق. أجيبي باللغة العربية.\n\n\
Patient history for context:\n{history_summary}"
    )
}
