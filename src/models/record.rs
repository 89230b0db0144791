//! Patient record shapes.
//!
//! A `PatientRecord` is one submitted health-data snapshot plus its
//! AI-generated assessment. Records are immutable once created; the only
//! later mutation is administrative deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assessment::AiResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub age: i32,
}

/// Obstetric counts. Invariant: `parity + abortions <= gravidity`
/// (enforced by validation before any record is assembled).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PregnancyHistory {
    pub gravidity: i32,
    pub parity: i32,
    pub abortions: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Measurements {
    pub height_cm: f64,
    pub pre_pregnancy_weight_kg: f64,
    pub current_weight_kg: f64,
}

/// Symptom flags grouped by the condition category they point at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymptomChecklist {
    #[serde(default)]
    pub preeclampsia: PreeclampsiaSymptoms,
    #[serde(default)]
    pub diabetes: DiabetesSymptoms,
    #[serde(default)]
    pub anemia: AnemiaSymptoms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PreeclampsiaSymptoms {
    #[serde(default)]
    pub severe_headache: bool,
    #[serde(default)]
    pub blurred_vision: bool,
    #[serde(default)]
    pub swelling: bool,
    #[serde(default)]
    pub epigastric_pain: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DiabetesSymptoms {
    #[serde(default)]
    pub excessive_thirst: bool,
    #[serde(default)]
    pub frequent_urination: bool,
    #[serde(default)]
    pub fatigue: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnemiaSymptoms {
    #[serde(default)]
    pub dizziness: bool,
    #[serde(default)]
    pub pallor: bool,
    #[serde(default)]
    pub shortness_of_breath: bool,
}

impl SymptomChecklist {
    /// Labels of every checked flag, for prompt text and CSV cells.
    pub fn checked_labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        let flags: [(bool, &'static str); 10] = [
            (self.preeclampsia.severe_headache, "severe headache"),
            (self.preeclampsia.blurred_vision, "blurred vision"),
            (self.preeclampsia.swelling, "swelling"),
            (self.preeclampsia.epigastric_pain, "epigastric pain"),
            (self.diabetes.excessive_thirst, "excessive thirst"),
            (self.diabetes.frequent_urination, "frequent urination"),
            (self.diabetes.fatigue, "fatigue"),
            (self.anemia.dizziness, "dizziness"),
            (self.anemia.pallor, "pallor"),
            (self.anemia.shortness_of_breath, "shortness of breath"),
        ];
        for (checked, label) in flags {
            if checked {
                labels.push(label);
            }
        }
        labels
    }

    pub fn any_checked(&self) -> bool {
        !self.checked_labels().is_empty() || self.other.is_some()
    }
}

/// Optional lab values entered with a submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabResults {
    /// `SYS/DIA`, e.g. `120/80`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose_mg_dl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hemoglobin_g_dl: Option<f64>,
}

impl LabResults {
    pub fn is_empty(&self) -> bool {
        self.blood_pressure.is_none() && self.glucose_mg_dl.is_none() && self.hemoglobin_g_dl.is_none()
    }
}

/// A candidate record as submitted — everything but the id, the server-side
/// timestamp, and the assessment the pipeline attaches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    pub user_id: String,
    pub personal: PersonalInfo,
    pub pregnancy: PregnancyHistory,
    pub measurements: Measurements,
    #[serde(default)]
    pub symptoms: SymptomChecklist,
    #[serde(default)]
    pub labs: LabResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
}

/// One stored snapshot plus its assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub personal: PersonalInfo,
    pub pregnancy: PregnancyHistory,
    pub measurements: Measurements,
    pub symptoms: SymptomChecklist,
    pub labs: LabResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    pub assessment: AiResponse,
}
