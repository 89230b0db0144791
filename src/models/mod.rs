pub mod assessment;
pub mod record;
pub mod user;

pub use assessment::{
    risk_bucket, AiResponse, ExtractedLabs, LegacyAssessment, RiskBucket, RiskDisplay, RiskScores,
    ScoredAssessment,
};
pub use record::{
    AnemiaSymptoms, DiabetesSymptoms, LabResults, Measurements, NewRecord, PatientRecord,
    PersonalInfo, PreeclampsiaSymptoms, PregnancyHistory, SymptomChecklist,
};
pub use user::{Role, UserProfile};
