//! Input validation for record submission.
//!
//! Every check runs before any network call. Failures come back as a list of
//! per-field errors so the client can surface them inline next to the form
//! fields that produced them.

use regex::Regex;
use serde::Serialize;

use crate::models::NewRecord;

const AGE_RANGE: std::ops::RangeInclusive<i32> = 10..=60;
const HEIGHT_CM_RANGE: std::ops::RangeInclusive<f64> = 100.0..=220.0;
const WEIGHT_KG_RANGE: std::ops::RangeInclusive<f64> = 30.0..=250.0;
const GLUCOSE_MG_DL_RANGE: std::ops::RangeInclusive<f64> = 20.0..=600.0;
const HEMOGLOBIN_G_DL_RANGE: std::ops::RangeInclusive<f64> = 3.0..=25.0;
const SYSTOLIC_RANGE: std::ops::RangeInclusive<u32> = 60..=260;
const DIASTOLIC_RANGE: std::ops::RangeInclusive<u32> = 30..=200;

/// One inline validation failure, attached to a named field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All failures found for one submission.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for ValidationErrors {}

/// Obstetric-count invariant.
///
/// Fails iff any count is negative or `parity + abortions > gravidity`.
pub fn validate_pregnancy_history(
    gravidity: i32,
    parity: i32,
    abortions: i32,
) -> Result<(), FieldError> {
    if gravidity < 0 || parity < 0 || abortions < 0 {
        return Err(FieldError::new(
            "pregnancy",
            "Gravidity, parity, and abortion counts cannot be negative",
        ));
    }
    if parity + abortions > gravidity {
        return Err(FieldError::new(
            "pregnancy",
            format!(
                "Parity ({parity}) plus abortions ({abortions}) cannot exceed gravidity ({gravidity})"
            ),
        ));
    }
    Ok(())
}

/// Validate a full candidate record, collecting every failure.
pub fn validate_new_record(record: &NewRecord) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if record.personal.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if !AGE_RANGE.contains(&record.personal.age) {
        errors.push(FieldError::new(
            "age",
            format!(
                "Age must be between {} and {}",
                AGE_RANGE.start(),
                AGE_RANGE.end()
            ),
        ));
    }

    if let Err(e) = validate_pregnancy_history(
        record.pregnancy.gravidity,
        record.pregnancy.parity,
        record.pregnancy.abortions,
    ) {
        errors.push(e);
    }

    if !HEIGHT_CM_RANGE.contains(&record.measurements.height_cm) {
        errors.push(FieldError::new("height_cm", "Height must be 100-220 cm"));
    }
    if !WEIGHT_KG_RANGE.contains(&record.measurements.pre_pregnancy_weight_kg) {
        errors.push(FieldError::new(
            "pre_pregnancy_weight_kg",
            "Pre-pregnancy weight must be 30-250 kg",
        ));
    }
    if !WEIGHT_KG_RANGE.contains(&record.measurements.current_weight_kg) {
        errors.push(FieldError::new(
            "current_weight_kg",
            "Current weight must be 30-250 kg",
        ));
    }

    if let Some(bp) = record.labs.blood_pressure.as_deref() {
        if let Err(e) = validate_blood_pressure(bp) {
            errors.push(e);
        }
    }
    if let Some(glucose) = record.labs.glucose_mg_dl {
        if !GLUCOSE_MG_DL_RANGE.contains(&glucose) {
            errors.push(FieldError::new(
                "glucose_mg_dl",
                "Glucose must be 20-600 mg/dL",
            ));
        }
    }
    if let Some(hemoglobin) = record.labs.hemoglobin_g_dl {
        if !HEMOGLOBIN_G_DL_RANGE.contains(&hemoglobin) {
            errors.push(FieldError::new(
                "hemoglobin_g_dl",
                "Hemoglobin must be 3-25 g/dL",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Blood pressure must look like `SYS/DIA` with plausible values.
fn validate_blood_pressure(bp: &str) -> Result<(), FieldError> {
    let pattern = Regex::new(r"^(\d{2,3})/(\d{2,3})$").expect("static regex");
    let captures = pattern.captures(bp.trim()).ok_or_else(|| {
        FieldError::new(
            "blood_pressure",
            "Blood pressure must be systolic/diastolic, e.g. 120/80",
        )
    })?;

    let systolic: u32 = captures[1].parse().expect("digits matched");
    let diastolic: u32 = captures[2].parse().expect("digits matched");

    if !SYSTOLIC_RANGE.contains(&systolic) || !DIASTOLIC_RANGE.contains(&diastolic) {
        return Err(FieldError::new(
            "blood_pressure",
            "Blood pressure values are outside the plausible range",
        ));
    }
    if diastolic >= systolic {
        return Err(FieldError::new(
            "blood_pressure",
            "Diastolic pressure must be lower than systolic",
        ));
    }
    Ok(())
}
