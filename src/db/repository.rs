//! Persistence adapter for patient records and user profiles.
//!
//! Operation semantics:
//! - `insert_record` propagates failures and refuses a record without an
//!   owning user id.
//! - `list_records_for_user` / `list_all_records` degrade silently: any read
//!   failure logs a warning and returns an empty vec, so callers cannot tell
//!   "no records" from "read failed". Kept for backward compatibility with
//!   how existing views consume history.
//! - `delete_record` reports a boolean and never errors; a missing id is
//!   `false`.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    AiResponse, LabResults, Measurements, NewRecord, PatientRecord, PersonalInfo,
    PregnancyHistory, Role, SymptomChecklist, UserProfile,
};

const RECORD_COLUMNS: &str = "id, user_id, created_at, name, age, gravidity, parity, abortions,
     height_cm, pre_pregnancy_weight_kg, current_weight_kg, symptoms,
     blood_pressure, glucose_mg_dl, hemoglobin_g_dl, ocr_text, assessment";

// ═══════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════

/// Persist a candidate record with its assessment.
///
/// Assigns the id and the server-side timestamp; returns the stored record.
pub fn insert_record(
    conn: &Connection,
    candidate: &NewRecord,
    assessment: &AiResponse,
) -> Result<PatientRecord, DatabaseError> {
    if candidate.user_id.trim().is_empty() {
        return Err(DatabaseError::MissingOwner);
    }

    let id = Uuid::new_v4();
    // Truncate to the stored precision so the returned record equals a
    // later read of the same row.
    let now = Utc::now();
    let created_at = now
        .with_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now);
    let symptoms_json = serde_json::to_string(&candidate.symptoms)?;
    let assessment_json = match assessment {
        AiResponse::Absent => None,
        other => Some(serde_json::to_string(other)?),
    };

    conn.execute(
        "INSERT INTO records (id, user_id, created_at, name, age, gravidity, parity, abortions,
         height_cm, pre_pregnancy_weight_kg, current_weight_kg, symptoms,
         blood_pressure, glucose_mg_dl, hemoglobin_g_dl, ocr_text, assessment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            id.to_string(),
            candidate.user_id,
            timestamp_string(&created_at),
            candidate.personal.name,
            candidate.personal.age,
            candidate.pregnancy.gravidity,
            candidate.pregnancy.parity,
            candidate.pregnancy.abortions,
            candidate.measurements.height_cm,
            candidate.measurements.pre_pregnancy_weight_kg,
            candidate.measurements.current_weight_kg,
            symptoms_json,
            candidate.labs.blood_pressure,
            candidate.labs.glucose_mg_dl,
            candidate.labs.hemoglobin_g_dl,
            candidate.ocr_text,
            assessment_json,
        ],
    )?;

    Ok(PatientRecord {
        id,
        user_id: candidate.user_id.clone(),
        created_at,
        personal: candidate.personal.clone(),
        pregnancy: candidate.pregnancy,
        measurements: candidate.measurements,
        symptoms: candidate.symptoms.clone(),
        labs: candidate.labs.clone(),
        ocr_text: candidate.ocr_text.clone(),
        assessment: assessment.clone(),
    })
}

/// All records for one user, newest first. Silent-degradation read.
pub fn list_records_for_user(conn: &Connection, user_id: &str) -> Vec<PatientRecord> {
    match query_records_for_user(conn, user_id) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "record list read failed, returning empty");
            Vec::new()
        }
    }
}

/// All records across users, newest first (admin view). Silent-degradation read.
pub fn list_all_records(conn: &Connection) -> Vec<PatientRecord> {
    match query_all_records(conn) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "record list read failed, returning empty");
            Vec::new()
        }
    }
}

/// Fetch a single record by id.
pub fn get_record(conn: &Connection, id: &Uuid) -> Result<Option<PatientRecord>, DatabaseError> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], record_row_from_rusqlite)
        .optional()?;
    row.map(record_from_row).transpose()
}

/// Delete a record by id. Returns whether a row was actually removed.
pub fn delete_record(conn: &Connection, id: &Uuid) -> bool {
    match conn.execute("DELETE FROM records WHERE id = ?1", params![id.to_string()]) {
        Ok(affected) => affected > 0,
        Err(e) => {
            tracing::warn!(record_id = %id, error = %e, "record delete failed");
            false
        }
    }
}

fn query_records_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<PatientRecord>, DatabaseError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM records WHERE user_id = ?1 ORDER BY created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], record_row_from_rusqlite)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

fn query_all_records(conn: &Connection) -> Result<Vec<PatientRecord>, DatabaseError> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM records ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], record_row_from_rusqlite)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

// Internal row type for record mapping
struct RecordRow {
    id: String,
    user_id: String,
    created_at: String,
    name: String,
    age: i32,
    gravidity: i32,
    parity: i32,
    abortions: i32,
    height_cm: f64,
    pre_pregnancy_weight_kg: f64,
    current_weight_kg: f64,
    symptoms: String,
    blood_pressure: Option<String>,
    glucose_mg_dl: Option<f64>,
    hemoglobin_g_dl: Option<f64>,
    ocr_text: Option<String>,
    assessment: Option<String>,
}

fn record_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RecordRow, rusqlite::Error> {
    Ok(RecordRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: row.get(2)?,
        name: row.get(3)?,
        age: row.get(4)?,
        gravidity: row.get(5)?,
        parity: row.get(6)?,
        abortions: row.get(7)?,
        height_cm: row.get(8)?,
        pre_pregnancy_weight_kg: row.get(9)?,
        current_weight_kg: row.get(10)?,
        symptoms: row.get(11)?,
        blood_pressure: row.get(12)?,
        glucose_mg_dl: row.get(13)?,
        hemoglobin_g_dl: row.get(14)?,
        ocr_text: row.get(15)?,
        assessment: row.get(16)?,
    })
}

fn record_from_row(row: RecordRow) -> Result<PatientRecord, DatabaseError> {
    let id = Uuid::parse_str(&row.id)
        .map_err(|e| DatabaseError::CorruptValue(format!("record id: {e}")))?;
    let created_at = parse_timestamp(&row.created_at)?;
    let symptoms: SymptomChecklist = serde_json::from_str(&row.symptoms)?;

    // Assessment payloads keep their raw JSON so legacy and current shapes
    // both survive round-trips; unparseable payloads degrade to Absent.
    let assessment = match row.assessment.as_deref() {
        None => AiResponse::Absent,
        Some(raw) => serde_json::from_str::<serde_json::Value>(raw)
            .map(|v| AiResponse::from_value(&v))
            .unwrap_or(AiResponse::Absent),
    };

    Ok(PatientRecord {
        id,
        user_id: row.user_id,
        created_at,
        personal: PersonalInfo {
            name: row.name,
            age: row.age,
        },
        pregnancy: PregnancyHistory {
            gravidity: row.gravidity,
            parity: row.parity,
            abortions: row.abortions,
        },
        measurements: Measurements {
            height_cm: row.height_cm,
            pre_pregnancy_weight_kg: row.pre_pregnancy_weight_kg,
            current_weight_kg: row.current_weight_kg,
        },
        symptoms,
        labs: LabResults {
            blood_pressure: row.blood_pressure,
            glucose_mg_dl: row.glucose_mg_dl,
            hemoglobin_g_dl: row.hemoglobin_g_dl,
        },
        ocr_text: row.ocr_text,
        assessment,
    })
}

// ═══════════════════════════════════════════════════════════
// Users
// ═══════════════════════════════════════════════════════════

/// Mirror a login from the identity provider: create the profile document on
/// first sight, refresh `last_login` (and the name, when provided) after.
/// The stored role is never touched by a login.
pub fn upsert_user_login(
    conn: &Connection,
    user_id: &str,
    name: Option<&str>,
) -> Result<UserProfile, DatabaseError> {
    if user_id.trim().is_empty() {
        return Err(DatabaseError::MissingOwner);
    }
    let now = timestamp_string(&Utc::now());
    conn.execute(
        "INSERT INTO users (id, name, role, created_at, last_login)
         VALUES (?1, ?2, 'patient', ?3, ?3)
         ON CONFLICT(id) DO UPDATE SET
             last_login = excluded.last_login,
             name = COALESCE(excluded.name, users.name)",
        params![user_id, name, now],
    )?;
    get_user(conn, user_id)?.ok_or_else(|| {
        DatabaseError::CorruptValue(format!("user {user_id} missing after upsert"))
    })
}

/// Fetch a user profile by provider id.
pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, role, created_at, last_login FROM users WHERE id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, name, role, created_at, last_login)| {
        Ok(UserProfile {
            id,
            name,
            role: role.parse().unwrap_or(Role::Patient),
            created_at: parse_timestamp(&created_at)?,
            last_login: parse_timestamp(&last_login)?,
        })
    })
    .transpose()
}

/// Set a user's role (admin management).
pub fn set_user_role(conn: &Connection, user_id: &str, role: Role) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users SET role = ?2 WHERE id = ?1",
        params![user_id, role.as_str()],
    )?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Timestamps
// ═══════════════════════════════════════════════════════════

/// Fixed-width RFC 3339 so lexical ordering matches chronological ordering.
fn timestamp_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    // SQLite's datetime('now') writes "YYYY-MM-DD HH:MM:SS"; accept both.
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::CorruptValue(format!("timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_store;
    use crate::models::{
        LegacyAssessment, RiskDisplay, RiskScores, ScoredAssessment,
    };

    fn candidate(user_id: &str) -> NewRecord {
        NewRecord {
            user_id: user_id.into(),
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
            labs: Default::default(),
            ocr_text: None,
        }
    }

    fn scored(overall: f64) -> AiResponse {
        AiResponse::Scored(ScoredAssessment {
            risk_scores: RiskScores {
                overall_risk: overall,
                preeclampsia: Some(0.1),
                gestational_diabetes: Some(0.1),
                anemia: Some(0.1),
            },
            brief_summary: "ملخص".into(),
            detailed_report: "تقرير".into(),
            extracted_labs: Default::default(),
        })
    }

    #[test]
    fn insert_assigns_id_and_timestamp() {
        let conn = open_memory_store().unwrap();
        let stored = insert_record(&conn, &candidate("u1"), &scored(0.3)).unwrap();
        assert_eq!(stored.user_id, "u1");

        let fetched = get_record(&conn, &stored.id).unwrap().unwrap();
        assert_eq!(fetched.personal.name, "Amira");
        assert_eq!(fetched.created_at, stored.created_at);
    }

    #[test]
    fn insert_without_owner_fails_loudly() {
        let conn = open_memory_store().unwrap();
        let result = insert_record(&conn, &candidate("  "), &AiResponse::Absent);
        assert!(matches!(result, Err(DatabaseError::MissingOwner)));
    }

    #[test]
    fn list_for_user_orders_newest_first() {
        let conn = open_memory_store().unwrap();
        let first = insert_record(&conn, &candidate("u1"), &scored(0.2)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = insert_record(&conn, &candidate("u1"), &scored(0.4)).unwrap();
        insert_record(&conn, &candidate("u2"), &scored(0.9)).unwrap();

        let records = list_records_for_user(&conn, "u1");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[1].id, first.id);
    }

    #[test]
    fn list_all_spans_users() {
        let conn = open_memory_store().unwrap();
        insert_record(&conn, &candidate("u1"), &scored(0.2)).unwrap();
        insert_record(&conn, &candidate("u2"), &scored(0.4)).unwrap();
        assert_eq!(list_all_records(&conn).len(), 2);
    }

    #[test]
    fn read_failure_degrades_to_empty() {
        let conn = open_memory_store().unwrap();
        conn.execute_batch("DROP TABLE records").unwrap();
        assert!(list_records_for_user(&conn, "u1").is_empty());
        assert!(list_all_records(&conn).is_empty());
    }

    #[test]
    fn delete_existing_returns_true() {
        let conn = open_memory_store().unwrap();
        let stored = insert_record(&conn, &candidate("u1"), &scored(0.2)).unwrap();
        assert!(delete_record(&conn, &stored.id));
        assert!(get_record(&conn, &stored.id).unwrap().is_none());
    }

    #[test]
    fn delete_missing_returns_false_not_error() {
        let conn = open_memory_store().unwrap();
        assert!(!delete_record(&conn, &Uuid::new_v4()));
    }

    #[test]
    fn legacy_assessment_round_trips_through_store() {
        let conn = open_memory_store().unwrap();
        let legacy = AiResponse::Legacy(LegacyAssessment {
            urgency: "High".into(),
            brief_summary: Some("قديم".into()),
            detailed_report: None,
        });
        let stored = insert_record(&conn, &candidate("u1"), &legacy).unwrap();
        let fetched = get_record(&conn, &stored.id).unwrap().unwrap();
        assert!(matches!(
            fetched.assessment.risk_display(),
            RiskDisplay::Legacy("High")
        ));
    }

    #[test]
    fn absent_assessment_stored_as_null() {
        let conn = open_memory_store().unwrap();
        let stored = insert_record(&conn, &candidate("u1"), &AiResponse::Absent).unwrap();
        let fetched = get_record(&conn, &stored.id).unwrap().unwrap();
        assert!(matches!(fetched.assessment, AiResponse::Absent));
    }

    #[test]
    fn unparseable_stored_assessment_degrades_to_absent() {
        let conn = open_memory_store().unwrap();
        let stored = insert_record(&conn, &candidate("u1"), &scored(0.5)).unwrap();
        conn.execute(
            "UPDATE records SET assessment = 'not-json' WHERE id = ?1",
            params![stored.id.to_string()],
        )
        .unwrap();
        let fetched = get_record(&conn, &stored.id).unwrap().unwrap();
        assert!(matches!(fetched.assessment, AiResponse::Absent));
    }

    // ── Users ───────────────────────────────────────────

    #[test]
    fn first_login_creates_patient_profile() {
        let conn = open_memory_store().unwrap();
        let profile = upsert_user_login(&conn, "u1", Some("Amira")).unwrap();
        assert_eq!(profile.role, Role::Patient);
        assert_eq!(profile.name.as_deref(), Some("Amira"));
    }

    #[test]
    fn later_login_refreshes_last_login_and_keeps_role() {
        let conn = open_memory_store().unwrap();
        upsert_user_login(&conn, "u1", Some("Amira")).unwrap();
        set_user_role(&conn, "u1", Role::Admin).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));
        let profile = upsert_user_login(&conn, "u1", None).unwrap();
        assert_eq!(profile.role, Role::Admin, "login must not reset role");
        assert_eq!(profile.name.as_deref(), Some("Amira"), "name kept when login omits it");
        assert!(profile.last_login > profile.created_at);
    }

    #[test]
    fn empty_user_id_login_rejected() {
        let conn = open_memory_store().unwrap();
        assert!(matches!(
            upsert_user_login(&conn, "", None),
            Err(DatabaseError::MissingOwner)
        ));
    }

    #[test]
    fn get_unknown_user_is_none() {
        let conn = open_memory_store().unwrap();
        assert!(get_user(&conn, "nobody").unwrap().is_none());
    }
}
