//! Record submission pipeline.
//!
//! One path: validate → fetch prior history → summarize → request assessment
//! → persist. Validation failures stop the flow before any network call; an
//! assessment failure stores nothing (no partial records).

use rusqlite::Connection;
use thiserror::Error;

use crate::ai::{request_assessment, summarize_history, AiError, GenAiClient};
use crate::db::{self, DatabaseError};
use crate::models::{AiResponse, NewRecord, PatientRecord};
use crate::validation::{validate_new_record, ValidationErrors};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Run the full submission pipeline for one candidate record.
pub fn submit_record<C: GenAiClient + ?Sized>(
    conn: &Connection,
    client: &C,
    model: &str,
    candidate: &NewRecord,
) -> Result<PatientRecord, SubmitError> {
    validate_new_record(candidate)?;

    let history = db::list_records_for_user(conn, &candidate.user_id);
    let summary = summarize_history(&history);
    tracing::debug!(
        user_id = %candidate.user_id,
        prior_records = history.len(),
        "requesting assessment"
    );

    let assessment = request_assessment(client, model, candidate, &summary)?;
    let stored = db::insert_record(conn, candidate, &AiResponse::Scored(assessment))?;
    tracing::info!(record_id = %stored.id, user_id = %stored.user_id, "record stored");
    Ok(stored)
}
