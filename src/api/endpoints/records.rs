//! Record endpoints: submission pipeline, own-history listing, report PDF.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser, RecordView};
use crate::db;
use crate::export::record_report_pdf;
use crate::models::{
    LabResults, Measurements, NewRecord, PersonalInfo, PregnancyHistory, Role, SymptomChecklist,
};
use crate::submission::submit_record;

/// Submission body — the candidate record sans ownership, which comes from
/// the authenticated user, never from the client payload.
#[derive(Deserialize)]
pub struct SubmitRequest {
    pub personal: PersonalInfo,
    pub pregnancy: PregnancyHistory,
    pub measurements: Measurements,
    #[serde(default)]
    pub symptoms: SymptomChecklist,
    #[serde(default)]
    pub labs: LabResults,
    #[serde(default)]
    pub ocr_text: Option<String>,
}

/// `POST /api/records` — run the full submission pipeline.
///
/// The AI call blocks, so the whole pipeline runs on a blocking task.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<RecordView>, ApiError> {
    let candidate = NewRecord {
        user_id: user.id,
        personal: request.personal,
        pregnancy: request.pregnancy,
        measurements: request.measurements,
        symptoms: request.symptoms,
        labs: request.labs,
        ocr_text: request.ocr_text,
    };

    let state = ctx.state.clone();
    let stored = tokio::task::spawn_blocking(move || {
        let conn = state.open_store()?;
        let client = state.ai();
        submit_record(
            &conn,
            client.as_ref(),
            &state.config.assessment_model,
            &candidate,
        )
        .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("submission task failed: {e}")))??;

    Ok(Json(RecordView::from_record(stored)))
}

#[derive(Serialize)]
pub struct RecordListResponse {
    pub records: Vec<RecordView>,
    pub total: usize,
}

/// `GET /api/records` — own records, newest first.
pub async fn list_own(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RecordListResponse>, ApiError> {
    let conn = ctx.state.open_store()?;
    let records = db::list_records_for_user(&conn, &user.id);
    let records: Vec<RecordView> = records.into_iter().map(RecordView::from_record).collect();
    let total = records.len();
    Ok(Json(RecordListResponse { records, total }))
}

/// `GET /api/records/:id/report.pdf` — single-page assessment report.
///
/// Patients can export their own records; admins any record.
pub async fn report_pdf(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = ctx.state.open_store()?;
    let record = db::get_record(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Record not found".into()))?;

    if record.user_id != user.id && user.role != Role::Admin {
        return Err(ApiError::NotFound("Record not found".into()));
    }

    let bytes = record_report_pdf(&record)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"assessment-{id}.pdf\""),
            ),
        ],
        bytes,
    ))
}
