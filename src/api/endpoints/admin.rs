//! Admin endpoints: the full record table, deletion, and CSV export.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser, RecordView};
use crate::db;
use crate::export::export_records_csv;

#[derive(Serialize)]
pub struct AdminRecordsResponse {
    pub records: Vec<RecordView>,
    pub total: usize,
}

/// `GET /api/admin/records` — every stored record, newest first.
pub async fn list_all(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AdminRecordsResponse>, ApiError> {
    user.require_admin()?;

    let conn = ctx.state.open_store()?;
    let records: Vec<RecordView> = db::list_all_records(&conn)
        .into_iter()
        .map(RecordView::from_record)
        .collect();
    let total = records.len();
    Ok(Json(AdminRecordsResponse { records, total }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// `DELETE /api/admin/records/:id` — remove one record.
///
/// Always 200 with a boolean flag; a missing id is `deleted: false`.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    user.require_admin()?;

    let conn = ctx.state.open_store()?;
    let deleted = db::delete_record(&conn, &id);
    if deleted {
        tracing::info!(record_id = %id, admin_id = %user.id, "record deleted");
    }
    Ok(Json(DeleteResponse { deleted }))
}

/// `GET /api/admin/export.csv` — full record collection as CSV.
pub async fn export_csv(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;

    let conn = ctx.state.open_store()?;
    let records = db::list_all_records(&conn);
    let csv = export_records_csv(&records);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"records.csv\"".to_string(),
            ),
        ],
        csv,
    ))
}
