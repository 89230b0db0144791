pub mod csv;
pub mod pdf;

pub use csv::export_records_csv;
pub use pdf::record_report_pdf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}
