// src/storage/mod.rs
use crate::pipeline::StatementReport;
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    // /base_dir/TICKER/accession/
    fn report_dir(&self, report: &StatementReport) -> Result<PathBuf, StorageError> {
        let target_dir = self
            .base_dir
            .join(report.ticker.to_uppercase())
            .join(&report.accession_number);

        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        Ok(target_dir)
    }

    /// Saves the extracted statements as pretty-printed JSON
    pub fn save_statements(&self, report: &StatementReport) -> Result<PathBuf, StorageError> {
        let file_path = self.report_dir(report)?.join("statements.json");

        let json = serde_json::to_string_pretty(&report.statements)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved statements to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves where the statements came from, in JSON format
    pub fn save_report_metadata(&self, report: &StatementReport) -> Result<PathBuf, StorageError> {
        let file_path = self.report_dir(report)?.join("metadata.json");

        let metadata = serde_json::json!({
            "ticker": report.ticker,
            "company_name": report.company_name,
            "cik": report.cik,
            "accession_number": report.accession_number,
            "filing_date": report.filing_date,
            "document_url": report.document_url,
            "statements": report.statements.keys().collect::<Vec<_>>(),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}
