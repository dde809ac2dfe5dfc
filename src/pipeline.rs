// src/pipeline.rs
use crate::config::{EdgarEndpoints, PipelineConfig};
use crate::edgar::client::{Fetcher, RetryPolicy};
use crate::edgar::directory::IssuerDirectory;
use crate::edgar::index::resolve_primary_document;
use crate::edgar::locator::locate_latest_annual_report;
use crate::edgar::models::{AccessionNumber, FilingReference};
use crate::extractors::statements::extract_financial_statements;
use crate::extractors::{FinancialStatements, Statement, XbrlConverter};
use crate::utils::error::{PipelineError, Stage};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one run: where the numbers came from, and the numbers.
#[derive(Debug, Clone, Serialize)]
pub struct StatementReport {
    pub ticker: String,
    pub company_name: String,
    /// 10-digit padded CIK
    pub cik: String,
    pub accession_number: String,
    pub filing_date: Option<String>,
    pub document_url: String,
    pub statements: FinancialStatements,
}

/// ticker → CIK → latest 10-K → primary document → financial statements.
///
/// Stages run strictly in order and the first failure aborts the run.
pub struct FilingPipeline {
    directory: Arc<IssuerDirectory>,
    fetcher: Arc<dyn Fetcher>,
    converter: Arc<dyn XbrlConverter>,
    endpoints: EdgarEndpoints,
    retry: RetryPolicy,
    statements: Vec<Statement>,
}

impl FilingPipeline {
    pub fn new(
        config: &PipelineConfig,
        directory: Arc<IssuerDirectory>,
        fetcher: Arc<dyn Fetcher>,
        converter: Arc<dyn XbrlConverter>,
    ) -> Self {
        Self {
            directory,
            fetcher,
            converter,
            endpoints: config.endpoints.clone(),
            retry: config.retry,
            statements: config.statements.clone(),
        }
    }

    /// Runs every stage for `ticker`. A supplied accession number skips the
    /// filing locator.
    pub async fn run(
        &self,
        ticker: &str,
        accession: Option<AccessionNumber>,
    ) -> Result<StatementReport, PipelineError> {
        // 1. Ticker -> CIK
        let issuer = self
            .directory
            .lookup(ticker)
            .map_err(|e| PipelineError::new(Stage::TickerResolver, e))?;
        tracing::info!(
            "Ticker {} resolved to CIK {} ({})",
            ticker,
            issuer.cik.padded(),
            issuer.name
        );

        // 2. CIK -> most recent 10-K
        let filing = match accession {
            Some(accession) => {
                tracing::info!("Using supplied accession number {}", accession);
                FilingReference::from_accession(issuer.cik, accession)
            }
            None => locate_latest_annual_report(
                self.fetcher.as_ref(),
                self.endpoints.data_base.as_str(),
                &self.retry,
                issuer.cik,
            )
            .await
            .map_err(|e| PipelineError::new(Stage::FilingLocator, e))?,
        };

        // 3. Filing index -> primary document
        let document_url = resolve_primary_document(
            self.fetcher.as_ref(),
            &self.endpoints.archives_base,
            &self.retry,
            &filing,
        )
        .await
        .map_err(|e| PipelineError::new(Stage::DocumentResolver, e))?;

        // 4. Document -> statements
        let statements = extract_financial_statements(
            self.converter.as_ref(),
            &self.retry,
            &document_url,
            &self.statements,
        )
        .await
        .map_err(|e| PipelineError::new(Stage::StatementExtractor, e))?;

        Ok(StatementReport {
            ticker: ticker.to_string(),
            company_name: issuer.name.clone(),
            cik: issuer.cik.padded(),
            accession_number: filing.accession_number().to_string(),
            filing_date: filing.filing_date().map(str::to_string),
            document_url,
            statements,
        })
    }
}
