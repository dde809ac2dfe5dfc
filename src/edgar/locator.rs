// src/edgar/locator.rs
use crate::edgar::client::{fetch_success, Fetcher, RetryPolicy};
use crate::edgar::models::{
    AccessionNumber, Cik, CompanySubmission, FilingReference, RecentFilings, ANNUAL_REPORT_FORM,
};
use crate::utils::error::{EdgarError, NotFound, RetrievalError};

pub fn submissions_url(data_base: &str, cik: Cik) -> String {
    format!("{}/submissions/CIK{}.json", data_base.trim_end_matches('/'), cik.padded())
}

/// Fetches the submission history for `cik` and returns its most recent 10-K.
pub async fn locate_latest_annual_report(
    fetcher: &dyn Fetcher,
    data_base: &str,
    policy: &RetryPolicy,
    cik: Cik,
) -> Result<FilingReference, EdgarError> {
    let url = submissions_url(data_base, cik);
    tracing::info!("Fetching submission history for CIK {}", cik.padded());

    let body = fetch_success(fetcher, &url, policy).await?;
    let submission: CompanySubmission = serde_json::from_str(&body).map_err(|e| {
        RetrievalError::Decode { url: url.clone(), message: e.to_string() }
    })?;

    tracing::debug!(
        "Submission history for {} lists {} recent filings",
        submission.name,
        submission.filings.recent.form.len()
    );

    let filing = find_latest_annual_report(&submission.filings.recent, cik)?;
    tracing::info!(
        "Most recent 10-K: {} (filed {})",
        filing.accession_number(),
        filing.filing_date().unwrap_or("unknown")
    );
    Ok(filing)
}

/// First entry whose form is exactly `10-K`. EDGAR lists filings most recent
/// first, so no sorting is done.
pub fn find_latest_annual_report(
    recent: &RecentFilings,
    cik: Cik,
) -> Result<FilingReference, NotFound> {
    for (i, form) in recent.form.iter().enumerate() {
        if form != ANNUAL_REPORT_FORM {
            continue;
        }
        let Some(accession) = recent.accession_number.get(i) else {
            tracing::warn!(
                "10-K entry {} for CIK {} has no accession number, skipping",
                i,
                cik.padded()
            );
            continue;
        };
        return Ok(FilingReference::annual_report(
            cik,
            AccessionNumber::from_edgar(accession),
            recent.filing_date.get(i).cloned(),
        ));
    }

    Err(NotFound::AnnualReport(cik.padded()))
}
