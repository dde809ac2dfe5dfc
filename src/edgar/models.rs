// src/edgar/models.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;

/// Form type of the annual report we are after.
pub const ANNUAL_REPORT_FORM: &str = "10-K";

static ACCESSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{10}-\d{2}-\d{6}$").expect("Failed to compile ACCESSION_RE")
});

/// Central Index Key.
///
/// `Display` renders the bare number (as used in archive paths);
/// `padded()` renders the 10-digit form used by the submissions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cik(u64);

impl Cik {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn padded(self) -> String {
        format!("{:010}", self.0)
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dash-delimited accession number, e.g. `0000320193-23-000106`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessionNumber(String);

impl AccessionNumber {
    /// Validates a user-supplied accession number.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if ACCESSION_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(format!(
                "Invalid accession number '{}', expected the form 0000320193-23-000106",
                raw
            ))
        }
    }

    /// Wraps an accession number as reported by EDGAR itself.
    pub(crate) fn from_edgar(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn without_dashes(&self) -> String {
        self.0.replace('-', "")
    }
}

impl fmt::Display for AccessionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Subset of the EDGAR company submission index we rely on.
/// Example: https://data.sec.gov/submissions/CIK0000320193.json
#[derive(Debug, Deserialize)]
pub struct CompanySubmission {
    #[serde(default)]
    pub name: String,
    pub filings: Filings,
}

#[derive(Debug, Deserialize)]
pub struct Filings {
    pub recent: RecentFilings,
}

/// Parallel columns, one element per filing, most recent first.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    pub accession_number: Vec<String>,
    #[serde(default)]
    pub filing_date: Vec<String>,
    pub form: Vec<String>,
}

/// One resolved filing.
///
/// Only built from a submission entry whose form is exactly `10-K`, or from
/// an accession number the caller supplied explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingReference {
    cik: Cik,
    accession_number: AccessionNumber,
    filing_date: Option<String>,
}

impl FilingReference {
    pub(crate) fn annual_report(
        cik: Cik,
        accession_number: AccessionNumber,
        filing_date: Option<String>,
    ) -> Self {
        Self { cik, accession_number, filing_date }
    }

    pub fn from_accession(cik: Cik, accession_number: AccessionNumber) -> Self {
        Self { cik, accession_number, filing_date: None }
    }

    pub fn cik(&self) -> Cik {
        self.cik
    }

    pub fn accession_number(&self) -> &AccessionNumber {
        &self.accession_number
    }

    pub fn filing_date(&self) -> Option<&str> {
        self.filing_date.as_deref()
    }
}
