// src/config.rs
use crate::edgar::client::{RetryPolicy, EDGAR_REQUEST_DELAY};
use crate::extractors::{Statement, DEFAULT_STATEMENTS};
use crate::utils::AppError;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TICKERS_PATH: &str = "company_tickers.json";

static DEFAULT_DATA_BASE: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://data.sec.gov").expect("Failed to parse DEFAULT_DATA_BASE")
});

static DEFAULT_ARCHIVES_BASE: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://www.sec.gov").expect("Failed to parse DEFAULT_ARCHIVES_BASE")
});

static DEFAULT_TICKERS_URL: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://www.sec.gov/files/company_tickers.json")
        .expect("Failed to parse DEFAULT_TICKERS_URL")
});

static DEFAULT_XBRL_TO_JSON: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://api.sec-api.io/xbrl-to-json").expect("Failed to parse DEFAULT_XBRL_TO_JSON")
});

/// Hosts the pipeline talks to.
#[derive(Debug, Clone)]
pub struct EdgarEndpoints {
    /// Submission history API (data.sec.gov)
    pub data_base: Url,
    /// Archive host for filing index pages and documents (www.sec.gov)
    pub archives_base: Url,
    /// Source of the issuer directory snapshot
    pub tickers_url: Url,
    /// XBRL-to-JSON conversion endpoint
    pub xbrl_to_json: Url,
}

impl Default for EdgarEndpoints {
    fn default() -> Self {
        Self {
            data_base: DEFAULT_DATA_BASE.clone(),
            archives_base: DEFAULT_ARCHIVES_BASE.clone(),
            tickers_url: DEFAULT_TICKERS_URL.clone(),
            xbrl_to_json: DEFAULT_XBRL_TO_JSON.clone(),
        }
    }
}

/// Everything the pipeline needs, built once at startup and handed to
/// `FilingPipeline`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Name part of the EDGAR User-Agent
    pub user_agent_name: String,
    /// Contact email part of the EDGAR User-Agent
    pub user_agent_email: String,
    pub sec_api_key: String,
    /// Local issuer directory snapshot
    pub tickers_path: PathBuf,
    pub endpoints: EdgarEndpoints,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    /// Minimum spacing between EDGAR requests
    pub request_interval: Duration,
    /// Sections to pull out of the conversion response
    pub statements: Vec<Statement>,
}

impl PipelineConfig {
    pub fn new(
        user_agent_name: impl Into<String>,
        user_agent_email: impl Into<String>,
        sec_api_key: impl Into<String>,
    ) -> Self {
        Self {
            user_agent_name: user_agent_name.into(),
            user_agent_email: user_agent_email.into(),
            sec_api_key: sec_api_key.into(),
            tickers_path: PathBuf::from(DEFAULT_TICKERS_PATH),
            endpoints: EdgarEndpoints::default(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
            request_interval: EDGAR_REQUEST_DELAY,
            statements: DEFAULT_STATEMENTS.to_vec(),
        }
    }

    /// `"<name> (<email>)"`, the form EDGAR expects.
    pub fn user_agent(&self) -> String {
        format!("{} ({})", self.user_agent_name.trim(), self.user_agent_email.trim())
    }

    /// Replaces the statement selection, dropping duplicates. An empty
    /// selection keeps the default.
    pub fn with_statements(mut self, statements: &[Statement]) -> Self {
        if statements.is_empty() {
            return self;
        }
        let mut selected = Vec::with_capacity(statements.len());
        for statement in statements {
            if !selected.contains(statement) {
                selected.push(*statement);
            }
        }
        self.statements = selected;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.user_agent_name.trim().is_empty() {
            return Err(AppError::Config("User-Agent name must not be empty".to_string()));
        }
        let email = self.user_agent_email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Config(format!(
                "User-Agent email '{}' is not a valid contact address",
                email
            )));
        }
        if self.sec_api_key.trim().is_empty() {
            return Err(AppError::Config("sec-api key must not be empty".to_string()));
        }
        if self.statements.is_empty() {
            return Err(AppError::Config("at least one statement must be selected".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(AppError::Config("request timeout must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::new("Jane Analyst", "jane@example.com", "key")
    }

    #[test]
    fn user_agent_format() {
        assert_eq!(config().user_agent(), "Jane Analyst (jane@example.com)");
    }

    #[test]
    fn defaults() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.statements, vec![Statement::CashFlow]);
        assert_eq!(config.tickers_path, PathBuf::from("company_tickers.json"));
        assert_eq!(config.endpoints.data_base.as_str(), "https://data.sec.gov/");
    }

    #[test]
    fn rejects_missing_identity_and_key() {
        let mut bad = config();
        bad.user_agent_email = "not-an-email".to_string();
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.user_agent_name = "  ".to_string();
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.sec_api_key = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn statement_selection_dedupes_and_keeps_default_when_empty() {
        let config =
            config().with_statements(&[Statement::Income, Statement::CashFlow, Statement::Income]);
        assert_eq!(config.statements, vec![Statement::Income, Statement::CashFlow]);

        let config = config.with_statements(&[]);
        assert_eq!(config.statements, vec![Statement::Income, Statement::CashFlow]);
    }
}
