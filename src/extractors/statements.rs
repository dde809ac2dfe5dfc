// src/extractors/statements.rs
use crate::edgar::client::{with_retry, RetryPolicy};
use crate::utils::error::ExtractError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

// Longest slice of an error body we carry into an error message
const MAX_ERROR_BODY: usize = 300;

/// Extracted statements keyed by output name, e.g. `CashFlowStatement`.
pub type FinancialStatements = Map<String, Value>;

/// Statement sections of an XBRL-to-JSON response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Statement {
    CashFlow,
    Income,
    BalanceSheet,
}

impl Statement {
    /// Key in the conversion service response.
    pub const fn source_key(self) -> &'static str {
        match self {
            Self::CashFlow => "StatementsOfCashFlows",
            Self::Income => "StatementsOfIncome",
            Self::BalanceSheet => "BalanceSheets",
        }
    }

    /// Key in our result.
    pub const fn output_key(self) -> &'static str {
        match self {
            Self::CashFlow => "CashFlowStatement",
            Self::Income => "IncomeStatement",
            Self::BalanceSheet => "BalanceSheet",
        }
    }
}

/// Only the cash-flow statement is extracted unless asked otherwise.
pub const DEFAULT_STATEMENTS: &[Statement] = &[Statement::CashFlow];

/// Converts a filing's primary HTML document into XBRL-derived JSON.
#[async_trait]
pub trait XbrlConverter: Send + Sync {
    async fn xbrl_to_json(&self, htm_url: &str) -> Result<Value, ExtractError>;
}

/// sec-api.io XBRL-to-JSON client.
pub struct SecApiClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl SecApiClient {
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    fn request_url(&self, htm_url: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("htm-url", htm_url)
            .append_pair("token", &self.api_key);
        url
    }
}

// reqwest errors print the request URL, which carries the API key.
fn transport(e: reqwest::Error) -> ExtractError {
    ExtractError::Transport(e.without_url().to_string())
}

#[async_trait]
impl XbrlConverter for SecApiClient {
    async fn xbrl_to_json(&self, htm_url: &str) -> Result<Value, ExtractError> {
        tracing::info!("Requesting XBRL-to-JSON conversion for {}", htm_url);

        let response = self
            .client
            .get(self.request_url(htm_url))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            tracing::error!("Conversion service returned {} for {}", status, htm_url);
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(ExtractError::Service { status: status.as_u16(), message });
        }

        tracing::debug!("Conversion response is {} bytes", body.len());
        serde_json::from_str(&body).map_err(|e| ExtractError::Malformed(e.to_string()))
    }
}

/// Copies each selected section out of a conversion response. A section
/// that is absent or null fails the whole extraction.
pub fn extract_statements(
    xbrl_json: &Value,
    selection: &[Statement],
) -> Result<FinancialStatements, ExtractError> {
    let sections = xbrl_json.as_object().ok_or_else(|| {
        ExtractError::Malformed("expected a JSON object at the top level".to_string())
    })?;

    let mut statements = FinancialStatements::new();
    for statement in selection {
        match sections.get(statement.source_key()) {
            Some(Value::Null) | None => {
                return Err(ExtractError::MissingSection(statement.source_key().to_string()));
            }
            Some(section) => {
                statements.insert(statement.output_key().to_string(), section.clone());
            }
        }
    }
    Ok(statements)
}

/// Converts the document at `htm_url` and extracts `selection` from it.
pub async fn extract_financial_statements(
    converter: &dyn XbrlConverter,
    policy: &RetryPolicy,
    htm_url: &str,
    selection: &[Statement],
) -> Result<FinancialStatements, ExtractError> {
    let xbrl_json = with_retry(policy, htm_url, || converter.xbrl_to_json(htm_url)).await?;
    let statements = extract_statements(&xbrl_json, selection)?;
    tracing::info!(
        "Extracted {} statement section(s): {}",
        statements.len(),
        statements.keys().cloned().collect::<Vec<_>>().join(", ")
    );
    Ok(statements)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Replies with queued results in order, repeating the last one.
    pub(crate) struct FakeConverter {
        replies: Mutex<Vec<Result<Value, ExtractError>>>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl FakeConverter {
        pub(crate) fn new(replies: Vec<Result<Value, ExtractError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                requested: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn returning(value: Value) -> Self {
            Self::new(vec![Ok(value)])
        }
    }

    #[async_trait]
    impl XbrlConverter for FakeConverter {
        async fn xbrl_to_json(&self, htm_url: &str) -> Result<Value, ExtractError> {
            self.requested.lock().unwrap().push(htm_url.to_string());
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.remove(0)
            } else {
                replies[0].clone()
            }
        }
    }
}
