// src/edgar/directory.rs
use crate::edgar::client::{fetch_success, Fetcher, RetryPolicy};
use crate::edgar::models::Cik;
use crate::utils::error::{EdgarError, NotFound};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// SEC snapshot entry: {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}
#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    cik_str: CikField,
    ticker: String,
    #[serde(default)]
    title: String,
}

// The SEC publishes cik_str as an integer despite the name; older mirrors quote it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CikField {
    Number(u64),
    Text(String),
}

impl CikField {
    fn to_cik(&self) -> Option<Cik> {
        match self {
            Self::Number(n) => Some(Cik::new(*n)),
            Self::Text(s) => s.trim().parse().ok().map(Cik::new),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerRecord {
    pub cik: Cik,
    pub name: String,
}

/// Read-only ticker → issuer mapping loaded from a local snapshot.
#[derive(Debug, Default)]
pub struct IssuerDirectory {
    by_ticker: HashMap<String, IssuerRecord>,
}

impl IssuerDirectory {
    /// Loads the snapshot at `path`. A missing or unparseable file is a
    /// `DirectoryUnavailable` error, never an unknown ticker.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, EdgarError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            EdgarError::DirectoryUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let directory = Self::from_json(&raw).map_err(|e| match e {
            EdgarError::DirectoryUnavailable(msg) => {
                EdgarError::DirectoryUnavailable(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::info!(
            "Loaded issuer directory with {} tickers from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    pub fn from_json(raw: &str) -> Result<Self, EdgarError> {
        let entries: BTreeMap<String, DirectoryEntry> = serde_json::from_str(raw)
            .map_err(|e| {
                EdgarError::DirectoryUnavailable(format!("invalid snapshot JSON: {}", e))
            })?;

        // Keys are "0", "1", ... ; keep the SEC's numeric order so the first
        // occurrence of a duplicated ticker wins.
        let mut ordered: Vec<(&String, &DirectoryEntry)> = entries.iter().collect();
        ordered.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(u64::MAX));

        let mut by_ticker = HashMap::with_capacity(ordered.len());
        for (key, entry) in ordered {
            let Some(cik) = entry.cik_str.to_cik() else {
                tracing::warn!(
                    "Skipping directory entry {} ({}): unparseable CIK",
                    key,
                    entry.ticker
                );
                continue;
            };
            by_ticker.entry(entry.ticker.clone()).or_insert_with(|| IssuerRecord {
                cik,
                name: entry.title.clone(),
            });
        }

        let directory = Self { by_ticker };
        if directory.is_empty() {
            return Err(EdgarError::DirectoryUnavailable(
                "snapshot holds no usable entries".to_string(),
            ));
        }
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.by_ticker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ticker.is_empty()
    }

    /// Case-sensitive lookup of the ticker exactly as supplied.
    pub fn lookup(&self, ticker: &str) -> Result<&IssuerRecord, NotFound> {
        self.by_ticker
            .get(ticker)
            .ok_or_else(|| NotFound::Ticker(ticker.to_string()))
    }
}

/// Downloads a fresh copy of the SEC ticker file, checks that it parses and
/// writes it to `path`.
pub async fn refresh_snapshot(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
    path: &Path,
) -> Result<IssuerDirectory, EdgarError> {
    tracing::info!("Refreshing issuer directory snapshot from {}", url);
    let raw = fetch_success(fetcher, url, policy).await?;
    let directory = IssuerDirectory::from_json(&raw)?;

    tokio::fs::write(path, raw.as_bytes()).await.map_err(|e| {
        EdgarError::DirectoryUnavailable(format!("failed to write {}: {}", path.display(), e))
    })?;

    tracing::info!(
        "Saved issuer directory snapshot ({} tickers) to {}",
        directory.len(),
        path.display()
    );
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::client::testing::FakeFetcher;
    use crate::utils::error::ErrorKind;

    const SNAPSHOT: &str = r#"{
        "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
        "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"},
        "2": {"cik_str": "1652044", "ticker": "GOOGL", "title": "Alphabet Inc."},
        "10": {"cik_str": 1, "ticker": "AAPL", "title": "Duplicate"}
    }"#;

    fn cik_of(directory: &IssuerDirectory, ticker: &str) -> Result<Cik, NotFound> {
        directory.lookup(ticker).map(|record| record.cik)
    }

    #[test]
    fn resolves_padded_cik() {
        let directory = IssuerDirectory::from_json(SNAPSHOT).unwrap();
        let expected = [("AAPL", "0000320193"), ("MSFT", "0000789019"), ("GOOGL", "0001652044")];
        for (ticker, padded) in expected {
            let cik = cik_of(&directory, ticker).unwrap();
            assert_eq!(cik.padded(), padded);
            assert_eq!(cik.padded().len(), 10);
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let directory = IssuerDirectory::from_json(SNAPSHOT).unwrap();
        assert_eq!(directory.len(), 3);
        assert_eq!(directory.lookup("AAPL").unwrap().name, "Apple Inc.");
    }

    #[test]
    fn unknown_ticker_is_not_found() {
        let directory = IssuerDirectory::from_json(SNAPSHOT).unwrap();
        assert_eq!(cik_of(&directory, "ZZZZ"), Err(NotFound::Ticker("ZZZZ".to_string())));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let directory = IssuerDirectory::from_json(SNAPSHOT).unwrap();
        assert!(directory.lookup("aapl").is_err());
    }

    #[test]
    fn snapshot_without_usable_entries_is_directory_unavailable() {
        let err = IssuerDirectory::from_json("{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryUnavailable);

        let unparseable = r#"{"0": {"cik_str": "n/a", "ticker": "AAPL", "title": "Apple Inc."}}"#;
        let err = IssuerDirectory::from_json(unparseable).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryUnavailable);
    }

    #[tokio::test]
    async fn missing_file_is_directory_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = IssuerDirectory::load(dir.path().join("company_tickers.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryUnavailable);
    }

    #[tokio::test]
    async fn malformed_file_is_directory_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company_tickers.json");
        std::fs::write(&path, "[not json").unwrap();
        let err = IssuerDirectory::load(&path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryUnavailable);
        assert!(err.to_string().contains("company_tickers.json"));
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company_tickers.json");
        std::fs::write(&path, SNAPSHOT).unwrap();
        let directory = IssuerDirectory::load(&path).await.unwrap();
        assert_eq!(cik_of(&directory, "MSFT").unwrap(), Cik::new(789019));
    }

    #[tokio::test]
    async fn refresh_writes_validated_snapshot() {
        let url = "https://www.sec.gov/files/company_tickers.json";
        let fetcher = FakeFetcher::new().respond(url, 200, SNAPSHOT);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company_tickers.json");

        let directory = refresh_snapshot(&fetcher, url, &RetryPolicy::none(), &path)
            .await
            .unwrap();
        assert_eq!(directory.len(), 3);
        assert!(IssuerDirectory::load(&path).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_without_touching_disk() {
        let url = "https://www.sec.gov/files/company_tickers.json";
        let fetcher = FakeFetcher::new().respond(url, 200, "<html>maintenance</html>");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company_tickers.json");

        let refreshed = refresh_snapshot(&fetcher, url, &RetryPolicy::none(), &path).await;
        assert!(refreshed.is_err());
        assert!(!path.exists());
    }
}
