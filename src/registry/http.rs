// src/registry/http.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::CandidateProvider;
use crate::models::{Candidate, MatchResult};
use crate::utils::config::MatcherConfig;

/// The registry search endpoint rejects larger pages.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_number: String,
    pub company_name: String,
    #[serde(default)]
    pub registered_office_address: Option<String>,
    #[serde(default)]
    pub company_category: Option<String>,
    #[serde(default)]
    pub company_status: Option<String>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub incorporation_date: Option<String>,
    #[serde(default)]
    pub sic_codes: Option<String>,
}

impl From<CompanyRecord> for Candidate {
    fn from(record: CompanyRecord) -> Self {
        Candidate::new(record.company_name, record.company_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub companies: Vec<CompanyRecord>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
}

/// HTTP client for the company registry search service.
pub struct RegistrySearchClient {
    http: Client,
    base_url: Url,
    max_concurrency: Option<usize>,
}

impl RegistrySearchClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid registry URL '{}'", base_url))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base_url,
            max_concurrency: None,
        })
    }

    pub fn from_config(config: &MatcherConfig) -> Result<Self> {
        Self::new(
            &config.registry_url,
            Duration::from_secs(config.registry_timeout_secs),
        )
    }

    /// Caps how many requests the batch runner keeps in flight.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    pub fn search_url(&self, query: &str, per_page: usize) -> Result<Url> {
        let mut url = self
            .base_url
            .join("search")
            .context("Failed to build search URL")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("per_page", &per_page.clamp(1, MAX_PAGE_SIZE).to_string());
        Ok(url)
    }

    pub async fn search(&self, query: &str, per_page: usize) -> Result<SearchResponse> {
        let url = self.search_url(query, per_page)?;
        debug!("Registry search: {}", url);
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Registry search for '{}' failed", query))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Registry search returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            ));
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse registry search response for '{}'", query))
    }

    /// Full registry record for a company number; `None` when the registry has no such company.
    pub async fn fetch_company(&self, company_number: &str) -> Result<Option<CompanyRecord>> {
        let mut url = self
            .base_url
            .join("company/")
            .context("Failed to build company URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Registry URL cannot carry a path"))?
            .pop_if_empty()
            .push(company_number.trim());

        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Registry lookup for company {} failed", company_number))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json()
                .await
                .map(Some)
                .with_context(|| format!("Failed to parse company {}", company_number)),
            status => Err(anyhow!(
                "Registry lookup for company {} returned {}",
                company_number,
                status
            )),
        }
    }

    /// Registry records for the high-confidence matches in `results`, aligned
    /// with `results`. Other entries, unknown companies and failed lookups are `None`.
    pub async fn enrich_matches(
        &self,
        results: &[MatchResult],
        workers: usize,
    ) -> Vec<Option<CompanyRecord>> {
        let lookups = results.iter().map(|result| async move {
            let number = match &result.best_match {
                Some(m) if result.is_high_confidence => m.id.as_str(),
                _ => return None,
            };
            match self.fetch_company(number).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("⚠️  Could not enrich match {}: {:#}", number, e);
                    None
                }
            }
        });
        stream::iter(lookups)
            .buffered(workers.max(1))
            .collect()
            .await
    }
}

#[async_trait]
impl CandidateProvider for RegistrySearchClient {
    async fn fetch_candidates(&self, normalized_query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let response = self.search(normalized_query, limit).await?;
        Ok(response
            .companies
            .into_iter()
            .take(limit)
            .map(Candidate::from)
            .collect())
    }

    fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchOutcome, MatchedCandidate};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned HTTP response and hands back the request line it saw.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{}", addr), handle)
    }

    const SEARCH_BODY: &str = r#"{
        "companies": [
            {"company_number": "00000001", "company_name": "APPLE LIMITED", "company_status": "Active"},
            {"company_number": "00000002", "company_name": "APPLE COMPUTERS LTD", "sic_codes": "62020"}
        ],
        "total": 2, "page": 1, "per_page": 10
    }"#;

    #[test]
    fn test_search_url_encodes_query_and_clamps_page() {
        let client = RegistrySearchClient::new("http://localhost:8000/api", Duration::from_secs(5)).unwrap();
        let url = client.search_url("smith and sons", 500).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/search?query=smith+and+sons&per_page=100"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(RegistrySearchClient::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_search_response_parses_optional_fields() {
        let parsed: SearchResponse = serde_json::from_str(SEARCH_BODY).unwrap();
        assert_eq!(parsed.total, 2);
        assert_eq!(parsed.companies[0].company_status.as_deref(), Some("Active"));
        assert_eq!(parsed.companies[1].registered_office_address, None);
        let candidate = Candidate::from(parsed.companies[1].clone());
        assert_eq!(candidate, Candidate::new("APPLE COMPUTERS LTD", "00000002"));
    }

    #[tokio::test]
    async fn test_fetch_candidates_against_local_server() {
        let (base, handle) = serve_once("200 OK", SEARCH_BODY).await;
        let client = RegistrySearchClient::new(&base, Duration::from_secs(5)).unwrap();
        let candidates = client.fetch_candidates("apple", 1).await.unwrap();
        assert_eq!(candidates, vec![Candidate::new("APPLE LIMITED", "00000001")]);

        let request_line = handle.await.unwrap();
        assert!(request_line.starts_with("GET /search?query=apple&per_page=1 "));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base, _handle) = serve_once("500 Internal Server Error", r#"{"detail":"db down"}"#).await;
        let client = RegistrySearchClient::new(&base, Duration::from_secs(5)).unwrap();
        let err = client.fetch_candidates("apple", 10).await.unwrap_err();
        let rendered = format!("{:#}", err);
        assert!(rendered.contains("500"), "{}", rendered);
        assert!(rendered.contains("db down"), "{}", rendered);
    }

    #[tokio::test]
    async fn test_fetch_company_maps_not_found_to_none() {
        let (base, handle) = serve_once("404 Not Found", r#"{"detail":"Company not found"}"#).await;
        let client = RegistrySearchClient::new(&base, Duration::from_secs(5)).unwrap();
        assert_eq!(client.fetch_company("01234567").await.unwrap(), None);
        assert!(handle.await.unwrap().starts_with("GET /company/01234567 "));
    }

    #[tokio::test]
    async fn test_enrich_matches_only_looks_up_high_confidence() {
        let body = r#"{"company_number": "00000002", "company_name": "APPLE COMPUTERS LTD", "company_status": "Active"}"#;
        let (base, handle) = serve_once("200 OK", body).await;
        let client = RegistrySearchClient::new(&base, Duration::from_secs(5)).unwrap();

        let matched = |id: &str, high: bool| MatchResult {
            query_name: Some("Apple".into()),
            normalized_query: Some("apple".into()),
            core_query: Some("apple".into()),
            best_match: Some(MatchedCandidate {
                id: id.into(),
                name: "APPLE COMPUTERS LTD".into(),
                normalized_name: "apple computers".into(),
            }),
            confidence: if high { 0.97 } else { 0.9 },
            is_high_confidence: high,
            scores: None,
            outcome: MatchOutcome::Matched,
        };
        let results = vec![
            MatchResult::empty_query(None),
            matched("00000009", false),
            matched("00000002", true),
        ];

        let records = client.enrich_matches(&results, 4).await;
        assert_eq!(records.len(), 3);
        assert!(records[0].is_none());
        assert!(records[1].is_none());
        let record = records[2].as_ref().unwrap();
        assert_eq!(record.company_status.as_deref(), Some("Active"));
        assert!(handle.await.unwrap().starts_with("GET /company/00000002 "));
    }

    #[tokio::test]
    async fn test_fetch_company_parses_record() {
        let body = r#"{"company_number": "01234567", "company_name": "ACME WIDGETS LIMITED", "incorporation_date": "2001-04-01"}"#;
        let (base, _handle) = serve_once("200 OK", body).await;
        let client = RegistrySearchClient::new(&base, Duration::from_secs(5)).unwrap();
        let record = client.fetch_company("01234567").await.unwrap().unwrap();
        assert_eq!(record.company_name, "ACME WIDGETS LIMITED");
        assert_eq!(record.incorporation_date.as_deref(), Some("2001-04-01"));
    }
}
