//! HTTP page source for the museum collection API

use std::time::Duration;
use reqwest::blocking::Client;
use serde::Deserialize;
use crate::{Error, Result};
use crate::record::RawRecord;
use super::PageSource;

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://api.harvardartmuseums.org";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Records are decoded one by one so a malformed entry cannot drop the page
#[derive(Deserialize)]
struct ObjectPage {
    records: Option<Vec<serde_json::Value>>,
}

/// Fetches pages from `GET {base_url}/object`
pub struct HttpPageSource {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpPageSource {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/object", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, category: &str, page: u32, page_size: u32) -> Result<Vec<RawRecord>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apikey", self.api_key.clone()),
                ("classification", category.to_string()),
                ("size", page_size.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .map_err(|e| Error::RemoteUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteUnavailable(format!("API error: {}", status)));
        }

        let body: ObjectPage = response
            .json()
            .map_err(|e| Error::RemoteUnavailable(format!("invalid response body: {}", e)))?;

        Ok(body
            .records
            .unwrap_or_default()
            .into_iter()
            .map(RawRecord::from_value)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    async fn object_handler(
        Query(params): Query<HashMap<String, String>>,
    ) -> std::result::Result<Json<serde_json::Value>, StatusCode> {
        if params.get("apikey").map(String::as_str) != Some("test-key") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let classification = params.get("classification").cloned().unwrap_or_default();
        if classification == "Broken" {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        let page: i64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
        let size: i64 = params.get("size").and_then(|s| s.parse().ok()).unwrap_or(0);

        if classification == "Mixed" {
            let body = match page {
                1 => serde_json::json!({"records": [
                    {"id": 1, "accessionyear": 1977},
                    {"id": 2, "accessionyear": "c. 1977", "colors": "none"},
                    {"id": 3, "rank": "high", "colors": [{"hue": "Grey", "percent": 0.5}]}
                ]}),
                2 => serde_json::json!({"records": [{"id": 4, "title": 12}]}),
                _ => serde_json::json!({"records": []}),
            };
            return Ok(Json(body));
        }

        let records: Vec<serde_json::Value> = (0..size)
            .map(|i| {
                serde_json::json!({
                    "id": i + 1,
                    "classification": classification,
                    "colors": [{"hue": "Grey", "percent": 0.5}]
                })
            })
            .collect();

        let body = match page {
            1 => serde_json::json!({"info": {"page": 1}, "records": records}),
            2 => serde_json::json!({"info": {"page": 2}, "records": []}),
            _ => serde_json::json!({"info": {"page": page}}),
        };
        Ok(Json(body))
    }

    fn spawn_api() -> SocketAddr {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                let app = Router::new().route("/object", get(object_handler));
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });
        rx.recv().unwrap()
    }

    fn source(addr: SocketAddr, key: &str) -> HttpPageSource {
        HttpPageSource::new(&format!("http://{}/", addr), key, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let source = HttpPageSource::new("http://localhost:9/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(source.endpoint(), "http://localhost:9/object");
    }

    #[test]
    fn test_fetches_records_with_query_parameters() {
        let addr = spawn_api();
        let records = source(addr, "test-key").fetch_page("Coins", 1, 4).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].id, Some(1));
        assert_eq!(records[3].classification.as_deref(), Some("Coins"));
        assert_eq!(records[0].color_rows().len(), 1);
    }

    #[test]
    fn test_empty_and_missing_records_mean_end_of_data() {
        let addr = spawn_api();
        let source = source(addr, "test-key");
        assert!(source.fetch_page("Coins", 2, 10).unwrap().is_empty());
        assert!(source.fetch_page("Coins", 3, 10).unwrap().is_empty());
    }

    #[test]
    fn test_non_success_status_is_remote_unavailable() {
        let addr = spawn_api();
        let err = source(addr, "test-key").fetch_page("Broken", 1, 10).unwrap_err();
        assert!(matches!(err, Error::RemoteUnavailable(ref m) if m.contains("500")));

        let err = source(addr, "wrong-key").fetch_page("Coins", 1, 10).unwrap_err();
        assert!(matches!(err, Error::RemoteUnavailable(ref m) if m.contains("401")));
    }

    #[test]
    fn test_mistyped_fields_keep_page_and_later_pages() {
        let addr = spawn_api();
        let source = source(addr, "test-key");
        let collection = super::super::Collector::new(&source, 3, 25).collect("Mixed");

        assert_eq!(collection.stop, super::super::StopReason::Exhausted);
        assert_eq!(collection.requests, 3);
        let ids: Vec<_> = collection.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4)]);

        assert_eq!(collection.records[0].accessionyear, Some(1977));
        assert_eq!(collection.records[1].accessionyear, None);
        assert!(collection.records[1].color_rows().is_empty());
        assert_eq!(collection.records[2].rank, None);
        assert_eq!(collection.records[2].color_rows().len(), 1);
        assert_eq!(collection.records[3].title, None);
    }

    #[test]
    fn test_collector_over_http_stops_on_empty_page() {
        let addr = spawn_api();
        let source = source(addr, "test-key");
        let collection = super::super::Collector::new(&source, 2, 25).collect("Coins");

        assert_eq!(collection.records.len(), 2);
        assert_eq!(collection.requests, 2);
        assert_eq!(collection.stop, super::super::StopReason::Exhausted);
    }
}
