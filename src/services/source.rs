//! Yearly snapshot sources.
//!
//! Each source serves one JSON document per year, `observations_{year}.json`,
//! with an `observations` array of raw records.

use reqwest::header::{HeaderValue, USER_AGENT};
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;

use crate::errors::AppError;
use crate::models::record::RawRecord;

/// Something that can produce the raw records of one year.
pub trait ObservationSource: Send + Sync + 'static {
    fn fetch_year(&self, year: i32)
        -> impl Future<Output = Result<Vec<RawRecord>, AppError>> + Send;
}

pub fn year_file_name(year: i32) -> String {
    format!("observations_{}.json", year)
}

/// Decode a yearly document. Only the `observations` array is required;
/// elements that fail to decode are skipped.
pub fn decode_year_document(year: i32, doc: Value) -> Result<Vec<RawRecord>, AppError> {
    let Value::Object(mut doc) = doc else {
        return Err(AppError::DataFormat(format!(
            "year {}: document is not a JSON object",
            year
        )));
    };

    if let Some(declared) = doc.get("year").and_then(Value::as_i64) {
        if declared != i64::from(year) {
            tracing::warn!(
                "Year {}: document declares year {}, using requested year",
                year,
                declared
            );
        }
    }

    let Some(Value::Array(items)) = doc.remove("observations") else {
        return Err(AppError::DataFormat(format!(
            "year {}: missing 'observations' array",
            year
        )));
    };

    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!("Year {}: skipping observation #{}: {}", year, index, e);
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            "Year {}: decoded {} of {} observations",
            year,
            records.len(),
            total
        );
    }
    Ok(records)
}

// --- HTTP ---

/// Fetches `{base_url}/observations_{year}.json`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl HttpSource {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    pub fn year_url(&self, year: i32) -> String {
        format!("{}/{}", self.base_url, year_file_name(year))
    }
}

impl ObservationSource for HttpSource {
    async fn fetch_year(&self, year: i32) -> Result<Vec<RawRecord>, AppError> {
        let url = self.year_url(year);
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| AppError::Config(format!("Invalid User-Agent: {}", e)))?;

        tracing::debug!("Fetching {}", url);
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("{} request failed: {}", url, e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let doc: Value = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("{} JSON parse error: {}", url, e))
        })?;
        decode_year_document(year, doc)
    }
}

// --- Local directory ---

/// Reads `observations_{year}.json` from a local directory, e.g. a checkout
/// of the published data folder.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ObservationSource for DirectorySource {
    async fn fetch_year(&self, year: i32) -> Result<Vec<RawRecord>, AppError> {
        let path = self.dir.join(year_file_name(year));
        tracing::debug!("Reading {}", path.display());
        let bytes = tokio::fs::read(&path).await?;
        let doc: Value = serde_json::from_slice(&bytes)?;
        decode_year_document(year, doc)
    }
}

/// Source selected at start-up from configuration.
#[derive(Debug, Clone)]
pub enum DataSource {
    Http(HttpSource),
    Directory(DirectorySource),
}

impl ObservationSource for DataSource {
    async fn fetch_year(&self, year: i32) -> Result<Vec<RawRecord>, AppError> {
        match self {
            DataSource::Http(source) => source.fetch_year(year).await,
            DataSource::Directory(source) => source.fetch_year(year).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ObservationId;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_doc() -> Value {
        json!({
            "year": 2023,
            "total_count": 2,
            "last_updated": "2024-01-02T03:04:05Z",
            "observations": [
                {
                    "id": 101,
                    "location": "38.85,-77.30",
                    "observed_on": "2023-05-04",
                    "common_name": "Eastern Box Turtle",
                    "taxonomic_group": "Reptilia"
                },
                {
                    "id": 102,
                    "common_name": "Red Fox",
                    "taxonomic_group": "Mammals"
                }
            ]
        })
    }

    #[test]
    fn test_decode_year_document() {
        let records = decode_year_document(2023, sample_doc()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, ObservationId::Int(101));
        assert_eq!(records[1].common_name.as_deref(), Some("Red Fox"));
    }

    #[test]
    fn test_decode_skips_bad_elements() {
        let doc = json!({
            "observations": [
                { "common_name": "no id" },
                { "id": "obs-2", "common_name": "Gray Squirrel" },
                42
            ]
        });
        let records = decode_year_document(2022, doc).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, ObservationId::Text("obs-2".to_string()));
    }

    #[test]
    fn test_decode_year_mismatch_is_not_fatal() {
        let mut doc = sample_doc();
        doc["year"] = json!(2019);
        assert_eq!(decode_year_document(2023, doc).unwrap().len(), 2);
    }

    #[test]
    fn test_decode_requires_observations_array() {
        let err = decode_year_document(2023, json!({ "year": 2023 })).unwrap_err();
        assert!(matches!(err, AppError::DataFormat(_)));
        assert!(decode_year_document(2023, json!([1, 2])).is_err());
        assert!(decode_year_document(2023, json!({ "observations": {} })).is_err());
    }

    #[tokio::test]
    async fn test_http_source_fetches_year_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/observations_2023.json"))
            .and(header("user-agent", "WildlifeDashboard/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_doc()))
            .expect(1)
            .mount(&server)
            .await;

        let source =
            HttpSource::new(&format!("{}/data/", server.uri()), "WildlifeDashboard/test").unwrap();
        let records = source.fetch_year(2023).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_http_source_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/observations_2016.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), "WildlifeDashboard/test").unwrap();
        let err = source.fetch_year(2016).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(ref m) if m.contains("404")));
    }

    #[tokio::test]
    async fn test_directory_source() {
        let dir = std::env::temp_dir().join(format!("year-source-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("observations_2023.json"),
            serde_json::to_vec(&sample_doc()).unwrap(),
        )
        .unwrap();

        let source = DataSource::Directory(DirectorySource::new(&dir));
        assert_eq!(source.fetch_year(2023).await.unwrap().len(), 2);
        assert!(matches!(
            source.fetch_year(1999).await.unwrap_err(),
            AppError::Io(_)
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_year_url_trims_trailing_slash() {
        let source = HttpSource::new("https://example.org/data/", "ua").unwrap();
        assert_eq!(
            source.year_url(2024),
            "https://example.org/data/observations_2024.json"
        );
    }
}
