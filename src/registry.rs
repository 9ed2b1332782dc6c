use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::domain::{LicenseCategory, LicenseRecord};
use crate::error::OmmaError;

const BASE_URL: &str = "https://omma.us.thentiacloud.net/rest/public/profile/search/";
const PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchEnvelope {
    #[serde(default)]
    pub error_code: i32,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub result_count: i32,
    #[serde(default)]
    pub result: Vec<LicenseRecord>,
}

pub trait RegistryClient: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<LicenseRecord>, OmmaError>;
    fn fetch_by_keyword(&self, keyword: &str) -> Result<FetchEnvelope, OmmaError>;
    fn fetch_by_category(&self, category: LicenseCategory) -> Result<FetchEnvelope, OmmaError>;
}

#[derive(Clone)]
pub struct OmmaHttpClient {
    client: Client,
    base_url: String,
}

impl OmmaHttpClient {
    pub fn new() -> Result<Self, OmmaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("omma-sync/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OmmaError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| OmmaError::Http(err.to_string()))?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, OmmaError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "OMMA request failed".to_string());
        Err(OmmaError::Status { status, message })
    }

    fn get_envelope(&self, query: &[(&str, String)]) -> Result<FetchEnvelope, OmmaError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(query)
            .send()
            .map_err(|err| OmmaError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| OmmaError::Http(err.to_string()))
    }

    fn fetch_page(&self, skip: usize, take: usize) -> Result<FetchEnvelope, OmmaError> {
        self.get_envelope(&[
            ("keyword", "*".to_string()),
            ("skip", skip.to_string()),
            ("take", take.to_string()),
            ("lang", "en".to_string()),
            ("type", "all".to_string()),
        ])
    }
}

impl RegistryClient for OmmaHttpClient {
    fn fetch_all(&self) -> Result<Vec<LicenseRecord>, OmmaError> {
        collect_pages(PAGE_SIZE, |skip, take| self.fetch_page(skip, take))
    }

    fn fetch_by_keyword(&self, keyword: &str) -> Result<FetchEnvelope, OmmaError> {
        self.get_envelope(&[
            ("keyword", keyword.to_string()),
            ("skip", "0".to_string()),
            ("take", "20".to_string()),
            ("lang", "en".to_string()),
            ("type", "all".to_string()),
        ])
    }

    fn fetch_by_category(&self, category: LicenseCategory) -> Result<FetchEnvelope, OmmaError> {
        // The upstream expects the catalog's pre-encoded form verbatim, so
        // this must not go through query-pair encoding a second time.
        let url = format!("{}?type={}", self.base_url, category.url_encoded_name());
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| OmmaError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| OmmaError::Http(err.to_string()))
    }
}

// Pages through the search endpoint until a short page, accumulating every
// record. A non-zero envelope code on any page fails the whole fetch.
pub fn collect_pages<F>(page_size: usize, mut fetch_page: F) -> Result<Vec<LicenseRecord>, OmmaError>
where
    F: FnMut(usize, usize) -> Result<FetchEnvelope, OmmaError>,
{
    let mut records = Vec::new();
    let mut skip = 0usize;
    loop {
        let envelope = fetch_page(skip, page_size)?;
        if envelope.error_code != 0 {
            return Err(OmmaError::Registry {
                code: envelope.error_code,
                message: envelope.error_message,
            });
        }
        let page_len = envelope.result.len();
        records.extend(envelope.result);
        if page_len < page_size {
            return Ok(records);
        }
        skip += page_size;
    }
}
