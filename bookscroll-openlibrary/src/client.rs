use bookscroll::{Page, RawBook};
use reqwest::Url;
use tracing::{debug, trace};

use crate::config::CatalogConfig;
use crate::error::{FetchError, Result};
use crate::source::PageSource;

/// HTTP client for the catalog's `query.json` endpoint.
#[derive(Clone, Debug)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| FetchError::Network {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the query URL for one page of `subject` starting at `offset`.
    pub fn page_url(&self, subject: &str, offset: u64) -> Result<Url> {
        page_url(&self.base_url, subject, offset)
    }

    /// Fetches and decodes one page.
    pub async fn fetch(&self, subject: &str, offset: u64) -> Result<Page> {
        let url = self.page_url(subject, offset)?;
        debug!(%url, "fetching catalog page");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;
        trace!(bytes = body.len(), "catalog page received");
        parse_page(&body)
    }
}

impl PageSource for CatalogClient {
    async fn fetch_page(&self, subject: &str, offset: u64) -> Result<Page> {
        self.fetch(subject, offset).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|err| FetchError::InvalidUrl {
        url: raw.to_owned(),
        message: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(FetchError::InvalidUrl {
            url: raw.to_owned(),
            message: "not a base url".to_owned(),
        });
    }
    // `join` replaces the last path segment unless the path ends with a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `GET {base}/query.json?type=/type/work&subjects={subject}&offset={offset}&title=&description=&subtitle=`
pub fn page_url(base_url: &Url, subject: &str, offset: u64) -> Result<Url> {
    let mut url = base_url
        .join("query.json")
        .map_err(|err| FetchError::InvalidUrl {
            url: base_url.to_string(),
            message: err.to_string(),
        })?;
    url.query_pairs_mut()
        .append_pair("type", "/type/work")
        .append_pair("subjects", subject)
        .append_pair("offset", &offset.to_string())
        .append_pair("title", "")
        .append_pair("description", "")
        .append_pair("subtitle", "");
    Ok(url)
}

/// Decodes a `query.json` response body: a JSON array of work records.
pub fn parse_page(body: &[u8]) -> Result<Page> {
    let raw: Vec<RawBook> = serde_json::from_slice(body)?;
    Ok(Page::from_raw(raw))
}
