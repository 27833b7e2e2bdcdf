//! Confluence REST client.

use futures::future::try_join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

use lozsync_core::config::ConfluenceConfig;
use lozsync_core::types::{PageContent, PageId};

use crate::error::ConfluenceError;
use crate::types::{extract_page_ids, PageResponse, SearchResponse};

/// Confluence API pagination limit per search request.
const SEARCH_PAGE_LIMIT: usize = 100;

/// Authenticated client for Confluence Cloud.
///
/// Cheap to clone; holds a connection-pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    api_token: String,
}

impl ConfluenceClient {
    pub fn new(config: &ConfluenceConfig) -> Result<Self, ConfluenceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Fetch a single page's content in storage format.
    ///
    /// Storage format carries the raw macro markup the lozenge parser
    /// operates on.
    pub async fn get_page(&self, page_id: &PageId) -> Result<PageContent, ConfluenceError> {
        let url = format!("{}/wiki/rest/api/content/{}", self.base_url, page_id);
        tracing::debug!(page_id = %page_id, "fetching page content");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .query(&[("expand", "body.storage")])
            .send()
            .await?;

        let response = check_status(response, &format!("fetch page {page_id}")).await?;
        let page: PageResponse = response.json().await?;
        Ok(page.into())
    }

    /// Fetch multiple pages concurrently.
    ///
    /// Requests fan out at once; results come back in the original
    /// request order. The first failure aborts the whole fetch.
    pub async fn get_pages(&self, page_ids: &[PageId]) -> Result<Vec<PageContent>, ConfluenceError> {
        try_join_all(page_ids.iter().map(|id| self.get_page(id))).await
    }

    /// Search a space for non-archived pages whose title matches
    /// `title_search`, following pagination until a short page.
    pub async fn search_pages(
        &self,
        space_key: &str,
        title_search: &str,
    ) -> Result<Vec<PageId>, ConfluenceError> {
        let cql = search_cql(space_key, title_search);
        let url = format!("{}/wiki/rest/api/content/search", self.base_url);

        let mut page_ids = Vec::new();
        let mut start = 0usize;

        loop {
            tracing::debug!(%cql, start, "searching pages");
            let limit = SEARCH_PAGE_LIMIT.to_string();
            let offset = start.to_string();
            let response = self
                .client
                .get(&url)
                .basic_auth(&self.email, Some(&self.api_token))
                .query(&[
                    ("cql", cql.as_str()),
                    ("limit", limit.as_str()),
                    ("start", offset.as_str()),
                    ("expand", "version,status,metadata.labels"),
                ])
                .send()
                .await?;

            let response = check_status(response, "search pages").await?;
            let search: SearchResponse = response.json().await?;

            let skipped = search.results.iter().filter(|r| r.is_archived()).count();
            if skipped > 0 {
                tracing::info!(skipped, "skipping archived search results");
            }
            page_ids.extend(extract_page_ids(&search.results));

            let size = search.size.unwrap_or(search.results.len());
            start += size;
            if size < SEARCH_PAGE_LIMIT {
                break;
            }
        }

        tracing::info!(found = page_ids.len(), "title search complete");
        Ok(page_ids)
    }
}

/// CQL filter for the title search.
pub fn search_cql(space_key: &str, title_search: &str) -> String {
    format!(r#"space = "{space_key}" AND title ~ "{title_search}" AND type = "page""#)
}

async fn check_status(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, ConfluenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ConfluenceError::Http {
        operation: operation.to_string(),
        status,
        body,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
