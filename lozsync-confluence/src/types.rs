//! Boundary structs for Confluence REST payloads.
//!
//! Responses are deserialized into these shapes and converted to the
//! crate-internal types immediately; untyped JSON never crosses the
//! client boundary.

use serde::Deserialize;

use lozsync_core::types::{PageContent, PageId};

// ---------------------------------------------------------------------------
// Page fetch (`GET /wiki/rest/api/content/{id}?expand=body.storage`)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PageResponse {
    pub id: String,
    pub title: String,
    pub body: PageBody,
}

#[derive(Debug, Deserialize)]
pub struct PageBody {
    pub storage: StorageBody,
}

#[derive(Debug, Deserialize)]
pub struct StorageBody {
    pub value: String,
}

impl From<PageResponse> for PageContent {
    fn from(response: PageResponse) -> Self {
        PageContent {
            page_id: PageId(response.id),
            title: response.title,
            body: response.body.storage.value,
        }
    }
}

// ---------------------------------------------------------------------------
// Title search (`GET /wiki/rest/api/content/search?cql=...`)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: Option<SearchMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchMetadata {
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
pub struct Label {
    pub name: String,
}

impl SearchResult {
    /// A page counts as archived when its status says so or when it
    /// carries an `archived` label.
    pub fn is_archived(&self) -> bool {
        if self.status.as_deref() == Some("archived") {
            return true;
        }
        self.metadata
            .as_ref()
            .map(|m| m.labels.iter().any(|l| l.name == "archived"))
            .unwrap_or(false)
    }
}

/// Extract the non-archived page ids from one search page, preserving
/// result order.
pub fn extract_page_ids(results: &[SearchResult]) -> Vec<PageId> {
    results
        .iter()
        .filter(|r| !r.is_archived())
        .filter_map(|r| r.id.as_deref())
        .map(PageId::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_response_converts_to_page_content() {
        let json = r#"{
            "id": "98304",
            "title": "Blueprint: Utah Jazz",
            "body": { "storage": { "value": "<h2>hello</h2>" } }
        }"#;
        let response: PageResponse = serde_json::from_str(json).expect("deserialize");
        let page: PageContent = response.into();
        assert_eq!(page.page_id, PageId::from("98304"));
        assert_eq!(page.title, "Blueprint: Utah Jazz");
        assert_eq!(page.body, "<h2>hello</h2>");
    }

    #[test]
    fn search_response_tolerates_missing_fields() {
        let json = r#"{ "results": [ { "id": "1" } ] }"#;
        let response: SearchResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.results.len(), 1);
        assert!(response.size.is_none());
        assert!(!response.results[0].is_archived());
    }

    #[test]
    fn archived_status_is_filtered() {
        let results = vec![
            SearchResult {
                id: Some("1".into()),
                title: Some("Blueprint: Live".into()),
                status: Some("current".into()),
                metadata: None,
            },
            SearchResult {
                id: Some("2".into()),
                title: Some("Blueprint: Old".into()),
                status: Some("archived".into()),
                metadata: None,
            },
        ];
        assert_eq!(extract_page_ids(&results), vec![PageId::from("1")]);
    }

    #[test]
    fn archived_label_is_filtered() {
        let results = vec![SearchResult {
            id: Some("3".into()),
            title: None,
            status: Some("current".into()),
            metadata: Some(SearchMetadata {
                labels: vec![Label {
                    name: "archived".into(),
                }],
            }),
        }];
        assert!(extract_page_ids(&results).is_empty());
    }

    #[test]
    fn results_without_id_are_skipped() {
        let results = vec![SearchResult {
            id: None,
            title: None,
            status: None,
            metadata: None,
        }];
        assert!(extract_page_ids(&results).is_empty());
    }
}
