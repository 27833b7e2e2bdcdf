//! Source-side pipeline: page ids → fetched pages → filtered → parsed.
//!
//! Shared by `scan` (read-only) and `run` (full reconciliation). The
//! destination side lives in `lozsync-sheets`.

use anyhow::{Context, Result};

use lozsync_confluence::ConfluenceClient;
use lozsync_core::config::Config;
use lozsync_core::types::{PageContent, PageLozengeResult};
use lozsync_parser::analyze_page;

/// Outcome of the source side of a run.
pub struct Collected {
    pub results: Vec<PageLozengeResult>,
    /// Pages dropped by the title exclusion filter.
    pub excluded: usize,
}

/// Fetch, filter, and parse the current page set.
///
/// Page fetches fan out concurrently; everything after that is pure.
pub async fn collect_results(config: &Config) -> Result<Collected> {
    let client =
        ConfluenceClient::new(&config.confluence).context("failed to build Confluence client")?;

    let page_ids = if config.confluence.page_ids.is_empty() {
        client
            .search_pages(&config.confluence.space_key, &config.confluence.title_search)
            .await
            .context("page search failed")?
    } else {
        println!(
            "Using {} explicit page id(s) from settings",
            config.confluence.page_ids.len()
        );
        config.confluence.page_ids.clone()
    };

    if page_ids.is_empty() {
        return Ok(Collected {
            results: vec![],
            excluded: 0,
        });
    }

    println!("Fetching {} page(s)...", page_ids.len());
    let pages = client
        .get_pages(&page_ids)
        .await
        .context("page fetch failed")?;

    let (kept, excluded) = filter_excluded(pages, &config.exclusion_terms);

    let results = kept
        .iter()
        .map(|page| analyze_page(page.page_id.clone(), &page.title, &page.body))
        .collect();

    Ok(Collected { results, excluded })
}

/// Drop pages whose title contains an exclusion term.
pub fn filter_excluded(
    pages: Vec<PageContent>,
    exclusion_terms: &[String],
) -> (Vec<PageContent>, usize) {
    let before = pages.len();
    let kept: Vec<PageContent> = pages
        .into_iter()
        .filter(|page| {
            !exclusion_terms
                .iter()
                .any(|term| page.title.contains(term.as_str()))
        })
        .collect();
    let excluded = before - kept.len();
    (kept, excluded)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
