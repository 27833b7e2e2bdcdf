//! Rate-limited spreadsheet reconciler.
//!
//! One reconciler run owns the destination spreadsheet exclusively:
//! there is no locking, and overlapping runs are an operator error.
//! All destination writes are strictly sequential behind the
//! [`RateLimiter`]; only the source-side page fetches (elsewhere) fan
//! out concurrently.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use lozsync_core::config::SheetsConfig;
use lozsync_core::types::{PageId, PageLozengeResult, TabName};

use crate::api::{range, SheetsApi, TabInfo};
use crate::error::SheetsError;
use crate::limiter::{
    RateLimiter, CLEAR_GAP, CORRELATION_READ_GAP, PAGE_WRITE_GAP, TAB_CREATE_GAP, TAB_DELETE_GAP,
};
use crate::plan::{
    append_action, plan_archived, plan_excluded, replace_action, tab_name, Correlation,
    PlannedDelete, TabAction, TabState,
};
use crate::token::StoredToken;

/// Fixed header row; column A of row 2 downward carries the page id
/// that correlates a tab to its source page across renames.
pub const HEADER_ROW: [&str; 6] = [
    "Page ID",
    "Page Title",
    "Lozenge Text",
    "Lozenge Color",
    "Count",
    "Last Updated",
];

/// Outcome of reconciling one page into its tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Rows were written (or appended).
    Written {
        tab: TabName,
        action: TabAction,
        rows: usize,
    },
    /// Dry-run mode: the rows *would* have been written.
    WouldWrite {
        tab: TabName,
        action: TabAction,
        rows: usize,
    },
}

/// High-level client over one destination spreadsheet.
///
/// Holds the credential; every operation fails fast with
/// [`SheetsError::NotAuthenticated`] when none is loaded.
#[derive(Debug)]
pub struct SheetsClient {
    api: Option<SheetsApi>,
    limiter: RateLimiter,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig, token: Option<&StoredToken>) -> Self {
        let api = token
            .map(|token| SheetsApi::new(config.spreadsheet_id.clone(), token.access_token.clone()));
        Self {
            api,
            limiter: RateLimiter::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.is_some()
    }

    fn api(&self) -> Result<&SheetsApi, SheetsError> {
        self.api.as_ref().ok_or(SheetsError::NotAuthenticated)
    }

    // -----------------------------------------------------------------------
    // Deletions
    // -----------------------------------------------------------------------

    /// Delete every tab whose name contains an exclusion term.
    pub async fn delete_excluded_sheets(
        &mut self,
        exclusion_terms: &[String],
        dry_run: bool,
    ) -> Result<Vec<PlannedDelete>, SheetsError> {
        let api = self.api()?;
        let existing = api.list_tabs().await?;
        let planned = plan_excluded(&existing, exclusion_terms);

        if planned.is_empty() {
            tracing::info!("no excluded tabs to delete");
            return Ok(planned);
        }

        self.execute_deletes(&planned, dry_run).await?;
        Ok(planned)
    }

    /// Delete tabs correlated to pages absent from the current result
    /// set (archived or removed upstream).
    ///
    /// Tabs with an unreadable correlation cell are left untouched and
    /// logged, so pre-convention orphans surface without being
    /// speculatively destroyed.
    pub async fn delete_archived_page_sheets(
        &mut self,
        current: &[PageLozengeResult],
        dry_run: bool,
    ) -> Result<Vec<PlannedDelete>, SheetsError> {
        let existing = self.api()?.list_tabs().await?;

        let mut correlations = Vec::with_capacity(existing.len());
        for tab in existing {
            self.limiter.pace().await;
            let page_id = self.read_correlation(&tab).await?;
            self.limiter.backoff(CORRELATION_READ_GAP);
            if page_id.is_none() {
                tracing::warn!(tab = %tab.title, "tab has no readable page id; leaving it alone");
            }
            correlations.push(Correlation { tab, page_id });
        }

        let planned = plan_archived(&correlations, current);
        if planned.is_empty() {
            tracing::info!("no archived-page tabs to delete");
            return Ok(planned);
        }

        self.execute_deletes(&planned, dry_run).await?;
        Ok(planned)
    }

    async fn execute_deletes(
        &mut self,
        planned: &[PlannedDelete],
        dry_run: bool,
    ) -> Result<(), SheetsError> {
        for delete in planned {
            if dry_run {
                tracing::info!(tab = %delete.tab.title, reason = ?delete.reason, "[dry-run] would delete tab");
                continue;
            }
            self.limiter.pace().await;
            self.api()?.delete_tab(delete.tab.sheet_id).await?;
            self.limiter.backoff(TAB_DELETE_GAP);
            tracing::info!(tab = %delete.tab.title, reason = ?delete.reason, "deleted tab");
        }
        Ok(())
    }

    /// Read the correlation cell (row 2, column A) of a tab.
    ///
    /// Read failures degrade to `None` rather than aborting: a single
    /// odd tab must not kill the cleanup pass.
    async fn read_correlation(&self, tab: &TabInfo) -> Result<Option<PageId>, SheetsError> {
        let cell_range = range(&tab.title, "A2:A2");
        match self.api()?.values_get(&cell_range).await {
            Ok(rows) => Ok(rows
                .first()
                .and_then(|row| row.first())
                .filter(|cell| !cell.is_empty())
                .map(|cell| PageId::from(cell.as_str()))),
            Err(err) => {
                tracing::warn!(tab = %tab.title, error = %err, "could not read page id cell");
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Full-replace strategy: each page's tab is created on demand,
    /// cleared, and rewritten with the latest snapshot. History is not
    /// preserved.
    pub async fn write_results(
        &mut self,
        results: &[PageLozengeResult],
        dry_run: bool,
    ) -> Result<Vec<WriteOutcome>, SheetsError> {
        let mut states = self.load_tab_states().await?;
        let mut outcomes = Vec::with_capacity(results.len());

        for (index, result) in results.iter().enumerate() {
            let name = tab_name(&result.page_title);
            let state = *states.get(&name.0).unwrap_or(&TabState::Absent);
            let action = replace_action(state);
            let rows = format_page_rows(result, Utc::now());

            tracing::info!(
                page = %result.page_title,
                tab = %name,
                position = index + 1,
                total = results.len(),
                ?action,
                "writing page results"
            );

            if dry_run {
                outcomes.push(WriteOutcome::WouldWrite {
                    tab: name,
                    action,
                    rows: rows.len(),
                });
                continue;
            }

            if action == TabAction::Create {
                self.limiter.pace().await;
                self.api()?.add_tab(&name.0).await?;
                self.limiter.backoff(TAB_CREATE_GAP);
            }

            self.limiter.pace().await;
            self.api()?.values_clear(&range(&name.0, "A:Z")).await?;
            self.limiter.backoff(CLEAR_GAP);

            self.limiter.pace().await;
            self.api()?.values_update(&range(&name.0, "A1"), &rows).await?;
            self.limiter.backoff(PAGE_WRITE_GAP);

            states.insert(name.0.clone(), TabState::ExistsPopulated);
            outcomes.push(WriteOutcome::Written {
                tab: name,
                action,
                rows: rows.len(),
            });
        }

        Ok(outcomes)
    }

    /// Append strategy: never clears; writes the header only for tabs
    /// created within this run, then appends the new rows below
    /// whatever is already there.
    pub async fn append_results(
        &mut self,
        results: &[PageLozengeResult],
        dry_run: bool,
    ) -> Result<Vec<WriteOutcome>, SheetsError> {
        let mut states = self.load_tab_states().await?;
        let mut outcomes = Vec::with_capacity(results.len());

        for result in results {
            let name = tab_name(&result.page_title);
            let state = *states.get(&name.0).unwrap_or(&TabState::Absent);
            let action = append_action(state);
            let all_rows = format_page_rows(result, Utc::now());
            let data_rows = &all_rows[1..];

            if dry_run {
                outcomes.push(WriteOutcome::WouldWrite {
                    tab: name,
                    action,
                    rows: data_rows.len(),
                });
                continue;
            }

            if action == TabAction::Create {
                self.limiter.pace().await;
                self.api()?.add_tab(&name.0).await?;
                self.limiter.backoff(TAB_CREATE_GAP);

                let header: Vec<Vec<Value>> =
                    vec![HEADER_ROW.iter().map(|h| json!(h)).collect()];
                self.limiter.pace().await;
                self.api()?.values_update(&range(&name.0, "A1"), &header).await?;
                self.limiter.backoff(CLEAR_GAP);
            }

            self.limiter.pace().await;
            self.api()?
                .values_append(&range(&name.0, "A:F"), data_rows)
                .await?;
            self.limiter.backoff(PAGE_WRITE_GAP);

            states.insert(name.0.clone(), TabState::ExistsPopulated);
            outcomes.push(WriteOutcome::Written {
                tab: name,
                action,
                rows: data_rows.len(),
            });
        }

        Ok(outcomes)
    }

    /// Reorder all tabs by name in a single batched call.
    pub async fn sort_sheets_alphabetically(
        &mut self,
        dry_run: bool,
    ) -> Result<usize, SheetsError> {
        let mut tabs = self.api()?.list_tabs().await?;
        tabs.sort_by_key(|tab| tab.title.to_lowercase());

        if dry_run {
            return Ok(tabs.len());
        }

        let positions: Vec<(i64, usize)> = tabs
            .iter()
            .enumerate()
            .map(|(index, tab)| (tab.sheet_id, index))
            .collect();

        self.limiter.pace().await;
        self.api()?.reorder_tabs(&positions).await?;
        self.limiter.backoff(PAGE_WRITE_GAP);

        tracing::info!(tabs = tabs.len(), "sorted tabs alphabetically");
        Ok(tabs.len())
    }

    /// Snapshot the destination tabs as reconciler states. Tabs already
    /// present are assumed populated; the writer always clears before
    /// rewriting.
    async fn load_tab_states(&self) -> Result<HashMap<String, TabState>, SheetsError> {
        let tabs = self.api()?.list_tabs().await?;
        Ok(tabs
            .into_iter()
            .map(|tab| (tab.title, TabState::ExistsPopulated))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Row formatting
// ---------------------------------------------------------------------------

/// Header row followed by one row per aggregated lozenge, or a single
/// explanatory row for a page with no lozenges.
pub fn format_page_rows(result: &PageLozengeResult, now: DateTime<Utc>) -> Vec<Vec<Value>> {
    let timestamp = now.to_rfc3339();
    let mut rows: Vec<Vec<Value>> = vec![HEADER_ROW.iter().map(|h| json!(h)).collect()];

    if result.lozenges.is_empty() {
        rows.push(vec![
            json!(result.page_id.0),
            json!(result.page_title),
            json!("No lozenges found"),
            json!(""),
            json!(0),
            json!(timestamp),
        ]);
        return rows;
    }

    for lozenge in &result.lozenges {
        rows.push(vec![
            json!(result.page_id.0),
            json!(result.page_title),
            json!(lozenge.text),
            json!(lozenge.color),
            json!(lozenge.count),
            json!(timestamp),
        ]);
    }
    rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
