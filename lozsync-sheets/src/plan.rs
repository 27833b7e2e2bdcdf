//! Tab reconciliation planner.
//!
//! Decision precedence for an existing tab:
//! 1. Name matches an exclusion term → delete
//! 2. Correlation cell holds a page id not in the current set → delete
//! 3. Correlation cell unreadable/missing → leave alone
//! 4. Otherwise → kept, rewritten (or appended to) by the writer
//!
//! Everything here is pure: planners operate on snapshots of the tab
//! list and correlation cells, so every decision is testable against an
//! in-memory tab set with no live API.

use std::collections::HashSet;

use lozsync_core::types::{PageId, PageLozengeResult, TabName};

use crate::api::TabInfo;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Lifecycle state of one destination tab, as known to the reconciler.
///
/// A tab observed in the metadata snapshot is assumed populated — the
/// writer always clears before rewriting. Only tabs created within the
/// current run are known empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Absent,
    ExistsEmpty,
    ExistsPopulated,
}

/// What the writer does to a tab for one page result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabAction {
    /// Create the tab, then write header + rows.
    Create,
    /// Clear existing content, then write header + rows (full replace).
    ClearWrite,
    /// Append rows below existing content; header only on a brand-new tab.
    Append,
}

/// Pick the action for the full-replace strategy.
pub fn replace_action(state: TabState) -> TabAction {
    match state {
        TabState::Absent => TabAction::Create,
        TabState::ExistsEmpty | TabState::ExistsPopulated => TabAction::ClearWrite,
    }
}

/// Pick the action for the append strategy.
pub fn append_action(state: TabState) -> TabAction {
    match state {
        TabState::Absent => TabAction::Create,
        TabState::ExistsEmpty | TabState::ExistsPopulated => TabAction::Append,
    }
}

/// State after the writer has performed `action`.
pub fn after_action(_action: TabAction) -> TabState {
    // Create, ClearWrite and Append all leave the tab populated.
    TabState::ExistsPopulated
}

// ---------------------------------------------------------------------------
// Deletion planning
// ---------------------------------------------------------------------------

/// Why a tab is queued for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteReason {
    /// Tab name contains an exclusion term (template/meta/generic marker).
    ExcludedName { term: String },
    /// Correlation cell names a page absent from the current result set.
    ArchivedPage { page_id: PageId },
}

/// A tab queued for deletion, with its audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDelete {
    pub tab: TabInfo,
    pub reason: DeleteReason,
}

/// Correlation snapshot for one tab: the page id read from row 2
/// column A, or `None` when the cell was empty or unreadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    pub tab: TabInfo,
    pub page_id: Option<PageId>,
}

/// Tabs whose name contains any exclusion term.
pub fn plan_excluded(existing: &[TabInfo], terms: &[String]) -> Vec<PlannedDelete> {
    existing
        .iter()
        .filter_map(|tab| {
            let term = terms.iter().find(|term| tab.title.contains(term.as_str()))?;
            Some(PlannedDelete {
                tab: tab.clone(),
                reason: DeleteReason::ExcludedName { term: term.clone() },
            })
        })
        .collect()
}

/// Tabs correlated to a page that is no longer in the current set.
///
/// A tab with no readable page id is never deleted here — the
/// conservative default for tabs predating the correlation convention.
pub fn plan_archived(
    correlations: &[Correlation],
    current: &[PageLozengeResult],
) -> Vec<PlannedDelete> {
    let valid: HashSet<&PageId> = current.iter().map(|result| &result.page_id).collect();

    correlations
        .iter()
        .filter_map(|correlation| {
            let page_id = correlation.page_id.as_ref()?;
            if valid.contains(page_id) {
                return None;
            }
            Some(PlannedDelete {
                tab: correlation.tab.clone(),
                reason: DeleteReason::ArchivedPage {
                    page_id: page_id.clone(),
                },
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tab naming
// ---------------------------------------------------------------------------

/// Maximum destination tab-name length.
const TAB_NAME_MAX: usize = 100;

/// Characters the destination rejects in tab names.
const TAB_NAME_INVALID: [char; 7] = [':', '/', '\\', '?', '*', '[', ']'];

/// Derive the tab name from a page title.
///
/// `"Blueprint: Utah Jazz"` → `"Utah Jazz"`: the `Blueprint:` prefix is
/// dropped (case-insensitive), restricted characters are stripped, and
/// the result is truncated to the destination's limit. Case is never
/// altered.
pub fn tab_name(page_title: &str) -> TabName {
    let trimmed = page_title.trim();
    let lower = trimmed.to_lowercase();
    let without_prefix = if lower.starts_with("blueprint:") {
        trimmed["blueprint:".len()..].trim_start()
    } else {
        trimmed
    };

    let cleaned: String = without_prefix
        .chars()
        .filter(|c| !TAB_NAME_INVALID.contains(c))
        .take(TAB_NAME_MAX)
        .collect();
    TabName(cleaned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
