//! # lozsync-sheets
//!
//! Google Sheets destination: OAuth token management, the raw API
//! surface, the tab reconciliation planner, and the rate-limited
//! reconciler that keeps one spreadsheet in sync with the current page
//! results.
//!
//! Call [`SheetsClient::delete_excluded_sheets`],
//! [`SheetsClient::delete_archived_page_sheets`] and
//! [`SheetsClient::write_results`] (or
//! [`SheetsClient::append_results`]) in that order for a full
//! reconciliation pass, then [`SheetsClient::sort_sheets_alphabetically`].

pub mod api;
pub mod error;
pub mod limiter;
pub mod plan;
pub mod reconciler;
pub mod token;

pub use api::{SheetsApi, TabInfo};
pub use error::SheetsError;
pub use plan::{tab_name, DeleteReason, PlannedDelete, TabAction, TabState};
pub use reconciler::{SheetsClient, WriteOutcome};
pub use token::StoredToken;
