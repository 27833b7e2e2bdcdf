//! Destination write pacing.
//!
//! The Sheets API allows roughly 60 writes per minute; the reconciler
//! spaces its calls with fixed gaps chosen with a safety margin. The
//! limiter records a not-before instant after each call; the next call
//! awaits it. Under `tokio::time::pause` the waits are deterministic,
//! so pacing is testable without wall-clock sleeps.

use tokio::time::{sleep_until, Duration, Instant};

/// Gap after writing one page's rows before touching the next page.
pub const PAGE_WRITE_GAP: Duration = Duration::from_millis(1500);
/// Gap after creating a tab before writing into it.
pub const TAB_CREATE_GAP: Duration = Duration::from_millis(1000);
/// Gap between tab deletions.
pub const TAB_DELETE_GAP: Duration = Duration::from_millis(1000);
/// Gap after clearing a tab before rewriting it.
pub const CLEAR_GAP: Duration = Duration::from_millis(500);
/// Gap between correlation-cell reads.
pub const CORRELATION_READ_GAP: Duration = Duration::from_millis(200);

/// Minimum-gap pacer for sequential destination calls.
#[derive(Debug, Default)]
pub struct RateLimiter {
    ready_at: Option<Instant>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the gap recorded by the previous [`backoff`](Self::backoff)
    /// has elapsed.
    pub async fn pace(&mut self) {
        if let Some(ready_at) = self.ready_at.take() {
            sleep_until(ready_at).await;
        }
    }

    /// Record that the next destination call must wait at least `gap`.
    pub fn backoff(&mut self, gap: Duration) {
        self.ready_at = Some(Instant::now() + gap);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
