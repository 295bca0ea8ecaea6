//! View Cache - Per-view Re-fetch Policy
//!
//! Each dashboard view is re-rendered on every interaction. A
//! `CachedView` decides whether that re-render calls the backend again
//! or reuses what was fetched earlier in the session.

use std::future::Future;

use chrono::{DateTime, Utc};

/// When a view goes back to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchPolicy {
    /// Every view triggers a fetch.
    EveryView,
    /// Fetch once, reuse until `invalidate` or `refresh`.
    UntilInvalidated,
}

/// What a failed fetch leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Drop the value and retry on the next view.
    Clear,
    /// Store an empty value and mark it fetched: no automatic retry
    /// until `refresh`.
    PinEmpty,
}

/// Result of resolving a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    /// `None` only for a view pinned empty after a failure.
    pub value: Option<T>,
    /// True if this resolve called the backend.
    pub fresh: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Session-scoped cache slot for one view.
#[derive(Debug, Clone)]
pub struct CachedView<T> {
    value: Option<T>,
    fetched: bool,
    fetched_at: Option<DateTime<Utc>>,
    refetch: RefetchPolicy,
    on_failure: OnFailure,
}

impl<T: Clone> CachedView<T> {
    pub const fn new(refetch: RefetchPolicy, on_failure: OnFailure) -> Self {
        Self {
            value: None,
            fetched: false,
            fetched_at: None,
            refetch,
            on_failure,
        }
    }

    /// Whether the next `resolve` will call the backend.
    pub const fn needs_fetch(&self) -> bool {
        match self.refetch {
            RefetchPolicy::EveryView => true,
            RefetchPolicy::UntilInvalidated => !self.fetched,
        }
    }

    /// Serve the cached value or run `fetch`, applying the failure policy.
    pub async fn resolve<F, Fut, E>(&mut self, fetch: F) -> Result<Fetched<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.needs_fetch() {
            return Ok(Fetched {
                value: self.value.clone(),
                fresh: false,
                fetched_at: self.fetched_at,
            });
        }

        match fetch().await {
            Ok(value) => {
                let now = Utc::now();
                self.value = Some(value.clone());
                self.fetched = true;
                self.fetched_at = Some(now);
                Ok(Fetched {
                    value: Some(value),
                    fresh: true,
                    fetched_at: Some(now),
                })
            }
            Err(e) => {
                self.value = None;
                match self.on_failure {
                    OnFailure::Clear => {
                        self.fetched = false;
                        self.fetched_at = None;
                    }
                    OnFailure::PinEmpty => {
                        self.fetched = true;
                        self.fetched_at = Some(Utc::now());
                    }
                }
                Err(e)
            }
        }
    }

    /// Force the next view to fetch and drop the stale value.
    pub fn refresh(&mut self) {
        self.value = None;
        self.fetched = false;
        self.fetched_at = None;
    }

    /// Force the next view to fetch but keep showing the old value.
    pub fn invalidate(&mut self) {
        self.fetched = false;
    }

    pub const fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }
}
