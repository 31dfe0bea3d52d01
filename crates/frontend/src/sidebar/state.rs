//! Sidebar state and refresh plumbing.
//!
//! Everything here is independent of the browser so the refresh rules can
//! be exercised natively: how triggers turn into fetches, how fetch results
//! land in state, and how an unmounted sidebar stops listening.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use study_db::ChangeType;
use study_types::StudySet;
use yew::prelude::*;

use crate::diagnostics;
use crate::signals::AppSignal;

/// Why the sidebar is re-fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// The sidebar was mounted
    Mount,
    /// The realtime feed reported a row change
    DatabaseChange(ChangeType),
    /// Another part of the app announced a change
    Signal(AppSignal),
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTrigger::Mount => write!(f, "mount"),
            RefreshTrigger::DatabaseChange(change) => write!(f, "database {:?}", change),
            RefreshTrigger::Signal(signal) => write!(f, "{}", signal.event_name()),
        }
    }
}

/// Sidebar state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarState {
    /// Rows from the most recent successful fetch, in the order received
    pub study_sets: Rc<Vec<StudySet>>,
    /// Fetches started but not yet resolved
    pub in_flight: u32,
    /// Fetches resolved, successfully or not
    pub completed: u32,
}

impl SidebarState {
    /// Whether to show the skeleton instead of the list.
    ///
    /// True while any fetch is outstanding, and before the first one lands.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0 || self.completed == 0
    }
}

/// State transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarAction {
    FetchStarted(RefreshTrigger),
    FetchSucceeded(Vec<StudySet>),
    /// The fetch failed; the list is left as it was
    FetchFailed,
}

impl Reducible for SidebarState {
    type Action = SidebarAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();

        match action {
            SidebarAction::FetchStarted(trigger) => {
                tracing::debug!(%trigger, "refreshing study sets");
                next.in_flight += 1;
            }
            SidebarAction::FetchSucceeded(rows) => {
                next.in_flight = next.in_flight.saturating_sub(1);
                next.completed += 1;
                next.study_sets = Rc::new(rows);
            }
            SidebarAction::FetchFailed => {
                next.in_flight = next.in_flight.saturating_sub(1);
                next.completed += 1;
            }
        }

        Rc::new(next)
    }
}

/// Liveness flag for one mount of the sidebar.
///
/// Clones share the flag. Once released, nothing holding a clone may touch
/// the sidebar's state.
#[derive(Debug, Clone)]
pub struct MountGuard(Rc<Cell<bool>>);

impl MountGuard {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.get()
    }

    /// Mark the mount as gone.
    pub fn release(&self) {
        self.0.set(false);
    }
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan-in point for every refresh trigger.
///
/// Each live trigger starts exactly one fetch; there is no debouncing and
/// no coalescing of simultaneous triggers.
#[derive(Clone)]
pub struct Refresher {
    guard: MountGuard,
    start: Rc<dyn Fn(RefreshTrigger)>,
}

impl Refresher {
    /// Create a refresher that calls `start` once per live trigger.
    pub fn new<F>(guard: MountGuard, start: F) -> Self
    where
        F: Fn(RefreshTrigger) + 'static,
    {
        Self {
            guard,
            start: Rc::new(start),
        }
    }

    /// Start a fetch unless the sidebar has been unmounted.
    ///
    /// Returns whether a fetch was started.
    pub fn trigger(&self, trigger: RefreshTrigger) -> bool {
        if !self.guard.is_live() {
            return false;
        }

        (self.start)(trigger);
        true
    }
}

/// Run one fetch and report its outcome.
///
/// Results arriving after the guard is released are dropped. Failures are
/// logged and leave the current list alone.
pub async fn run_fetch<F, Fut, D>(guard: &MountGuard, dispatch: D, fetch: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = study_db::Result<Vec<StudySet>>>,
    D: Fn(SidebarAction),
{
    let result = fetch().await;

    if !guard.is_live() {
        return;
    }

    match result {
        Ok(rows) => dispatch(SidebarAction::FetchSucceeded(rows)),
        Err(e) => {
            diagnostics::error(&format!("Error fetching study sets: {}", e));
            dispatch(SidebarAction::FetchFailed);
        }
    }
}
