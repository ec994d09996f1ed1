//! Single vs. double activation of tree entries.
//!
//! A click does not act immediately: it arms a deferral timer. If the same
//! entry is clicked again before the deadline the gesture becomes a
//! navigate-into, otherwise the deadline fires the single-click action.
//! Time comes from an injected [`Clock`] so the machine is testable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::fs::entry::Entry;

/// Default window in which a second click counts as a double click.
pub const DEFAULT_DOUBLE_CLICK: Duration = Duration::from_millis(250);

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

/// Semantic result of a pointer gesture on the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UiAction {
    /// Single activation of a file: open it.
    SelectFile(Entry),
    /// Single activation of a directory: expand or collapse it.
    ToggleFolder(Entry),
    /// Double activation of a directory: make it the current directory.
    NavigateInto(Entry),
    /// Secondary activation, delivered immediately.
    ContextMenu { entry: Entry, x: u16, y: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClickState {
    Idle,
    PendingSingle { target: Entry, deadline: Instant },
}

/// Turns raw clicks into [`UiAction`]s, one per gesture.
#[derive(Debug)]
pub struct ClickDispatcher<C> {
    clock: C,
    delay: Duration,
    state: ClickState,
}

impl ClickDispatcher<SystemClock> {
    /// Creates a dispatcher on the wall clock with the given delay.
    pub fn with_delay(delay: Duration) -> Self {
        Self::new(SystemClock, delay)
    }
}

impl<C: Clock> ClickDispatcher<C> {
    pub fn new(clock: C, delay: Duration) -> Self {
        Self {
            clock,
            delay,
            state: ClickState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Feeds a primary click on `entry`.
    ///
    /// Returns the actions that became due: usually none, since the click
    /// only arms the timer. A click on a different entry flushes the pending
    /// action of the earlier gesture first.
    pub fn click(&mut self, entry: &Entry) -> Vec<UiAction> {
        let now = self.clock.now();
        let mut fired = Vec::new();

        match std::mem::replace(&mut self.state, ClickState::Idle) {
            ClickState::PendingSingle { target, deadline }
                if target.path() == entry.path() && now < deadline =>
            {
                // Second click inside the window: double activation.
                if target.is_dir() {
                    fired.push(UiAction::NavigateInto(target));
                }
                return fired;
            }
            ClickState::PendingSingle { target, .. } => {
                fired.push(single_action(target));
            }
            ClickState::Idle => {}
        }

        self.state = ClickState::PendingSingle {
            target: entry.clone(),
            deadline: now + self.delay,
        };
        fired
    }

    /// Fires the pending single action if its deadline has passed.
    pub fn tick(&mut self) -> Option<UiAction> {
        let now = self.clock.now();
        match &self.state {
            ClickState::PendingSingle { deadline, .. } if now >= *deadline => {
                match std::mem::replace(&mut self.state, ClickState::Idle) {
                    ClickState::PendingSingle { target, .. } => Some(single_action(target)),
                    ClickState::Idle => None,
                }
            }
            _ => None,
        }
    }

    /// Feeds a secondary click. Fires at once; a pending click on the same
    /// entry is dropped, one on another entry is flushed first.
    pub fn context_menu(&mut self, entry: &Entry, x: u16, y: u16) -> Vec<UiAction> {
        let mut fired = Vec::new();
        if let ClickState::PendingSingle { target, .. } =
            std::mem::replace(&mut self.state, ClickState::Idle)
        {
            if target.path() != entry.path() {
                fired.push(single_action(target));
            }
        }
        fired.push(UiAction::ContextMenu {
            entry: entry.clone(),
            x,
            y,
        });
        fired
    }

    /// When the pending single action is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            ClickState::PendingSingle { deadline, .. } => Some(*deadline),
            ClickState::Idle => None,
        }
    }

    /// Time left until [`ClickDispatcher::next_deadline`], saturating at zero.
    pub fn time_until_deadline(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ClickState::PendingSingle { .. })
    }

    /// Drops a pending click without firing it.
    pub fn cancel(&mut self) {
        self.state = ClickState::Idle;
    }
}

fn single_action(target: Entry) -> UiAction {
    if target.is_dir() {
        UiAction::ToggleFolder(target)
    } else {
        UiAction::SelectFile(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dir(path: &str) -> Entry {
        Entry::new(PathBuf::from(path), true)
    }

    fn file(path: &str) -> Entry {
        Entry::new(PathBuf::from(path), false)
    }

    fn dispatcher() -> (ManualClock, ClickDispatcher<ManualClock>) {
        let clock = ManualClock::new();
        let dispatcher = ClickDispatcher::new(clock.clone(), DEFAULT_DOUBLE_CLICK);
        (clock, dispatcher)
    }

    #[test]
    fn single_click_fires_toggle_after_delay() {
        let (clock, mut clicks) = dispatcher();
        let docs = dir("/proj/docs");

        assert!(clicks.click(&docs).is_empty());
        clock.advance(Duration::from_millis(100));
        assert_eq!(clicks.tick(), None);

        clock.advance(Duration::from_millis(150));
        assert_eq!(clicks.tick(), Some(UiAction::ToggleFolder(docs)));
        assert_eq!(clicks.tick(), None);
        assert!(!clicks.is_pending());
    }

    #[test]
    fn double_click_fires_navigate_only() {
        let (clock, mut clicks) = dispatcher();
        let docs = dir("/proj/docs");

        clicks.click(&docs);
        clock.advance(Duration::from_millis(120));
        let fired = clicks.click(&docs);
        assert_eq!(fired, vec![UiAction::NavigateInto(docs)]);

        clock.advance(Duration::from_secs(1));
        assert_eq!(clicks.tick(), None);
    }

    #[test]
    fn double_click_on_file_fires_nothing() {
        let (clock, mut clicks) = dispatcher();
        let readme = file("/proj/readme.md");

        clicks.click(&readme);
        clock.advance(Duration::from_millis(50));
        assert!(clicks.click(&readme).is_empty());
        clock.advance(Duration::from_secs(1));
        assert_eq!(clicks.tick(), None);
    }

    #[test]
    fn single_click_on_file_selects_it() {
        let (clock, mut clicks) = dispatcher();
        let readme = file("/proj/readme.md");

        clicks.click(&readme);
        clock.advance(DEFAULT_DOUBLE_CLICK);
        assert_eq!(clicks.tick(), Some(UiAction::SelectFile(readme)));
    }

    #[test]
    fn second_click_after_deadline_starts_new_gesture() {
        let (clock, mut clicks) = dispatcher();
        let docs = dir("/proj/docs");

        clicks.click(&docs);
        clock.advance(Duration::from_millis(300));
        // The event loop missed its tick; the stale single still belongs
        // to the first gesture.
        let fired = clicks.click(&docs);
        assert_eq!(fired, vec![UiAction::ToggleFolder(docs.clone())]);
        assert!(clicks.is_pending());
    }

    #[test]
    fn click_on_other_entry_flushes_pending() {
        let (_clock, mut clicks) = dispatcher();
        let docs = dir("/proj/docs");
        let readme = file("/proj/readme.md");

        clicks.click(&docs);
        let fired = clicks.click(&readme);

        assert_eq!(fired, vec![UiAction::ToggleFolder(docs)]);
        assert!(clicks.is_pending());
    }

    #[test]
    fn context_menu_is_immediate_and_cancels_pending_on_same_entry() {
        let (clock, mut clicks) = dispatcher();
        let docs = dir("/proj/docs");

        clicks.click(&docs);
        let fired = clicks.context_menu(&docs, 4, 7);
        assert_eq!(
            fired,
            vec![UiAction::ContextMenu {
                entry: docs,
                x: 4,
                y: 7
            }]
        );

        clock.advance(Duration::from_secs(1));
        assert_eq!(clicks.tick(), None);
    }

    #[test]
    fn context_menu_on_other_entry_flushes_pending() {
        let (_clock, mut clicks) = dispatcher();
        let docs = dir("/proj/docs");
        let readme = file("/proj/readme.md");

        clicks.click(&docs);
        let fired = clicks.context_menu(&readme, 0, 0);

        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0], UiAction::ToggleFolder(docs));
        assert!(matches!(fired[1], UiAction::ContextMenu { .. }));
    }

    #[test]
    fn next_deadline_tracks_pending_click() {
        let (clock, mut clicks) = dispatcher();
        assert!(clicks.next_deadline().is_none());

        clicks.click(&dir("/a"));
        assert_eq!(clicks.next_deadline(), Some(clock.now() + DEFAULT_DOUBLE_CLICK));
        assert_eq!(clicks.time_until_deadline(), Some(DEFAULT_DOUBLE_CLICK));

        clock.advance(Duration::from_secs(5));
        assert_eq!(clicks.time_until_deadline(), Some(Duration::ZERO));

        clicks.cancel();
        assert!(clicks.next_deadline().is_none());
    }
}
