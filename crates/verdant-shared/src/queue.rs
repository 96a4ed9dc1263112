//! Reward notification queue and presenter.
//!
//! `RewardQueue` is a plain FIFO of unlocked-but-unshown reward ids.
//! `RewardPresenter` drains it one item at a time. It owns no timers: the host
//! calls [`RewardPresenter::tick`] with elapsed time and renders whatever the
//! returned events say. Dwell duration is chosen by the host.
//!
//! One presenter only orders its own queue. To show achievements and badges
//! through a single slot in unlock order, use [`crate::engine::RewardStage`].

use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// FIFO of reward ids awaiting presentation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardQueue {
    items: VecDeque<String>,
}

impl RewardQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append ids at the tail, preserving their order.
    /// Duplicates are filtered upstream by rule evaluation, not here.
    pub fn enqueue<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.items.extend(ids);
    }

    /// Remove and return the head, `None` when empty
    pub fn pop_next(&mut self) -> Option<String> {
        self.items.pop_front()
    }

    pub fn peek(&self) -> Option<&str> {
        self.items.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Drop everything pending
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// What the presenter is doing right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterState {
    /// Nothing showing
    Idle,
    /// One reward on screen
    Showing { id: String, elapsed: Duration },
}

/// Events the host renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    /// Start showing this reward
    Show(String),
    /// Stop showing this reward (auto-advance or dismissal)
    Hide(String),
}

/// Shows queued rewards one at a time.
///
/// `dwell == None` means items stay until [`dismiss`](Self::dismiss) is called.
#[derive(Debug, Clone)]
pub struct RewardPresenter {
    dwell: Option<Duration>,
    state: PresenterState,
}

impl RewardPresenter {
    /// Auto-advancing presenter
    pub fn with_dwell(dwell: Duration) -> Self {
        Self {
            dwell: Some(dwell),
            state: PresenterState::Idle,
        }
    }

    /// Presenter that waits for explicit dismissal
    pub fn manual() -> Self {
        Self {
            dwell: None,
            state: PresenterState::Idle,
        }
    }

    pub fn state(&self) -> &PresenterState {
        &self.state
    }

    pub fn showing(&self) -> Option<&str> {
        match &self.state {
            PresenterState::Showing { id, .. } => Some(id),
            PresenterState::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == PresenterState::Idle
    }

    /// Advance by `elapsed`. Pops the next reward when idle, hides the current
    /// one once its dwell has passed. Returns at most one event per call so the
    /// host never shows two rewards at once.
    pub fn tick(&mut self, queue: &mut RewardQueue, elapsed: Duration) -> Option<PresenterEvent> {
        if !self.is_idle() {
            return self.advance(elapsed);
        }
        self.show_next(queue)
    }

    /// Advance the reward on screen by `elapsed`, hiding it once its dwell
    /// has passed. Never pulls from a queue.
    pub fn advance(&mut self, elapsed: Duration) -> Option<PresenterEvent> {
        let dwell_done = match &mut self.state {
            PresenterState::Idle => false,
            PresenterState::Showing { elapsed: shown_for, .. } => {
                *shown_for = shown_for.saturating_add(elapsed);
                self.dwell.is_some_and(|dwell| *shown_for >= dwell)
            }
        };

        if dwell_done {
            self.hide()
        } else {
            None
        }
    }

    /// Show the head of `queue` if nothing is on screen
    pub fn show_next(&mut self, queue: &mut RewardQueue) -> Option<PresenterEvent> {
        if !self.is_idle() {
            return None;
        }

        let id = queue.pop_next()?;
        debug!(remaining = queue.len(), "queue head taken");
        Some(self.show(id))
    }

    /// Put `id` on screen. Whatever was showing is dropped without a `Hide`.
    pub fn show(&mut self, id: String) -> PresenterEvent {
        self.cancel();
        debug!(reward = %id, "presenting reward");
        self.state = PresenterState::Showing {
            id: id.clone(),
            elapsed: Duration::ZERO,
        };
        PresenterEvent::Show(id)
    }

    /// Manually dismiss the reward on screen, if any
    pub fn dismiss(&mut self) -> Option<PresenterEvent> {
        self.hide()
    }

    /// Teardown: drop the reward on screen without pulling more from the queue
    pub fn cancel(&mut self) {
        if let PresenterState::Showing { id, .. } = &self.state {
            debug!(reward = %id, "presenter cancelled");
        }
        self.state = PresenterState::Idle;
    }

    fn hide(&mut self) -> Option<PresenterEvent> {
        match std::mem::replace(&mut self.state, PresenterState::Idle) {
            PresenterState::Showing { id, .. } => Some(PresenterEvent::Hide(id)),
            PresenterState::Idle => None,
        }
    }
}
