//! Rule evaluation shared by the achievement and badge catalogs.
//!
//! A rule is plain data: an id, a [`Condition`] and an XP reward. Conditions
//! name a [`Metric`] or [`Flag`] of the stats snapshot; reading them is an
//! exhaustive `match`, so adding a snapshot field without wiring it here is a
//! compile error rather than a silently dead rule.
//!
//! Unlocking is monotonic and idempotent: [`evaluate`] only reports ids that
//! are not yet unlocked, and nothing here ever removes an id.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error};

use crate::error::VerdantError;
use crate::stats::StatsSnapshot;

/// Numeric snapshot fields a rule can threshold on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TasksCompleted,
    MaxTasksInDay,
    TaskStreak,
    JournalEntries,
    JournalStreak,
    MoodEntries,
    BooksFinished,
    PagesRead,
    HabitCheckIns,
    HabitStreak,
    BestSingleHabitStreak,
    FocusSessions,
    FocusMinutes,
    TransactionsLogged,
    Level,
    Xp,
}

impl Metric {
    /// Current value of this metric in the snapshot
    pub fn read(self, s: &StatsSnapshot) -> u64 {
        match self {
            Self::TasksCompleted => s.tasks_completed,
            Self::MaxTasksInDay => s.max_tasks_in_day,
            Self::TaskStreak => u64::from(s.task_streak),
            Self::JournalEntries => s.journal_entries,
            Self::JournalStreak => u64::from(s.journal_streak),
            Self::MoodEntries => s.mood_entries,
            Self::BooksFinished => s.books_finished,
            Self::PagesRead => s.pages_read,
            Self::HabitCheckIns => s.habit_check_ins,
            Self::HabitStreak => u64::from(s.habit_streak),
            Self::BestSingleHabitStreak => u64::from(s.best_single_habit_streak),
            Self::FocusSessions => s.focus_sessions,
            Self::FocusMinutes => s.focus_minutes,
            Self::TransactionsLogged => s.transactions_logged,
            Self::Level => u64::from(s.level),
            Self::Xp => s.xp,
        }
    }
}

/// Boolean snapshot fields a rule can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    EarlyMorningTask,
    LateNightTask,
    PerfectWeek,
}

impl Flag {
    pub fn read(self, s: &StatsSnapshot) -> bool {
        match self {
            Self::EarlyMorningTask => s.has_early_morning_task,
            Self::LateNightTask => s.has_late_night_task,
            Self::PerfectWeek => s.perfect_week,
        }
    }
}

/// What must hold for a rule to unlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    AtLeast { metric: Metric, target: u64 },
    Flag { flag: Flag },
}

impl Condition {
    pub const fn at_least(metric: Metric, target: u64) -> Self {
        Self::AtLeast { metric, target }
    }

    pub const fn flag(flag: Flag) -> Self {
        Self::Flag { flag }
    }

    pub fn is_met(&self, s: &StatsSnapshot) -> bool {
        match *self {
            Self::AtLeast { metric, target } => metric.read(s) >= target,
            Self::Flag { flag } => flag.read(s),
        }
    }

    /// Progress toward the condition, clamped to the target
    pub fn progress(&self, s: &StatsSnapshot) -> Progress {
        match *self {
            Self::AtLeast { metric, target } => Progress::clamped(metric.read(s), target),
            Self::Flag { flag } => Progress::clamped(u64::from(flag.read(s)), 1),
        }
    }
}

/// Progress toward a rule. Always `target > 0` and `current <= target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    pub target: u64,
}

impl Progress {
    /// Clamp `current` into `0..=target`; a zero target is treated as 1
    pub fn clamped(current: u64, target: u64) -> Self {
        let target = target.max(1);
        Self {
            current: current.min(target),
            target,
        }
    }

    /// Whole percent, 0-100
    pub fn percentage(&self) -> u8 {
        (u128::from(self.current) * 100 / u128::from(self.target)).min(100) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

/// One unlock rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    pub condition: Condition,
    pub reward_xp: u64,
}

impl RuleDefinition {
    pub fn new(id: impl Into<String>, condition: Condition, reward_xp: u64) -> Self {
        Self {
            id: id.into(),
            condition,
            reward_xp,
        }
    }

    pub fn is_met(&self, s: &StatsSnapshot) -> bool {
        self.condition.is_met(s)
    }

    pub fn progress(&self, s: &StatsSnapshot) -> Progress {
        self.condition.progress(s)
    }

    /// Reject rules that could never be meaningfully displayed or unlocked
    pub fn validate(&self) -> Result<(), VerdantError> {
        if self.id.trim().is_empty() {
            return Err(VerdantError::InvalidRule {
                id: self.id.clone(),
                reason: "empty id".to_string(),
            });
        }
        if let Condition::AtLeast { target: 0, .. } = self.condition {
            return Err(VerdantError::InvalidRule {
                id: self.id.clone(),
                reason: "target must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Anything evaluated through the shared unlock contract
pub trait Rule {
    fn definition(&self) -> &RuleDefinition;

    fn id(&self) -> &str {
        &self.definition().id
    }

    fn reward_xp(&self) -> u64 {
        self.definition().reward_xp
    }

    fn progress(&self, s: &StatsSnapshot) -> Progress {
        self.definition().progress(s)
    }
}

impl Rule for RuleDefinition {
    fn definition(&self) -> &RuleDefinition {
        self
    }
}

/// Ids of rules that hold now and are not yet unlocked, in catalog order.
///
/// Pure: the caller unions the result into its unlocked set. Invalid rules are
/// skipped without affecting the rest of the catalog.
pub fn evaluate<R: Rule>(catalog: &[R], snapshot: &StatsSnapshot, unlocked: &HashSet<String>) -> Vec<String> {
    let mut newly = Vec::new();

    for rule in catalog {
        let def = rule.definition();
        if unlocked.contains(&def.id) {
            continue;
        }
        if let Err(e) = def.validate() {
            error!(rule = %def.id, kind = e.kind(), error = %e, "skipping invalid rule");
            continue;
        }
        if def.is_met(snapshot) && !newly.contains(&def.id) {
            debug!(rule = %def.id, "rule satisfied");
            newly.push(def.id.clone());
        }
    }

    newly
}

/// Every invalid rule in a catalog, plus duplicate ids
pub fn validate_catalog<R: Rule>(catalog: &[R]) -> Vec<VerdantError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for rule in catalog {
        let def = rule.definition();
        if let Err(e) = def.validate() {
            errors.push(e);
        }
        if !seen.insert(def.id.as_str()) {
            errors.push(VerdantError::InvalidRule {
                id: def.id.clone(),
                reason: "duplicate id".to_string(),
            });
        }
    }

    errors
}

/// Append-only set of unlocked rule ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlockState {
    ids: HashSet<String>,
}

impl UnlockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Borrow as a set for [`evaluate`]
    pub fn as_set(&self) -> &HashSet<String> {
        &self.ids
    }

    /// Union `ids` in, returning the ones that were not present before
    pub fn union<I>(&mut self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        ids.into_iter()
            .filter(|id| self.ids.insert(id.clone()))
            .collect()
    }

    /// Ids in sorted order, for stable persistence
    pub fn sorted(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl FromIterator<String> for UnlockState {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
