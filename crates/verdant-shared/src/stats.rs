//! Stats aggregation for the progression engine.
//!
//! Turns the activity stores into a flat [`StatsSnapshot`]. Aggregation is
//! pure: absent collections count as zero and input order does not matter.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::activity::{ActivityStores, BookStatus};
use crate::streaks::{all_habits_streak, checked_days, compute_streak, longest_run};
use crate::xp::Profile;

/// Tasks completed before this local hour count as early morning
pub const EARLY_MORNING_HOUR: u32 = 8;

/// Tasks completed at or after this local hour count as late night
pub const LATE_NIGHT_HOUR: u32 = 22;

/// All-habits streak needed for a perfect week
pub const PERFECT_WEEK_DAYS: u32 = 7;

/// Local timezone and reference day used for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayClock {
    pub offset: FixedOffset,
    pub today: NaiveDate,
}

impl DayClock {
    pub fn new(offset: FixedOffset, today: NaiveDate) -> Self {
        Self { offset, today }
    }

    /// UTC clock anchored at `today`
    pub fn utc(today: NaiveDate) -> Self {
        Self::new(Utc.fix(), today)
    }

    /// Clock from the system's local time
    pub fn local_now() -> Self {
        let now = Local::now();
        Self::new(*now.offset(), now.date_naive())
    }

    /// Local calendar day of an instant
    pub fn local_day(&self, at: &DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Local hour (0-23) of an instant
    pub fn local_hour(&self, at: &DateTime<Utc>) -> u32 {
        at.with_timezone(&self.offset).hour()
    }
}

/// Flat, derived statistics. Never persisted; rebuilt on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub tasks_completed: u64,
    pub tasks_total: u64,
    pub max_tasks_in_day: u64,
    pub task_streak: u32,
    pub has_early_morning_task: bool,
    pub has_late_night_task: bool,

    pub journal_entries: u64,
    pub journal_streak: u32,
    pub mood_entries: u64,

    pub books_finished: u64,
    pub books_reading: u64,
    pub pages_read: u64,

    pub habits_tracked: u64,
    pub habit_check_ins: u64,
    pub habit_streak: u32,
    pub best_single_habit_streak: u32,
    pub perfect_week: bool,

    pub focus_sessions: u64,
    pub focus_minutes: u64,

    pub transactions_logged: u64,

    pub level: u32,
    pub xp: u64,
}

impl StatsSnapshot {
    /// Copy of this snapshot with profile fields refreshed
    pub fn with_profile(mut self, profile: &Profile) -> Self {
        self.level = profile.level;
        self.xp = profile.xp;
        self
    }
}

/// Build a snapshot from the activity stores and the current profile
pub fn build_snapshot(stores: &ActivityStores, profile: &Profile, clock: &DayClock) -> StatsSnapshot {
    let mut snapshot = StatsSnapshot {
        level: profile.level,
        xp: profile.xp,
        ..Default::default()
    };

    aggregate_tasks(stores, clock, &mut snapshot);
    aggregate_journal(stores, clock, &mut snapshot);
    aggregate_books(stores, &mut snapshot);
    aggregate_habits(stores, clock, &mut snapshot);
    aggregate_focus(stores, &mut snapshot);
    snapshot.transactions_logged = stores.transactions().len() as u64;

    snapshot
}

fn aggregate_tasks(stores: &ActivityStores, clock: &DayClock, snapshot: &mut StatsSnapshot) {
    let tasks = stores.tasks();
    snapshot.tasks_total = tasks.len() as u64;

    snapshot.tasks_completed = tasks.iter().filter(|t| t.completed).count() as u64;

    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for at in completion_times(stores) {
        *per_day.entry(clock.local_day(at)).or_insert(0) += 1;

        let hour = clock.local_hour(at);
        if hour < EARLY_MORNING_HOUR {
            snapshot.has_early_morning_task = true;
        }
        if hour >= LATE_NIGHT_HOUR {
            snapshot.has_late_night_task = true;
        }
    }

    snapshot.max_tasks_in_day = per_day.values().copied().max().unwrap_or(0);
    let days: BTreeSet<NaiveDate> = per_day.into_keys().collect();
    snapshot.task_streak = compute_streak(&days, clock.today);
}

/// Completion instants of completed tasks.
/// Tasks completed without a timestamp have no day or hour and are skipped.
fn completion_times(stores: &ActivityStores) -> impl Iterator<Item = &DateTime<Utc>> {
    stores
        .tasks()
        .iter()
        .filter(|t| t.completed)
        .filter_map(|t| t.completed_at.as_ref())
}

/// Local days with at least one completed task
pub fn task_days(stores: &ActivityStores, clock: &DayClock) -> BTreeSet<NaiveDate> {
    completion_times(stores).map(|at| clock.local_day(at)).collect()
}

/// Local days with at least one journal entry, by `created_at`
pub fn journal_days(stores: &ActivityStores, clock: &DayClock) -> BTreeSet<NaiveDate> {
    stores.journal().iter().map(|e| clock.local_day(&e.created_at)).collect()
}

fn aggregate_journal(stores: &ActivityStores, clock: &DayClock, snapshot: &mut StatsSnapshot) {
    let journal = stores.journal();
    snapshot.journal_entries = journal.len() as u64;
    snapshot.mood_entries = journal.iter().filter(|e| e.valid_mood().is_some()).count() as u64;

    snapshot.journal_streak = compute_streak(&journal_days(stores, clock), clock.today);
}

fn aggregate_books(stores: &ActivityStores, snapshot: &mut StatsSnapshot) {
    for book in stores.books() {
        if book.is_finished() {
            snapshot.books_finished += 1;
        } else if book.status == BookStatus::Reading {
            snapshot.books_reading += 1;
        }
        snapshot.pages_read += u64::from(book.pages_read());
    }
}

fn aggregate_habits(stores: &ActivityStores, clock: &DayClock, snapshot: &mut StatsSnapshot) {
    let habit_ids: Vec<&str> = stores.habits().iter().map(|h| h.id.as_str()).collect();
    snapshot.habits_tracked = habit_ids.len() as u64;

    for id in &habit_ids {
        let Some(check_ins) = stores.check_ins_for(id) else {
            continue;
        };
        let days = checked_days(check_ins);
        snapshot.habit_check_ins += days.len() as u64;
        snapshot.best_single_habit_streak = snapshot.best_single_habit_streak.max(longest_run(&days));
    }

    if let Some(check_ins) = stores.habit_check_ins.as_ref() {
        snapshot.habit_streak = all_habits_streak(check_ins, &habit_ids, clock.today);
    }
    snapshot.perfect_week = snapshot.habit_streak >= PERFECT_WEEK_DAYS;
}

fn aggregate_focus(stores: &ActivityStores, snapshot: &mut StatsSnapshot) {
    for session in stores.pomodoro_sessions().iter().filter(|s| s.is_focus()) {
        snapshot.focus_sessions += 1;
        snapshot.focus_minutes += u64::from(session.duration);
    }
}
