//! Streak calculation for the progression engine.
//!
//! Streaks count consecutive calendar days with activity, walking backward
//! from a reference day. The reference day itself may be missing (today's
//! activity is often not logged yet); any later gap ends the streak.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::activity::HabitCheckIns;

/// Upper bound on days walked per streak
pub const MAX_STREAK_WALK: u32 = 365;

/// Date key format used by check-in maps
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Streak statistics for one activity kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakStats {
    /// Current streak ending at the reference day (with grace)
    pub current_streak: u32,
    /// Best run of consecutive days ever
    pub best_streak: u32,
    /// Unique days with activity
    pub active_days: u32,
}

/// Count consecutive present days walking backward from `reference`.
///
/// Missing `reference` is forgiven once; the first later missing day ends the
/// walk. At most [`MAX_STREAK_WALK`] days are inspected.
pub fn compute_streak(present: &BTreeSet<NaiveDate>, reference: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut day = reference;

    for step in 0..MAX_STREAK_WALK {
        if present.contains(&day) {
            streak += 1;
        } else if step > 0 {
            break;
        }
        day = match day.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }

    streak
}

/// Longest run of consecutive days in the set
pub fn longest_run(present: &BTreeSet<NaiveDate>) -> u32 {
    let mut best = 0u32;
    let mut run = 0u32;
    let mut last: Option<NaiveDate> = None;

    for day in present {
        run = match last {
            Some(prev) if prev.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        last = Some(*day);
    }

    best
}

/// Current, best and active-day counts in one pass
pub fn streak_stats(present: &BTreeSet<NaiveDate>, reference: NaiveDate) -> StreakStats {
    StreakStats {
        current_streak: compute_streak(present, reference),
        best_streak: longest_run(present),
        active_days: present.len() as u32,
    }
}

/// Parse a `YYYY-MM-DD` check-in key
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT).ok()
}

/// Format a day as a check-in key
pub fn date_key(day: NaiveDate) -> String {
    day.format(DATE_KEY_FORMAT).to_string()
}

/// Days marked `true` in a single habit's check-in map.
/// Unparseable keys are ignored.
pub fn checked_days(check_ins: &BTreeMap<String, bool>) -> BTreeSet<NaiveDate> {
    check_ins
        .iter()
        .filter(|(_, checked)| **checked)
        .filter_map(|(key, _)| {
            let day = parse_date_key(key);
            if day.is_none() {
                debug!(key = %key, "ignoring unparseable check-in key");
            }
            day
        })
        .collect()
}

/// Days on which every tracked habit was checked in
pub fn all_habits_days(check_ins: &HabitCheckIns, habit_ids: &[&str]) -> BTreeSet<NaiveDate> {
    let Some((first, rest)) = habit_ids.split_first() else {
        return BTreeSet::new();
    };

    let mut days = check_ins.get(*first).map(checked_days).unwrap_or_default();
    for habit in rest {
        let habit_days = check_ins.get(*habit).map(checked_days).unwrap_or_default();
        days.retain(|d| habit_days.contains(d));
        if days.is_empty() {
            break;
        }
    }
    days
}

/// Streak over days where all tracked habits were checked in.
/// No tracked habits means no streak.
pub fn all_habits_streak(check_ins: &HabitCheckIns, habit_ids: &[&str], reference: NaiveDate) -> u32 {
    compute_streak(&all_habits_days(check_ins, habit_ids), reference)
}
