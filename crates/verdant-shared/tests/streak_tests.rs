//! Streak and level properties over wider input ranges.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

use verdant_shared::activity::HabitCheckIns;
use verdant_shared::streaks::{all_habits_streak, compute_streak, date_key, MAX_STREAK_WALK};
use verdant_shared::xp::{level_for_xp, stage_for_xp};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn offsets(days: &[i64]) -> BTreeSet<NaiveDate> {
    days.iter().map(|d| today() - Duration::days(*d)).collect()
}

#[test]
fn test_grace_for_missing_today() {
    assert_eq!(compute_streak(&offsets(&[1, 2]), today()), 2);
    assert_eq!(compute_streak(&offsets(&[1, 3]), today()), 1);
    assert_eq!(compute_streak(&offsets(&[0, 1, 2]), today()), 3);
    assert_eq!(compute_streak(&offsets(&[2, 3]), today()), 0);
}

#[test]
fn test_streak_across_leap_day() {
    // 2024-02-29 sits inside this run
    assert_eq!(compute_streak(&offsets(&[0, 1, 2, 3]), today()), 4);
}

#[test]
fn test_streak_is_capped() {
    let long: Vec<i64> = (0..1000).collect();
    assert_eq!(compute_streak(&offsets(&long), today()), MAX_STREAK_WALK);
}

#[test]
fn test_streak_never_exceeds_present_days() {
    for n in 0..40i64 {
        let set = offsets(&(0..n).step_by(2).collect::<Vec<_>>());
        assert!(compute_streak(&set, today()) as usize <= set.len());
    }
}

#[test]
fn test_all_habits_needs_every_habit() {
    let mut check_ins = HabitCheckIns::new();
    let run = |days: &[i64]| -> BTreeMap<String, bool> {
        days.iter().map(|d| (date_key(today() - Duration::days(*d)), true)).collect()
    };
    check_ins.insert("read".to_string(), run(&[0, 1, 2, 3]));
    check_ins.insert("run".to_string(), run(&[0, 1, 3]));

    assert_eq!(all_habits_streak(&check_ins, &["read"], today()), 4);
    assert_eq!(all_habits_streak(&check_ins, &["read", "run"], today()), 2);
    assert_eq!(all_habits_streak(&check_ins, &["read", "swim"], today()), 0);
    assert_eq!(all_habits_streak(&check_ins, &[], today()), 0);
}

#[test]
fn test_level_and_stage_are_monotonic_in_xp() {
    let mut last_level = level_for_xp(0);
    let mut last_stage = stage_for_xp(0);
    for xp in (0..2000).step_by(7) {
        assert!(level_for_xp(xp) >= last_level);
        assert!(stage_for_xp(xp) >= last_stage);
        last_level = level_for_xp(xp);
        last_stage = stage_for_xp(xp);
    }
}
