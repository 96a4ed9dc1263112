//! Tiered badges.
//!
//! Each badge type has a ladder of thresholds; every rung is its own rule with
//! id `{type}_{threshold}` (e.g. `tasks_5`). Badges run through the same
//! evaluation contract as achievements; the tier is for display only.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::rules::{evaluate, Condition, Metric, Progress, Rule, RuleDefinition};
use crate::stats::StatsSnapshot;

/// Activity a badge ladder tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeType {
    Tasks,
    Journal,
    Streak,
    Books,
    Focus,
}

impl BadgeType {
    pub const ALL: [BadgeType; 5] = [
        BadgeType::Tasks,
        BadgeType::Journal,
        BadgeType::Streak,
        BadgeType::Books,
        BadgeType::Focus,
    ];

    /// Id prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Journal => "journal",
            Self::Streak => "streak",
            Self::Books => "books",
            Self::Focus => "focus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Tasks => "Task Finisher",
            Self::Journal => "Journal Keeper",
            Self::Streak => "Habit Streak",
            Self::Books => "Avid Reader",
            Self::Focus => "Focus Keeper",
        }
    }

    /// Snapshot metric the ladder counts
    pub fn metric(&self) -> Metric {
        match self {
            Self::Tasks => Metric::TasksCompleted,
            Self::Journal => Metric::JournalEntries,
            Self::Streak => Metric::HabitStreak,
            Self::Books => Metric::BooksFinished,
            Self::Focus => Metric::FocusSessions,
        }
    }

    /// Ascending thresholds for this ladder
    pub fn thresholds(&self) -> &'static [u64] {
        match self {
            Self::Tasks => &[1, 5, 10, 25, 50, 100],
            Self::Journal => &[1, 5, 10, 25, 50],
            Self::Streak => &[3, 7, 14, 30],
            Self::Books => &[1, 3, 5, 10],
            Self::Focus => &[1, 10, 25, 50, 100],
        }
    }

    /// Unit shown next to progress counters
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Journal => "entries",
            Self::Streak => "days",
            Self::Books => "books",
            Self::Focus => "sessions",
        }
    }
}

impl std::fmt::Display for BadgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display tier, by position on the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl BadgeTier {
    /// Tier for the n-th rung (0-based); rungs past the fifth stay diamond
    pub fn for_rung(rung: usize) -> Self {
        match rung {
            0 => Self::Bronze,
            1 => Self::Silver,
            2 => Self::Gold,
            3 => Self::Platinum,
            _ => Self::Diamond,
        }
    }

    pub fn xp_reward(&self) -> u64 {
        match self {
            Self::Bronze => 10,
            Self::Silver => 25,
            Self::Gold => 50,
            Self::Platinum => 100,
            Self::Diamond => 200,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Diamond => "Diamond",
        }
    }

    /// ASCII frame used when rendering the badge
    pub fn frame(&self) -> (&'static str, &'static str) {
        match self {
            Self::Bronze => ("(", ")"),
            Self::Silver => ("[", "]"),
            Self::Gold => ("{", "}"),
            Self::Platinum => ("<", ">"),
            Self::Diamond => ("<<", ">>"),
        }
    }
}

/// One rung of a badge ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub rule: RuleDefinition,
    pub badge_type: BadgeType,
    pub threshold: u64,
    pub tier: BadgeTier,
}

impl Badge {
    pub fn new(badge_type: BadgeType, threshold: u64, tier: BadgeTier) -> Self {
        Self {
            rule: RuleDefinition::new(
                badge_id(badge_type, threshold),
                Condition::at_least(badge_type.metric(), threshold),
                tier.xp_reward(),
            ),
            badge_type,
            threshold,
            tier,
        }
    }

    /// e.g. "Task Finisher (Gold)"
    pub fn name(&self) -> String {
        format!("{} ({})", self.badge_type.label(), self.tier.label())
    }

    /// e.g. "Reach 10 tasks"
    pub fn description(&self) -> String {
        format!("Reach {} {}", self.threshold, self.badge_type.unit())
    }

    /// ASCII glyph, e.g. "{tasks 10}"
    pub fn glyph(&self) -> String {
        let (open, close) = self.tier.frame();
        format!("{}{} {}{}", open, self.badge_type.as_str(), self.threshold, close)
    }
}

impl Rule for Badge {
    fn definition(&self) -> &RuleDefinition {
        &self.rule
    }
}

/// Badge id for a type and threshold
pub fn badge_id(badge_type: BadgeType, threshold: u64) -> String {
    format!("{}_{}", badge_type.as_str(), threshold)
}

/// The full badge catalog, ladder by ladder
pub fn all_badges() -> Vec<Badge> {
    BadgeType::ALL
        .iter()
        .flat_map(|badge_type| {
            badge_type
                .thresholds()
                .iter()
                .enumerate()
                .map(move |(rung, threshold)| Badge::new(*badge_type, *threshold, BadgeTier::for_rung(rung)))
        })
        .collect()
}

/// Look up a badge by id
pub fn get_badge(id: &str) -> Option<Badge> {
    all_badges().into_iter().find(|b| b.id() == id)
}

/// Ids newly earned by this snapshot
pub fn newly_unlocked(snapshot: &StatsSnapshot, unlocked: &HashSet<String>) -> Vec<String> {
    evaluate(&all_badges(), snapshot, unlocked)
}

/// Per-type counters persisted for badge display
pub type BadgeProgress = BTreeMap<BadgeType, u64>;

/// Current counter for every badge type
pub fn badge_progress(snapshot: &StatsSnapshot) -> BadgeProgress {
    BadgeType::ALL
        .iter()
        .map(|t| (*t, t.metric().read(snapshot)))
        .collect()
}

/// Next locked rung of a ladder and progress toward it
pub fn next_badge(badge_type: BadgeType, snapshot: &StatsSnapshot, unlocked: &HashSet<String>) -> Option<(Badge, Progress)> {
    all_badges()
        .into_iter()
        .filter(|b| b.badge_type == badge_type)
        .find(|b| !unlocked.contains(b.id()))
        .map(|b| {
            let progress = b.progress(snapshot);
            (b, progress)
        })
}

/// Format a badge unlock for the reward dialog
pub fn format_badge_unlock(badge: &Badge) -> String {
    format!("{} Badge earned: {} - {}", badge.glyph(), badge.name(), badge.description())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::validate_catalog;

    fn tasks(n: u64) -> StatsSnapshot {
        StatsSnapshot {
            tasks_completed: n,
            ..Default::default()
        }
    }

    #[test]
    fn test_catalog_is_valid() {
        let badges = all_badges();
        assert!(validate_catalog(&badges).is_empty());
        assert_eq!(badges.len(), 24);
    }

    #[test]
    fn test_ids_and_tiers() {
        let badge = get_badge("tasks_5").unwrap();
        assert_eq!(badge.badge_type, BadgeType::Tasks);
        assert_eq!(badge.threshold, 5);
        assert_eq!(badge.tier, BadgeTier::Silver);
        assert_eq!(badge.rule.reward_xp, 25);
        assert_eq!(get_badge("tasks_100").unwrap().tier, BadgeTier::Diamond);
        assert!(get_badge("tasks_7").is_none());
    }

    #[test]
    fn test_five_tasks_unlock_once() {
        let snapshot = tasks(5);
        let mut unlocked = HashSet::new();

        let first = newly_unlocked(&snapshot, &unlocked);
        assert_eq!(first, vec!["tasks_1".to_string(), "tasks_5".to_string()]);
        unlocked.extend(first);

        assert!(newly_unlocked(&snapshot, &unlocked).is_empty());
    }

    #[test]
    fn test_badge_progress_counters() {
        let snapshot = StatsSnapshot {
            tasks_completed: 7,
            books_finished: 2,
            habit_streak: 4,
            ..Default::default()
        };
        let progress = badge_progress(&snapshot);
        assert_eq!(progress.get(&BadgeType::Tasks), Some(&7));
        assert_eq!(progress.get(&BadgeType::Books), Some(&2));
        assert_eq!(progress.get(&BadgeType::Streak), Some(&4));
        assert_eq!(progress.get(&BadgeType::Focus), Some(&0));
    }

    #[test]
    fn test_next_badge() {
        let unlocked: HashSet<String> = ["tasks_1".to_string(), "tasks_5".to_string()].into_iter().collect();
        let (badge, progress) = next_badge(BadgeType::Tasks, &tasks(7), &unlocked).unwrap();
        assert_eq!(badge.id(), "tasks_10");
        assert_eq!(progress, Progress { current: 7, target: 10 });
    }

    #[test]
    fn test_next_badge_when_ladder_complete() {
        let unlocked: HashSet<String> = BadgeType::Books
            .thresholds()
            .iter()
            .map(|t| badge_id(BadgeType::Books, *t))
            .collect();
        assert!(next_badge(BadgeType::Books, &StatsSnapshot::default(), &unlocked).is_none());
    }

    #[test]
    fn test_format_badge_unlock() {
        let badge = get_badge("journal_10").unwrap();
        assert_eq!(
            format_badge_unlock(&badge),
            "{journal 10} Badge earned: Journal Keeper (Gold) - Reach 10 entries"
        );
    }

    #[test]
    fn test_progress_serializes_with_type_keys() {
        let json = serde_json::to_string(&badge_progress(&tasks(3))).unwrap();
        assert!(json.contains("\"tasks\":3"));
    }
}
