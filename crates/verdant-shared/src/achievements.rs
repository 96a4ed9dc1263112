//! Achievements: fine-grained, semantically named rewards.
//!
//! Tracks milestones across every activity domain and unlocks achievements.
//! Uses ASCII badge glyphs so toasts render in any terminal.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::rules::{evaluate, Condition, Flag, Metric, Progress, Rule, RuleDefinition};
use crate::stats::StatsSnapshot;

/// Flavor category of an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Tasks,
    Journal,
    Reading,
    Habits,
    Focus,
    Finance,
    Progress,
}

impl AchievementCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tasks => "Tasks",
            Self::Journal => "Journal",
            Self::Reading => "Reading",
            Self::Habits => "Habits",
            Self::Focus => "Focus",
            Self::Finance => "Finance",
            Self::Progress => "Progress",
        }
    }
}

/// Achievement with ASCII symbol and description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Achievement {
    pub rule: RuleDefinition,
    /// ASCII badge symbol (e.g., "[1]", "~05~")
    pub badge: &'static str,
    pub name: &'static str,
    /// How to earn it
    pub description: &'static str,
    pub category: AchievementCategory,
}

impl Rule for Achievement {
    fn definition(&self) -> &RuleDefinition {
        &self.rule
    }
}

type AchievementRow = (
    AchievementCategory,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    Condition,
    u64,
);

use self::AchievementCategory as C;

#[rustfmt::skip]
const ACHIEVEMENT_TABLE: &[AchievementRow] = &[
    // Tasks
    (C::Tasks, "first_task", "[1]", "First Step", "Complete your first task", Condition::at_least(Metric::TasksCompleted, 1), 10),
    (C::Tasks, "task_apprentice", "[10]", "Getting Things Done", "Complete 10 tasks", Condition::at_least(Metric::TasksCompleted, 10), 25),
    (C::Tasks, "task_master", "[50]", "Task Master", "Complete 50 tasks", Condition::at_least(Metric::TasksCompleted, 50), 50),
    (C::Tasks, "task_legend", "[100]", "Unstoppable", "Complete 100 tasks", Condition::at_least(Metric::TasksCompleted, 100), 100),
    (C::Tasks, "productive_day", "[5/d]", "Productive Day", "Complete 5 tasks in a single day", Condition::at_least(Metric::MaxTasksInDay, 5), 30),
    (C::Tasks, "task_streak_7", "<7d>", "On a Roll", "Complete tasks 7 days in a row", Condition::at_least(Metric::TaskStreak, 7), 40),
    (C::Tasks, "early_bird", "~07~", "Early Bird", "Complete a task before 8 AM", Condition::flag(Flag::EarlyMorningTask), 20),
    (C::Tasks, "night_owl", "~22~", "Night Owl", "Complete a task after 10 PM", Condition::flag(Flag::LateNightTask), 20),
    // Journal
    (C::Journal, "first_entry", "(j)", "Dear Diary", "Write your first journal entry", Condition::at_least(Metric::JournalEntries, 1), 10),
    (C::Journal, "journal_streak_7", "<7j>", "Reflective Week", "Journal 7 days in a row", Condition::at_least(Metric::JournalStreak, 7), 40),
    (C::Journal, "journal_30", "(30j)", "Chronicler", "Write 30 journal entries", Condition::at_least(Metric::JournalEntries, 30), 60),
    (C::Journal, "mood_tracker", "(:)", "In Touch", "Record your mood 10 times", Condition::at_least(Metric::MoodEntries, 10), 25),
    // Reading
    (C::Reading, "first_book", "{b}", "Bookworm", "Finish your first book", Condition::at_least(Metric::BooksFinished, 1), 30),
    (C::Reading, "library_5", "{5b}", "Little Library", "Finish 5 books", Condition::at_least(Metric::BooksFinished, 5), 60),
    (C::Reading, "page_turner", "{pg}", "Page Turner", "Read 1000 pages", Condition::at_least(Metric::PagesRead, 1000), 50),
    // Habits
    (C::Habits, "first_check_in", "|v|", "Seed of Habit", "Check in a habit for the first time", Condition::at_least(Metric::HabitCheckIns, 1), 10),
    (C::Habits, "perfect_week", "|7/7|", "Perfect Week", "Check in every habit 7 days in a row", Condition::flag(Flag::PerfectWeek), 50),
    (C::Habits, "habit_hero", "|30|", "Habit Hero", "Keep one habit going for 30 days", Condition::at_least(Metric::BestSingleHabitStreak, 30), 100),
    // Focus
    (C::Focus, "first_focus", "(o)", "Deep Breath", "Finish your first focus session", Condition::at_least(Metric::FocusSessions, 1), 10),
    (C::Focus, "deep_focus", "(10h)", "Deep Focus", "Focus for 10 hours in total", Condition::at_least(Metric::FocusMinutes, 600), 50),
    (C::Focus, "focus_marathon", "(100)", "Marathon Mind", "Finish 100 focus sessions", Condition::at_least(Metric::FocusSessions, 100), 100),
    // Finance
    (C::Finance, "budget_keeper", "[$]", "Budget Keeper", "Log 10 transactions", Condition::at_least(Metric::TransactionsLogged, 10), 20),
    // Progress
    (C::Progress, "level_5", "*5*", "Growing Strong", "Reach level 5", Condition::at_least(Metric::Level, 5), 25),
    (C::Progress, "level_10", "*10*", "Seasoned Gardener", "Reach level 10", Condition::at_least(Metric::Level, 10), 50),
    (C::Progress, "forest_keeper", "/^\\", "Forest Keeper", "Grow your garden into a forest", Condition::at_least(Metric::Xp, 500), 0),
];

/// All available achievements, in display order
pub fn all_achievements() -> Vec<Achievement> {
    ACHIEVEMENT_TABLE
        .iter()
        .map(|(category, id, badge, name, description, condition, reward)| Achievement {
            rule: RuleDefinition::new(*id, *condition, *reward),
            badge: *badge,
            name: *name,
            description: *description,
            category: *category,
        })
        .collect()
}

/// Look up an achievement by id
pub fn get_achievement(id: &str) -> Option<Achievement> {
    all_achievements().into_iter().find(|a| a.id() == id)
}

/// Achievements in one category
pub fn achievements_by_category(category: AchievementCategory) -> Vec<Achievement> {
    all_achievements()
        .into_iter()
        .filter(|a| a.category == category)
        .collect()
}

/// Ids newly earned by this snapshot
pub fn newly_unlocked(snapshot: &StatsSnapshot, unlocked: &HashSet<String>) -> Vec<String> {
    evaluate(&all_achievements(), snapshot, unlocked)
}

/// Display row: achievement, unlocked flag and progress
#[derive(Debug, Clone)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub unlocked: bool,
    pub progress: Progress,
}

/// Every achievement with its unlocked flag and progress toward it
pub fn check_achievements(snapshot: &StatsSnapshot, unlocked: &HashSet<String>) -> Vec<AchievementStatus> {
    all_achievements()
        .into_iter()
        .map(|achievement| AchievementStatus {
            unlocked: unlocked.contains(achievement.id()),
            progress: achievement.progress(snapshot),
            achievement,
        })
        .collect()
}

/// Format unlocked badges for display (ASCII style)
pub fn format_achievements(statuses: &[AchievementStatus], max_display: usize) -> String {
    let unlocked: Vec<_> = statuses.iter().filter(|s| s.unlocked).collect();
    if unlocked.is_empty() {
        return String::new();
    }

    let badges: String = unlocked
        .iter()
        .take(max_display)
        .map(|s| s.achievement.badge)
        .collect::<Vec<_>>()
        .join(" ");

    if unlocked.len() > max_display {
        format!("{} +{} more", badges, unlocked.len() - max_display)
    } else {
        badges
    }
}

/// Format a single achievement for notification (ASCII style)
pub fn format_achievement_unlock(ach: &Achievement) -> String {
    format!("{} Achievement unlocked: {} - {}", ach.badge, ach.name, ach.description)
}
