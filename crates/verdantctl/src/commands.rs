//! Command implementations for verdantctl.

use anyhow::{Context as _, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use verdant_shared::achievements::{check_achievements, format_achievements, AchievementStatus};
use verdant_shared::badges::{badge_id, get_badge, BadgeType};
use verdant_shared::engine::{Action, ProgressionEngine, RewardStage};
use verdant_shared::queue::PresenterEvent;
use verdant_shared::rules::{Progress, Rule};
use verdant_shared::stats::{journal_days, task_days};
use verdant_shared::streaks::{all_habits_days, checked_days, streak_stats, StreakStats};
use verdant_shared::{ActivityStores, DayClock, StateStore, StatsSnapshot, VerdantConfig};

use crate::ui::{self, colors};

/// Earned glyphs shown on the status screen
const STATUS_GLYPHS: usize = 8;

/// Width of progress bars
const BAR_WIDTH: usize = 20;

/// Loaded config plus the state store it points at
pub struct Session {
    pub config: VerdantConfig,
    pub store: StateStore,
}

impl Session {
    /// Resolve config and state location from CLI flags
    pub fn open(config_path: Option<&Path>, state_path: Option<PathBuf>) -> Result<Self> {
        let config = VerdantConfig::load(config_path)?;
        let path = state_path.unwrap_or_else(|| config.state_path());
        debug!(state = %path.display(), "session opened");
        Ok(Self {
            store: StateStore::new(path),
            config,
        })
    }

    pub fn engine(&self) -> ProgressionEngine {
        ProgressionEngine::from_persisted(self.store.load(), &self.config)
    }

    pub fn save(&self, engine: &ProgressionEngine) -> Result<()> {
        self.store
            .save(&engine.to_persisted())
            .with_context(|| format!("Failed to save state to {}", self.store.path().display()))
    }
}

fn load_activity(path: &Path) -> Result<ActivityStores> {
    ActivityStores::load(path).with_context(|| format!("Failed to load activity from {}", path.display()))
}

/// verdantctl status
pub fn status(session: &Session, as_json: bool, version: &str) -> Result<()> {
    let engine = session.engine();
    let profile = engine.profile();
    let state = engine.state();

    let achievements_known = engine.achievements().iter().filter(|a| state.achievements.contains(a.id())).count();
    let badges_known = engine.badges().iter().filter(|b| state.badges.contains(b.id())).count();

    if as_json {
        let value = json!({
            "xp": profile.xp,
            "level": profile.level,
            "gardenStage": profile.stage,
            "achievements": { "unlocked": achievements_known, "total": engine.achievements().len() },
            "badges": { "unlocked": badges_known, "total": engine.badges().len() },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let level = profile.level_progress();

    ui::print_header("verdantctl status", version);
    ui::print_kv("level", &profile.level.to_string());
    ui::print_kv(
        "xp",
        &format!(
            "{} {} {}/{}",
            profile.xp,
            ui::progress_bar(level.percentage / 100.0, BAR_WIDTH),
            level.xp_in_level,
            level.xp_for_level
        ),
    );
    ui::print_kv("garden", &format!("{} {}", profile.stage.glyph(), profile.stage));
    match (profile.stage.next(), profile.xp_to_next_stage()) {
        (Some(next), Some(remaining)) => ui::print_kv("next stage", &format!("{} in {} xp", next, remaining)),
        _ => ui::print_kv("next stage", "fully grown"),
    }
    println!();

    ui::print_kv(
        "achievements",
        &format!("{}/{}", achievements_known, engine.achievements().len()),
    );
    ui::print_kv("badges", &format!("{}/{}", badges_known, engine.badges().len()));

    let statuses = check_achievements(&StatsSnapshot::default(), state.achievements.as_set());
    let earned = format_achievements(&statuses, STATUS_GLYPHS);
    if !earned.is_empty() {
        ui::print_kv("earned", &earned);
    }
    ui::print_footer();
    Ok(())
}

/// verdantctl sync --activity FILE
pub fn sync(session: &Session, activity: &Path) -> Result<()> {
    let stores = load_activity(activity)?;
    let mut engine = session.engine();
    let clock = DayClock::local_now();

    let report = engine.process(&stores, &clock);
    session.save(&engine)?;

    if report.is_empty() {
        println!("Nothing new. Keep going!");
        return Ok(());
    }

    println!();
    ui::print_section(
        "rewards",
        &format!(
            "{} achievements unlocked, {} badges earned",
            report.new_achievements.len(),
            report.new_badges.len()
        ),
    );
    present(&mut engine, RewardStage::from_config(&session.config.notifications));

    // XP notices trail the unlocks that earned them
    for notice in &report.notices {
        ui::print_notice(notice);
    }
    println!();

    info!(
        achievements = report.new_achievements.len(),
        badges = report.new_badges.len(),
        xp = engine.profile().xp,
        "sync complete"
    );
    Ok(())
}

/// Drain both pending queues through one stage, printing each reward once in
/// unlock order.
///
/// Output is not interactive, so every tick jumps past the dwell and manual
/// dialogs are dismissed as soon as they are shown.
fn present(engine: &mut ProgressionEngine, mut stage: RewardStage) {
    let step = Duration::MAX;
    let mut shown = Vec::new();

    loop {
        let event = match stage.tick(engine, step) {
            Some(event) => Some(event),
            None if !stage.is_idle() => stage.dismiss(),
            None => None,
        };
        match event {
            Some((kind, PresenterEvent::Show(id))) => shown.push((kind, id)),
            Some((_, PresenterEvent::Hide(_))) => {}
            None => break,
        }
    }

    for (kind, id) in shown {
        match engine.reward_notice(kind, &id) {
            Some(notice) => ui::print_notice(&notice),
            None => debug!(reward = %id, "no catalog entry for reward"),
        }
    }
}

/// verdantctl award AMOUNT | --action ACTION
pub fn award(session: &Session, amount: Option<u64>, action: Option<Action>) -> Result<()> {
    let mut engine = session.engine();
    let outcome = match (amount, action) {
        (Some(amount), _) => engine.award_xp(amount),
        (None, Some(action)) => engine.award_action(action),
        (None, None) => anyhow::bail!("Nothing to award: pass an amount or --action"),
    };

    if outcome.gained == 0 {
        println!("No xp awarded.");
        return Ok(());
    }

    session.save(&engine)?;
    ui::print_notice(&outcome.notice());
    Ok(())
}

/// verdantctl achievements [--all] [--activity FILE]
pub fn achievements(session: &Session, all: bool, activity: Option<&Path>) -> Result<()> {
    let engine = session.engine();
    let snapshot = match activity {
        Some(path) => engine.snapshot(&load_activity(path)?, &DayClock::local_now()),
        None => StatsSnapshot::default().with_profile(engine.profile()),
    };
    let statuses = check_achievements(&snapshot, engine.state().achievements.as_set());
    let earned = statuses.iter().filter(|s| s.unlocked).count();

    println!();
    ui::print_section("achievements", &format!("{}/{} unlocked", earned, statuses.len()));

    if earned == 0 && !all {
        println!("  {}None yet. Use --all to see what's available.{}", colors::DIM, colors::RESET);
    }

    for status in statuses.iter().filter(|s| all || s.unlocked) {
        print_achievement(status, activity.is_some());
    }
    println!();
    Ok(())
}

fn print_achievement(status: &AchievementStatus, with_progress: bool) {
    let ach = &status.achievement;
    let detail = if status.unlocked || !with_progress {
        format!("{} ({})", ach.description, ach.category.label())
    } else {
        format!("{} {}", ach.description, ui::format_progress(&status.progress, 10))
    };
    ui::print_reward_row(status.unlocked, ach.badge, ach.name, &detail);
}

/// verdantctl badges [--all]
pub fn badges(session: &Session, all: bool) -> Result<()> {
    let engine = session.engine();
    let state = engine.state();

    println!();
    for badge_type in BadgeType::ALL {
        let count = state.badge_progress.get(&badge_type).copied().unwrap_or(0);
        let ladder: Vec<_> = badge_type
            .thresholds()
            .iter()
            .filter_map(|t| get_badge(&badge_id(badge_type, *t)))
            .collect();
        let earned = ladder.iter().filter(|b| state.badges.contains(b.id())).count();

        ui::print_section(badge_type.label(), &format!("{}/{} ({} {})", earned, ladder.len(), count, badge_type.unit()));

        for badge in &ladder {
            let unlocked = state.badges.contains(badge.id());
            if !unlocked && !all {
                continue;
            }
            let detail = if unlocked {
                badge.tier.label().to_string()
            } else {
                ui::format_progress(&Progress::clamped(count, badge.threshold), 10)
            };
            ui::print_reward_row(unlocked, &badge.glyph(), &badge.description(), &detail);
        }

        if !all {
            if let Some(next) = ladder.iter().find(|b| !state.badges.contains(b.id())) {
                println!(
                    "    {}next:{} {} {}",
                    colors::DIM,
                    colors::RESET,
                    next.glyph(),
                    ui::format_progress(&Progress::clamped(count, next.threshold), 10)
                );
            } else {
                println!("    {}ladder complete{}", colors::OK, colors::RESET);
            }
        }
    }
    println!();
    Ok(())
}

/// verdantctl streaks --activity FILE
pub fn streaks(activity: &Path) -> Result<()> {
    let stores = load_activity(activity)?;
    let clock = DayClock::local_now();

    println!();
    ui::print_section("streaks", &format!("as of {}", clock.today));
    print_streak("tasks", &streak_stats(&task_days(&stores, &clock), clock.today));
    print_streak("journal", &streak_stats(&journal_days(&stores, &clock), clock.today));

    let habits = stores.habits();
    if !habits.is_empty() {
        let ids: Vec<&str> = habits.iter().map(|h| h.id.as_str()).collect();
        if let Some(check_ins) = stores.habit_check_ins.as_ref() {
            print_streak("all habits", &streak_stats(&all_habits_days(check_ins, &ids), clock.today));
        }
        println!();
        ui::print_section("habits", &format!("{} tracked", habits.len()));
        for habit in habits {
            let days = stores.check_ins_for(&habit.id).map(checked_days).unwrap_or_default();
            let label = if habit.name.is_empty() { &habit.id } else { &habit.name };
            print_streak(label, &streak_stats(&days, clock.today));
        }
    }
    println!();
    Ok(())
}

fn print_streak(label: &str, stats: &StreakStats) {
    let current = if stats.current_streak > 0 {
        format!("{}{}{}", colors::BOLD, ui::format_days(stats.current_streak), colors::RESET)
    } else {
        format!("{}none{}", colors::DIM, colors::RESET)
    };
    ui::print_kv(
        label,
        &format!(
            "{}  {}best {}, {} active{}",
            current,
            colors::DIM,
            ui::format_days(stats.best_streak),
            ui::format_days(stats.active_days),
            colors::RESET
        ),
    );
}
