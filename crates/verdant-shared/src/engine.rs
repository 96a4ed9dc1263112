//! Progression engine.
//!
//! Owns the whole mutable progression state and runs the per-event cycle:
//! snapshot, evaluate both catalogs, union into the unlocked sets, enqueue for
//! presentation, apply reward XP. Reward XP can itself satisfy level or XP
//! rules, so the cycle repeats on a refreshed snapshot until nothing new
//! unlocks.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info};

use crate::achievements::{all_achievements, format_achievement_unlock, Achievement};
use crate::activity::ActivityStores;
use crate::badges::{all_badges, badge_progress, format_badge_unlock, Badge, BadgeProgress};
use crate::config::{NotificationConfig, VerdantConfig, XpConfig};
use crate::notice::Notice;
use crate::persist::PersistedState;
use crate::queue::{PresenterEvent, RewardPresenter, RewardQueue};
use crate::rules::{evaluate, validate_catalog, Rule, UnlockState};
use crate::stats::{build_snapshot, DayClock, StatsSnapshot};
use crate::xp::{add_xp, Profile, XpOutcome};

/// Which catalog a reward id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Achievement,
    Badge,
}

/// User actions that earn XP directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TaskCompleted,
    HabitCheckIn,
    JournalEntry,
    BookFinished,
    FocusSession,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::TaskCompleted,
        Action::HabitCheckIn,
        Action::JournalEntry,
        Action::BookFinished,
        Action::FocusSession,
    ];

    /// XP this action is worth under `config`
    pub fn xp(&self, config: &XpConfig) -> u64 {
        match self {
            Self::TaskCompleted => config.task_completed,
            Self::HabitCheckIn => config.habit_check_in,
            Self::JournalEntry => config.journal_entry,
            Self::BookFinished => config.book_finished,
            Self::FocusSession => config.focus_session,
        }
    }
}

/// Everything that changes while the user progresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    pub profile: Profile,
    pub achievements: UnlockState,
    pub badges: UnlockState,
    pub badge_progress: BadgeProgress,
    /// Unlocked achievements not yet shown; transient
    pub pending_achievements: RewardQueue,
    /// Unlocked badges not yet shown; transient
    pub pending_badges: RewardQueue,
    /// Catalog of each pending reward in unlock order, across both queues.
    /// Within one round achievements come before badges. Transient.
    pub arrivals: VecDeque<RewardKind>,
}

/// What one [`ProgressionEngine::process`] call did
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub new_achievements: Vec<String>,
    pub new_badges: Vec<String>,
    /// One entry per round that granted reward XP
    pub xp_outcomes: Vec<XpOutcome>,
    /// XP notices, delayed behind the unlocks that earned them
    pub notices: Vec<Notice>,
    /// Final snapshot, with profile fields after all reward XP
    pub snapshot: StatsSnapshot,
    pub rounds: usize,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.new_achievements.is_empty() && self.new_badges.is_empty()
    }

    /// Total reward XP granted this cycle
    pub fn xp_gained(&self) -> u64 {
        self.xp_outcomes.iter().map(|o| o.gained).sum()
    }
}

/// Owns the catalogs and the progression state
pub struct ProgressionEngine {
    state: EngineState,
    achievements: Vec<Achievement>,
    badges: Vec<Badge>,
    xp: XpConfig,
    xp_notice_delay_ms: u64,
}

impl ProgressionEngine {
    /// Fresh engine: level 1, nothing unlocked
    pub fn new(config: &VerdantConfig) -> Self {
        Self::with_state(EngineState::default(), config)
    }

    /// Resume from persisted state
    pub fn from_persisted(persisted: PersistedState, config: &VerdantConfig) -> Self {
        let state = EngineState {
            profile: persisted.profile,
            achievements: persisted.achievements,
            badges: persisted.badges,
            badge_progress: persisted.badge_progress,
            ..Default::default()
        };
        Self::with_state(state, config)
    }

    fn with_state(state: EngineState, config: &VerdantConfig) -> Self {
        let achievements = all_achievements();
        let badges = all_badges();
        debug_assert!(
            validate_catalog(&achievements).is_empty(),
            "built-in achievement catalog is invalid"
        );
        debug_assert!(validate_catalog(&badges).is_empty(), "built-in badge catalog is invalid");

        Self {
            state,
            achievements,
            badges,
            xp: config.xp.clone(),
            xp_notice_delay_ms: config.notifications.xp_notice_delay_ms,
        }
    }

    /// The durable part of the state
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            profile: self.state.profile,
            achievements: self.state.achievements.clone(),
            badges: self.state.badges.clone(),
            badge_progress: self.state.badge_progress.clone(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn profile(&self) -> &Profile {
        &self.state.profile
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    /// Pending queue for one catalog.
    ///
    /// Draining it directly skips cross-catalog ordering; [`RewardStage`]
    /// goes through [`pop_pending`](Self::pop_pending) instead.
    pub fn pending_mut(&mut self, kind: RewardKind) -> &mut RewardQueue {
        match kind {
            RewardKind::Achievement => &mut self.state.pending_achievements,
            RewardKind::Badge => &mut self.state.pending_badges,
        }
    }

    /// Oldest pending reward across both catalogs
    pub fn pop_pending(&mut self) -> Option<(RewardKind, String)> {
        while let Some(kind) = self.state.arrivals.pop_front() {
            if let Some(id) = self.pending_mut(kind).pop_next() {
                return Some((kind, id));
            }
        }
        // Arrivals run dry when a queue was filled or drained directly
        [RewardKind::Achievement, RewardKind::Badge]
            .into_iter()
            .find_map(|kind| self.pending_mut(kind).pop_next().map(|id| (kind, id)))
    }

    /// Snapshot of the stores against the current profile
    pub fn snapshot(&self, stores: &ActivityStores, clock: &DayClock) -> StatsSnapshot {
        build_snapshot(stores, &self.state.profile, clock)
    }

    /// Run one full evaluation cycle.
    ///
    /// Calling this twice on the same stores unlocks nothing the second time.
    pub fn process(&mut self, stores: &ActivityStores, clock: &DayClock) -> CycleReport {
        let mut snapshot = self.snapshot(stores, clock);
        let mut report = CycleReport::default();

        // Every round unlocks at least one rule, so this bounds the loop
        let max_rounds = self.achievements.len() + self.badges.len() + 1;

        for _ in 0..max_rounds {
            let found = evaluate(&self.achievements, &snapshot, self.state.achievements.as_set());
            let new_achievements = self.state.achievements.union(found);
            let found = evaluate(&self.badges, &snapshot, self.state.badges.as_set());
            let new_badges = self.state.badges.union(found);

            if new_achievements.is_empty() && new_badges.is_empty() {
                break;
            }
            report.rounds += 1;

            let reward = reward_for(&self.achievements, &new_achievements)
                .saturating_add(reward_for(&self.badges, &new_badges));
            debug!(
                achievements = new_achievements.len(),
                badges = new_badges.len(),
                reward,
                "rules unlocked"
            );

            self.state.pending_achievements.enqueue(new_achievements.iter().cloned());
            self.state.pending_badges.enqueue(new_badges.iter().cloned());
            let arrivals = &mut self.state.arrivals;
            arrivals.extend(new_achievements.iter().map(|_| RewardKind::Achievement));
            arrivals.extend(new_badges.iter().map(|_| RewardKind::Badge));
            report.new_achievements.extend(new_achievements);
            report.new_badges.extend(new_badges);

            if reward > 0 {
                let outcome = self.apply_xp(reward);
                report.notices.push(outcome.notice().delayed(self.xp_notice_delay_ms));
                report.xp_outcomes.push(outcome);
                snapshot = snapshot.with_profile(&self.state.profile);
            }
        }

        self.state.badge_progress = badge_progress(&snapshot);
        report.snapshot = snapshot;

        if !report.is_empty() {
            info!(
                achievements = report.new_achievements.len(),
                badges = report.new_badges.len(),
                xp = report.xp_gained(),
                level = self.state.profile.level,
                "progression cycle complete"
            );
        }
        report
    }

    /// Grant XP outside of rule rewards. Zero changes nothing.
    pub fn award_xp(&mut self, amount: u64) -> XpOutcome {
        self.apply_xp(amount)
    }

    /// Grant the configured XP for a user action
    pub fn award_action(&mut self, action: Action) -> XpOutcome {
        let amount = action.xp(&self.xp);
        debug!(?action, amount, "action xp");
        self.apply_xp(amount)
    }

    fn apply_xp(&mut self, amount: u64) -> XpOutcome {
        let outcome = add_xp(amount, &self.state.profile);
        self.state.profile = outcome.profile;
        if outcome.crossed_stage {
            info!(stage = %outcome.profile.stage, "garden stage reached");
        } else if outcome.crossed_level {
            info!(level = outcome.profile.level, "level reached");
        }
        outcome
    }

    /// Display notice for an unlocked reward, `None` for ids no longer in a catalog
    pub fn reward_notice(&self, kind: RewardKind, id: &str) -> Option<Notice> {
        let text = match kind {
            RewardKind::Achievement => self
                .achievements
                .iter()
                .find(|a| a.id() == id)
                .map(format_achievement_unlock),
            RewardKind::Badge => self.badges.iter().find(|b| b.id() == id).map(format_badge_unlock),
        };
        text.map(Notice::success)
    }
}

/// Shows achievements and badges through one slot, oldest unlock first.
///
/// Achievements use the toast presenter, badges the dialog presenter. Only one
/// of them is ever on screen. Like the presenters it wraps, it owns no timers.
#[derive(Debug, Clone)]
pub struct RewardStage {
    toast: RewardPresenter,
    dialog: RewardPresenter,
    active: Option<RewardKind>,
}

impl RewardStage {
    pub fn new(toast: RewardPresenter, dialog: RewardPresenter) -> Self {
        Self {
            toast,
            dialog,
            active: None,
        }
    }

    /// Toast dwell from config; badge dialogs manual or on the same dwell
    pub fn from_config(config: &NotificationConfig) -> Self {
        let dialog = if config.badge_dialog_manual {
            RewardPresenter::manual()
        } else {
            RewardPresenter::with_dwell(config.toast_dwell())
        };
        Self::new(RewardPresenter::with_dwell(config.toast_dwell()), dialog)
    }

    pub fn showing(&self) -> Option<(RewardKind, &str)> {
        let kind = self.active?;
        self.presenter(kind).showing().map(|id| (kind, id))
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Advance the reward on screen, or pull the oldest pending one when
    /// nothing is showing. At most one event per call.
    pub fn tick(&mut self, engine: &mut ProgressionEngine, elapsed: Duration) -> Option<(RewardKind, PresenterEvent)> {
        if let Some(kind) = self.active {
            let event = self.presenter_mut(kind).advance(elapsed)?;
            self.active = None;
            return Some((kind, event));
        }

        let (kind, id) = engine.pop_pending()?;
        self.active = Some(kind);
        Some((kind, self.presenter_mut(kind).show(id)))
    }

    /// Dismiss whatever is on screen
    pub fn dismiss(&mut self) -> Option<(RewardKind, PresenterEvent)> {
        let kind = self.active.take()?;
        self.presenter_mut(kind).dismiss().map(|event| (kind, event))
    }

    /// Teardown: drop the reward on screen, leave the queues alone
    pub fn cancel(&mut self) {
        if let Some(kind) = self.active.take() {
            self.presenter_mut(kind).cancel();
        }
    }

    fn presenter(&self, kind: RewardKind) -> &RewardPresenter {
        match kind {
            RewardKind::Achievement => &self.toast,
            RewardKind::Badge => &self.dialog,
        }
    }

    fn presenter_mut(&mut self, kind: RewardKind) -> &mut RewardPresenter {
        match kind {
            RewardKind::Achievement => &mut self.toast,
            RewardKind::Badge => &mut self.dialog,
        }
    }
}

/// Sum of reward XP for `ids` in `catalog`
fn reward_for<R: Rule>(catalog: &[R], ids: &[String]) -> u64 {
    catalog
        .iter()
        .filter(|rule| ids.iter().any(|id| id == rule.id()))
        .fold(0u64, |total, rule| total.saturating_add(rule.reward_xp()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Task;
    use crate::notice::MessageClass;
    use crate::xp::GardenStage;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn clock() -> DayClock {
        DayClock::utc(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap())
    }

    fn five_tasks() -> ActivityStores {
        ActivityStores {
            tasks: Some(
                (0..5)
                    .map(|i| Task::new(&format!("t{i}")).done_at(Utc.with_ymd_and_hms(2024, 5, 9, 12, i, 0).unwrap()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_stores_unlock_nothing() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        let report = engine.process(&ActivityStores::default(), &clock());
        assert!(report.is_empty());
        assert_eq!(report.rounds, 0);
        assert_eq!(engine.profile().xp, 0);
    }

    #[test]
    fn test_five_tasks_badge_emitted_once() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());

        let first = engine.process(&five_tasks(), &clock());
        assert!(first.new_badges.contains(&"tasks_5".to_string()));
        assert!(first.new_achievements.contains(&"first_task".to_string()));
        assert!(first.new_achievements.contains(&"productive_day".to_string()));

        let second = engine.process(&five_tasks(), &clock());
        assert!(second.is_empty());
        assert!(second.notices.is_empty());
        assert_eq!(engine.state().pending_badges.iter().filter(|id| *id == "tasks_5").count(), 1);
    }

    #[test]
    fn test_reward_xp_applied() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        let report = engine.process(&five_tasks(), &clock());
        // first_task 10 + productive_day 30 + tasks_1 10 + tasks_5 25
        assert_eq!(report.xp_gained(), 75);
        assert_eq!(engine.profile().xp, 75);
        assert_eq!(report.snapshot.xp, 75);
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].delay_ms, 600);
    }

    #[test]
    fn test_reward_xp_triggers_level_rules_same_cycle() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        engine.award_xp(395);
        let report = engine.process(&five_tasks(), &clock());
        // 395 + 75 = 470 reaches level 5, then level_5 adds 25
        assert!(report.new_achievements.contains(&"level_5".to_string()));
        assert_eq!(report.rounds, 2);
        assert_eq!(report.xp_outcomes.len(), 2);
        assert_eq!(engine.profile().xp, 495);
        assert_eq!(engine.profile().stage, GardenStage::Flower);
        assert!(!engine.state().achievements.contains("forest_keeper"));
    }

    #[test]
    fn test_unlocks_survive_activity_regression() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        engine.process(&five_tasks(), &clock());
        let before = engine.state().achievements.len();

        engine.process(&ActivityStores::default(), &clock());
        assert_eq!(engine.state().achievements.len(), before);
        assert!(engine.state().badges.contains("tasks_5"));
    }

    #[test]
    fn test_badge_progress_refreshed() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        engine.process(&five_tasks(), &clock());
        assert_eq!(
            engine.state().badge_progress.get(&crate::badges::BadgeType::Tasks),
            Some(&5)
        );
    }

    #[test]
    fn test_persisted_round_trip_drops_pending() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        engine.process(&five_tasks(), &clock());

        let resumed = ProgressionEngine::from_persisted(engine.to_persisted(), &VerdantConfig::default());
        assert_eq!(resumed.profile(), engine.profile());
        assert_eq!(resumed.state().badges, engine.state().badges);
        assert!(resumed.state().pending_badges.is_empty());
    }

    #[test]
    fn test_award_action_uses_config() {
        let mut config = VerdantConfig::default();
        config.xp.book_finished = 120;
        let mut engine = ProgressionEngine::new(&config);
        let outcome = engine.award_action(Action::BookFinished);
        assert_eq!(outcome.profile.xp, 120);
        assert!(outcome.crossed_level);
        assert_eq!(outcome.notice().class, MessageClass::LevelUp);
    }

    #[test]
    fn test_award_zero_is_noop() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        let outcome = engine.award_xp(0);
        assert_eq!(outcome.gained, 0);
        assert_eq!(engine.profile().xp, 0);
    }

    #[test]
    fn test_reward_notice_lookup() {
        let engine = ProgressionEngine::new(&VerdantConfig::default());
        let notice = engine.reward_notice(RewardKind::Badge, "tasks_5").unwrap();
        assert_eq!(notice.class, MessageClass::Success);
        assert!(notice.text.contains("Task Finisher"));
        assert!(engine.reward_notice(RewardKind::Achievement, "retired_rule").is_none());
    }

    #[test]
    fn test_stage_interleaves_catalogs_in_unlock_order() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        engine.award_xp(395);
        engine.process(&five_tasks(), &clock());
        let expected: Vec<(RewardKind, String)> = {
            let state = engine.state();
            assert_eq!(state.arrivals.len(), state.pending_achievements.len() + state.pending_badges.len());
            let mut achievements = state.pending_achievements.iter();
            let mut badges = state.pending_badges.iter();
            state
                .arrivals
                .iter()
                .map(|kind| {
                    let id = match kind {
                        RewardKind::Achievement => achievements.next(),
                        RewardKind::Badge => badges.next(),
                    };
                    (*kind, id.unwrap().to_string())
                })
                .collect()
        };
        let position = |kind: RewardKind, id: &str| expected.iter().position(|(k, i)| *k == kind && i == id).unwrap();
        assert!(position(RewardKind::Badge, "tasks_5") < position(RewardKind::Achievement, "level_5"));
        assert!(position(RewardKind::Achievement, "first_task") < position(RewardKind::Badge, "tasks_5"));

        let mut stage = RewardStage::new(
            RewardPresenter::with_dwell(Duration::from_secs(5)),
            RewardPresenter::manual(),
        );
        let mut shown = Vec::new();
        loop {
            match stage.tick(&mut engine, Duration::from_secs(5)) {
                Some((kind, PresenterEvent::Show(id))) => {
                    assert_eq!(stage.showing(), Some((kind, id.as_str())));
                    shown.push((kind, id));
                }
                Some((_, PresenterEvent::Hide(_))) => assert!(stage.is_idle()),
                None if !stage.is_idle() => {
                    assert_eq!(stage.showing().map(|(kind, _)| kind), Some(RewardKind::Badge));
                    stage.dismiss();
                }
                None => break,
            }
        }

        assert_eq!(shown, expected);
        assert!(shown.iter().any(|(kind, _)| *kind == RewardKind::Badge));
        assert!(engine.state().arrivals.is_empty());
    }

    #[test]
    fn test_stage_holds_badge_until_dismissed() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        engine.pending_mut(RewardKind::Badge).enqueue(vec!["tasks_5".to_string()]);
        engine.pending_mut(RewardKind::Achievement).enqueue(vec!["first_task".to_string()]);
        let mut stage = RewardStage::from_config(&NotificationConfig::default());

        // No arrivals recorded, so achievements go first
        assert_eq!(
            stage.tick(&mut engine, Duration::ZERO),
            Some((RewardKind::Achievement, PresenterEvent::Show("first_task".into())))
        );
        assert_eq!(
            stage.tick(&mut engine, Duration::from_secs(5)),
            Some((RewardKind::Achievement, PresenterEvent::Hide("first_task".into())))
        );
        assert_eq!(
            stage.tick(&mut engine, Duration::ZERO),
            Some((RewardKind::Badge, PresenterEvent::Show("tasks_5".into())))
        );
        assert_eq!(stage.tick(&mut engine, Duration::from_secs(3600)), None);
        assert_eq!(
            stage.dismiss(),
            Some((RewardKind::Badge, PresenterEvent::Hide("tasks_5".into())))
        );
        assert_eq!(stage.tick(&mut engine, Duration::ZERO), None);
    }

    #[test]
    fn test_stage_cancel_keeps_queue() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        engine.process(&five_tasks(), &clock());
        let pending_before = engine.state().arrivals.len();
        let mut stage = RewardStage::from_config(&NotificationConfig::default());

        stage.tick(&mut engine, Duration::ZERO);
        stage.cancel();
        assert!(stage.is_idle());
        assert_eq!(engine.state().arrivals.len(), pending_before - 1);
    }

    #[test]
    fn test_pending_queues_in_unlock_order() {
        let mut engine = ProgressionEngine::new(&VerdantConfig::default());
        engine.process(&five_tasks(), &clock());
        let pending = engine.pending_mut(RewardKind::Badge);
        assert_eq!(pending.pop_next().as_deref(), Some("tasks_1"));
        assert_eq!(pending.pop_next().as_deref(), Some("tasks_5"));
        assert_eq!(pending.pop_next(), None);
    }
}
