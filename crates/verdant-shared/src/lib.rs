//! Shared types and engine for Verdant.
//!
//! Turns activity records into achievements, badges, XP, levels and garden
//! stages. Everything here is synchronous and free of presentation concerns;
//! `verdantctl` drives it and renders the results.

pub mod achievements;
pub mod activity;
pub mod badges;
pub mod config;
pub mod engine;
pub mod error;
pub mod notice;
pub mod persist;
pub mod queue;
pub mod rules;
pub mod stats;
pub mod streaks;
pub mod xp;

pub use activity::ActivityStores;
pub use config::VerdantConfig;
pub use engine::{Action, CycleReport, EngineState, ProgressionEngine, RewardKind, RewardStage};
pub use error::{Result, VerdantError};
pub use notice::{MessageClass, Notice};
pub use persist::{PersistedState, StateStore};
pub use queue::{PresenterEvent, RewardPresenter, RewardQueue};
pub use stats::{build_snapshot, DayClock, StatsSnapshot};
pub use xp::{add_xp, GardenStage, Profile, XpOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
