//! Persisted progression state.
//!
//! Layout (JSON):
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "user": { "xp": 120, "level": 2, "gardenStage": "sprout" },
//!   "unlockedAchievements": ["first_task"],
//!   "unlockedBadges": ["tasks_1"],
//!   "badgeProgress": { "tasks": 3 }
//! }
//! ```
//!
//! Loading never fails. Each slice is read on its own; a slice that is
//! missing or malformed falls back to its default while the others still
//! load. `level` and `gardenStage` are written for readers of the file but
//! always re-derived from `xp` on load.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::badges::{BadgeProgress, BadgeType};
use crate::error::Result;
use crate::rules::UnlockState;
use crate::xp::{GardenStage, Profile};

/// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Everything the engine keeps across sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub profile: Profile,
    pub achievements: UnlockState,
    pub badges: UnlockState,
    pub badge_progress: BadgeProgress,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserBlob {
    xp: u64,
    level: u32,
    garden_stage: GardenStage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateBlob<'a> {
    schema_version: u32,
    user: UserBlob,
    unlocked_achievements: Vec<String>,
    unlocked_badges: Vec<String>,
    badge_progress: &'a BadgeProgress,
}

impl PersistedState {
    /// Serialize to the versioned JSON layout
    pub fn to_json(&self) -> Result<String> {
        let blob = StateBlob {
            schema_version: SCHEMA_VERSION,
            user: UserBlob {
                xp: self.profile.xp,
                level: self.profile.level,
                garden_stage: self.profile.stage,
            },
            unlocked_achievements: self.achievements.sorted(),
            unlocked_badges: self.badges.sorted(),
            badge_progress: &self.badge_progress,
        };
        Ok(serde_json::to_string_pretty(&blob)?)
    }

    /// Parse persisted JSON, degrading slice by slice
    pub fn from_json(json: &str) -> Self {
        let root = match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!("persisted state is not an object, starting fresh");
                return Self::default();
            }
            Err(e) => {
                warn!(error = %e, "persisted state unparseable, starting fresh");
                return Self::default();
            }
        };

        match root.get("schemaVersion").and_then(Value::as_u64) {
            Some(v) if v == u64::from(SCHEMA_VERSION) => {}
            other => warn!(
                found = ?other,
                expected = SCHEMA_VERSION,
                "schema version mismatch, loading known fields only"
            ),
        }

        Self {
            profile: read_profile(&root),
            achievements: read_ids(&root, "unlockedAchievements"),
            badges: read_ids(&root, "unlockedBadges"),
            badge_progress: read_badge_progress(&root),
        }
    }
}

fn read_profile(root: &Map<String, Value>) -> Profile {
    match root.get("user").and_then(|u| u.get("xp")).and_then(Value::as_u64) {
        Some(xp) => Profile::from_xp(xp),
        None => {
            warn!("persisted profile missing or malformed, resetting to level 1");
            Profile::default()
        }
    }
}

fn read_ids(root: &Map<String, Value>, key: &str) -> UnlockState {
    let Some(items) = root.get(key).and_then(Value::as_array) else {
        if root.contains_key(key) {
            warn!(slice = key, "persisted unlock list malformed, resetting");
        }
        return UnlockState::new();
    };

    let mut dropped = 0usize;
    let ids: UnlockState = items
        .iter()
        .filter_map(|v| {
            let id = v.as_str().map(str::trim).filter(|s| !s.is_empty());
            if id.is_none() {
                dropped += 1;
            }
            id.map(str::to_string)
        })
        .collect();

    if dropped > 0 {
        warn!(slice = key, dropped, "dropped malformed unlock ids");
    }
    ids
}

fn read_badge_progress(root: &Map<String, Value>) -> BadgeProgress {
    let Some(map) = root.get("badgeProgress").and_then(Value::as_object) else {
        return BadgeProgress::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let badge_type = serde_json::from_value::<BadgeType>(Value::String(key.clone())).ok();
            let count = value.as_u64();
            if badge_type.is_none() || count.is_none() {
                debug!(key = %key, "ignoring badge progress entry");
            }
            Some((badge_type?, count?))
        })
        .collect()
}

/// File-backed state store
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `$XDG_DATA_HOME/verdant/state.json`, falling back to the working dir
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("verdant")
            .join("state.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state; missing or unreadable files yield the default state
    pub fn load(&self) -> PersistedState {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no persisted state yet");
            return PersistedState::default();
        }
        match fs::read_to_string(&self.path) {
            Ok(json) => PersistedState::from_json(&json),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read persisted state");
                PersistedState::default()
            }
        }
    }

    /// Write state via a temporary file and rename
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = state.to_json()?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedState {
        let mut state = PersistedState {
            profile: Profile::from_xp(260),
            ..Default::default()
        };
        state.achievements.union(vec!["first_task".to_string(), "night_owl".to_string()]);
        state.badges.union(vec!["tasks_1".to_string()]);
        state.badge_progress.insert(BadgeType::Tasks, 3);
        state
    }

    #[test]
    fn test_layout_keys() {
        let json = sample().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["user"]["xp"], 260);
        assert_eq!(value["user"]["level"], 3);
        assert_eq!(value["user"]["gardenStage"], "flower");
        assert_eq!(value["unlockedAchievements"][0], "first_task");
        assert_eq!(value["badgeProgress"]["tasks"], 3);
    }

    #[test]
    fn test_reload_matches() {
        let state = sample();
        assert_eq!(PersistedState::from_json(&state.to_json().unwrap()), state);
    }

    #[test]
    fn test_garbage_yields_default() {
        assert_eq!(PersistedState::from_json("{not json"), PersistedState::default());
        assert_eq!(PersistedState::from_json("[]"), PersistedState::default());
    }

    #[test]
    fn test_corrupt_slice_is_isolated() {
        let json = r#"{
            "schemaVersion": 1,
            "user": "oops",
            "unlockedAchievements": ["first_task", 42, null, ""],
            "unlockedBadges": {"tasks_1": true},
            "badgeProgress": {"tasks": 4, "unicorns": 1, "books": "many"}
        }"#;
        let state = PersistedState::from_json(json);
        assert_eq!(state.profile, Profile::default());
        assert_eq!(state.achievements.sorted(), vec!["first_task".to_string()]);
        assert!(state.badges.is_empty());
        assert_eq!(state.badge_progress.len(), 1);
        assert_eq!(state.badge_progress.get(&BadgeType::Tasks), Some(&4));
    }

    #[test]
    fn test_version_mismatch_still_loads_known_fields() {
        let json = r#"{"schemaVersion": 0, "user": {"xp": 150}, "unlockedBadges": ["tasks_1"]}"#;
        let state = PersistedState::from_json(json);
        assert_eq!(state.profile.level, 2);
        assert!(state.badges.contains("tasks_1"));
        assert!(state.achievements.is_empty());
    }

    #[test]
    fn test_stored_level_is_rederived() {
        let json = r#"{"schemaVersion": 1, "user": {"xp": 510, "level": 1, "gardenStage": "seed"}}"#;
        let state = PersistedState::from_json(json);
        assert_eq!(state.profile.level, 6);
        assert_eq!(state.profile.stage, GardenStage::Forest);
    }
}
