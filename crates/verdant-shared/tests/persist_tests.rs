//! Tests for the on-disk state store.

use std::fs;

use verdant_shared::badges::BadgeType;
use verdant_shared::persist::{PersistedState, StateStore};
use verdant_shared::{GardenStage, Profile};

#[test]
fn test_missing_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    assert_eq!(store.load(), PersistedState::default());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));

    let mut state = PersistedState {
        profile: Profile::from_xp(505),
        ..Default::default()
    };
    state.achievements.union(vec!["first_book".to_string()]);
    state.badges.union(vec!["books_1".to_string()]);
    state.badge_progress.insert(BadgeType::Books, 1);

    store.save(&state).unwrap();
    let loaded = store.load();
    assert_eq!(loaded, state);
    assert_eq!(loaded.profile.stage, GardenStage::Forest);
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    store.save(&PersistedState::default()).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["state.json".to_string()]);
}

#[test]
fn test_corrupt_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "\u{0}\u{0}garbage").unwrap();
    assert_eq!(StateStore::new(&path).load(), PersistedState::default());
}

#[test]
fn test_unknown_ids_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(
        &path,
        r#"{"schemaVersion": 1, "user": {"xp": 10}, "unlockedAchievements": ["retired_rule", "first_task"]}"#,
    )
    .unwrap();

    let state = StateStore::new(&path).load();
    assert!(state.achievements.contains("retired_rule"));
    assert!(state.achievements.contains("first_task"));
    assert_eq!(state.profile.xp, 10);
}

#[test]
fn test_future_schema_loads_known_slices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(
        &path,
        r#"{"schemaVersion": 7, "user": {"xp": 260}, "unlockedBadges": ["tasks_1"], "somethingNew": {}}"#,
    )
    .unwrap();

    let state = StateStore::new(&path).load();
    assert_eq!(state.profile.level, 3);
    assert!(state.badges.contains("tasks_1"));
}
