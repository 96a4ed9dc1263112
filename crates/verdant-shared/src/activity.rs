//! Activity records consumed by the progression engine.
//!
//! These are read-only snapshots of the domain stores (tasks, habits, journal,
//! books, focus sessions, transactions). The engine never mutates them.
//! Every collection is optional: an absent collection is treated as empty.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;

/// A task from the task store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// Mark as completed at the given instant
    pub fn done_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed = true;
        self.completed_at = Some(at);
        self
    }
}

/// A tracked habit. Check-ins live in a separate map keyed by habit id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Check-in map: `habit_id -> { "YYYY-MM-DD" -> checked }`
pub type HabitCheckIns = BTreeMap<String, BTreeMap<String, bool>>;

/// A journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(default)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Free-form display date set by some editors. Not used for streaks.
    #[serde(default)]
    pub date: Option<String>,
    /// Mood rating 1..=5
    #[serde(default)]
    pub mood: Option<u8>,
}

impl JournalEntry {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            created_at,
            date: None,
            mood: None,
        }
    }

    /// Mood if it lies in the valid 1..=5 range
    pub fn valid_mood(&self) -> Option<u8> {
        self.mood.filter(|m| (1..=5).contains(m))
    }
}

/// Reading status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Reading,
    Finished,
    /// Any status the reading store adds later (wishlist, abandoned, ...)
    #[serde(other)]
    Other,
}

/// A book from the reading list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: BookStatus,
    /// Pages (or percent units) read so far
    #[serde(default, deserialize_with = "lenient_count")]
    pub progress: u32,
    /// Total pages
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u32,
    /// Plain date or full timestamp; anything else reads as unset
    #[serde(default, deserialize_with = "lenient_day")]
    pub finished_date: Option<NaiveDate>,
}

impl Book {
    pub fn is_finished(&self) -> bool {
        self.status == BookStatus::Finished
    }

    /// Progress clamped to the book length
    pub fn pages_read(&self) -> u32 {
        if self.total == 0 {
            self.progress
        } else {
            self.progress.min(self.total)
        }
    }
}

/// Kind of a pomodoro session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
    #[serde(other)]
    Other,
}

/// A finished pomodoro session from the focus history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    #[serde(default, rename = "type")]
    pub kind: SessionKind,
    /// Duration in minutes
    #[serde(default, deserialize_with = "lenient_count")]
    pub duration: u32,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PomodoroSession {
    pub fn work(duration: u32, completed_at: DateTime<Utc>) -> Self {
        Self {
            kind: SessionKind::Work,
            duration,
            completed_at: Some(completed_at),
        }
    }

    pub fn is_focus(&self) -> bool {
        self.kind == SessionKind::Work
    }
}

/// A finance transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Read-only view over every domain store.
///
/// `None` and `Some(vec![])` mean the same thing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStores {
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
    #[serde(default)]
    pub habits: Option<Vec<Habit>>,
    #[serde(default)]
    pub habit_check_ins: Option<HabitCheckIns>,
    #[serde(default)]
    pub journal: Option<Vec<JournalEntry>>,
    #[serde(default)]
    pub books: Option<Vec<Book>>,
    #[serde(default)]
    pub pomodoro_sessions: Option<Vec<PomodoroSession>>,
    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
}

impl ActivityStores {
    pub fn tasks(&self) -> &[Task] {
        self.tasks.as_deref().unwrap_or(&[])
    }

    pub fn habits(&self) -> &[Habit] {
        self.habits.as_deref().unwrap_or(&[])
    }

    /// Check-ins for one habit, if any were recorded
    pub fn check_ins_for(&self, habit_id: &str) -> Option<&BTreeMap<String, bool>> {
        self.habit_check_ins.as_ref().and_then(|m| m.get(habit_id))
    }

    pub fn journal(&self) -> &[JournalEntry] {
        self.journal.as_deref().unwrap_or(&[])
    }

    pub fn books(&self) -> &[Book] {
        self.books.as_deref().unwrap_or(&[])
    }

    pub fn pomodoro_sessions(&self) -> &[PomodoroSession] {
        self.pomodoro_sessions.as_deref().unwrap_or(&[])
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.transactions.as_deref().unwrap_or(&[])
    }

    /// Parse an activity export, keeping every well-formed record.
    ///
    /// Malformed records are skipped one by one instead of failing the whole
    /// collection, so a single bad entry never hides the rest of a store.
    pub fn from_json(json: &str) -> Result<Self> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        let obj = match root.as_object() {
            Some(obj) => obj,
            None => {
                warn!("activity export is not a JSON object, treating as empty");
                return Ok(Self::default());
            }
        };

        Ok(Self {
            tasks: parse_collection(obj.get("tasks"), "tasks"),
            habits: parse_collection(obj.get("habits"), "habits"),
            habit_check_ins: parse_check_ins(obj.get("habitCheckIns")),
            journal: parse_collection(obj.get("journal"), "journal"),
            books: parse_collection(obj.get("books"), "books"),
            pomodoro_sessions: parse_collection(obj.get("pomodoroSessions"), "pomodoroSessions"),
            transactions: parse_collection(obj.get("transactions"), "transactions"),
        })
    }

    /// Load an activity export from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }
}

fn parse_collection<T: DeserializeOwned>(
    value: Option<&serde_json::Value>,
    name: &str,
) -> Option<Vec<T>> {
    let items = value?.as_array()?;
    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(record) => records.push(record),
            Err(e) => warn!(collection = name, index = idx, error = %e, "skipping malformed record"),
        }
    }
    debug!(collection = name, count = records.len(), "loaded activity collection");
    Some(records)
}

/// Check-ins are kept cell by cell: a non-boolean day or a non-object habit
/// entry is dropped without touching its neighbours.
fn parse_check_ins(value: Option<&Value>) -> Option<HabitCheckIns> {
    let habits = match value? {
        Value::Object(habits) => habits,
        Value::Null => return None,
        other => {
            warn!(found = %json_kind(other), "habitCheckIns is not an object, ignoring");
            return None;
        }
    };

    let mut check_ins = HabitCheckIns::new();
    for (habit_id, days) in habits {
        let Some(days) = days.as_object() else {
            warn!(habit = %habit_id, "skipping malformed habit check-ins");
            continue;
        };
        let cells = days
            .iter()
            .filter_map(|(day, cell)| match cell.as_bool() {
                Some(done) => Some((day.clone(), done)),
                None => {
                    debug!(habit = %habit_id, day = %day, "ignoring non-boolean check-in");
                    None
                }
            })
            .collect();
        check_ins.insert(habit_id.clone(), cells);
    }
    Some(check_ins)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `YYYY-MM-DD` or an RFC 3339 timestamp (its UTC date). Anything else is `None`.
fn lenient_day<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(raw) = value.as_str().map(str::trim) else {
        if !value.is_null() {
            debug!(found = %json_kind(&value), "ignoring non-string date");
        }
        return Ok(None);
    };

    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|ts| ts.with_timezone(&Utc).date_naive())
        });
    if day.is_none() {
        debug!(value = raw, "ignoring unparseable date");
    }
    Ok(day)
}

/// Non-negative count. Fractions truncate, negatives and junk read as 0,
/// values past `u32::MAX` saturate.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match &value {
        Value::Number(n) => n.as_u64().map_or_else(
            || n.as_f64().map_or(0, |f| f as u32),
            |v| u32::try_from(v).unwrap_or(u32::MAX),
        ),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, |f| f as u32),
        Value::Null => 0,
        other => {
            debug!(found = %json_kind(other), "ignoring non-numeric count");
            0
        }
    };
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_collections_are_empty() {
        let stores = ActivityStores::default();
        assert!(stores.tasks().is_empty());
        assert!(stores.journal().is_empty());
        assert!(stores.check_ins_for("water").is_none());
    }

    #[test]
    fn test_from_json_camel_case() {
        let json = r#"{
            "tasks": [{"id": "t1", "completed": true, "completedAt": "2024-03-01T09:00:00Z"}],
            "habits": [{"id": "water", "name": "Drink water"}],
            "habitCheckIns": {"water": {"2024-03-01": true}},
            "journal": [{"createdAt": "2024-03-01T20:00:00Z", "mood": 4}],
            "books": [{"status": "finished", "progress": 300, "total": 300}],
            "pomodoroSessions": [{"type": "work", "duration": 25, "completedAt": "2024-03-01T10:00:00Z"}],
            "transactions": [{"amount": 12.5, "createdAt": "2024-03-01T12:00:00Z"}]
        }"#;
        let stores = ActivityStores::from_json(json).unwrap();
        assert_eq!(stores.tasks().len(), 1);
        assert!(stores.tasks()[0].completed);
        assert_eq!(stores.habits()[0].id, "water");
        assert_eq!(stores.check_ins_for("water").unwrap().get("2024-03-01"), Some(&true));
        assert_eq!(stores.journal()[0].valid_mood(), Some(4));
        assert!(stores.books()[0].is_finished());
        assert!(stores.pomodoro_sessions()[0].is_focus());
        assert_eq!(stores.transactions().len(), 1);
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let json = r#"{
            "journal": [
                {"createdAt": "not a date"},
                {"createdAt": "2024-03-01T20:00:00Z"}
            ]
        }"#;
        let stores = ActivityStores::from_json(json).unwrap();
        assert_eq!(stores.journal().len(), 1);
    }

    #[test]
    fn test_book_with_timestamp_finished_date_counts() {
        let json = r#"{
            "books": [
                {"id": "b1", "status": "finished", "progress": 320, "total": 320,
                 "finishedDate": "2024-03-01T10:00:00.000Z"},
                {"id": "b2", "status": "finished", "finishedDate": "2024-02-10"},
                {"id": "b3", "status": "finished", "finishedDate": "sometime"}
            ]
        }"#;
        let stores = ActivityStores::from_json(json).unwrap();
        assert_eq!(stores.books().len(), 3);
        assert_eq!(stores.books()[0].finished_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(stores.books()[1].finished_date, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert_eq!(stores.books()[2].finished_date, None);

        let clock = crate::stats::DayClock::utc(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        let snapshot = crate::stats::build_snapshot(&stores, &crate::xp::Profile::default(), &clock);
        assert_eq!(snapshot.books_finished, 3);
        assert_eq!(snapshot.pages_read, 320);
    }

    #[test]
    fn test_fractional_and_junk_counts() {
        let json = r#"{
            "books": [
                {"status": "reading", "progress": 42.7, "total": 300.0},
                {"status": "reading", "progress": -5, "total": "250"},
                {"status": "reading", "progress": true, "total": null}
            ],
            "pomodoroSessions": [{"type": "work", "duration": 24.9}]
        }"#;
        let stores = ActivityStores::from_json(json).unwrap();
        let books = stores.books();
        assert_eq!(books.len(), 3);
        assert_eq!((books[0].progress, books[0].total), (42, 300));
        assert_eq!((books[1].progress, books[1].total), (0, 250));
        assert_eq!((books[2].progress, books[2].total), (0, 0));
        assert_eq!(stores.pomodoro_sessions()[0].duration, 24);
    }

    #[test]
    fn test_bad_check_in_cell_keeps_the_rest() {
        let json = r#"{
            "habits": [{"id": "water", "name": "Water"}, {"id": "walk", "name": "Walk"}],
            "habitCheckIns": {
                "water": {"2024-03-03": true, "2024-03-04": true},
                "walk": {"2024-03-03": true, "2024-03-04": true, "2024-03-05": null},
                "stretch": "daily"
            }
        }"#;
        let stores = ActivityStores::from_json(json).unwrap();
        let walk = stores.check_ins_for("walk").unwrap();
        assert_eq!(walk.len(), 2);
        assert_eq!(walk.get("2024-03-05"), None);
        assert_eq!(stores.check_ins_for("water").unwrap().len(), 2);
        assert!(stores.check_ins_for("stretch").is_none());

        let check_ins = stores.habit_check_ins.as_ref().unwrap();
        let reference = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(crate::streaks::all_habits_streak(check_ins, &["water", "walk"], reference), 2);
    }

    #[test]
    fn test_non_object_check_ins_ignored() {
        let stores = ActivityStores::from_json(r#"{"habitCheckIns": [true]}"#).unwrap();
        assert!(stores.habit_check_ins.is_none());
    }

    #[test]
    fn test_unknown_statuses() {
        let json = r#"{
            "books": [{"status": "wishlist"}],
            "pomodoroSessions": [{"type": "stretch", "duration": 5}, {"type": "shortBreak", "duration": 5}]
        }"#;
        let stores = ActivityStores::from_json(json).unwrap();
        assert_eq!(stores.books()[0].status, BookStatus::Other);
        assert_eq!(stores.pomodoro_sessions()[0].kind, SessionKind::Other);
        assert_eq!(stores.pomodoro_sessions()[1].kind, SessionKind::ShortBreak);
    }

    #[test]
    fn test_invalid_mood_ignored() {
        let mut entry = JournalEntry::new(Utc::now());
        entry.mood = Some(9);
        assert_eq!(entry.valid_mood(), None);
    }

    #[test]
    fn test_pages_read_clamped() {
        let book = Book {
            progress: 420,
            total: 300,
            ..Default::default()
        };
        assert_eq!(book.pages_read(), 300);
    }

    #[test]
    fn test_non_object_export() {
        let stores = ActivityStores::from_json("[1, 2, 3]").unwrap();
        assert!(stores.tasks.is_none());
    }
}
