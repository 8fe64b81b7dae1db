//! The devotions journal.
//!
//! Three kinds of entries live in the key-value store:
//!
//! - a mood per calendar day (`devotions-mood-YYYY-MM-DD`)
//! - free vent text per calendar day (`devotions-vent-YYYY-MM-DD`)
//! - a prayer and reflection per Psalm (`devotions-psalm-N`), independent of the
//!   day it was written on
//!
//! Journal operations never fail from the caller's point of view. A store that
//! cannot be read yields defaults, a store that cannot be written drops the
//! write, and both are logged. A stored value that doesn't parse is treated as
//! absent.

use crate::calendar::{DateKey, PsalmIndex};
use crate::constants::{JOURNAL_DAYS_BACK, MOOD_KEY_PREFIX, PSALM_KEY_PREFIX, VENT_KEY_PREFIX};
use crate::store::KeyValueStore;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// How the user is feeling on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Mania,
    Mixed,
    Depressive,
    Baseline,
    NotSure,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Mania,
        Mood::Mixed,
        Mood::Depressive,
        Mood::Baseline,
        Mood::NotSure,
    ];

    /// The stored form of the mood.
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Mania => "mania",
            Mood::Mixed => "mixed",
            Mood::Depressive => "depressive",
            Mood::Baseline => "baseline",
            Mood::NotSure => "not_sure",
        }
    }

    /// How the mood is shown in the journal.
    pub fn label(self) -> &'static str {
        match self {
            Mood::Mania => "MANIA",
            Mood::Mixed => "MIXED",
            Mood::Depressive => "DEPRESSIVE",
            Mood::Baseline => "I'm doing okay",
            Mood::NotSure => "Not sure",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mood string outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood '{0}' (expected one of: mania, mixed, depressive, baseline, not_sure)")]
pub struct ParseMoodError(String);

impl FromStr for Mood {
    type Err = ParseMoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == s)
            .ok_or_else(|| ParseMoodError(s.to_string()))
    }
}

/// Prayer and reflection written against one Psalm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsalmResponse {
    pub prayer: String,
    pub reflection: String,
}

impl PsalmResponse {
    pub fn is_empty(&self) -> bool {
        self.prayer.trim().is_empty() && self.reflection.trim().is_empty()
    }
}

/// Everything recorded for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub date: DateKey,
    pub mood: Option<Mood>,
    pub vent: String,
}

impl JournalEntry {
    pub fn has_vent(&self) -> bool {
        !self.vent.trim().is_empty()
    }
}

/// Storage key for the mood on `date`.
pub fn mood_key(date: DateKey) -> String {
    format!("{}{}", MOOD_KEY_PREFIX, date)
}

/// Storage key for the vent text on `date`.
pub fn vent_key(date: DateKey) -> String {
    format!("{}{}", VENT_KEY_PREFIX, date)
}

/// Storage key for the response to `psalm`.
pub fn psalm_key(psalm: PsalmIndex) -> String {
    format!("{}{}", PSALM_KEY_PREFIX, psalm)
}

/// Journal operations over any key-value store.
///
/// ```
/// use devotions::calendar::DateKey;
/// use devotions::journal::{Journal, Mood};
/// use devotions::store::MemoryStore;
/// use chrono::NaiveDate;
///
/// let journal = Journal::new(MemoryStore::new());
/// let day = DateKey::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
///
/// journal.set_mood(day, Mood::Baseline);
/// assert_eq!(journal.get_mood(day), Some(Mood::Baseline));
/// assert_eq!(journal.get_vent(day), "");
/// ```
pub struct Journal<S> {
    store: S,
    lookback_days: u32,
}

impl<S: KeyValueStore> Journal<S> {
    pub fn new(store: S) -> Self {
        Self::with_lookback(store, JOURNAL_DAYS_BACK)
    }

    /// A journal whose listing and streak look back `lookback_days` before today.
    pub fn with_lookback(store: S, lookback_days: u32) -> Self {
        Journal {
            store,
            lookback_days,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Reading {} failed, using default: {}", key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        debug!("Saving {}", key);
        if let Err(e) = self.store.set(key, value) {
            warn!("Saving {} failed, nothing saved: {}", key, e);
        }
    }

    pub fn set_mood(&self, date: DateKey, mood: Mood) {
        self.write(&mood_key(date), mood.as_str());
    }

    /// The mood recorded for `date`. Unknown stored values read as `None`.
    pub fn get_mood(&self, date: DateKey) -> Option<Mood> {
        self.read(&mood_key(date))
            .and_then(|raw| raw.parse().ok())
    }

    pub fn set_vent(&self, date: DateKey, text: &str) {
        self.write(&vent_key(date), text);
    }

    pub fn get_vent(&self, date: DateKey) -> String {
        self.read(&vent_key(date)).unwrap_or_default()
    }

    pub fn set_psalm_response(&self, psalm: PsalmIndex, response: &PsalmResponse) {
        match serde_json::to_string(response) {
            Ok(json) => self.write(&psalm_key(psalm), &json),
            Err(e) => warn!("Encoding response for Psalm {} failed: {}", psalm, e),
        }
    }

    /// The saved response for `psalm`, or empty strings.
    pub fn get_psalm_response(&self, psalm: PsalmIndex) -> PsalmResponse {
        let Some(raw) = self.read(&psalm_key(psalm)) else {
            return PsalmResponse::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Stored response for Psalm {} is unreadable: {}", psalm, e);
            PsalmResponse::default()
        })
    }

    /// A day counts as journaled if it has a mood or a non-blank vent.
    pub fn has_entry(&self, date: DateKey) -> bool {
        self.get_mood(date).is_some() || !self.get_vent(date).trim().is_empty()
    }

    pub fn entry_for(&self, date: DateKey) -> JournalEntry {
        JournalEntry {
            date,
            mood: self.get_mood(date),
            vent: self.get_vent(date),
        }
    }

    /// Days from `today` back through the lookback window, newest first.
    fn window(&self, today: NaiveDate) -> impl Iterator<Item = DateKey> {
        (0..=i64::from(self.lookback_days))
            .map_while(move |days_back| today.checked_sub_signed(Duration::days(days_back)))
            .map(DateKey::new)
    }

    /// Every journaled day in `[today - lookback, today]`, most recent first.
    pub fn list_entry_dates(&self, today: NaiveDate) -> Vec<DateKey> {
        let mut dates: Vec<DateKey> = self.window(today).filter(|d| self.has_entry(*d)).collect();
        dates.sort_by(|a, b| b.cmp(a));
        dates
    }

    /// The journaled days with their contents, most recent first.
    pub fn entries(&self, today: NaiveDate) -> Vec<JournalEntry> {
        self.window(today)
            .map(|date| self.entry_for(date))
            .filter(|entry| entry.mood.is_some() || entry.has_vent())
            .collect()
    }

    /// Consecutive journaled days ending today. Zero when today has no entry.
    pub fn streak(&self, today: NaiveDate) -> u32 {
        self.window(today)
            .take_while(|date| self.has_entry(*date))
            .count() as u32
    }
}
