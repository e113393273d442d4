use crate::error::StorageError;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike};
use std::fmt;
use tracing::{debug, warn};

/// Storage key holding the whole history as a JSON array of strings
pub const RECORDS_KEY: &str = "typingGameRecords";

const TIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Summary of one finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    score: u32,
    timestamp: DateTime<Local>,
}

impl RecordEntry {
    /// Sub-second precision is dropped; the persisted text only carries whole seconds.
    pub fn new(score: u32, timestamp: DateTime<Local>) -> Self {
        Self {
            score,
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
        }
    }

    pub fn now(score: u32) -> Self {
        Self::new(score, Local::now())
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// `Score: <n>, Time: <date-time>`
    pub fn to_record_string(&self) -> String {
        format!(
            "Score: {}, Time: {}",
            self.score,
            self.timestamp.format(TIME_FORMAT)
        )
    }

    /// The stored text carries no UTC offset. A time inside the repeated hour
    /// of a DST fall-back resolves to the earlier instant, so only the text
    /// round-trips there, not the instant.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("Score: ")?;
        let (score, time) = rest.split_once(", Time: ")?;
        let score = score.trim().parse::<u32>().ok()?;
        let naive = NaiveDateTime::parse_from_str(time.trim(), TIME_FORMAT).ok()?;
        let timestamp = Local.from_local_datetime(&naive).earliest()?;
        Some(Self { score, timestamp })
    }
}

impl fmt::Display for RecordEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_record_string())
    }
}

/// History in insertion order, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordLog {
    entries: Vec<RecordEntry>,
}

impl RecordLog {
    pub fn entries(&self) -> &[RecordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&RecordEntry> {
        self.entries.last()
    }

    pub fn best_score(&self) -> Option<u32> {
        self.entries.iter().map(RecordEntry::score).max()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordEntry> {
        self.entries.iter()
    }
}

impl From<Vec<RecordEntry>> for RecordLog {
    fn from(entries: Vec<RecordEntry>) -> Self {
        Self { entries }
    }
}

/// Append-only score history on top of a key/value store.
///
/// Every append rewrites the complete list. There is no deletion and no size cap.
#[derive(Debug)]
pub struct RecordStore<S> {
    storage: S,
}

impl<S: KeyValueStore> RecordStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Stored strings as-is. Missing or malformed data reads as empty.
    fn read_raw(&self) -> Vec<String> {
        match self.storage.get(RECORDS_KEY) {
            Ok(Some(value)) => serde_json::from_str::<Vec<String>>(&value).unwrap_or_else(|err| {
                debug!(error = %err, "stored records are malformed, treating as empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "could not read stored records");
                Vec::new()
            }
        }
    }

    /// Read the full history, add `entry`, write the full history back.
    /// Stored strings that are not records are kept untouched.
    pub fn append(&mut self, entry: &RecordEntry) -> Result<(), StorageError> {
        let mut raw = self.read_raw();
        raw.push(entry.to_record_string());
        let value = serde_json::to_string(&raw)?;
        self.storage.set(RECORDS_KEY, &value)
    }

    pub fn load_all(&self) -> RecordLog {
        let entries = self
            .read_raw()
            .iter()
            .filter_map(|raw| {
                let entry = RecordEntry::parse(raw);
                if entry.is_none() {
                    debug!(record = %raw, "skipping unrecognized record");
                }
                entry
            })
            .collect::<Vec<_>>();
        RecordLog::from(entries)
    }
}
