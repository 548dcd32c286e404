use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version tag written into every persisted ledger
pub const LEDGER_SCHEMA_VERSION: u32 = 1;

/// Usage recorded for one identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerEntry {
    /// Successful requests on `day`
    pub count: u32,
    /// Calendar date on which `count` accrued
    pub day: NaiveDate,
}

impl LedgerEntry {
    /// Fresh entry with no usage
    pub fn new(day: NaiveDate) -> Self {
        LedgerEntry { count: 0, day }
    }

    /// Whether this entry belongs to `today`
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.day == today
    }

    /// Usage that counts against `today`. Stale entries count as zero.
    pub fn count_on(&self, today: NaiveDate) -> u32 {
        if self.is_current(today) {
            self.count
        } else {
            0
        }
    }
}

/// Mapping from identity to its daily usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &str) -> Option<&LedgerEntry> {
        self.entries.get(identity)
    }

    /// Usage of `identity` on `today`
    pub fn count_on(&self, identity: &str, today: NaiveDate) -> u32 {
        self.entries
            .get(identity)
            .map(|entry| entry.count_on(today))
            .unwrap_or(0)
    }

    /// Record one successful request and return the new count.
    ///
    /// An entry from an earlier day is replaced, not merged.
    pub fn record(&mut self, identity: &str, today: NaiveDate) -> u32 {
        let entry = self
            .entries
            .entry(identity.to_string())
            .or_insert_with(|| LedgerEntry::new(today));

        if !entry.is_current(today) {
            *entry = LedgerEntry::new(today);
        }

        entry.count = entry.count.saturating_add(1);
        entry.count
    }

    /// Insert an entry verbatim
    pub fn insert(&mut self, identity: impl Into<String>, entry: LedgerEntry) {
        self.entries.insert(identity.into(), entry);
    }

    /// Drop every entry not dated `today`. Returns how many were removed.
    pub fn prune(&mut self, today: NaiveDate) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_current(today));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// On-disk representation of a ledger
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LedgerFile {
    pub version: u32,
    pub entries: BTreeMap<String, LedgerEntry>,
}

impl From<&Ledger> for LedgerFile {
    fn from(ledger: &Ledger) -> Self {
        LedgerFile {
            version: LEDGER_SCHEMA_VERSION,
            entries: ledger.entries.clone(),
        }
    }
}

impl From<LedgerFile> for Ledger {
    fn from(file: LedgerFile) -> Self {
        Ledger {
            entries: file.entries,
        }
    }
}
