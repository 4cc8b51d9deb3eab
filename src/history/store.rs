// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::fs::read_to_string;
use std::fs::remove_file;
use std::fs::rename;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::history::HistoryError;
use crate::history::Year;
use crate::types::timestamp::Timestamp;

/// The set of references sent in each year.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryState {
    sent_by_year: BTreeMap<Year, BTreeSet<String>>,
}

impl HistoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_for(&self, year: Year) -> Option<&BTreeSet<String>> {
        self.sent_by_year.get(&year)
    }

    pub fn contains(&self, year: Year, reference: &str) -> bool {
        self.sent_by_year
            .get(&year)
            .is_some_and(|sent| sent.contains(reference))
    }

    /// Records a reference for a year. Returns false if it was already there.
    pub fn insert(&mut self, year: Year, reference: &str) -> bool {
        self.sent_by_year
            .entry(year)
            .or_default()
            .insert(reference.to_string())
    }

    /// Empties a year's sent-set, keeping the year itself. Returns false if
    /// the year has no entry.
    pub fn clear_year(&mut self, year: Year) -> bool {
        match self.sent_by_year.get_mut(&year) {
            Some(sent) => {
                sent.clear();
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        self.sent_by_year.clear();
    }

    /// Drops every year older than `cutoff`, returning the years removed.
    pub fn remove_years_before(&mut self, cutoff: Year) -> Vec<Year> {
        let removed: Vec<Year> = self
            .sent_by_year
            .keys()
            .copied()
            .filter(|year| *year < cutoff)
            .collect();
        for year in &removed {
            self.sent_by_year.remove(year);
        }
        removed
    }

    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.sent_by_year.keys().copied()
    }

    pub fn year_count(&self) -> usize {
        self.sent_by_year.len()
    }
}

/// On-disk shape, read side. Every field is optional so that the legacy flat
/// format can be told apart from a malformed file.
#[derive(Deserialize)]
pub(crate) struct HistoryDocument {
    #[serde(default)]
    pub sent_verses_by_year: Option<BTreeMap<Year, BTreeSet<String>>>,
    #[serde(default)]
    pub sent_verses: Option<Vec<String>>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// On-disk shape, write side.
#[derive(Serialize)]
struct HistoryDocumentRef<'a> {
    sent_verses_by_year: &'a BTreeMap<Year, BTreeSet<String>>,
    last_updated: Timestamp,
}

/// Durable storage for [`HistoryState`] in a single JSON file.
pub struct HistoryStore {
    path: PathBuf,
    /// Set when a legacy file could not be copied aside, so saving over it
    /// would lose it.
    keep_legacy: bool,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keep_legacy: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the history file. A missing file is an empty history. A legacy
    /// flat file is also an empty history, and is copied to `<name>.legacy`
    /// so that `migrate` can merge it later.
    pub fn load(&mut self) -> Result<HistoryState, HistoryError> {
        let content = match read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!(
                    "No history file at {}, starting fresh.",
                    self.path.display()
                );
                return Ok(HistoryState::new());
            }
            Err(e) => return Err(self.corrupt(e.to_string())),
        };
        let doc: HistoryDocument =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        match doc.sent_verses_by_year {
            Some(sent_by_year) => Ok(HistoryState { sent_by_year }),
            None => {
                if doc.sent_verses.is_some() {
                    self.set_legacy_aside(&content);
                }
                Ok(HistoryState::new())
            }
        }
    }

    fn set_legacy_aside(&mut self, content: &str) {
        let aside = legacy_path(&self.path);
        let result = match read_to_string(&aside) {
            Ok(existing) if existing == content => Ok(()),
            Ok(_) => Err(format!("{} already exists", aside.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                write_atomically(&aside, content.as_bytes()).map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => log::warn!(
                "{} uses the old flat history format; a copy is kept at {}. \
                 Run `dailyverse migrate` to merge it.",
                self.path.display(),
                aside.display()
            ),
            Err(e) => {
                log::error!(
                    "{} uses the old flat history format and cannot be copied aside ({e}); \
                     it will not be overwritten until `dailyverse migrate` has run.",
                    self.path.display()
                );
                self.keep_legacy = true;
            }
        }
    }

    /// Overwrites the history file. The content is written to a sibling
    /// temporary file first and renamed into place, so readers see either
    /// the old or the new file.
    pub fn save(&self, state: &HistoryState) -> Result<(), HistoryError> {
        if self.keep_legacy {
            return Err(self.persistence(
                "the file holds legacy history; run `dailyverse migrate`",
            ));
        }
        let doc = HistoryDocumentRef {
            sent_verses_by_year: &state.sent_by_year,
            last_updated: Timestamp::now(),
        };
        let json = serde_json::to_string_pretty(&doc).map_err(|e| self.persistence(e))?;
        write_atomically(&self.path, json.as_bytes()).map_err(|e| self.persistence(e))?;
        log::debug!("Verse history saved to {}.", self.path.display());
        Ok(())
    }

    fn corrupt(&self, reason: String) -> HistoryError {
        HistoryError::CorruptHistory {
            path: self.path.clone(),
            reason,
        }
    }

    fn persistence(&self, reason: impl ToString) -> HistoryError {
        HistoryError::Persistence {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// `path` with `suffix` appended to its file name.
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Where a legacy history file is kept until it is migrated.
pub(crate) fn legacy_path(path: &Path) -> PathBuf {
    sibling_path(path, ".legacy")
}

pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = sibling_path(path, ".tmp");
    let result = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()?;
        rename(&tmp_path, path)
    });
    if result.is_err() {
        let _ = remove_file(&tmp_path);
    }
    result
}
