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
use std::fs::copy;
use std::fs::read_to_string;
use std::fs::remove_file;
use std::fs::rename;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Fallible;
use crate::history::Year;
use crate::history::store::HistoryDocument;
use crate::history::store::legacy_path;
use crate::history::store::sibling_path;
use crate::history::store::write_atomically;
use crate::types::timestamp::Timestamp;

/// What [`migrate_legacy_history`] did.
#[derive(Debug, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// There is no history file.
    NoHistory,
    /// The file already uses the per-year layout.
    AlreadyMigrated,
    /// The legacy file lists no verses.
    NothingToMigrate,
    Migrated {
        year: Year,
        count: usize,
        backup: PathBuf,
    },
}

#[derive(Serialize)]
struct MigratedDocument {
    sent_verses_by_year: BTreeMap<Year, BTreeSet<String>>,
    last_updated: Timestamp,
}

/// Converts a flat `{"sent_verses": [...]}` history file into the per-year
/// layout. The verses are filed under the year of `last_updated`, or
/// `fallback_year` when that is missing or unparseable. The original file is
/// copied to `<name>.backup` before it is overwritten.
///
/// When the history file already uses the per-year layout but a legacy copy
/// was kept at `<name>.legacy` (because the tracker wrote new history before
/// migration), that copy is merged in and then moved to `<name>.backup`.
pub fn migrate_legacy_history(path: &Path, fallback_year: Year) -> Fallible<MigrationOutcome> {
    let content = match read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MigrationOutcome::NoHistory),
        Err(e) => return Err(e.into()),
    };
    let doc: HistoryDocument = serde_json::from_str(&content)?;
    let aside = legacy_path(path);
    match doc.sent_verses_by_year {
        None => {
            let verses: Vec<String> = doc.sent_verses.unwrap_or_default();
            if verses.is_empty() {
                return Ok(MigrationOutcome::NothingToMigrate);
            }
            let year = legacy_year(doc.last_updated.as_deref(), fallback_year);
            let backup = backup_path(path);
            copy(path, &backup)?;
            log::info!("Old history backed up to {}.", backup.display());
            let references: BTreeSet<String> = verses.into_iter().collect();
            let count = references.len();
            write_migrated(path, BTreeMap::from([(year, references)]))?;
            // The kept copy is the same legacy file, now backed up.
            if read_to_string(&aside).is_ok_and(|kept| kept == content) {
                remove_file(&aside)?;
            }
            log::info!("Migrated {count} verses to {year}.");
            Ok(MigrationOutcome::Migrated {
                year,
                count,
                backup,
            })
        }
        Some(mut sent_by_year) => {
            let kept = match read_to_string(&aside) {
                Ok(kept) => kept,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Ok(MigrationOutcome::AlreadyMigrated);
                }
                Err(e) => return Err(e.into()),
            };
            let legacy: HistoryDocument = serde_json::from_str(&kept)?;
            let references: BTreeSet<String> =
                legacy.sent_verses.unwrap_or_default().into_iter().collect();
            let backup = backup_path(path);
            if references.is_empty() {
                rename(&aside, &backup)?;
                return Ok(MigrationOutcome::NothingToMigrate);
            }
            let year = legacy_year(legacy.last_updated.as_deref(), fallback_year);
            let count = references.len();
            sent_by_year.entry(year).or_default().extend(references);
            write_migrated(path, sent_by_year)?;
            rename(&aside, &backup)?;
            log::info!(
                "Merged {count} legacy verses into {year}; the old file is at {}.",
                backup.display()
            );
            Ok(MigrationOutcome::Migrated {
                year,
                count,
                backup,
            })
        }
    }
}

fn legacy_year(last_updated: Option<&str>, fallback_year: Year) -> Year {
    match last_updated.map(Timestamp::parse) {
        Some(Ok(ts)) => ts.year(),
        Some(Err(e)) => {
            log::warn!("Cannot read last_updated ({e}), filing verses under {fallback_year}.");
            fallback_year
        }
        None => fallback_year,
    }
}

fn write_migrated(
    path: &Path,
    sent_verses_by_year: BTreeMap<Year, BTreeSet<String>>,
) -> Fallible<()> {
    let migrated = MigratedDocument {
        sent_verses_by_year,
        last_updated: Timestamp::now(),
    };
    let json = serde_json::to_string_pretty(&migrated)?;
    write_atomically(path, json.as_bytes())?;
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    sibling_path(path, ".backup")
}
