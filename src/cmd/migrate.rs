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

use std::path::Path;

use crate::error::Fallible;
use crate::history::Year;
use crate::history::migrate::MigrationOutcome;
use crate::history::migrate::migrate_legacy_history;

pub fn migrate_history(path: &Path, current_year: Year) -> Fallible<()> {
    let outcome = migrate_legacy_history(path, current_year)?;
    println!("{}", describe(path, &outcome));
    Ok(())
}

fn describe(path: &Path, outcome: &MigrationOutcome) -> String {
    match outcome {
        MigrationOutcome::NoHistory => {
            format!("No history file at {}, nothing to migrate.", path.display())
        }
        MigrationOutcome::AlreadyMigrated => {
            format!("{} already uses the per-year format.", path.display())
        }
        MigrationOutcome::NothingToMigrate => {
            format!("{} lists no sent verses, nothing to migrate.", path.display())
        }
        MigrationOutcome::Migrated {
            year,
            count,
            backup,
        } => format!(
            "Migrated {count} verses to {year}. Old file backed up to {}.",
            backup.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_describe() {
        let path = Path::new("data/verse_history.json");
        assert_eq!(
            describe(path, &MigrationOutcome::NoHistory),
            "No history file at data/verse_history.json, nothing to migrate."
        );
        let migrated = MigrationOutcome::Migrated {
            year: 2023,
            count: 4,
            backup: PathBuf::from("data/verse_history.json.backup"),
        };
        assert_eq!(
            describe(path, &migrated),
            "Migrated 4 verses to 2023. Old file backed up to data/verse_history.json.backup."
        );
    }
}
