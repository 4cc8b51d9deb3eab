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

use crate::app::App;
use crate::error::Fallible;
use crate::history::Year;
use crate::history::tracker::VerseHistoryTracker;
use crate::history::tracker::lock_tracker;

pub fn reset_year(app: &App, year: Option<Year>) -> Fallible<()> {
    let mut tracker = lock_tracker(&app.tracker);
    let year = year.unwrap_or_else(|| tracker.current_year());
    tracker.reset_year(year);
    ensure_saved(&tracker)?;
    println!("Reset verse history for {year}.");
    Ok(())
}

pub fn reset_all(app: &App) -> Fallible<()> {
    let mut tracker = lock_tracker(&app.tracker);
    tracker.reset_all();
    ensure_saved(&tracker)?;
    println!("Reset all verse history.");
    Ok(())
}

pub fn cleanup(app: &App, keep_years: u32) -> Fallible<()> {
    let mut tracker = lock_tracker(&app.tracker);
    let removed = tracker.cleanup_old_years(keep_years);
    ensure_saved(&tracker)?;
    if removed.is_empty() {
        println!("Nothing to clean up.");
    } else {
        let years: Vec<String> = removed.iter().map(Year::to_string).collect();
        println!("Removed history for {}.", years.join(", "));
    }
    Ok(())
}

/// The tracker keeps going when a save fails, but a one-shot command should
/// report it.
fn ensure_saved(tracker: &VerseHistoryTracker) -> Fallible<()> {
    match tracker.persistence_error() {
        Some(e) => Err(e.clone().into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use serde_json::Value;
    use tempfile::tempdir;

    use super::*;
    use crate::config::Settings;

    fn app_with_history(history: &str) -> Fallible<(tempfile::TempDir, App)> {
        let dir = tempdir()?;
        let path = dir.path().join("history.json");
        std::fs::write(&path, history)?;
        let mut settings = Settings::default();
        settings.storage.history_file = path;
        let app = App::new(settings)?;
        Ok((dir, app))
    }

    #[test]
    fn test_reset_given_year() -> Fallible<()> {
        let (dir, app) = app_with_history(
            r#"{"sent_verses_by_year": {"2023": ["John 3:16"], "2024": ["Psalm 23:1"]}}"#,
        )?;
        reset_year(&app, Some(2023))?;
        let saved: Value = serde_json::from_str(&read_to_string(dir.path().join("history.json"))?)?;
        assert_eq!(saved["sent_verses_by_year"]["2023"], serde_json::json!([]));
        assert_eq!(saved["sent_verses_by_year"]["2024"], serde_json::json!(["Psalm 23:1"]));
        Ok(())
    }

    #[test]
    fn test_reset_all() -> Fallible<()> {
        let (dir, app) = app_with_history(r#"{"sent_verses_by_year": {"2023": ["John 3:16"]}}"#)?;
        reset_all(&app)?;
        let saved: Value = serde_json::from_str(&read_to_string(dir.path().join("history.json"))?)?;
        assert_eq!(saved["sent_verses_by_year"], serde_json::json!({}));
        Ok(())
    }

    #[test]
    fn test_cleanup() -> Fallible<()> {
        let (_dir, app) = app_with_history(
            r#"{"sent_verses_by_year": {"1990": ["John 3:16"], "1991": ["Psalm 23:1"]}}"#,
        )?;
        cleanup(&app, 2)?;
        let tracker = lock_tracker(&app.tracker);
        assert!(tracker.all_years_stats().is_empty());
        Ok(())
    }
}
