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

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Write;

use clap::ValueEnum;

use crate::app::App;
use crate::error::Fallible;
use crate::history::Year;
use crate::history::tracker::VerseHistoryTracker;
use crate::history::tracker::YearStats;
use crate::history::tracker::lock_tracker;

/// How many unsent references the text report lists.
const REMAINING_PREVIEW: usize = 10;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsFormat {
    /// Human-readable output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_year_stats(app: &App, year: Option<Year>, format: StatsFormat) -> Fallible<()> {
    let tracker = lock_tracker(&app.tracker);
    let year = year.unwrap_or_else(|| tracker.current_year());
    print!("{}", render_year_stats(&tracker, year, format)?);
    Ok(())
}

pub fn print_all_years(app: &App, format: StatsFormat) -> Fallible<()> {
    let tracker = lock_tracker(&app.tracker);
    print!("{}", render_all_years(&tracker, format)?);
    Ok(())
}

fn render_year_stats(
    tracker: &VerseHistoryTracker,
    year: Year,
    format: StatsFormat,
) -> Fallible<String> {
    let stats = tracker.stats(year);
    if format == StatsFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&stats)?));
    }
    let mut out = String::new();
    let _ = writeln!(out, "Verse statistics for {year}");
    let _ = writeln!(out, "  Total verses: {}", stats.total);
    let _ = writeln!(out, "  Sent:         {}", stats.used);
    let _ = writeln!(out, "  Remaining:    {}", stats.unused);
    let _ = writeln!(out, "  Complete:     {:.1}%", stats.completion_percent);
    if stats.recorded > stats.used {
        let _ = writeln!(
            out,
            "  ({} recorded references are no longer in the verse pool.)",
            stats.recorded - stats.used
        );
    }
    let sent = tracker.sent_for_year(year);
    if !sent.is_empty() {
        let _ = writeln!(out, "\nSent in {year}:");
        for reference in sent {
            let _ = writeln!(out, "  - {reference}");
        }
    }
    let unused = tracker.unused_for_year(year);
    if !unused.is_empty() {
        if unused.len() > REMAINING_PREVIEW {
            let _ = writeln!(
                out,
                "\nRemaining (first {REMAINING_PREVIEW} of {}):",
                unused.len()
            );
        } else {
            let _ = writeln!(out, "\nRemaining:");
        }
        for verse in unused.iter().take(REMAINING_PREVIEW) {
            let _ = writeln!(out, "  - {}", verse.reference());
        }
    }
    Ok(out)
}

fn render_all_years(tracker: &VerseHistoryTracker, format: StatsFormat) -> Fallible<String> {
    let years: Vec<YearStats> = tracker.all_years_stats().into_values().rev().collect();
    if format == StatsFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&years)?));
    }
    if years.is_empty() {
        return Ok("No verse history yet.\n".to_string());
    }
    let mut out = String::new();
    for stats in years {
        let _ = writeln!(
            out,
            "{}: {}/{} sent ({:.1}%), {} remaining",
            stats.year, stats.used, stats.total, stats.completion_percent, stats.unused
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use tempfile::tempdir;

    use super::*;
    use crate::helper::sample_pool;
    use crate::history::store::HistoryStore;

    fn tracker_with_history() -> Fallible<(tempfile::TempDir, VerseHistoryTracker)> {
        let dir = tempdir()?;
        let store = HistoryStore::new(dir.path().join("history.json"));
        let mut tracker = VerseHistoryTracker::open(store).with_clock(|| 2025);
        let pool = sample_pool(12);
        tracker.set_available_verses(pool.clone());
        tracker.mark_sent(&pool[0], 2024);
        tracker.mark_sent(&pool[0], 2025);
        tracker.mark_sent(&pool[1], 2025);
        Ok((dir, tracker))
    }

    #[test]
    fn test_text_report() -> Fallible<()> {
        let (_dir, tracker) = tracker_with_history()?;
        let text = render_year_stats(&tracker, 2025, StatsFormat::Text)?;
        assert!(text.starts_with("Verse statistics for 2025\n"));
        assert!(text.contains("Sent:         2\n"));
        assert!(text.contains("Remaining:    10\n"));
        assert!(text.contains("Complete:     16.7%"));
        assert!(text.contains("  - Proverbs 3:1\n"));
        assert!(text.contains("\nRemaining:\n"));
        assert!(text.contains("  - Proverbs 3:12\n"));
        assert_eq!(text.matches("  - ").count(), 12);
        Ok(())
    }

    #[test]
    fn test_remaining_is_truncated() -> Fallible<()> {
        let (_dir, tracker) = tracker_with_history()?;
        let text = render_year_stats(&tracker, 2023, StatsFormat::Text)?;
        assert!(text.contains("Remaining (first 10 of 12):"));
        assert_eq!(text.matches("  - ").count(), 10);
        Ok(())
    }

    #[test]
    fn test_json_report() -> Fallible<()> {
        let (_dir, tracker) = tracker_with_history()?;
        let rendered = render_year_stats(&tracker, 2025, StatsFormat::Json)?;
        let json: Value = serde_json::from_str(&rendered)?;
        assert_eq!(json["year"], 2025);
        assert_eq!(json["used"], 2);
        assert_eq!(json["unused"], 10);
        Ok(())
    }

    #[test]
    fn test_all_years_newest_first() -> Fallible<()> {
        let (_dir, tracker) = tracker_with_history()?;
        let text = render_all_years(&tracker, StatsFormat::Text)?;
        assert_eq!(
            text,
            "2025: 2/12 sent (16.7%), 10 remaining\n2024: 1/12 sent (8.3%), 11 remaining\n"
        );
        let json: Value = serde_json::from_str(&render_all_years(&tracker, StatsFormat::Json)?)?;
        assert_eq!(json[0]["year"], 2025);
        assert_eq!(json[1]["year"], 2024);
        Ok(())
    }
}
