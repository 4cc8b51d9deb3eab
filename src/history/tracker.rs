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
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use chrono::Datelike;
use chrono::Local;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::history::HistoryError;
use crate::history::Year;
use crate::history::store::HistoryState;
use crate::history::store::HistoryStore;
use crate::types::verse::VerseRecord;

/// A tracker shared between the scheduler and the HTTP trigger. Selection
/// and marking happen under one lock.
pub type SharedTracker = Arc<Mutex<VerseHistoryTracker>>;

/// Locks a shared tracker. A panic while the lock was held leaves the
/// in-memory state consistent (every mutation is a single set operation), so
/// a poisoned lock is recovered.
pub fn lock_tracker(tracker: &SharedTracker) -> MutexGuard<'_, VerseHistoryTracker> {
    tracker.lock().unwrap_or_else(|e| e.into_inner())
}

type Clock = Box<dyn Fn() -> Year + Send>;

/// Picks verses that have not been sent yet this year and records every
/// pick. When a year has used up the whole pool, that year starts over.
pub struct VerseHistoryTracker {
    store: HistoryStore,
    state: HistoryState,
    pool: Vec<VerseRecord>,
    clock: Clock,
    rng: StdRng,
    persistence_error: Option<HistoryError>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearStats {
    pub year: Year,
    /// Number of distinct verses in the pool.
    pub total: usize,
    /// Pool verses already sent this year.
    pub used: usize,
    pub unused: usize,
    /// References recorded for the year, including ones no longer in the
    /// pool.
    pub recorded: usize,
    pub completion_percent: f64,
}

impl VerseHistoryTracker {
    /// Loads history from the store. Unreadable history is logged and
    /// replaced by an empty one.
    pub fn open(mut store: HistoryStore) -> Self {
        let state = match store.load() {
            Ok(state) => {
                log::info!("Loaded verse history for {} years.", state.year_count());
                state
            }
            Err(e) => {
                log::warn!("{e}; starting with an empty history.");
                HistoryState::new()
            }
        };
        Self {
            store,
            state,
            pool: Vec::new(),
            clock: Box::new(|| Local::now().year()),
            rng: StdRng::from_entropy(),
            persistence_error: None,
        }
    }

    /// Replaces the source of [`VerseHistoryTracker::current_year`].
    pub fn with_clock(mut self, clock: impl Fn() -> Year + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[cfg(test)]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replaces the pool of candidate verses. The first record wins when a
    /// reference appears more than once.
    pub fn set_available_verses(&mut self, verses: Vec<VerseRecord>) {
        let mut seen: HashSet<String> = HashSet::new();
        let mut pool: Vec<VerseRecord> = Vec::with_capacity(verses.len());
        for verse in verses {
            if seen.insert(verse.reference().to_string()) {
                pool.push(verse);
            } else {
                log::warn!("Ignoring duplicate verse {}.", verse.reference());
            }
        }
        log::info!("Set {} available verses.", pool.len());
        self.pool = pool;
    }

    pub fn pool(&self) -> &[VerseRecord] {
        &self.pool
    }

    pub fn current_year(&self) -> Year {
        (self.clock)()
    }

    /// The pool minus the verses already sent in `year`, in pool order.
    pub fn unused_for_year(&self, year: Year) -> Vec<&VerseRecord> {
        self.pool
            .iter()
            .filter(|verse| !self.state.contains(year, verse.reference()))
            .collect()
    }

    /// The references sent in `year`, sorted.
    pub fn sent_for_year(&self, year: Year) -> Vec<&str> {
        match self.state.sent_for(year) {
            Some(sent) => sent.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// Selects a random verse not yet sent in `year` and marks it sent before
    /// returning it.
    pub fn select_next(&mut self, year: Year) -> Result<VerseRecord, HistoryError> {
        if self.pool.is_empty() {
            return Err(HistoryError::NoVerseAvailable);
        }
        let mut unused: Vec<usize> = self.unused_indices(year);
        if unused.is_empty() {
            log::info!("All verses have been used for {year}, starting the year over.");
            self.reset_year(year);
            unused = (0..self.pool.len()).collect();
        }
        log::debug!(
            "{} of {} verses unused for {year}.",
            unused.len(),
            self.pool.len()
        );
        let index: usize = *unused
            .choose(&mut self.rng)
            .ok_or(HistoryError::NoVerseAvailable)?;
        let verse = self.pool[index].clone();
        self.mark_sent(&verse, year);
        Ok(verse)
    }

    /// Records a verse as sent in `year`. Marking the same verse twice is a
    /// no-op.
    pub fn mark_sent(&mut self, verse: &VerseRecord, year: Year) {
        if self.state.insert(year, verse.reference()) {
            self.persist();
            log::info!("Marked {} as sent for {year}.", verse.reference());
        } else {
            log::debug!("{} was already marked for {year}.", verse.reference());
        }
    }

    pub fn reset_year(&mut self, year: Year) {
        if self.state.clear_year(year) {
            self.persist();
            log::info!("Verse history reset for {year}.");
        } else {
            log::debug!("No verse history for {year}, nothing to reset.");
        }
    }

    pub fn reset_all(&mut self) {
        self.state.clear_all();
        self.persist();
        log::info!("All verse history reset.");
    }

    pub fn stats(&self, year: Year) -> YearStats {
        let total = self.pool.len();
        let used = self
            .pool
            .iter()
            .filter(|verse| self.state.contains(year, verse.reference()))
            .count();
        let recorded = self.state.sent_for(year).map_or(0, |sent| sent.len());
        let completion_percent = if total == 0 {
            0.0
        } else {
            used as f64 * 100.0 / total as f64
        };
        YearStats {
            year,
            total,
            used,
            unused: total - used,
            recorded,
            completion_percent,
        }
    }

    /// Stats for every year that has history, whether or not it overlaps the
    /// current pool.
    pub fn all_years_stats(&self) -> BTreeMap<Year, YearStats> {
        self.state
            .years()
            .map(|year| (year, self.stats(year)))
            .collect()
    }

    /// Forgets every year older than `keep_years` before the current one.
    pub fn cleanup_old_years(&mut self, keep_years: u32) -> Vec<Year> {
        let cutoff = self.current_year().saturating_sub_unsigned(keep_years);
        let removed = self.state.remove_years_before(cutoff);
        for year in &removed {
            log::info!("Removed history for {year}.");
        }
        if !removed.is_empty() {
            self.persist();
        }
        removed
    }

    /// The last save failure, if the most recent save did not succeed.
    pub fn persistence_error(&self) -> Option<&HistoryError> {
        self.persistence_error.as_ref()
    }

    fn unused_indices(&self, year: Year) -> Vec<usize> {
        self.pool
            .iter()
            .enumerate()
            .filter(|(_, verse)| !self.state.contains(year, verse.reference()))
            .map(|(index, _)| index)
            .collect()
    }

    fn persist(&mut self) {
        match self.store.save(&self.state) {
            Ok(()) => self.persistence_error = None,
            Err(e) => {
                log::error!("{e}; continuing with in-memory history.");
                self.persistence_error = Some(e);
            }
        }
    }
}
