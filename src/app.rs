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

use std::fs::create_dir_all;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Instant;

use crate::bot::VerseBot;
use crate::config::Settings;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::history::store::HistoryStore;
use crate::history::tracker::SharedTracker;
use crate::history::tracker::VerseHistoryTracker;
use crate::scheduler::Zone;
use crate::source::VerseSource;
use crate::telegram::client::TelegramClient;

/// Everything a command needs: settings, the history tracker with its pool,
/// and the verse source.
pub struct App {
    pub settings: Settings,
    pub zone: Zone,
    pub tracker: SharedTracker,
    source: VerseSource,
}

impl App {
    pub fn new(settings: Settings) -> Fallible<Self> {
        let zone = settings.daily_schedule()?.zone();

        let history_file = &settings.storage.history_file;
        if let Some(parent) = history_file.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent).map_err(|e| {
                    ErrorReport::new(&format!("cannot create {}: {e}", parent.display()))
                })?;
            }
        }

        let source = {
            log::debug!("Loading verses...");
            let start = Instant::now();
            let source = VerseSource::from_settings(&settings)?;
            let duration = start.elapsed().as_millis();
            log::debug!("Verses loaded in {duration}ms.");
            source
        };

        let mut tracker = VerseHistoryTracker::open(HistoryStore::new(history_file.clone()))
            .with_clock(move || zone.current_year());
        tracker.set_available_verses(source.pool());

        Ok(Self {
            settings,
            zone,
            tracker: Arc::new(Mutex::new(tracker)),
            source,
        })
    }

    /// Builds the Telegram bot. Fails when no bot token is configured.
    pub fn into_bot(self) -> Fallible<VerseBot> {
        let telegram = TelegramClient::new(&self.settings.telegram)?;
        Ok(VerseBot::new(
            self.tracker,
            self.source,
            telegram,
            self.settings.telegram.chat_ids,
        ))
    }
}
