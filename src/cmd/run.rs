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
use crate::history::tracker::lock_tracker;
use crate::scheduler::run_scheduler;
use crate::server::start_server;

/// Runs the daily scheduler until interrupted.
pub async fn run(app: App) -> Fallible<()> {
    let schedule = app.settings.daily_schedule()?;
    if let Some(keep_years) = app.settings.storage.keep_years {
        let removed = lock_tracker(&app.tracker).cleanup_old_years(keep_years);
        if !removed.is_empty() {
            log::info!("Cleaned up history for {} old years.", removed.len());
        }
    }
    let bot = app.into_bot()?;
    match bot.telegram().get_me().await {
        Ok(me) => log::info!(
            "Connected as @{}.",
            me.username.as_deref().unwrap_or(&me.first_name)
        ),
        Err(e) => log::warn!("Cannot reach Telegram yet: {e}"),
    }
    run_scheduler(&bot, &schedule).await
}

/// Serves the HTTP trigger endpoint until interrupted.
pub async fn serve(app: App, bind: Option<String>) -> Fallible<()> {
    let bind = bind.unwrap_or_else(|| app.settings.server.bind.clone());
    let bot = app.into_bot()?;
    start_server(bot, &bind).await
}
