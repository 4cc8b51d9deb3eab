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

//! An HTTP endpoint that sends the daily verse when hit, for use with an
//! external cron service.

mod view;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;

use crate::bot::VerseBot;
use crate::error::Fallible;
use crate::history::tracker::YearStats;
use crate::history::tracker::lock_tracker;
use crate::server::view::not_found_page;
use crate::server::view::stats_page;

#[derive(Clone)]
pub struct ServerState {
    bot: Arc<VerseBot>,
}

pub fn router(bot: VerseBot) -> Router {
    let state = ServerState { bot: Arc::new(bot) };
    let app = Router::new();
    let app = app.route(
        "/api/send_daily_verse",
        get(send_daily_verse).post(send_daily_verse),
    );
    let app = app.route("/", get(stats_handler));
    let app = app.route("/stats.json", get(stats_json));
    let app = app.route("/health", get(health));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

pub async fn start_server(bot: VerseBot, bind: &str) -> Fallible<()> {
    let app = router(bot);
    log::info!("Starting server on {bind}");
    let listener = TcpListener::bind(bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Received interrupt, shutting down.");
        })
        .await?;
    Ok(())
}

async fn send_daily_verse(State(state): State<ServerState>) -> (StatusCode, Json<Value>) {
    match state.bot.send_daily_verse().await {
        Ok(report) => {
            log::info!("Daily verse {} sent via the trigger endpoint.", report.reference);
            (
                StatusCode::OK,
                Json(json!({ "ok": true, "message": "Daily verse sent", "report": report })),
            )
        }
        Err(e) => {
            log::error!("Trigger endpoint failed to send the daily verse: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}

async fn stats_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let tracker = lock_tracker(state.bot.tracker());
    let year = tracker.current_year();
    let current = tracker.stats(year);
    let sent: Vec<String> = tracker
        .sent_for_year(year)
        .into_iter()
        .map(str::to_string)
        .collect();
    let years: Vec<YearStats> = tracker.all_years_stats().into_values().rev().collect();
    drop(tracker);
    let html = stats_page(&current, &sent, &years);
    (StatusCode::OK, Html(html.into_string()))
}

async fn stats_json(State(state): State<ServerState>) -> Json<YearStats> {
    let tracker = lock_tracker(state.bot.tracker());
    let year = tracker.current_year();
    Json(tracker.stats(year))
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(not_found_page().into_string()))
}
