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

use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::history::tracker::SharedTracker;
use crate::history::tracker::lock_tracker;
use crate::source::VerseSource;
use crate::telegram::client::BotUser;
use crate::telegram::client::ParseMode;
use crate::telegram::client::TelegramClient;
use crate::telegram::message::ONLINE_MESSAGE;
use crate::telegram::message::format_verse_message;
use crate::types::verse::VerseRecord;

/// Sends verses to the configured chats.
pub struct VerseBot {
    tracker: SharedTracker,
    source: VerseSource,
    telegram: TelegramClient,
    chat_ids: Vec<String>,
}

/// The outcome of sending one verse to a set of chats.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub reference: String,
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

pub struct ConnectionReport {
    pub bot: BotUser,
    /// Per chat: the chat's name, or the error.
    pub chats: Vec<(String, Result<String, String>)>,
}

impl VerseBot {
    pub fn new(
        tracker: SharedTracker,
        source: VerseSource,
        telegram: TelegramClient,
        chat_ids: Vec<String>,
    ) -> Self {
        Self {
            tracker,
            source,
            telegram,
            chat_ids,
        }
    }

    pub fn tracker(&self) -> &SharedTracker {
        &self.tracker
    }

    pub fn telegram(&self) -> &TelegramClient {
        &self.telegram
    }

    /// Picks the next unsent verse for the current year and sends it to every
    /// chat. The verse is recorded before delivery starts.
    pub async fn send_daily_verse(&self) -> Fallible<DeliveryReport> {
        self.send_daily_verse_to(None).await
    }

    /// Like [`VerseBot::send_daily_verse`], optionally to a single chat.
    pub async fn send_daily_verse_to(&self, chat_id: Option<&str>) -> Fallible<DeliveryReport> {
        log::info!("Selecting the daily verse...");
        let verse = {
            let mut tracker = lock_tracker(&self.tracker);
            let year = tracker.current_year();
            tracker.select_next(year)?
        };
        let verse = self.source.resolve(&verse).await;
        self.send_verse(&verse, chat_id).await
    }

    /// Sends a specific verse. History is not touched.
    pub async fn send_custom_verse(
        &self,
        reference: &str,
        chat_id: Option<&str>,
    ) -> Fallible<DeliveryReport> {
        log::info!("Fetching verse {reference}...");
        let verse = self.source.lookup(reference).await?;
        self.send_verse(&verse, chat_id).await
    }

    /// Sends a verse to one chat, or to all configured chats. Succeeds if at
    /// least one chat received it.
    pub async fn send_verse(
        &self,
        verse: &VerseRecord,
        chat_id: Option<&str>,
    ) -> Fallible<DeliveryReport> {
        let targets: Vec<&str> = match chat_id {
            Some(chat_id) => vec![chat_id],
            None => self.chat_ids.iter().map(String::as_str).collect(),
        };
        if targets.is_empty() {
            return fail("no chat ids configured (set TELEGRAM_CHAT_ID or TELEGRAM_CHAT_IDS).");
        }
        let message = format_verse_message(verse);
        let mut report = DeliveryReport {
            reference: verse.reference().to_string(),
            delivered: Vec::new(),
            failed: Vec::new(),
        };
        for target in targets {
            match self
                .telegram
                .send_message(target, &message, ParseMode::Html)
                .await
            {
                Ok(()) => {
                    log::info!("Sent {} to chat {target}.", verse.reference());
                    report.delivered.push(target.to_string());
                }
                Err(e) => {
                    log::error!("Failed to send {} to chat {target}: {e}", verse.reference());
                    report.failed.push(target.to_string());
                }
            }
        }
        if report.delivered.is_empty() {
            return fail(format!("failed to send {} to any chat.", verse.reference()));
        }
        log::info!(
            "Sent verse to {}/{} chats.",
            report.delivered.len(),
            report.delivered.len() + report.failed.len()
        );
        Ok(report)
    }

    /// Checks that the bot token works, then checks every chat: by looking
    /// it up, or by posting an "online" message when `announce` is set.
    pub async fn test_connection(&self, announce: bool) -> Fallible<ConnectionReport> {
        let bot = self.telegram.get_me().await?;
        log::info!(
            "Bot connected: @{}",
            bot.username.as_deref().unwrap_or(&bot.first_name)
        );
        let mut chats = Vec::new();
        for chat_id in &self.chat_ids {
            let result = if announce {
                self.telegram
                    .send_message(chat_id, ONLINE_MESSAGE, ParseMode::Plain)
                    .await
                    .map(|()| "message sent".to_string())
            } else {
                self.telegram
                    .get_chat(chat_id)
                    .await
                    .map(|chat| format!("{} ({})", chat.display_name(), chat.kind))
            };
            match &result {
                Ok(_) => log::info!("Connection test passed for chat {chat_id}."),
                Err(e) => log::error!("Connection test failed for chat {chat_id}: {e}"),
            }
            chats.push((chat_id.clone(), result.map_err(|e| e.to_string())));
        }
        Ok(ConnectionReport { bot, chats })
    }
}
