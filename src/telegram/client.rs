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

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;

use crate::config::TelegramSettings;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

/// A thin client for the Telegram Bot API.
pub struct TelegramClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

/// The envelope every Bot API response is wrapped in.
#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BotUser {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

impl Chat {
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.first_name.as_deref())
            .or(self.username.as_deref())
            .unwrap_or("unknown")
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<UpdateMessage>,
    pub channel_post: Option<UpdateMessage>,
    pub my_chat_member: Option<UpdateMessage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdateMessage {
    pub chat: Chat,
}

impl Update {
    pub fn chat(&self) -> Option<&Chat> {
        self.message
            .as_ref()
            .or(self.channel_post.as_ref())
            .or(self.my_chat_member.as_ref())
            .map(|m| &m.chat)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Html,
}

impl TelegramClient {
    pub fn new(settings: &TelegramSettings) -> Fallible<Self> {
        if settings.bot_token.trim().is_empty() {
            return fail("no Telegram bot token configured (set TELEGRAM_BOT_TOKEN).");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.bot_token.trim().to_string(),
            client,
        })
    }

    pub async fn get_me(&self) -> Fallible<BotUser> {
        self.call("getMe", json!({})).await
    }

    pub async fn get_chat(&self, chat_id: &str) -> Fallible<Chat> {
        self.call("getChat", json!({ "chat_id": chat_id })).await
    }

    pub async fn get_updates(&self) -> Fallible<Vec<Update>> {
        self.call("getUpdates", json!({})).await
    }

    pub async fn send_message(&self, chat_id: &str, text: &str, mode: ParseMode) -> Fallible<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if mode == ParseMode::Html {
            body["parse_mode"] = json!("HTML");
        }
        let _: Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Fallible<T> {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token);
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            ErrorReport::new(&format!("Telegram {method} returned {status}: {e}"))
        })?;
        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| status.to_string());
            return fail(format!("Telegram {method} failed: {description}"));
        }
        match envelope.result {
            Some(result) => Ok(result),
            None => fail(format!("Telegram {method} returned no result.")),
        }
    }
}
