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

//! Test fixtures: sample verses and local stand-ins for the remote APIs.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::config::TelegramSettings;
use crate::types::verse::VerseRecord;

/// `n` distinct KJV verses, all from Proverbs.
pub fn sample_pool(n: usize) -> Vec<VerseRecord> {
    (1..=n)
        .map(|i| {
            let verse = i as u32;
            VerseRecord::new(
                &format!("Proverbs 3:{verse}"),
                &format!("Sample text for verse {verse}."),
                "KJV",
                "Proverbs",
                3,
                verse,
            )
            .unwrap()
        })
        .collect()
}

/// Binds `app` to a free local port and waits until it accepts connections.
async fn serve(app: Router) -> String {
    let port = portpicker::pick_unused_port().unwrap();
    let bind = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&bind).await.unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    loop {
        if let Ok(stream) = TcpStream::connect(&bind).await {
            drop(stream);
            break;
        }
        sleep(Duration::from_millis(1)).await;
    }
    format!("http://{bind}")
}

/// A passage API that only knows John 3:16.
pub struct MockBibleApi {
    base_url: String,
}

impl MockBibleApi {
    pub async fn start() -> Self {
        let app = Router::new().route("/{reference}", get(passage));
        Self {
            base_url: serve(app).await,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }
}

async fn passage(
    Path(reference): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if reference != "John 3:16" {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })));
    }
    let translation = query
        .get("translation")
        .cloned()
        .unwrap_or_else(|| "web".to_string());
    let body = json!({
        "reference": "John 3:16",
        "verses": [
            { "book_id": "JHN", "book_name": "John", "chapter": 3, "verse": 16, "text": "..." }
        ],
        "text": "For God so loved the world,\nthat he gave his one and only Son,\n",
        "translation_id": translation,
        "translation_name": "Mock Translation",
    });
    (StatusCode::OK, Json(body))
}

/// One `sendMessage` call received by [`MockTelegram`].
#[derive(Clone, Debug)]
pub struct SentMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: Option<String>,
}

#[derive(Clone)]
struct TelegramState {
    failing: Vec<String>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

/// A Bot API stand-in. Chats listed as failing answer "chat not found".
pub struct MockTelegram {
    base_url: String,
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl MockTelegram {
    pub async fn start(failing: &[&str]) -> Self {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let state = TelegramState {
            failing: failing.iter().map(|c| c.to_string()).collect(),
            sent: sent.clone(),
        };
        let app = Router::new()
            .route("/{bot}/{method}", post(bot_method))
            .with_state(state);
        Self {
            base_url: serve(app).await,
            sent,
        }
    }

    pub fn settings(&self) -> TelegramSettings {
        TelegramSettings {
            bot_token: "test-token".to_string(),
            api_url: self.base_url.clone(),
            timeout_secs: 5,
            ..TelegramSettings::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

async fn bot_method(
    State(state): State<TelegramState>,
    Path((bot, method)): Path<(String, String)>,
    body: String,
) -> (StatusCode, Json<Value>) {
    if bot != "bottest-token" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "error_code": 401, "description": "Unauthorized" })),
        );
    }
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let chat_id = body["chat_id"].as_str().unwrap_or_default().to_string();
    if state.failing.contains(&chat_id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found",
            })),
        );
    }
    let result = match method.as_str() {
        "getMe" => json!({
            "id": 42,
            "is_bot": true,
            "first_name": "Daily Verse",
            "username": "daily_verse_bot",
        }),
        "getChat" => json!({
            "id": chat_id.parse::<i64>().unwrap_or(0),
            "type": "group",
            "title": format!("Chat {chat_id}"),
        }),
        "getUpdates" => json!([
            {
                "update_id": 1,
                "message": {
                    "message_id": 7,
                    "date": 0,
                    "chat": { "id": -100123, "type": "supergroup", "title": "Morning Group" },
                    "text": "hello",
                },
            },
            { "update_id": 2 },
        ]),
        "sendMessage" => {
            state.sent.lock().unwrap().push(SentMessage {
                chat_id: chat_id.clone(),
                text: body["text"].as_str().unwrap_or_default().to_string(),
                parse_mode: body["parse_mode"].as_str().map(str::to_string),
            });
            json!({ "message_id": 1, "date": 0, "chat": { "id": 0, "type": "group" } })
        }
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "ok": false, "error_code": 404, "description": "Not Found" })),
            );
        }
    };
    (StatusCode::OK, Json(json!({ "ok": true, "result": result })))
}
