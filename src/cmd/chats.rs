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

use crate::app::App;
use crate::error::Fallible;
use crate::telegram::client::Chat;
use crate::telegram::client::Update;

/// Lists the chats the bot has recently seen, to help fill in chat ids.
pub async fn list_chats(app: App) -> Fallible<()> {
    let bot = app.into_bot()?;
    let updates = bot.telegram().get_updates().await?;
    let chats = distinct_chats(&updates);
    if chats.is_empty() {
        println!("No chats found. Add the bot to a chat and send it a message, then try again.");
        return Ok(());
    }
    for chat in chats.values() {
        println!("{}\t{}\t{}", chat.id, chat.kind, chat.display_name());
    }
    Ok(())
}

fn distinct_chats(updates: &[Update]) -> BTreeMap<i64, &Chat> {
    updates
        .iter()
        .filter_map(Update::chat)
        .map(|chat| (chat.id, chat))
        .collect()
}
