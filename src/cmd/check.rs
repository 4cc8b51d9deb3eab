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
use crate::error::fail;

/// Tests the bot token and every configured chat.
pub async fn check_connection(app: App, announce: bool) -> Fallible<()> {
    let bot = app.into_bot()?;
    let report = bot.test_connection(announce).await?;
    println!(
        "Bot: {} (@{})",
        report.bot.first_name,
        report.bot.username.as_deref().unwrap_or("-")
    );
    if report.chats.is_empty() {
        println!("No chats configured.");
        return Ok(());
    }
    let mut failures = 0;
    for (chat_id, result) in &report.chats {
        match result {
            Ok(detail) => println!("  {chat_id}: ok, {detail}"),
            Err(e) => {
                failures += 1;
                println!("  {chat_id}: FAILED, {e}");
            }
        }
    }
    if failures > 0 {
        return fail(format!("{failures} of {} chats failed.", report.chats.len()));
    }
    Ok(())
}
