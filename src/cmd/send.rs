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
use crate::bot::DeliveryReport;
use crate::error::Fallible;

/// Sends a verse right away: the next daily verse, or the given reference.
pub async fn send_now(
    app: App,
    reference: Option<String>,
    chat_id: Option<String>,
) -> Fallible<()> {
    let bot = app.into_bot()?;
    let report = match reference {
        Some(reference) => bot.send_custom_verse(&reference, chat_id.as_deref()).await?,
        None => bot.send_daily_verse_to(chat_id.as_deref()).await?,
    };
    print_report(&report);
    Ok(())
}

fn print_report(report: &DeliveryReport) {
    println!("Sent {} to {} chat(s).", report.reference, report.delivered.len());
    for chat_id in &report.failed {
        println!("Failed to deliver to {chat_id}.");
    }
}
