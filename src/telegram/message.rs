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

use maud::html;

use crate::types::verse::VerseRecord;

pub const ONLINE_MESSAGE: &str = "🤖 Daily verse bot is online and ready!";

/// Renders a verse as a Telegram HTML message. Verse text is escaped.
pub fn format_verse_message(verse: &VerseRecord) -> String {
    let markup = html! {
        "📖 " b { "Daily Bible Verse" } "\n\n"
        i { "\u{201c}" (verse.text()) "\u{201d}" } "\n\n"
        b { "\u{2014} " (verse.reference()) " (" (verse.translation()) ")" } "\n\n"
        "Have a blessed day! 🙏"
    };
    markup.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    #[test]
    fn test_format() -> Fallible<()> {
        let verse = VerseRecord::new(
            "Psalm 23:1",
            "The LORD is my shepherd; I shall not want.",
            "KJV",
            "Psalm",
            23,
            1,
        )?;
        let message = format_verse_message(&verse);
        assert!(message.starts_with("📖 <b>Daily Bible Verse</b>\n\n"));
        assert!(
            message.contains("<i>\u{201c}The LORD is my shepherd; I shall not want.\u{201d}</i>")
        );
        assert!(message.contains("<b>\u{2014} Psalm 23:1 (KJV)</b>"));
        assert!(message.ends_with("Have a blessed day! 🙏"));
        Ok(())
    }

    #[test]
    fn test_text_is_escaped() -> Fallible<()> {
        let verse = VerseRecord::new("Test 1:1", "a < b & c", "KJV", "Test", 1, 1)?;
        let message = format_verse_message(&verse);
        assert!(message.contains("a &lt; b &amp; c"));
        Ok(())
    }
}
