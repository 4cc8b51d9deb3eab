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

use percent_encoding::AsciiSet;
use percent_encoding::CONTROLS;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;

use crate::config::BibleApiSettings;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::verse::VerseRecord;

/// Characters escaped when a reference becomes a path segment.
const REFERENCE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Client for a bible-api.com style passage API:
/// `GET {base}/{reference}?translation={id}`.
pub struct BibleApiClient {
    base_url: String,
    translation: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct PassageResponse {
    reference: String,
    verses: Vec<PassageVerse>,
    text: String,
    translation_id: String,
}

#[derive(Deserialize)]
struct PassageVerse {
    book_name: String,
    chapter: u32,
    verse: u32,
}

impl BibleApiClient {
    pub fn new(settings: &BibleApiSettings) -> Fallible<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            translation: settings.translation.clone(),
            client,
        })
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }

    fn passage_url(&self, reference: &str) -> String {
        let reference = utf8_percent_encode(reference.trim(), REFERENCE);
        let translation = utf8_percent_encode(&self.translation, REFERENCE);
        format!("{}/{reference}?translation={translation}", self.base_url)
    }

    /// Fetches a passage. Multi-verse passages are joined into one text and
    /// described by their first verse.
    pub async fn fetch(&self, reference: &str) -> Fallible<VerseRecord> {
        log::info!("Fetching {reference} from the verse API.");
        let response = self.client.get(self.passage_url(reference)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return fail(format!("verse API returned {status} for {reference}."));
        }
        let passage: PassageResponse = serde_json::from_str(&body)?;
        let Some(first) = passage.verses.first() else {
            return fail(format!("verse API returned no verses for {reference}."));
        };
        let text = passage.text.split_whitespace().collect::<Vec<_>>().join(" ");
        VerseRecord::new(
            &passage.reference,
            &text,
            &passage.translation_id.to_uppercase(),
            &first.book_name,
            first.chapter,
            first.verse,
        )
    }
}
