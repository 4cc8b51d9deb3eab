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

//! Where verses come from: a local corpus and, optionally, a remote API.

pub mod bible_api;
pub mod corpus;

use crate::config::Settings;
use crate::error::Fallible;
use crate::error::fail;
use crate::source::bible_api::BibleApiClient;
use crate::source::corpus::builtin_corpus;
use crate::source::corpus::load_corpus_file;
use crate::types::verse::VerseRecord;

pub struct VerseSource {
    corpus: Vec<VerseRecord>,
    api: Option<BibleApiClient>,
}

impl VerseSource {
    pub fn new(corpus: Vec<VerseRecord>, api: Option<BibleApiClient>) -> Self {
        Self { corpus, api }
    }

    pub fn from_settings(settings: &Settings) -> Fallible<Self> {
        let corpus = match &settings.storage.corpus_file {
            Some(path) => {
                log::debug!("Loading corpus from {}.", path.display());
                load_corpus_file(path)?
            }
            None => builtin_corpus()?,
        };
        let api = if settings.bible_api.enabled {
            Some(BibleApiClient::new(&settings.bible_api)?)
        } else {
            None
        };
        Ok(Self::new(corpus, api))
    }

    /// The candidate pool for selection.
    pub fn pool(&self) -> Vec<VerseRecord> {
        self.corpus.clone()
    }

    /// Refreshes a selected verse from the API in the configured translation.
    /// Falls back to the pooled record on any failure.
    pub async fn resolve(&self, verse: &VerseRecord) -> VerseRecord {
        let Some(api) = &self.api else {
            return verse.clone();
        };
        match api.fetch(verse.reference()).await {
            Ok(fetched) => verse.with_text(fetched.text(), fetched.translation()),
            Err(e) => {
                log::warn!(
                    "Cannot fetch {} in {} ({e}), using the local text.",
                    verse.reference(),
                    api.translation()
                );
                verse.clone()
            }
        }
    }

    /// Looks up a verse by reference: the API first, then the corpus.
    pub async fn lookup(&self, reference: &str) -> Fallible<VerseRecord> {
        if let Some(api) = &self.api {
            match api.fetch(reference).await {
                Ok(verse) => return Ok(verse),
                Err(e) => log::warn!("Verse API lookup for {reference} failed: {e}"),
            }
        }
        let wanted = reference.trim();
        match self
            .corpus
            .iter()
            .find(|verse| verse.reference().eq_ignore_ascii_case(wanted))
        {
            Some(verse) => {
                log::info!("Using local verse {}.", verse.reference());
                Ok(verse.clone())
            }
            None => fail(format!("verse not found: {wanted}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BibleApiSettings;
    use crate::helper::MockBibleApi;
    use crate::helper::sample_pool;

    fn api_settings(base_url: String) -> BibleApiSettings {
        BibleApiSettings {
            enabled: true,
            base_url,
            translation: "web".to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_resolve_without_api() -> Fallible<()> {
        let pool = sample_pool(2);
        let source = VerseSource::new(pool.clone(), None);
        assert_eq!(source.resolve(&pool[0]).await, pool[0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_with_api_keeps_identity() -> Fallible<()> {
        let api = MockBibleApi::start().await;
        let client = BibleApiClient::new(&api_settings(api.base_url()))?;
        let local = VerseRecord::new("John 3:16", "local text", "KJV", "John", 3, 16)?;
        let source = VerseSource::new(vec![local.clone()], Some(client));
        let resolved = source.resolve(&local).await;
        assert_eq!(resolved.reference(), "John 3:16");
        assert_eq!(resolved.translation(), "WEB");
        assert_ne!(resolved.text(), "local text");
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_api_failure() -> Fallible<()> {
        let api = MockBibleApi::start().await;
        let client = BibleApiClient::new(&api_settings(api.base_url()))?;
        let local = VerseRecord::new("Micah 6:8", "local text", "KJV", "Micah", 6, 8)?;
        let source = VerseSource::new(vec![local.clone()], Some(client));
        assert_eq!(source.resolve(&local).await, local);
        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_in_corpus() -> Fallible<()> {
        let source = VerseSource::new(builtin_corpus()?, None);
        let verse = source.lookup("psalm 23:1").await?;
        assert_eq!(verse.reference(), "Psalm 23:1");
        assert!(source.lookup("Obadiah 1:99").await.is_err());
        Ok(())
    }
}
