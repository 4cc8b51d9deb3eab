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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;

/// A single Bible verse. The reference ("John 3:16") is the verse's identity:
/// two records with the same reference are the same verse as far as history
/// tracking is concerned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    reference: String,
    text: String,
    translation: String,
    book: String,
    chapter: u32,
    #[serde(rename = "verse")]
    verse_number: u32,
}

impl VerseRecord {
    pub fn new(
        reference: &str,
        text: &str,
        translation: &str,
        book: &str,
        chapter: u32,
        verse_number: u32,
    ) -> Fallible<Self> {
        let verse = Self {
            reference: reference.trim().to_string(),
            text: text.trim().to_string(),
            translation: translation.trim().to_string(),
            book: book.trim().to_string(),
            chapter,
            verse_number,
        };
        verse.validate()?;
        Ok(verse)
    }

    /// Checks the invariants of a record that was deserialized rather than
    /// built with [`VerseRecord::new`].
    pub fn validate(&self) -> Fallible<()> {
        if self.reference.trim().is_empty() {
            return fail("verse reference is empty.");
        }
        if self.text.trim().is_empty() {
            return fail(format!("verse {} has no text.", self.reference));
        }
        if self.chapter == 0 {
            return fail(format!("verse {} has chapter 0.", self.reference));
        }
        if self.verse_number == 0 {
            return fail(format!("verse {} has verse number 0.", self.reference));
        }
        Ok(())
    }

    /// The same verse with different display text, e.g. fetched in another
    /// translation.
    pub fn with_text(&self, text: &str, translation: &str) -> Self {
        Self {
            reference: self.reference.clone(),
            text: text.trim().to_string(),
            translation: translation.trim().to_string(),
            book: self.book.clone(),
            chapter: self.chapter,
            verse_number: self.verse_number,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn verse_number(&self) -> u32 {
        self.verse_number
    }
}

impl Display for VerseRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.reference, self.translation)
    }
}
