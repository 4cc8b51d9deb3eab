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

//! Yearly verse history: which references were already sent in which year.

pub mod migrate;
pub mod store;
pub mod tracker;

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::PathBuf;

/// A calendar year.
pub type Year = i32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The verse pool is empty, so there is nothing to select.
    NoVerseAvailable,
    /// The history file exists but could not be read or parsed.
    CorruptHistory { path: PathBuf, reason: String },
    /// The history file could not be written.
    Persistence { path: PathBuf, reason: String },
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryError::NoVerseAvailable => write!(f, "no verses available to select."),
            HistoryError::CorruptHistory { path, reason } => {
                write!(f, "corrupt verse history {}: {reason}", path.display())
            }
            HistoryError::Persistence { path, reason } => {
                write!(f, "failed to save verse history {}: {reason}", path.display())
            }
        }
    }
}

impl Error for HistoryError {}
