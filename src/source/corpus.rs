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

use std::fs::read_to_string;
use std::path::Path;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::verse::VerseRecord;

/// Verses shipped inside the binary, used when no corpus file is configured.
pub fn builtin_corpus() -> Fallible<Vec<VerseRecord>> {
    parse_corpus(include_str!("corpus.json"))
        .map_err(|e| ErrorReport::new(&format!("built-in corpus: {e}")))
}

/// Loads a corpus from a JSON array of verse records.
pub fn load_corpus_file(path: &Path) -> Fallible<Vec<VerseRecord>> {
    let content = read_to_string(path)?;
    parse_corpus(&content).map_err(|e| ErrorReport::new(&format!("{}: {e}", path.display())))
}

fn parse_corpus(content: &str) -> Fallible<Vec<VerseRecord>> {
    let verses: Vec<VerseRecord> = serde_json::from_str(content)?;
    for verse in &verses {
        verse.validate()?;
    }
    Ok(verses)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_builtin_corpus() -> Fallible<()> {
        let corpus = builtin_corpus()?;
        assert!(corpus.len() >= 30);
        let references: HashSet<&str> = corpus.iter().map(|v| v.reference()).collect();
        assert_eq!(references.len(), corpus.len());
        Ok(())
    }

    #[test]
    fn test_load_corpus_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("corpus.json");
        write(
            &path,
            r#"[{
                "reference": "Micah 6:8",
                "text": "He hath shewed thee, O man, what is good",
                "translation": "KJV",
                "book": "Micah",
                "chapter": 6,
                "verse": 8
            }]"#,
        )?;
        let corpus = load_corpus_file(&path)?;
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].book(), "Micah");
        Ok(())
    }

    #[test]
    fn test_invalid_record_is_rejected() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("corpus.json");
        write(
            &path,
            r#"[{
                "reference": "Micah 6:8",
                "text": "",
                "translation": "KJV",
                "book": "Micah",
                "chapter": 6,
                "verse": 8
            }]"#,
        )?;
        assert!(load_corpus_file(&path).is_err());
        Ok(())
    }
}
