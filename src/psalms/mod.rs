//! Read-only access to the Psalm dataset.
//!
//! The dataset is a JSON array prepared ahead of time from a public-domain
//! translation:
//!
//! ```json
//! [{"number": 1, "verses": [{"verseNumber": 1, "text": "Blessed is the man..."}]}]
//! ```
//!
//! It is loaded once and only ever looked up by Psalm number.

pub mod styled;

use crate::calendar::PsalmIndex;
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsalmVerse {
    pub verse_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Psalm {
    pub number: u16,
    pub verses: Vec<PsalmVerse>,
}

/// The Psalms, indexed by number.
#[derive(Debug, Clone, Default)]
pub struct PsalmLibrary {
    psalms: BTreeMap<PsalmIndex, Psalm>,
}

impl PsalmLibrary {
    /// Build a library from parsed Psalms. Entries numbered outside 1..=150 are dropped.
    pub fn from_psalms(psalms: Vec<Psalm>) -> Self {
        let mut library = PsalmLibrary::default();
        for psalm in psalms {
            match PsalmIndex::new(psalm.number) {
                Some(index) => {
                    library.psalms.insert(index, psalm);
                }
                None => warn!("Ignoring Psalm numbered {}", psalm.number),
            }
        }
        library
    }

    /// Parse the dataset from a JSON string.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let psalms: Vec<Psalm> = serde_json::from_str(json)
            .map_err(|e| AppError::Journal(format!("Psalm dataset is malformed: {}", e)))?;
        Ok(Self::from_psalms(psalms))
    }

    /// Load the dataset file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file can't be read and `AppError::Journal`
    /// if it isn't a Psalm dataset.
    pub fn load(path: &Path) -> AppResult<Self> {
        debug!("Loading Psalms from {:?}", path);
        let json = fs::read_to_string(path)?;
        let library = Self::from_json(&json)?;
        debug!("Loaded {} Psalms", library.len());
        Ok(library)
    }

    pub fn get(&self, psalm: PsalmIndex) -> Option<&Psalm> {
        self.psalms.get(&psalm)
    }

    pub fn len(&self) -> usize {
        self.psalms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.psalms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"[
        {"number": 1, "verses": [{"verseNumber": 1, "text": "Blessed is the man"}]},
        {"number": 23, "verses": [
            {"verseNumber": 1, "text": "The LORD is my shepherd; I shall not want."},
            {"verseNumber": 2, "text": "He maketh me to lie down in green pastures"}
        ]},
        {"number": 151, "verses": []}
    ]"#;

    #[test]
    fn test_lookup_by_number() {
        let library = PsalmLibrary::from_json(SAMPLE).unwrap();
        assert_eq!(library.len(), 2);

        let psalm = library.get(PsalmIndex::new(23).unwrap()).unwrap();
        assert_eq!(psalm.verses.len(), 2);
        assert_eq!(psalm.verses[1].verse_number, 2);
        assert!(library.get(PsalmIndex::new(2).unwrap()).is_none());
    }

    #[test]
    fn test_malformed_dataset_is_an_error() {
        assert!(PsalmLibrary::from_json(r#"{"number": 1}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("psalms.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let library = PsalmLibrary::load(&path).unwrap();
        assert!(!library.is_empty());
        assert!(matches!(
            PsalmLibrary::load(&dir.path().join("missing.json")),
            Err(AppError::Io(_))
        ));
    }
}
