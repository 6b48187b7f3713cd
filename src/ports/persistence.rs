//! JSON-file-backed [`PersistencePort`], one subdirectory per sanitized
//! search label, `articles.json` / `authors.json` as described in the
//! persisted-state layout.

use super::{PersistencePort, PersistenceError};
use crate::core::{Article, Author};
use std::fs;
use std::path::{Path, PathBuf};

/// Collapse whitespace, replace `[\/:*?"<>|]` with `_`, strip trailing
/// space/dot, default to `"Recherche"` when empty.
pub fn sanitize_label(label: &str) -> String {
    let collapsed: String = label.split_whitespace().collect::<Vec<_>>().join(" ");
    let replaced: String = collapsed
        .chars()
        .map(|c| if "\\/:*?\"<>|".contains(c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_end_matches([' ', '.']).trim().to_string();
    if trimmed.is_empty() {
        "Recherche".to_string()
    } else {
        trimmed
    }
}

pub struct JsonFilePersistence {
    root: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(root: PathBuf) -> Self {
        JsonFilePersistence { root }
    }

    fn label_dir(&self, label: &str) -> PathBuf {
        self.root.join(sanitize_label(label))
    }

    fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, PersistenceError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| PersistenceError::MissingOrCorrupt(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| PersistenceError::MissingOrCorrupt(e.to_string()))
    }

    fn save<T: serde::Serialize>(path: &Path, items: &[T]) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::MissingOrCorrupt(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| PersistenceError::MissingOrCorrupt(e.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| PersistenceError::MissingOrCorrupt(e.to_string()))?;
        fs::rename(&tmp_path, path).map_err(|e| PersistenceError::MissingOrCorrupt(e.to_string()))?;
        Ok(())
    }
}

impl PersistencePort for JsonFilePersistence {
    fn load_articles(&self, label: &str) -> Result<Vec<Article>, PersistenceError> {
        Self::load(&self.label_dir(label).join("articles.json"))
    }

    fn load_authors(&self, label: &str) -> Result<Vec<Author>, PersistenceError> {
        Self::load(&self.label_dir(label).join("authors.json"))
    }

    fn save_articles(&self, label: &str, articles: &[Article]) -> Result<(), PersistenceError> {
        Self::save(&self.label_dir(label).join("articles.json"), articles)
    }

    fn save_authors(&self, label: &str, authors: &[Author]) -> Result<(), PersistenceError> {
        Self::save(&self.label_dir(label).join("authors.json"), authors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_label_replaces_forbidden_characters() {
        assert_eq!(sanitize_label("dog/training:test?"), "dog_training_test_");
    }

    #[test]
    fn sanitize_label_defaults_to_recherche() {
        assert_eq!(sanitize_label("   "), "Recherche");
    }

    #[test]
    fn sanitize_label_strips_trailing_space_and_dot() {
        assert_eq!(sanitize_label("query. "), "query");
    }

    #[test]
    fn round_trip_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path().to_path_buf());

        let article = Article {
            title: "Detection dogs in mines".to_string(),
            venue: "-".to_string(),
            year: "2020".to_string(),
            citations: "4".to_string(),
            link: "https://x/y".to_string(),
            bibtex: "-".to_string(),
            cite_type: "-".to_string(),
            abstract_text: "Aucun résumé".to_string(),
            qualis: crate::core::Qualis::Nf,
            authors: Vec::new(),
            relevance_score: 42.5,
            concepts: std::collections::BTreeSet::new(),
        };

        store.save_articles("My Search", &[article.clone()]).unwrap();
        let loaded = store.load_articles("My Search").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, article.title);
    }

    #[test]
    fn missing_store_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path().to_path_buf());
        assert!(store.load_articles("Nothing Here").unwrap().is_empty());
    }
}
