//! The crawl-and-rank core: data model, text normalization, the synonym bank,
//! the relevance engine, the query planner, and the candidate pool.

pub mod controller;
pub mod planner;
pub mod pool;
pub mod relevance;
pub mod synonyms;
pub mod text;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Brazilian journal-quality grade. Exact lookup is out of scope for this
/// crate; see [`crate::ports::qualis`] for the illustrative lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Qualis {
    A1,
    A2,
    A3,
    A4,
    B1,
    B2,
    B3,
    B4,
    B5,
    C,
    Nf,
    Np,
}

impl std::fmt::Display for Qualis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Qualis::A1 => "A1",
            Qualis::A2 => "A2",
            Qualis::A3 => "A3",
            Qualis::A4 => "A4",
            Qualis::B1 => "B1",
            Qualis::B2 => "B2",
            Qualis::B3 => "B3",
            Qualis::B4 => "B4",
            Qualis::B5 => "B5",
            Qualis::C => "C",
            Qualis::Nf => "NF",
            Qualis::Np => "NP",
        };
        f.write_str(label)
    }
}

/// An author, identified by `(name, profile_link)`. Holds an ordered set of
/// the articles it is reachable from, kept sorted by title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub profile_link: Option<String>,
    pub articles: Vec<Article>,
}

impl Author {
    pub fn new(name: String, profile_link: Option<String>) -> Self {
        Author {
            name,
            profile_link,
            articles: Vec::new(),
        }
    }

    pub fn key(&self) -> (String, Option<String>) {
        (self.name.clone(), self.profile_link.clone())
    }

    /// Insert `article` and keep the list sorted by title, as the teacher's
    /// `addArtigo`/`add_article` idiom does.
    pub fn add_article(&mut self, article: Article) {
        if self
            .articles
            .iter()
            .any(|a| a.dedup_key() == article.dedup_key())
        {
            return;
        }
        self.articles.push(article);
        self.articles.sort_by(article_order);
    }
}

/// An accepted paper. Immutable once constructed by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub venue: String,
    pub year: String,
    pub citations: String,
    pub link: String,
    pub bibtex: String,
    pub cite_type: String,
    pub abstract_text: String,
    pub qualis: Qualis,
    pub authors: Vec<Author>,
    pub relevance_score: f64,
    pub concepts: BTreeSet<String>,
}

impl Article {
    /// `(lowercase(trim(title)), lowercase(trim(link)))`.
    pub fn dedup_key(&self) -> (String, String) {
        (
            self.title.trim().to_lowercase(),
            self.link.trim().to_lowercase(),
        )
    }
}

/// Comparator for stable output: title ascending, then link.
pub fn article_order(a: &Article, b: &Article) -> Ordering {
    a.title.cmp(&b.title).then_with(|| a.link.cmp(&b.link))
}

pub fn author_order(a: &Author, b: &Author) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.profile_link.cmp(&b.profile_link))
}
