//! Semantic Scholar paper-search response shape and the field mapping from
//! a raw response item to a domain [`Article`]/[`Author`] pair (§4.F, §6.1).

use crate::core::{Article, Author, Qualis};
use serde::Deserialize;

pub const ENDPOINT: &str = "https://api.semanticscholar.org/graph/v1/paper/search";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[allow(dead_code)]
    pub total: Option<u64>,
    pub data: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawCitationStyles {
    bibtex: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawItem {
    title: Option<String>,
    authors: Option<Vec<RawAuthor>>,
    venue: Option<String>,
    year: Option<serde_json::Value>,
    #[serde(rename = "citationCount")]
    citation_count: Option<serde_json::Value>,
    url: Option<String>,
    #[serde(rename = "citationStyles")]
    citation_styles: Option<RawCitationStyles>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

/// Extracts the BibTeX entry type: the text between the first `@` and the
/// first `{`, or `"-"` when absent or unparseable.
fn cite_type_from_bibtex(bibtex: &str) -> String {
    let Some(after_at) = bibtex.split_once('@').map(|(_, rest)| rest) else {
        return "-".to_string();
    };
    match after_at.split_once('{') {
        Some((entry_type, _)) => entry_type.to_string(),
        None => "-".to_string(),
    }
}

/// `JournalArticle|Review → "1"`; `Conference|CaseReport → "2"`;
/// `Book|BookSection|News|Study → "3"`; else `"4"`. Case-sensitive substring
/// search on the raw bibtex string.
///
/// Not called anywhere in this crate: the classification exists for the
/// spreadsheet exporter (an external collaborator, out of scope here) to
/// consume downstream. Kept as crate-visible API rather than deleted, with
/// the warning suppressed since its only caller lives outside this crate.
#[allow(dead_code)]
pub fn classify_cite_type(bibtex: &str) -> &'static str {
    let matches_any = |needles: &[&str]| needles.iter().any(|needle| bibtex.contains(needle));
    if matches_any(&["JournalArticle", "Review"]) {
        "1"
    } else if matches_any(&["Conference", "CaseReport"]) {
        "2"
    } else if matches_any(&["Book", "BookSection", "News", "Study"]) {
        "3"
    } else {
        "4"
    }
}

fn clean_abstract(raw: Option<String>) -> String {
    match raw {
        None => "Aucun résumé".to_string(),
        Some(text) => {
            let without_tldr = text.replace("TLDR\n", "");
            without_tldr.trim_end_matches(" Expand").trim().to_string()
        }
    }
}

/// Maps one raw Semantic Scholar search-result item into an `(Article,
/// authors)` pair. `title` is required upstream by the caller; items missing
/// it should be skipped before calling this.
pub fn map_item(item: &serde_json::Value, qualis_lookup: &dyn crate::ports::QualisPort) -> Option<(Article, Vec<Author>)> {
    let raw: RawItem = serde_json::from_value(item.clone()).ok()?;
    let title = raw.title?;

    let mut seen_authors: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    let mut authors = Vec::new();
    for raw_author in raw.authors.unwrap_or_default() {
        let Some(name) = raw_author.name else { continue };
        if !seen_authors.insert(name.clone()) {
            continue;
        }
        authors.push(Author::new(name, None));
    }

    let venue = raw.venue.filter(|v| !v.is_empty()).unwrap_or_else(|| "-".to_string());
    let year = raw
        .year
        .and_then(|v| v.as_i64().map(|n| n.to_string()).or_else(|| v.as_str().map(str::to_string)))
        .unwrap_or_else(|| "0".to_string());
    let citations = raw
        .citation_count
        .and_then(|v| v.as_i64())
        .unwrap_or(0)
        .max(0)
        .to_string();
    let link = raw.url.filter(|u| !u.is_empty()).unwrap_or_else(|| "-".to_string());
    let bibtex = raw
        .citation_styles
        .and_then(|styles| styles.bibtex)
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| "-".to_string());
    let cite_type = if bibtex == "-" {
        "-".to_string()
    } else {
        cite_type_from_bibtex(&bibtex)
    };
    let abstract_text = clean_abstract(raw.abstract_text);
    let qualis = qualis_lookup.lookup(&venue);

    let article = Article {
        title,
        venue,
        year,
        citations,
        link,
        bibtex,
        cite_type,
        abstract_text,
        qualis,
        authors: authors.clone(),
        relevance_score: 0.0,
        concepts: std::collections::BTreeSet::new(),
    };

    Some((article, authors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::qualis::StaticQualisTable;
    use serde_json::json;

    #[test]
    fn maps_full_item() {
        let item = json!({
            "title": "Detection dogs in mines",
            "authors": [{"name": "A. One"}, {"name": "B. Two"}],
            "venue": "Nature",
            "year": 2021,
            "citationCount": 12,
            "url": "https://x/y",
            "citationStyles": {"bibtex": "@JournalArticle{abc, title={X}}"},
            "abstract": "TLDR\nDogs detect mines well. Expand",
        });
        let (article, authors) = map_item(&item, &StaticQualisTable).unwrap();
        assert_eq!(article.title, "Detection dogs in mines");
        assert_eq!(article.venue, "Nature");
        assert_eq!(article.year, "2021");
        assert_eq!(article.citations, "12");
        assert_eq!(article.link, "https://x/y");
        assert_eq!(article.cite_type, "JournalArticle");
        assert_eq!(article.abstract_text, "Dogs detect mines well.");
        assert_eq!(article.qualis, Qualis::A1);
        assert_eq!(authors.len(), 2);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let item = json!({"title": "Bare item"});
        let (article, authors) = map_item(&item, &StaticQualisTable).unwrap();
        assert_eq!(article.venue, "-");
        assert_eq!(article.year, "0");
        assert_eq!(article.citations, "0");
        assert_eq!(article.link, "-");
        assert_eq!(article.bibtex, "-");
        assert_eq!(article.cite_type, "-");
        assert_eq!(article.abstract_text, "Aucun résumé");
        assert!(authors.is_empty());
    }

    #[test]
    fn item_without_title_is_skipped() {
        let item = json!({"venue": "Nature"});
        assert!(map_item(&item, &StaticQualisTable).is_none());
    }

    #[test]
    fn classify_cite_type_matches_known_families() {
        assert_eq!(classify_cite_type("@JournalArticle{x,"), "1");
        assert_eq!(classify_cite_type("@Conference{x,"), "2");
        assert_eq!(classify_cite_type("@Book{x,"), "3");
        assert_eq!(classify_cite_type("@Misc{x,"), "4");
    }
}
