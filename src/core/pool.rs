//! Deduplicating map from dedup-key to best-scoring candidate, split into
//! accepted vs fallback pools.

use crate::core::relevance::RelevanceResult;
use crate::core::{Article, Author};
use indexmap::IndexMap;

pub type DedupKey = (String, String);

#[derive(Debug, Clone)]
pub struct Candidate {
    pub article: Article,
    pub authors: Vec<Author>,
    pub result: RelevanceResult,
}

#[derive(Default)]
pub struct CandidatePool {
    accepted: IndexMap<DedupKey, Candidate>,
    fallback: IndexMap<DedupKey, Candidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_accepted(&mut self, key: DedupKey, candidate: Candidate) {
        insert_if_better(&mut self.accepted, key, candidate);
    }

    pub fn insert_fallback(&mut self, key: DedupKey, candidate: Candidate) {
        insert_if_better(&mut self.fallback, key, candidate);
    }

    pub fn accepted_len(&self) -> usize {
        self.accepted.len()
    }

    pub fn score_at_least(&self, key: &DedupKey, score: f64) -> bool {
        self.accepted
            .get(key)
            .map(|c| c.result.score >= score)
            .unwrap_or(false)
            || self
                .fallback
                .get(key)
                .map(|c| c.result.score >= score)
                .unwrap_or(false)
    }

    /// Merge accepted + fallback, accepted preferred, highest score first,
    /// truncated to `desired`.
    pub fn select(self, desired: usize) -> Vec<Candidate> {
        let mut accepted: Vec<Candidate> = self.accepted.into_values().collect();
        accepted.sort_by(|a, b| b.result.score.partial_cmp(&a.result.score).unwrap());

        let mut fallback: Vec<Candidate> = self.fallback.into_values().collect();
        fallback.sort_by(|a, b| b.result.score.partial_cmp(&a.result.score).unwrap());

        let mut selected = accepted;
        if selected.len() < desired {
            selected.extend(fallback);
        }
        selected.truncate(desired);
        selected
    }
}

fn insert_if_better(map: &mut IndexMap<DedupKey, Candidate>, key: DedupKey, candidate: Candidate) {
    match map.get(&key) {
        Some(existing) if existing.result.score >= candidate.result.score => {}
        _ => {
            map.insert(key, candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn article(title: &str, link: &str) -> Article {
        Article {
            title: title.to_string(),
            venue: "-".to_string(),
            year: "0".to_string(),
            citations: "0".to_string(),
            link: link.to_string(),
            bibtex: "-".to_string(),
            cite_type: "-".to_string(),
            abstract_text: "Aucun résumé".to_string(),
            qualis: crate::core::Qualis::Nf,
            authors: Vec::new(),
            relevance_score: 0.0,
            concepts: BTreeSet::new(),
        }
    }

    fn candidate(score: f64) -> Candidate {
        Candidate {
            article: article("Title", "https://x/y"),
            authors: Vec::new(),
            result: RelevanceResult {
                score,
                ..Default::default()
            },
        }
    }

    #[test]
    fn higher_score_overwrites_lower() {
        let mut pool = CandidatePool::new();
        let key = ("title".to_string(), "link".to_string());
        pool.insert_accepted(key.clone(), candidate(10.0));
        pool.insert_accepted(key.clone(), candidate(5.0));
        assert!(pool.score_at_least(&key, 10.0));
    }

    #[test]
    fn selection_prefers_accepted_then_backfills_from_fallback_by_score() {
        let mut pool = CandidatePool::new();
        pool.insert_accepted(("a".into(), "1".into()), candidate(60.0));
        pool.insert_accepted(("b".into(), "2".into()), candidate(55.0));
        pool.insert_fallback(("c".into(), "3".into()), candidate(40.0));
        pool.insert_fallback(("d".into(), "4".into()), candidate(38.0));
        pool.insert_fallback(("e".into(), "5".into()), candidate(20.0));

        let selected = pool.select(4);
        let scores: Vec<f64> = selected.iter().map(|c| c.result.score).collect();
        assert_eq!(scores, vec![60.0, 55.0, 40.0, 38.0]);
    }
}
