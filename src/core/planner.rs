//! Turns a user query + filters + engine output into an ordered list of
//! search strategies (parameter overlays against a base parameter set).

use super::relevance::RelevanceEngine;
use super::text::dedupe_adjacent_tokens;
use chrono::Datelike;

/// UI-facing year-filter choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearFilter {
    None,
    Five,
    Ten,
    Twenty,
}

impl YearFilter {
    fn years(self) -> Option<i32> {
        match self {
            YearFilter::None => None,
            YearFilter::Five => Some(5),
            YearFilter::Ten => Some(10),
            YearFilter::Twenty => Some(20),
        }
    }
}

/// Fixed request parameters the remote API accepts, overlaid per strategy.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub fields: String,
    pub offset: u32,
    pub limit: u32,
    pub year: Option<String>,
}

/// One (description, parameter overlay) pair emitted by the planner.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub description: String,
    pub params: SearchParams,
}

fn year_range(current_year: i32, years: i32) -> String {
    format!("{}-", current_year - years + 1)
}

fn base_params(query: &str, pages_desired: u32) -> SearchParams {
    SearchParams {
        query: query.to_string(),
        fields: "abstract,authors,citationCount,citationStyles,title,url,venue,year".to_string(),
        offset: 0,
        limit: pages_desired.max(1),
        year: None,
    }
}

pub struct QueryPlanner;

impl QueryPlanner {
    /// Build the ordered strategy list. `current_year` is injected rather than
    /// read from the clock so the planner stays a pure, testable function.
    pub fn plan(
        query: &str,
        pages_desired: u32,
        year_filter: YearFilter,
        engine: &RelevanceEngine,
        current_year: i32,
    ) -> Vec<Strategy> {
        let mut strategies = Vec::new();

        let mut standard = base_params(query, pages_desired);
        if let Some(years) = year_filter.years() {
            standard.year = Some(year_range(current_year, years));
        }
        strategies.push(Strategy {
            description: "Recherche standard".to_string(),
            params: standard,
        });

        for targeted_query in engine.build_targeted_queries(3, 4, 6) {
            let mut params = base_params(&targeted_query, pages_desired);
            params.query = dedupe_adjacent_tokens(&targeted_query);
            strategies.push(Strategy {
                description: format!("Requête ciblée: {targeted_query}"),
                params,
            });
        }

        let filter_years = year_filter.years();
        if filter_years.is_none() || filter_years.unwrap() > 5 {
            let mut params = base_params(query, pages_desired);
            params.year = Some(year_range(current_year, 5));
            strategies.push(Strategy {
                description: "Articles récents (5 years)".to_string(),
                params,
            });
        }
        if filter_years.is_none() || filter_years.unwrap() > 10 {
            let mut params = base_params(query, pages_desired);
            params.year = Some(year_range(current_year, 10));
            strategies.push(Strategy {
                description: "Articles depuis 10 ans".to_string(),
                params,
            });
        }

        let review_query = dedupe_adjacent_tokens(&format!("{query} review"));
        let mut review_params = base_params(&review_query, pages_desired);
        review_params.query = review_query;
        strategies.push(Strategy {
            description: "Revue de littérature (review)".to_string(),
            params: review_params,
        });

        strategies
    }

    pub fn current_year_now() -> i32 {
        chrono::Utc::now().year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relevance::RelevanceEngine;

    #[test]
    fn no_year_filter_adds_both_recency_strategies() {
        let engine = RelevanceEngine::new("dog training", &[], &[]);
        let strategies = QueryPlanner::plan("dog training", 5, YearFilter::None, &engine, 2026);
        let descriptions: Vec<&str> = strategies.iter().map(|s| s.description.as_str()).collect();
        assert!(descriptions.contains(&"Articles récents (5 years)"));
        assert!(descriptions.contains(&"Articles depuis 10 ans"));
        assert_eq!(descriptions.last(), Some(&"Revue de littérature (review)"));
    }

    #[test]
    fn year_filter_five_drops_five_year_recency_strategy() {
        let engine = RelevanceEngine::new("dog training", &[], &[]);
        let strategies = QueryPlanner::plan("dog training", 5, YearFilter::Five, &engine, 2026);
        let descriptions: Vec<&str> = strategies.iter().map(|s| s.description.as_str()).collect();
        assert!(!descriptions.contains(&"Articles récents (5 years)"));
        assert!(!descriptions.contains(&"Articles depuis 10 ans"));
    }
}
