//! Orchestrates one crawl run: plans strategies, fetches and scores pages,
//! dedupes against persisted state, and persists the selection.

use super::pool::{Candidate, CandidatePool, DedupKey};
use super::planner::{QueryPlanner, YearFilter};
use super::relevance::{KeywordInput, RelevanceEngine};
use super::text::dedupe_adjacent_tokens;
use super::{article_order, author_order, Article, Author};
use crate::fetch::HttpFetcher;
use crate::ports::{NotifierPort, PersistencePort, QualisPort, TranslatorPort};
use crate::semantic;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// One term the caller wants enforced or preferred, alongside how strict it
/// is. Mirrors the configuration-level `keyword_rules` entries.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub term: String,
    pub required: bool,
}

/// Value returned to the CLI shell for exit-code mapping and final
/// reporting. Carries no information the notifier callbacks didn't already
/// emit.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub success: bool,
    pub added: usize,
    pub elapsed: Duration,
}

pub struct CrawlController<'a> {
    persistence: &'a dyn PersistencePort,
    notifier: &'a dyn NotifierPort,
    fetcher: &'a HttpFetcher<'a>,
    translator: &'a dyn TranslatorPort,
    qualis_lookup: &'a dyn QualisPort,
}

impl<'a> CrawlController<'a> {
    pub fn new(
        persistence: &'a dyn PersistencePort,
        notifier: &'a dyn NotifierPort,
        fetcher: &'a HttpFetcher<'a>,
        translator: &'a dyn TranslatorPort,
        qualis_lookup: &'a dyn QualisPort,
    ) -> Self {
        CrawlController {
            persistence,
            notifier,
            fetcher,
            translator,
            qualis_lookup,
        }
    }

    pub fn run(
        &self,
        query_raw: &str,
        pages_desired: u32,
        year_filter: YearFilter,
        keyword_rules: &[KeywordRule],
    ) -> RunSummary {
        let started = Instant::now();
        let query = normalize_search_phrase(query_raw);

        let existing_articles = self.persistence.load_articles(&query).unwrap_or_default();
        let existing_authors = self.persistence.load_authors(&query).unwrap_or_default();
        let mut existing_keys: BTreeSet<DedupKey> =
            existing_articles.iter().map(Article::dedup_key).collect();
        let mut author_lookup: HashMap<(String, Option<String>), Author> = existing_authors
            .iter()
            .cloned()
            .map(|author| (author.key(), author))
            .collect();

        let search_query = dedupe_adjacent_tokens(
            &self
                .translator
                .variants(&query)
                .join(" "),
        );

        let mandatory: Vec<KeywordInput> = keyword_rules
            .iter()
            .filter(|rule| rule.required)
            .map(|rule| keyword_input(rule, self.translator))
            .collect();
        let optional: Vec<KeywordInput> = keyword_rules
            .iter()
            .filter(|rule| !rule.required)
            .map(|rule| keyword_input(rule, self.translator))
            .collect();

        let engine = RelevanceEngine::new(&search_query, &mandatory, &optional);
        let strategies = QueryPlanner::plan(
            &search_query,
            pages_desired,
            year_filter,
            &engine,
            QueryPlanner::current_year_now(),
        );
        let total_strategies = strategies.len();

        let mut pool = CandidatePool::new();
        let mut any_successful_response = false;

        for (index, strategy) in strategies.into_iter().enumerate() {
            self.notifier
                .on_strategy_start(&strategy.description, index, total_strategies);

            let mut params: Vec<(String, String)> = vec![
                ("query".to_string(), dedupe_adjacent_tokens(&strategy.params.query)),
                ("fields".to_string(), strategy.params.fields.clone()),
                ("offset".to_string(), strategy.params.offset.to_string()),
                ("limit".to_string(), strategy.params.limit.to_string()),
            ];
            if let Some(year) = &strategy.params.year {
                params.push(("year".to_string(), year.clone()));
            }

            let response = match self.fetcher.fetch(semantic::ENDPOINT, &params, &[]) {
                Ok(value) => value,
                Err(err) => {
                    self.notifier.on_failure(&err.to_string());
                    warn!(marker = "FETCH_FAILURE", %err, "aborting run after transport-level failure");
                    return RunSummary {
                        success: false,
                        added: 0,
                        elapsed: started.elapsed(),
                    };
                }
            };
            any_successful_response = true;

            let items: Vec<serde_json::Value> = match serde_json::from_value::<semantic::SearchResponse>(response) {
                Ok(parsed) => parsed.data.unwrap_or_default(),
                Err(err) => {
                    warn!(marker = "DECODE_MALFORMED", %err, "response missing data array, treating as empty page");
                    Vec::new()
                }
            };

            let mut new_accepted = 0usize;
            for item in &items {
                let Some((mut article, authors)) = semantic::map_item(item, self.qualis_lookup) else {
                    continue;
                };
                let result = engine.evaluate(&article.title, &article.abstract_text);
                let key = article.dedup_key();

                if existing_keys.contains(&key) {
                    continue;
                }
                if pool.score_at_least(&key, result.score) {
                    continue;
                }

                article.relevance_score = result.score;
                article.concepts = result.matched_concepts.clone();
                let candidate = Candidate {
                    article,
                    authors,
                    result: result.clone(),
                };

                if engine.should_keep(&result, pool.accepted_len(), pages_desired as usize) {
                    pool.insert_accepted(key, candidate);
                    new_accepted += 1;
                } else if result.mandatory_missing.is_empty() {
                    pool.insert_fallback(key, candidate);
                }
            }

            self.notifier
                .on_strategy_result(&strategy.description, new_accepted, items.len());

            if pool.accepted_len() >= pages_desired as usize {
                break;
            }
        }

        let selected = pool.select(pages_desired as usize);

        let mut added = 0usize;
        let mut articles_out = existing_articles;

        for candidate in selected {
            let key = candidate.article.dedup_key();
            if existing_keys.contains(&key) {
                continue;
            }
            existing_keys.insert(key);
            added += 1;

            for author in &candidate.authors {
                let entry = author_lookup
                    .entry(author.key())
                    .or_insert_with(|| Author::new(author.name.clone(), author.profile_link.clone()));
                entry.add_article(candidate.article.clone());
            }

            articles_out.push(candidate.article);
        }

        if added == 0 || !any_successful_response {
            self.notifier.on_failure("aucun nouvel article trouvé pour cette recherche");
            return RunSummary {
                success: false,
                added: 0,
                elapsed: started.elapsed(),
            };
        }

        articles_out.sort_by(article_order);
        let mut authors_out: Vec<Author> = author_lookup.into_values().collect();
        authors_out.sort_by(author_order);

        if let Err(err) = self.persistence.save_articles(&query, &articles_out) {
            self.notifier.on_failure(&err.to_string());
            return RunSummary {
                success: false,
                added: 0,
                elapsed: started.elapsed(),
            };
        }
        if let Err(err) = self.persistence.save_authors(&query, &authors_out) {
            self.notifier.on_failure(&err.to_string());
            return RunSummary {
                success: false,
                added: 0,
                elapsed: started.elapsed(),
            };
        }

        let elapsed = started.elapsed();
        self.notifier.on_success(elapsed, added);
        info!(marker = "CRAWL_SUCCESS", added, elapsed_secs = elapsed.as_secs_f64(), "crawl run finished");

        RunSummary {
            success: true,
            added,
            elapsed,
        }
    }

    /// Reports how many articles/authors are already persisted for a search
    /// label, without crawling.
    pub fn status(&self, query_raw: &str) -> (usize, usize) {
        let query = normalize_search_phrase(query_raw);
        let articles = self.persistence.load_articles(&query).unwrap_or_default();
        let authors = self.persistence.load_authors(&query).unwrap_or_default();
        (articles.len(), authors.len())
    }
}

fn normalize_search_phrase(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn keyword_input(rule: &KeywordRule, translator: &dyn TranslatorPort) -> KeywordInput {
    let forms = translator.variants(&rule.term);
    let mut display_terms: BTreeSet<String> = forms.iter().cloned().collect();
    display_terms.insert(rule.term.clone());
    KeywordInput {
        label: Some(rule.term.clone()),
        forms,
        display_terms: Some(display_terms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{NotifierPort, PersistenceError, PersistencePort, RawResponse, RetryKind, TransportError, TransportPort};
    use std::cell::RefCell;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex;

    struct FakeTransport {
        pages: Mutex<Vec<serde_json::Value>>,
    }

    impl TransportPort for FakeTransport {
        fn get(
            &self,
            _url: &str,
            _params: &[(String, String)],
            _headers: &[(String, String)],
            _timeout: Duration,
        ) -> Result<RawResponse, TransportError> {
            let mut pages = self.pages.lock().unwrap();
            let value = if pages.is_empty() {
                serde_json::json!({"data": []})
            } else {
                pages.remove(0)
            };
            Ok(RawResponse {
                status: 200,
                headers: StdHashMap::new(),
                body: serde_json::to_vec(&value).unwrap(),
            })
        }
    }

    struct NullNotifier;
    impl NotifierPort for NullNotifier {
        fn on_strategy_start(&self, _: &str, _: usize, _: usize) {}
        fn on_strategy_result(&self, _: &str, _: usize, _: usize) {}
        fn on_retry(&self, _: RetryKind, _: u64, _: u32, _: u32) {}
        fn on_success(&self, _: Duration, _: usize) {}
        fn on_failure(&self, _: &str) {}
        fn on_empty_export(&self, _: bool, _: &str) {}
    }

    struct NoopSleeper;
    impl crate::fetch::Sleeper for NoopSleeper {
        fn sleep(&self, _duration: Duration) {}
    }

    struct InMemoryPersistence {
        articles: RefCell<HashMap<String, Vec<Article>>>,
        authors: RefCell<HashMap<String, Vec<Author>>>,
    }

    impl PersistencePort for InMemoryPersistence {
        fn load_articles(&self, label: &str) -> Result<Vec<Article>, PersistenceError> {
            Ok(self.articles.borrow().get(label).cloned().unwrap_or_default())
        }
        fn load_authors(&self, label: &str) -> Result<Vec<Author>, PersistenceError> {
            Ok(self.authors.borrow().get(label).cloned().unwrap_or_default())
        }
        fn save_articles(&self, label: &str, articles: &[Article]) -> Result<(), PersistenceError> {
            self.articles.borrow_mut().insert(label.to_string(), articles.to_vec());
            Ok(())
        }
        fn save_authors(&self, label: &str, authors: &[Author]) -> Result<(), PersistenceError> {
            self.authors.borrow_mut().insert(label.to_string(), authors.to_vec());
            Ok(())
        }
    }

    fn article_json(title: &str, abstract_text: &str, link: &str) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "authors": [{"name": "Jane Doe"}],
            "venue": "arXiv",
            "year": 2022,
            "citationCount": 3,
            "url": link,
            "abstract": abstract_text,
        })
    }

    #[test]
    fn two_strategies_needed_accepts_both_papers() {
        let pages = vec![
            serde_json::json!({"data": [article_json(
                "Explosive detection using canines",
                "Canines are used for explosive detection in post-conflict landmine clearance.",
                "https://x/1"
            )]}),
            serde_json::json!({"data": [article_json(
                "Landmine sniffing dogs in post-conflict zones",
                "Landmine sniffing dogs clear mine detection fields reliably.",
                "https://x/2"
            )]}),
        ];
        let transport = FakeTransport { pages: Mutex::new(pages) };
        let notifier = NullNotifier;
        let sleeper = NoopSleeper;
        let fetcher = HttpFetcher::new(&transport, &notifier, &sleeper);
        let translator = crate::ports::translator::IdentityTranslator;
        let qualis = crate::ports::qualis::StaticQualisTable;
        let persistence = InMemoryPersistence {
            articles: RefCell::new(HashMap::new()),
            authors: RefCell::new(HashMap::new()),
        };

        let controller = CrawlController::new(&persistence, &notifier, &fetcher, &translator, &qualis);
        let summary = controller.run("mine detection dog", 2, YearFilter::None, &[]);

        assert!(summary.success);
        assert_eq!(summary.added, 2);
    }

    #[test]
    fn required_keyword_rejects_non_matching_paper() {
        let pages = vec![serde_json::json!({"data": [article_json(
            "Dog training techniques",
            "Positive reinforcement methods",
            "https://x/3"
        )]})];
        let transport = FakeTransport { pages: Mutex::new(pages) };
        let notifier = NullNotifier;
        let sleeper = NoopSleeper;
        let fetcher = HttpFetcher::new(&transport, &notifier, &sleeper);
        let translator = crate::ports::translator::IdentityTranslator;
        let qualis = crate::ports::qualis::StaticQualisTable;
        let persistence = InMemoryPersistence {
            articles: RefCell::new(HashMap::new()),
            authors: RefCell::new(HashMap::new()),
        };

        let controller = CrawlController::new(&persistence, &notifier, &fetcher, &translator, &qualis);
        let rules = vec![KeywordRule {
            term: "aggression".to_string(),
            required: true,
        }];
        let summary = controller.run("dog training", 5, YearFilter::None, &rules);

        assert!(!summary.success);
        assert_eq!(summary.added, 0);
    }

    #[test]
    fn existing_store_dedup_skips_known_article() {
        let existing = Article {
            title: "Detection dogs in mines".to_string(),
            venue: "-".to_string(),
            year: "2019".to_string(),
            citations: "1".to_string(),
            link: "https://x/y".to_string(),
            bibtex: "-".to_string(),
            cite_type: "-".to_string(),
            abstract_text: "Old abstract".to_string(),
            qualis: crate::core::Qualis::Nf,
            authors: Vec::new(),
            relevance_score: 50.0,
            concepts: BTreeSet::new(),
        };
        let pages = vec![serde_json::json!({"data": [article_json(
            "Detection dogs in mines",
            "A different abstract about the same paper.",
            "https://x/y"
        )]})];
        let transport = FakeTransport { pages: Mutex::new(pages) };
        let notifier = NullNotifier;
        let sleeper = NoopSleeper;
        let fetcher = HttpFetcher::new(&transport, &notifier, &sleeper);
        let translator = crate::ports::translator::IdentityTranslator;
        let qualis = crate::ports::qualis::StaticQualisTable;
        let mut articles_map = HashMap::new();
        articles_map.insert("detection dogs".to_string(), vec![existing]);
        let persistence = InMemoryPersistence {
            articles: RefCell::new(articles_map),
            authors: RefCell::new(HashMap::new()),
        };

        let controller = CrawlController::new(&persistence, &notifier, &fetcher, &translator, &qualis);
        let summary = controller.run("detection dogs", 3, YearFilter::None, &[]);

        assert!(!summary.success);
        assert_eq!(summary.added, 0);
    }
}
