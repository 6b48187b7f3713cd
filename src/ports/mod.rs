//! Abstract interfaces the crawl core consumes (§4.H), plus reference
//! implementations of each (§10) so the crate is runnable standalone.

pub mod notifier;
pub mod persistence;
pub mod qualis;
pub mod tor;
pub mod transport;
pub mod translator;

use crate::core::{Article, Author};
use std::collections::HashMap;
use std::time::Duration;

/// One HTTP response as seen by [`crate::fetch::HttpFetcher`]: status code,
/// response headers (lower-cased names), and the raw body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Failure modes a transport can raise that are *not* expressed as an HTTP
/// status code (those come back as an `Ok(RawResponse)` with that status).
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

pub trait TransportPort {
    fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

/// Retry-kind reported to [`NotifierPort::on_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    RateLimit,
    Transient,
}

/// Fire-and-forget progress/outcome notifications. No return values, no
/// ordering guarantee beyond the order the controller calls them in.
pub trait NotifierPort {
    fn on_strategy_start(&self, description: &str, index: usize, total: usize);
    fn on_strategy_result(&self, description: &str, new_accepted: usize, total_received: usize);
    fn on_retry(&self, kind: RetryKind, wait_seconds: u64, attempt: u32, max: u32);
    fn on_success(&self, elapsed: Duration, added: usize);
    fn on_failure(&self, message: &str);
    fn on_empty_export(&self, merge: bool, search: &str);
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistenceError {
    #[error("missing or corrupt store: {0}")]
    MissingOrCorrupt(String),
}

/// Load/save of previously-accepted articles and authors, keyed by a
/// sanitized search label. Implementations must be atomic per call; load
/// failures should be surfaced as [`PersistenceError::MissingOrCorrupt`],
/// which the controller treats as an empty collection.
pub trait PersistencePort {
    fn load_articles(&self, label: &str) -> Result<Vec<Article>, PersistenceError>;
    fn load_authors(&self, label: &str) -> Result<Vec<Author>, PersistenceError>;
    fn save_articles(&self, label: &str, articles: &[Article]) -> Result<(), PersistenceError>;
    fn save_authors(&self, label: &str, authors: &[Author]) -> Result<(), PersistenceError>;
}

/// `variants(text) -> ordered, duplicate-free sequence` containing the
/// original and, if different, its translated form. Lossless fallback to
/// `[text]` on error.
pub trait TranslatorPort {
    fn variants(&self, text: &str) -> Vec<String>;
}

/// Pure function `journal -> qualis grade`.
pub trait QualisPort {
    fn lookup(&self, venue: &str) -> crate::core::Qualis;
}
