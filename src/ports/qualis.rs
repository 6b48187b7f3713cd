//! Illustrative, non-authoritative [`QualisPort`]: a small static
//! substring-matching table over a handful of well-known venues, defaulting
//! to `NF` for anything unrecognized.

use super::QualisPort;
use crate::core::Qualis;

const TABLE: &[(&str, Qualis)] = &[
    ("nature", Qualis::A1),
    ("science", Qualis::A1),
    ("ieee transactions", Qualis::A1),
    ("acm transactions", Qualis::A2),
    ("plos one", Qualis::A3),
    ("arxiv", Qualis::Np),
];

pub struct StaticQualisTable;

impl QualisPort for StaticQualisTable {
    fn lookup(&self, venue: &str) -> Qualis {
        if venue.trim().is_empty() || venue == "-" {
            return Qualis::Nf;
        }
        let lowered = venue.to_lowercase();
        TABLE
            .iter()
            .find(|(needle, _)| lowered.contains(needle))
            .map(|(_, grade)| *grade)
            .unwrap_or(Qualis::Nf)
    }
}
