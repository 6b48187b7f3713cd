//! Pure text-normalization helpers used throughout the relevance engine.
//! No state, no I/O — everything here is a free function over `&str`.

use std::collections::BTreeSet;

/// Lowercase; replace any character outside `[A-Za-z0-9_- ]` with a space;
/// collapse runs of `-`/`_` to a single space; collapse whitespace; trim.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut scrubbed = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch.is_whitespace() {
            scrubbed.push(ch);
        } else {
            scrubbed.push(' ');
        }
    }

    let mut collapsed_dashes = String::with_capacity(scrubbed.len());
    let mut in_dash_run = false;
    for ch in scrubbed.chars() {
        if ch == '-' || ch == '_' {
            if !in_dash_run {
                collapsed_dashes.push(' ');
                in_dash_run = true;
            }
        } else {
            collapsed_dashes.push(ch);
            in_dash_run = false;
        }
    }

    collapsed_dashes
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Given a lowercased `base` of at least 4 characters, return `{base, ...}`
/// extended with a plural/inflected form, a past-tense form, and `-ing`.
/// Bases shorter than 4 characters return just `{base}`.
pub fn pluralize(base: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    out.insert(base.to_string());

    if base.len() < 4 {
        return out;
    }

    let chars: Vec<char> = base.chars().collect();
    let last = chars[chars.len() - 1];
    let prev = if chars.len() >= 2 {
        Some(chars[chars.len() - 2])
    } else {
        None
    };

    if last == 'y' && !matches!(prev, Some('a' | 'e' | 'i' | 'o' | 'u')) {
        let mut stem = base.to_string();
        stem.pop();
        out.insert(format!("{stem}ies"));
    } else if matches!(last, 's' | 'x' | 'z') {
        out.insert(format!("{base}es"));
    } else {
        out.insert(format!("{base}s"));
    }

    if last == 'e' {
        out.insert(format!("{base}d"));
    } else {
        out.insert(format!("{base}ed"));
    }

    out.insert(format!("{base}ing"));
    out
}

/// Split on whitespace, drop tokens equal (case-insensitively) to the
/// immediately previous kept token, rejoin with single spaces.
pub fn dedupe_adjacent_tokens(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for token in text.split_whitespace() {
        let is_repeat = kept
            .last()
            .map(|prev| prev.eq_ignore_ascii_case(token))
            .unwrap_or(false);
        if !is_repeat {
            kept.push(token);
        }
    }
    kept.join(" ")
}
