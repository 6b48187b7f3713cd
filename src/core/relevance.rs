//! Builds concept groups from a query plus user keywords, scores candidate
//! papers against title/abstract, and decides keep / fallback / reject.

use super::synonyms::{PHRASE_SYNONYMS, TOKEN_SYNONYMS};
use super::text::{dedupe_adjacent_tokens, normalize, pluralize};
use std::collections::BTreeSet;

/// One user-supplied keyword constraint before it is folded into a
/// [`ConceptGroup`]. `label` defaults to the first form when absent;
/// `display_terms` defaults to `forms` when absent.
#[derive(Debug, Clone)]
pub struct KeywordInput {
    pub label: Option<String>,
    pub forms: Vec<String>,
    pub display_terms: Option<BTreeSet<String>>,
}

impl KeywordInput {
    pub fn new(term: impl Into<String>) -> Self {
        KeywordInput {
            label: None,
            forms: vec![term.into()],
            display_terms: None,
        }
    }
}

/// A cluster of surface forms (token, its synonyms, its inflections, or a
/// phrase and its paraphrases) treated as one matchable concept.
#[derive(Debug, Clone)]
pub struct ConceptGroup {
    pub name: String,
    pub terms: BTreeSet<String>,
    pub display_terms: BTreeSet<String>,
    pub weight: f64,
}

/// Value-typed scoring outcome for one (query, candidate paper) pair.
#[derive(Debug, Clone, Default)]
pub struct RelevanceResult {
    pub score: f64,
    pub matched_groups: usize,
    pub title_only_groups: usize,
    pub matched_terms: BTreeSet<String>,
    pub matched_concepts: BTreeSet<String>,
    pub core_matches: usize,
    pub mandatory_hits: BTreeSet<String>,
    pub mandatory_missing: BTreeSet<String>,
    pub optional_hits: BTreeSet<String>,
}

pub struct RelevanceEngine {
    pub normalized_query: String,
    pub concept_groups: Vec<ConceptGroup>,
    keyword_groups: Vec<BTreeSet<String>>,
    keyword_terms: BTreeSet<String>,
    mandatory_keywords: Vec<(String, BTreeSet<String>)>,
    optional_keywords: Vec<(String, BTreeSet<String>)>,
    total_concept_weight: f64,
    required_core_matches: usize,
    min_groups_required: usize,
    dynamic_threshold: f64,
}

fn expand_token_synonyms(token: &str) -> BTreeSet<String> {
    let mut expanded: BTreeSet<String> = BTreeSet::new();
    let bank_words: Vec<&str> = TOKEN_SYNONYMS
        .get(token)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
        .to_vec();

    let mut base_words: BTreeSet<String> = BTreeSet::new();
    base_words.insert(token.to_string());
    for w in &bank_words {
        base_words.insert(w.to_string());
    }

    for word in &base_words {
        expanded.extend(pluralize(word));
        expanded.insert(word.clone());
    }
    expanded.insert(token.to_string());
    expanded.retain(|t| t.len() > 2);
    expanded
}

fn expand_phrase_synonyms(phrase: &str) -> BTreeSet<String> {
    let mut expanded: BTreeSet<String> = BTreeSet::new();
    if let Some(synonyms) = PHRASE_SYNONYMS.get(phrase) {
        for syn in synonyms {
            expanded.extend(pluralize(syn));
            expanded.insert(syn.to_string());
        }
    }
    expanded
}

fn normalize_set(terms: &BTreeSet<String>) -> BTreeSet<String> {
    terms
        .iter()
        .map(|t| normalize(t))
        .filter(|t| !t.is_empty())
        .collect()
}

impl RelevanceEngine {
    pub fn new(raw_query: &str, mandatory: &[KeywordInput], optional: &[KeywordInput]) -> Self {
        let normalized_query = normalize(raw_query);
        let tokens: Vec<String> = normalized_query
            .split(' ')
            .filter(|t| t.len() > 2)
            .map(|t| t.to_string())
            .collect();

        let mut concept_groups: Vec<ConceptGroup> = Vec::new();
        let mut keyword_groups: Vec<BTreeSet<String>> = Vec::new();

        let mut used_indices: BTreeSet<usize> = BTreeSet::new();
        let mut phrase_hits: Vec<String> = Vec::new();
        for size in [3usize, 2usize] {
            if tokens.len() < size {
                continue;
            }
            for start in 0..=(tokens.len() - size) {
                let phrase = tokens[start..start + size].join(" ");
                if PHRASE_SYNONYMS.contains_key(phrase.as_str()) {
                    phrase_hits.push(phrase);
                    for i in start..start + size {
                        used_indices.insert(i);
                    }
                }
            }
        }

        for phrase in &phrase_hits {
            let expanded = expand_phrase_synonyms(phrase);
            let normalized = normalize_set(&expanded);
            if normalized.is_empty() {
                continue;
            }
            let mut display_terms: BTreeSet<String> = BTreeSet::new();
            display_terms.insert(phrase.clone());
            if let Some(synonyms) = PHRASE_SYNONYMS.get(phrase.as_str()) {
                display_terms.extend(synonyms.iter().map(|s| s.to_string()));
            }
            keyword_groups.push(normalized.clone());
            concept_groups.push(ConceptGroup {
                name: phrase.clone(),
                terms: normalized,
                display_terms,
                weight: 1.5,
            });
        }

        for (index, token) in tokens.iter().enumerate() {
            if used_indices.contains(&index) {
                continue;
            }
            let expanded = expand_token_synonyms(token);
            let normalized = normalize_set(&expanded);
            if normalized.is_empty() {
                continue;
            }
            let mut display_terms: BTreeSet<String> = BTreeSet::new();
            display_terms.insert(token.clone());
            if let Some(synonyms) = TOKEN_SYNONYMS.get(token.as_str()) {
                display_terms.extend(synonyms.iter().map(|s| s.to_string()));
            }
            keyword_groups.push(normalized.clone());
            concept_groups.push(ConceptGroup {
                name: token.clone(),
                terms: normalized,
                display_terms,
                weight: 1.0,
            });
        }

        let mut mandatory_keywords = Vec::new();
        let mut optional_keywords = Vec::new();
        integrate_keywords(
            mandatory,
            2.0,
            true,
            &mut mandatory_keywords,
            &mut concept_groups,
            &mut keyword_groups,
        );
        integrate_keywords(
            optional,
            0.8,
            false,
            &mut optional_keywords,
            &mut concept_groups,
            &mut keyword_groups,
        );

        let keyword_terms: BTreeSet<String> = concept_groups
            .iter()
            .flat_map(|g| g.terms.iter().cloned())
            .collect();

        let total_concept_weight: f64 = concept_groups.iter().map(|g| g.weight).sum();

        let core_group_count = concept_groups.iter().filter(|g| g.weight >= 1.0).count();
        let required_core_matches = if core_group_count >= 2 {
            (2usize).max(((core_group_count as f64) * 0.75).ceil() as usize)
        } else {
            (1usize).max(core_group_count)
        };
        let min_groups_required = if core_group_count > 0 {
            (1usize).max(((core_group_count as f64) * 0.5).ceil() as usize)
        } else {
            0
        };
        let dynamic_threshold = if keyword_groups.len() >= 3 { 42.0 } else { 35.0 };

        RelevanceEngine {
            normalized_query,
            concept_groups,
            keyword_groups,
            keyword_terms,
            mandatory_keywords,
            optional_keywords,
            total_concept_weight,
            required_core_matches,
            min_groups_required,
            dynamic_threshold,
        }
    }

    pub fn evaluate(&self, title: &str, abstract_text: &str) -> RelevanceResult {
        let t = normalize(title);
        let a = normalize(abstract_text);
        let c = format!("{t} {a}").trim().to_string();
        let keyword_basis = if !a.is_empty() { a.clone() } else { c.clone() };

        let mut mandatory_hits = BTreeSet::new();
        let mut mandatory_missing = BTreeSet::new();
        for (label, terms) in &self.mandatory_keywords {
            let hit = !keyword_basis.is_empty() && terms.iter().any(|term| keyword_basis.contains(term.as_str()));
            if hit {
                mandatory_hits.insert(label.clone());
            } else {
                mandatory_missing.insert(label.clone());
            }
        }

        let mut optional_hits = BTreeSet::new();
        for (label, terms) in &self.optional_keywords {
            let hit = !keyword_basis.is_empty() && terms.iter().any(|term| keyword_basis.contains(term.as_str()));
            if hit {
                optional_hits.insert(label.clone());
            }
        }

        let mut matched_groups = 0usize;
        let mut title_only_groups = 0usize;
        let mut matched_concepts = BTreeSet::new();
        let mut core_matches = 0usize;
        let mut matched_weight = 0.0f64;

        for group in &self.concept_groups {
            let abstract_hit = !a.is_empty() && group.terms.iter().any(|t| a.contains(t.as_str()));
            let title_hit = !t.is_empty() && group.terms.iter().any(|term| t.contains(term.as_str()));

            if abstract_hit {
                matched_groups += 1;
                matched_concepts.insert(group.name.clone());
                matched_weight += group.weight;
                if group.weight >= 1.0 {
                    core_matches += 1;
                }
            } else if title_hit {
                title_only_groups += 1;
                matched_concepts.insert(group.name.clone());
                matched_weight += group.weight * 0.4;
            }
        }

        let matched_terms: BTreeSet<String> = if !keyword_basis.is_empty() {
            self.keyword_terms
                .iter()
                .filter(|term| !term.is_empty() && keyword_basis.contains(term.as_str()))
                .cloned()
                .collect()
        } else {
            BTreeSet::new()
        };
        let keyword_coverage = if !self.keyword_terms.is_empty() {
            matched_terms.len() as f64 / self.keyword_terms.len() as f64 * 100.0
        } else {
            0.0
        };

        let ratio_title = if !t.is_empty() {
            partial_ratio(&self.normalized_query, &t)
        } else {
            0.0
        };
        let ratio_abstract = if !a.is_empty() {
            partial_ratio(&self.normalized_query, &a)
        } else {
            0.0
        };

        let coverage_ratio = if self.total_concept_weight > 0.0 {
            matched_weight / self.total_concept_weight * 100.0
        } else if !self.keyword_groups.is_empty() {
            matched_groups as f64 / self.keyword_groups.len() as f64 * 100.0
        } else {
            0.0
        };

        let mut score = 0.20 * ratio_title + 0.40 * ratio_abstract + 0.25 * coverage_ratio + 0.15 * keyword_coverage;
        score += 10.0 * mandatory_hits.len() as f64;
        score += 6.0 * optional_hits.len() as f64;
        score += 2.0 * title_only_groups as f64;
        let score = (score * 100.0).round() / 100.0;

        RelevanceResult {
            score,
            matched_groups,
            title_only_groups,
            matched_terms,
            matched_concepts,
            core_matches,
            mandatory_hits,
            mandatory_missing,
            optional_hits,
        }
    }

    pub fn should_keep(&self, result: &RelevanceResult, current_count: usize, desired: usize) -> bool {
        if !result.mandatory_missing.is_empty() {
            return false;
        }

        if self.keyword_groups.is_empty() && self.mandatory_keywords.is_empty() {
            return result.score >= 30.0 || current_count < desired;
        }

        if result.core_matches >= self.required_core_matches {
            return true;
        }
        if result.matched_groups >= self.min_groups_required && result.score >= self.dynamic_threshold {
            return true;
        }
        if result.core_matches + 1 >= self.required_core_matches && result.score >= self.dynamic_threshold + 5.0 {
            return true;
        }
        if current_count < desired && result.core_matches >= 1 && result.score >= (self.dynamic_threshold - 5.0).max(25.0) {
            return true;
        }
        false
    }

    pub fn build_targeted_queries(
        &self,
        max_groups: usize,
        max_terms_per_group: usize,
        max_combinations: usize,
    ) -> Vec<String> {
        if self.concept_groups.len() < 2 {
            return Vec::new();
        }

        let mut core_groups: Vec<&ConceptGroup> =
            self.concept_groups.iter().filter(|g| g.weight >= 1.0).collect();
        if core_groups.len() < 2 {
            core_groups = self.concept_groups.iter().take(2).collect();
        }

        let selected_groups: Vec<&ConceptGroup> = core_groups.into_iter().take(max_groups).collect();
        if selected_groups.len() < 2 {
            return Vec::new();
        }

        let mut option_lists: Vec<Vec<String>> = Vec::new();
        for group in &selected_groups {
            let mut candidates: BTreeSet<String> = group.display_terms.clone();
            candidates.insert(group.name.clone());
            let terms = sort_terms(&group.name, &candidates, max_terms_per_group);
            if terms.is_empty() {
                return Vec::new();
            }
            option_lists.push(terms);
        }

        let mut combinations: Vec<String> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut current: Vec<String> = Vec::new();
        build_combinations(&option_lists, 0, &mut current, &mut combinations, &mut seen, max_combinations);
        combinations
    }
}

fn integrate_keywords(
    inputs: &[KeywordInput],
    weight: f64,
    add_to_groups: bool,
    target_list: &mut Vec<(String, BTreeSet<String>)>,
    concept_groups: &mut Vec<ConceptGroup>,
    keyword_groups: &mut Vec<BTreeSet<String>>,
) {
    for keyword in inputs {
        if keyword.forms.is_empty() {
            continue;
        }
        let normalized_forms: BTreeSet<String> = keyword
            .forms
            .iter()
            .map(|f| normalize(f))
            .filter(|f| !f.is_empty())
            .collect();
        if normalized_forms.is_empty() {
            continue;
        }

        let label = keyword
            .label
            .clone()
            .unwrap_or_else(|| keyword.forms[0].trim().to_string());
        target_list.push((label.clone(), normalized_forms.clone()));

        let display: BTreeSet<String> = match &keyword.display_terms {
            Some(terms) if !terms.is_empty() => terms.clone(),
            _ => keyword.forms.iter().cloned().collect(),
        };
        let display = if display.is_empty() {
            BTreeSet::from([label.clone()])
        } else {
            display
        };

        concept_groups.push(ConceptGroup {
            name: label,
            terms: normalized_forms.clone(),
            display_terms: display,
            weight,
        });

        if add_to_groups {
            keyword_groups.push(normalized_forms);
        }
    }
}

fn sort_terms(base: &str, options: &BTreeSet<String>, max_terms: usize) -> Vec<String> {
    let base_clean = base.trim().to_string();
    let mut cleaned_options: Vec<String> = options
        .iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    cleaned_options.sort_by(|a, b| {
        let a_words = a.matches(' ').count();
        let b_words = b.matches(' ').count();
        b_words.cmp(&a_words).then_with(|| a.len().cmp(&b.len()))
    });

    let mut preferred: Vec<String> = Vec::new();
    if !base_clean.is_empty() {
        preferred.push(base_clean.clone());
    }
    for candidate in cleaned_options {
        if preferred.len() >= max_terms {
            break;
        }
        if !base_clean.is_empty() && candidate.eq_ignore_ascii_case(&base_clean) {
            continue;
        }
        preferred.push(candidate);
    }
    preferred.truncate(max_terms);
    preferred
}

fn build_combinations(
    option_lists: &[Vec<String>],
    index: usize,
    current: &mut Vec<String>,
    combinations: &mut Vec<String>,
    seen: &mut BTreeSet<String>,
    max_combinations: usize,
) {
    if combinations.len() >= max_combinations {
        return;
    }
    if index == option_lists.len() {
        let query = current.join(" ");
        let cleaned_query = dedupe_adjacent_tokens(&query);
        let normalized = normalize(&cleaned_query);
        if !normalized.is_empty() && !seen.contains(&normalized) {
            seen.insert(normalized);
            combinations.push(cleaned_query);
        }
        return;
    }
    for option in &option_lists[index] {
        if combinations.len() >= max_combinations {
            return;
        }
        current.push(option.clone());
        build_combinations(option_lists, index + 1, current, combinations, seen, max_combinations);
        current.pop();
    }
}

/// Levenshtein edit distance over char slices.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    let (n, m) = (a.len(), b.len());
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr: Vec<usize> = vec![0; m + 1];
    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

/// Levenshtein-based partial-ratio fuzzy match, scale 0-100: slides the
/// shorter string across the longer one and keeps the best local ratio.
/// An approximation of rapidfuzz's `partial_ratio` (which aligns via
/// difflib matching blocks rather than a fixed-width Levenshtein slide).
pub fn partial_ratio(query: &str, candidate: &str) -> f64 {
    let a: Vec<char> = query.chars().collect();
    let b: Vec<char> = candidate.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    let slen = shorter.len();
    let llen = longer.len();

    let mut best = 0.0f64;
    for start in 0..=(llen - slen) {
        let window = &longer[start..start + slen];
        let dist = levenshtein(shorter, window);
        let ratio = (1.0 - dist as f64 / slen as f64) * 100.0;
        if ratio > best {
            best = ratio;
        }
    }
    best.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_has_no_concept_groups() {
        let engine = RelevanceEngine::new("", &[], &[]);
        assert!(engine.concept_groups.is_empty());
        let result = engine.evaluate("Some title", "Some abstract");
        assert!(result.mandatory_missing.is_empty());
        assert!(engine.should_keep(&result, 0, 5) == (result.score >= 30.0 || 0 < 5));
    }

    #[test]
    fn mandatory_missing_blocks_keep() {
        let mandatory = vec![KeywordInput::new("aggression")];
        let engine = RelevanceEngine::new("dog training", &mandatory, &[]);
        let result = engine.evaluate("Dog training techniques", "Positive reinforcement methods");
        assert!(result.mandatory_missing.contains("aggression"));
        assert!(!engine.should_keep(&result, 0, 5));
    }

    #[test]
    fn two_core_concepts_score_above_threshold() {
        let engine = RelevanceEngine::new("mine detection dog", &[], &[]);
        let result = engine.evaluate(
            "Explosive detection using canines",
            "Canines are used for explosive detection in post-conflict landmine clearance.",
        );
        assert!(result.score >= 35.0, "score was {}", result.score);
    }

    #[test]
    fn targeted_query_cap_respects_limits() {
        let mut mandatory_like: Vec<KeywordInput> = Vec::new();
        for i in 0..4 {
            mandatory_like.push(KeywordInput {
                label: Some(format!("concept{i}")),
                forms: vec![format!("concept{i}")],
                display_terms: Some(
                    (0..5)
                        .map(|j| format!("concept{i} variant{j}"))
                        .collect(),
                ),
            });
        }
        let engine = RelevanceEngine::new("", &mandatory_like, &[]);
        let queries = engine.build_targeted_queries(3, 4, 6);
        assert_eq!(queries.len(), 6);
        let unique: BTreeSet<String> = queries.iter().map(|q| normalize(q)).collect();
        assert_eq!(unique.len(), queries.len());
    }
}
