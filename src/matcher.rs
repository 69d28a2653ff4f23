use std::collections::HashSet;

/// Minimum score for a candidate to count as a match at all.
const MATCH_THRESHOLD: f64 = 0.65;

/// A compound pair must beat the running best by this factor to take over.
const COMPOUND_TAKEOVER_FACTOR: f64 = 0.95;

/// Recorded score of an accepted compound pair is damped by this factor.
const COMPOUND_SCORE_DAMPING: f64 = 0.75;

/// Sub-word fragments used to decompose German compound room/device names.
/// Stored pre-normalized (umlauts folded) so containment checks against
/// normalized text can actually hit.
const COMPOUND_FRAGMENTS: [&str; 17] = [
    "wohn",
    "zimmer",
    "schlaf",
    "kinder",
    "bade",
    "ess",
    "arbeits",
    "buero",
    "wohnzimmer",
    "schlafzimmer",
    "kueche",
    "bad",
    "flur",
    "keller",
    "garage",
    "garten",
    "licht",
];

/// How a match was found, ordered by the stage that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    Contains,
    TokenSet,
    Fuzzy,
    Compound,
}

/// Best match for a query, only produced at or above [`MATCH_THRESHOLD`].
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub score: f64,
    pub match_type: MatchType,
    pub matched_id: String,
}

/// Fold case, map German special characters to ASCII digraphs, trim.
///
/// Idempotent: folding already-folded text is a no-op.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
        .replace('ß', "ss")
        .trim()
        .to_string()
}

/// Jaro similarity with Winkler prefix boost, on normalized input.
pub fn jaro_winkler(s1: &str, s2: &str) -> f64 {
    let s1 = normalize(s1);
    let s2 = normalize(s2);

    if s1 == s2 {
        return if s1.is_empty() { 0.0 } else { 1.0 };
    }

    let c1: Vec<char> = s1.chars().collect();
    let c2: Vec<char> = s2.chars().collect();
    let len1 = c1.len();
    let len2 = c2.len();

    if len1 == 0 || len2 == 0 {
        return 0.0;
    }

    // Characters match when equal and within half the longer length.
    let match_distance = (len1.max(len2) / 2).saturating_sub(1);
    let mut matches1 = vec![false; len1];
    let mut matches2 = vec![false; len2];
    let mut matches = 0usize;

    for i in 0..len1 {
        let start = i.saturating_sub(match_distance);
        let end = (i + match_distance + 1).min(len2);
        for j in start..end {
            if matches2[j] || c1[i] != c2[j] {
                continue;
            }
            matches1[i] = true;
            matches2[j] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    // Count transpositions among the matched characters.
    let mut transpositions = 0usize;
    let mut k = 0usize;
    for i in 0..len1 {
        if !matches1[i] {
            continue;
        }
        while !matches2[k] {
            k += 1;
        }
        if c1[i] != c2[k] {
            transpositions += 1;
        }
        k += 1;
    }

    let m = matches as f64;
    let jaro = (m / len1 as f64
        + m / len2 as f64
        + (m - transpositions as f64 / 2.0) / m)
        / 3.0;

    // Winkler boost for up to 4 shared leading characters.
    let mut prefix = 0usize;
    for i in 0..len1.min(len2).min(4) {
        if c1[i] == c2[i] {
            prefix += 1;
        } else {
            break;
        }
    }

    jaro + prefix as f64 * 0.1 * (1.0 - jaro)
}

/// Jaccard similarity over whitespace-delimited token sets.
pub fn token_set_ratio(s1: &str, s2: &str) -> f64 {
    let n1 = normalize(s1);
    let n2 = normalize(s2);
    let tokens1: HashSet<&str> = n1.split_whitespace().collect();
    let tokens2: HashSet<&str> = n2.split_whitespace().collect();

    let union = tokens1.union(&tokens2).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = tokens1.intersection(&tokens2).count();

    intersection as f64 / union as f64
}

/// Multi-stage fuzzy matcher tolerant of German spelling and compounding.
pub struct FuzzyMatcher {
    fragments: Vec<String>,
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self::with_fragments(&[])
    }

    /// Extra fragments extend the built-in dictionary; they are normalized
    /// on ingest and empty ones are dropped (an empty fragment would match
    /// every word).
    pub fn with_fragments(extra: &[String]) -> Self {
        let mut fragments: Vec<String> =
            COMPOUND_FRAGMENTS.iter().map(|f| f.to_string()).collect();
        for f in extra {
            let f = normalize(f);
            if !f.is_empty() {
                fragments.push(f);
            }
        }
        Self { fragments }
    }

    /// Decompose a word into candidate fragments. Always includes the
    /// normalized whole word; known fragments additionally contribute the
    /// fragment plus the word with that fragment's first occurrence removed.
    pub fn split_compound(&self, word: &str) -> Vec<String> {
        let normalized = normalize(word);
        let mut parts = vec![normalized.clone()];

        for fragment in &self.fragments {
            if normalized.contains(fragment.as_str()) && normalized.len() > fragment.len() {
                let remainder = normalized.replacen(fragment.as_str(), "", 1);
                if !remainder.is_empty() {
                    parts.push(fragment.clone());
                    parts.push(remainder);
                }
            }
        }

        parts
    }

    /// Score `query` against `(name, id)` candidate pairs in input order.
    ///
    /// Stages per candidate: exact (returns immediately), contains,
    /// token-set, Jaro-Winkler, compound. The running best is only replaced
    /// by a strictly greater score, so ties keep the first candidate seen.
    pub fn find_best_match(
        &self,
        query: &str,
        candidates: &[(&str, &str)],
    ) -> Option<MatchResult> {
        if candidates.is_empty() {
            return None;
        }

        let normalized_query = normalize(query);
        let query_parts = self.split_compound(query);

        let mut best_score = 0.0f64;
        let mut best_type = MatchType::Exact;
        let mut best_id: Option<&str> = None;

        for &(candidate, candidate_id) in candidates {
            let normalized_candidate = normalize(candidate);

            // Stage 1: exact match wins outright.
            if normalized_query == normalized_candidate {
                return Some(MatchResult {
                    score: 1.0,
                    match_type: MatchType::Exact,
                    matched_id: candidate_id.to_string(),
                });
            }

            // Stage 2: substring containment, weighted by length overlap.
            let contains_score = if normalized_candidate.contains(&normalized_query) {
                let extra = (normalized_candidate.len() - normalized_query.len()) as f64
                    / normalized_candidate.len() as f64;
                0.85 + 0.05 * (1.0 - extra)
            } else if normalized_query.contains(&normalized_candidate) {
                0.80
            } else {
                0.0
            };
            if contains_score > best_score {
                best_score = contains_score;
                best_type = MatchType::Contains;
                best_id = Some(candidate_id);
            }

            // Stage 3: token overlap.
            let token_score = token_set_ratio(query, candidate) * 0.80;
            if token_score > best_score {
                best_score = token_score;
                best_type = MatchType::TokenSet;
                best_id = Some(candidate_id);
            }

            // Stage 4: edit similarity, only trusted above 0.75.
            let jaro_score = jaro_winkler(query, candidate);
            if jaro_score > 0.75 && jaro_score > best_score {
                best_score = jaro_score;
                best_type = MatchType::Fuzzy;
                best_id = Some(candidate_id);
            }

            // Stage 5: fragment-vs-fragment similarity for compound words.
            // An accepted pair records a damped score, which may sit below
            // the previous best; that is the intended takeover rule.
            let candidate_parts = self.split_compound(candidate);
            for q_part in &query_parts {
                for c_part in &candidate_parts {
                    let part_score = jaro_winkler(q_part, c_part);
                    if part_score > 0.80 && part_score > best_score * COMPOUND_TAKEOVER_FACTOR {
                        best_score = part_score * COMPOUND_SCORE_DAMPING;
                        best_type = MatchType::Compound;
                        best_id = Some(candidate_id);
                    }
                }
            }
        }

        match best_id {
            Some(id) if best_score >= MATCH_THRESHOLD => Some(MatchResult {
                score: best_score,
                match_type: best_type,
                matched_id: id.to_string(),
            }),
            _ => None,
        }
    }

    /// Whether `query` matches the single `candidate` above threshold.
    pub fn matches(&self, query: &str, candidate: &str) -> bool {
        let pair = [(candidate, candidate)];
        self.find_best_match(query, &pair).is_some()
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}
