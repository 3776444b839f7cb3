//! Frequency filtering of candidate strings (answers, predicates).
//!
//! One counting pass over the corpus, then a retention decision under either
//! a minimum-occurrence threshold or a top-N cutoff. Both modes also enforce a
//! maximum token length and full vocabulary coverage.
//!
//! Output order is deterministic: threshold mode keeps first-occurrence order,
//! top-N mode sorts by descending count and breaks ties by first occurrence.

use std::collections::HashMap;

use crate::error::DataError;
use crate::text;
use crate::vocabulary::Vocabulary;

/// How many distinct candidates survive the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep every candidate seen at least this many times.
    MinOccurrence(usize),
    /// Keep the N most frequent eligible candidates.
    TopN(usize),
}

/// Occurrence counts in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceCounts {
    order: Vec<String>,
    counts: HashMap<String, usize>,
}

impl OccurrenceCounts {
    /// Count candidates; empty strings carry no content and are not counted.
    pub fn from_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = Self::default();
        for candidate in candidates {
            counts.add(candidate.as_ref());
        }
        counts
    }

    /// Record one occurrence.
    pub fn add(&mut self, candidate: &str) {
        if candidate.is_empty() {
            return;
        }
        match self.counts.get_mut(candidate) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(candidate.to_string(), 1);
                self.order.push(candidate.to_string());
            }
        }
    }

    /// Occurrences of `candidate` (0 if never seen).
    pub fn count(&self, candidate: &str) -> usize {
        self.counts.get(candidate).copied().unwrap_or(0)
    }

    /// Number of distinct candidates.
    pub fn distinct(&self) -> usize {
        self.order.len()
    }

    /// Total occurrences counted.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Distinct candidates with counts, in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.order
            .iter()
            .map(|c| (c.as_str(), self.counts[c.as_str()]))
    }

    /// Distinct candidates by descending count, ties in first-occurrence order.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> = self.iter().collect();
        // stable: equal counts keep encounter order
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

/// Result of a filtering pass.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Retained candidates in deterministic order.
    pub retained: Vec<String>,
    /// Counts for every distinct candidate, kept for diagnostics.
    pub counts: OccurrenceCounts,
}

/// Retains frequent candidates that the vocabulary fully covers.
pub struct FrequencyFilter<'a> {
    vocabulary: &'a Vocabulary,
    policy: RetentionPolicy,
    max_tokens: Option<usize>,
}

impl<'a> FrequencyFilter<'a> {
    /// Create a filter with no token-length bound.
    pub fn new(vocabulary: &'a Vocabulary, policy: RetentionPolicy) -> Self {
        Self {
            vocabulary,
            policy,
            max_tokens: None,
        }
    }

    /// Reject candidates with more than `max_tokens` tokens.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn eligible(&self, candidate: &str) -> bool {
        let within_len = self
            .max_tokens
            .map_or(true, |max| text::token_count(candidate) <= max);
        within_len && self.vocabulary.covers(candidate)
    }

    /// Count `candidates` and decide which to retain.
    pub fn apply<I, S>(&self, candidates: I) -> Result<FilterOutcome, DataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let counts = OccurrenceCounts::from_candidates(candidates);
        tracing::debug!(
            "Counted {} occurrences of {} distinct candidates",
            counts.total(),
            counts.distinct()
        );

        let retained: Vec<String> = match self.policy {
            RetentionPolicy::MinOccurrence(min) => counts
                .iter()
                .filter(|&(c, n)| n >= min && self.eligible(c))
                .map(|(c, _)| c.to_string())
                .collect(),
            RetentionPolicy::TopN(limit) => counts
                .most_common()
                .into_iter()
                .filter(|&(c, _)| self.eligible(c))
                .take(limit)
                .map(|(c, _)| c.to_string())
                .collect(),
        };

        self.verify(&retained)?;

        tracing::info!(
            "Retained {} of {} distinct candidates ({:?})",
            retained.len(),
            counts.distinct(),
            self.policy,
        );

        Ok(FilterOutcome { retained, counts })
    }

    /// Every retained token must be in the vocabulary.
    fn verify(&self, retained: &[String]) -> Result<(), DataError> {
        for item in retained {
            if let Some(token) = self.vocabulary.first_missing(item) {
                return Err(DataError::OutOfVocabulary {
                    item: item.clone(),
                    token: token.to_string(),
                });
            }
        }
        Ok(())
    }
}
