//! Block-word suppression for raw search results.

use crate::types::{Candidate, Query, RawResult};

/// Drop every result whose `title + " " + snippet` contains any block word.
///
/// Matching is case-sensitive plain substring, not word-boundary: a block
/// word can over-match inside a longer unrelated phrase, and a false drop
/// is preferred over a spam notification.
pub fn apply_block_words(
    results: Vec<RawResult>,
    query: &Query,
    block_words: &[String],
) -> Vec<Candidate> {
    results
        .into_iter()
        .filter(|r| {
            let haystack = format!("{} {}", r.title, r.snippet);
            let hit = block_words
                .iter()
                .find(|w| !w.is_empty() && haystack.contains(w.as_str()));
            if let Some(word) = hit {
                tracing::debug!(
                    query = %query.label,
                    link = %r.link,
                    block_word = %word,
                    "filter.dropped"
                );
                false
            } else {
                true
            }
        })
        .map(|result| Candidate {
            result,
            query_label: query.label.clone(),
        })
        .collect()
}
