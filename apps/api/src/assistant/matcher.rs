//! Local Matcher: greedy keyword-substring scorer over the knowledge base.
//!
//! Algorithm:
//! 1. Empty query → no match.
//! 2. Lowercase the query.
//! 3. score(entry) = number of its keywords contained in the query (substring, not word match).
//! 4. Single pass, strict `>`: the first entry reaching the best score wins ties.
//! 5. Best score 0 → no match.

use crate::assistant::knowledge_base::KnowledgeEntry;

/// Returns the canned response of the best-scoring entry, if any keyword hit.
pub fn find_best_match(query: &str, entries: &[KnowledgeEntry]) -> Option<&'static str> {
    if query.is_empty() {
        return None;
    }
    let lower_query = query.to_lowercase();

    let mut best: Option<&KnowledgeEntry> = None;
    let mut max_score = 0;

    for entry in entries {
        let score = keyword_score(entry, &lower_query);
        if score > max_score {
            max_score = score;
            best = Some(entry);
        }
    }

    best.map(|e| e.response)
}

/// Count of `entry` keywords that occur in `lower_query`.
pub fn keyword_score(entry: &KnowledgeEntry, lower_query: &str) -> usize {
    entry
        .keywords
        .iter()
        .filter(|kw| lower_query.contains(*kw))
        .count()
}
