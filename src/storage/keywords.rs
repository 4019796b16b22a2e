//! Keyword extraction used by [`super::content_storage::ContentStorage`]
//! when a crawled page carries no explicit `meta[name=keywords]` (spec
//! §4.13: "extract keywords from text via frequency-after-stopword-removal").

use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "else", "of", "at", "by", "for", "with",
    "about", "against", "between", "into", "through", "during", "before", "after", "above",
    "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under", "again",
    "further", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing", "it", "its", "this", "that", "these", "those", "as", "not",
    "no", "so", "than", "too", "very", "can", "will", "just", "should", "now", "you", "your",
    "we", "our", "i", "he", "she", "they", "them", "his", "her", "their",
];

/// Extracts up to `limit` keywords from `text`, ranked by frequency after
/// lowercasing, tokenizing on non-alphanumeric boundaries, dropping
/// stopwords and single-character tokens.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for raw in text.split(|c: char| !c.is_alphanumeric()) {
        if raw.is_empty() {
            continue;
        }
        let token = raw.to_lowercase();
        if token.len() < 2 || STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        if !counts.contains_key(&token) {
            order.push(token.clone());
        }
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut ranked: Vec<String> = order;
    ranked.sort_by(|a, b| counts[b].cmp(&counts[a]).then_with(|| a.cmp(b)));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_repeated_terms_above_single_occurrences() {
        let keywords = extract_keywords("rust rust rust search engine search the a", 3);
        assert_eq!(keywords[0], "rust");
        assert_eq!(keywords[1], "search");
    }

    #[test]
    fn drops_stopwords_and_short_tokens() {
        let keywords = extract_keywords("the a is of it to", 10);
        assert!(keywords.is_empty());
    }

    #[test]
    fn respects_limit() {
        let keywords = extract_keywords("alpha beta gamma delta epsilon", 2);
        assert_eq!(keywords.len(), 2);
    }
}
