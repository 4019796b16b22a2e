//! Scorer (C11): tagged-enum `ScoringAlgorithm` per spec.md §9 Design Note
//! ("avoid virtual-class polymorphism; use a tagged container"), grounded
//! in `original_source/include/search_engine/scoring/SearchScorer.h`'s
//! `BM25Algorithm`/`TFIDFAlgorithm`/`RedisSearchCombinedAlgorithm`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{DocumentScore, QueryNode};
use crate::query;

use super::config::{CorpusStats, FieldWeights, ScoringConfig};

/// Document fields as handed to the scorer, the Rust analogue of the
/// header's `DocumentInfo`.
#[derive(Debug, Clone)]
pub struct ScorableDocument {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub domain: String,
    pub base_score: f64,
    pub indexed_at: DateTime<Utc>,
}

impl ScorableDocument {
    pub fn content_length(&self) -> usize {
        self.content.split_whitespace().count().max(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryInfo {
    pub terms: Vec<String>,
    pub exact_phrases: Vec<String>,
    pub term_weights: HashMap<String, f64>,
    pub require_all_terms: bool,
}

/// `SearchScorer::extractQueryInfo` (spec §4.10): walks the Query AST (C10)
/// collecting terms/phrases; `requireAllTerms` is true only when the AST is
/// a pure conjunction (no `Or` node anywhere).
pub fn extract_query_info(query_str: &str) -> QueryInfo {
    let Ok(ast) = query::parse(query_str) else { return QueryInfo::default() };
    let mut info = QueryInfo::default();
    let mut saw_or = false;
    collect(&ast, &mut info, &mut saw_or);
    info.require_all_terms = !saw_or;
    info
}

fn collect(node: &QueryNode, info: &mut QueryInfo, saw_or: &mut bool) {
    match node {
        QueryNode::Term { value, exact } => {
            if *exact {
                info.exact_phrases.push(value.clone());
            } else {
                info.terms.push(value.clone());
            }
            info.term_weights.entry(value.clone()).or_insert(1.0);
        }
        QueryNode::Filter { .. } => {}
        QueryNode::And(children) => {
            for child in children {
                collect(child, info, saw_or);
            }
        }
        QueryNode::Or(children) => {
            *saw_or = true;
            for child in children {
                collect(child, info, saw_or);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringAlgorithm {
    Bm25,
    TfIdf,
    Hybrid,
}

impl ScoringAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            ScoringAlgorithm::Bm25 => "BM25",
            ScoringAlgorithm::TfIdf => "TF-IDF",
            ScoringAlgorithm::Hybrid => "RedisSearchCombined+BM25",
        }
    }

    pub fn score_document(
        self,
        doc: &ScorableDocument,
        query: &QueryInfo,
        config: &ScoringConfig,
        corpus: &CorpusStats,
    ) -> DocumentScore {
        match self {
            ScoringAlgorithm::Bm25 => score_bm25(doc, query, config, corpus),
            ScoringAlgorithm::TfIdf => score_tfidf(doc, query, config, corpus),
            ScoringAlgorithm::Hybrid => score_hybrid(doc, query, config, corpus),
        }
    }
}

fn calculate_term_frequency(tf: usize, params: &super::config::TfParams) -> f64 {
    let capped = (tf as f64).min(params.max_term_frequency);
    if params.use_log_normalization {
        (1.0 + capped).ln()
    } else {
        capped
    }
}

fn calculate_field_weight(field: &str, weights: &FieldWeights) -> f64 {
    match field {
        "title" => weights.title,
        "description" => weights.description,
        "content" => weights.content,
        "keywords" => weights.keywords,
        "url" => weights.url,
        "domain" => weights.domain,
        _ => 1.0,
    }
}

fn count_term_occurrences(text: &str, term: &str) -> usize {
    let term_lower = term.to_lowercase();
    text.split_whitespace().filter(|w| w.to_lowercase().trim_matches(|c: char| !c.is_alphanumeric()) == term_lower).count()
}

fn contains_exact_phrase(text: &str, phrase: &str) -> bool {
    text.to_lowercase().contains(&phrase.to_lowercase())
}

struct FieldHits {
    title: f64,
    content: f64,
    description: f64,
    keyword: f64,
    url: f64,
    matched_terms: usize,
}

fn field_hits(
    doc: &ScorableDocument,
    query: &QueryInfo,
    config: &ScoringConfig,
    term_score: impl Fn(usize, &str) -> f64,
) -> FieldHits {
    let mut hits = FieldHits { title: 0.0, content: 0.0, description: 0.0, keyword: 0.0, url: 0.0, matched_terms: 0 };
    let keywords_text = doc.keywords.join(" ");

    for term in &query.terms {
        let weight = *query.term_weights.get(term).unwrap_or(&1.0);
        let mut matched_any = false;

        let title_tf = count_term_occurrences(&doc.title, term);
        if title_tf > 0 {
            hits.title += term_score(title_tf, term) * calculate_field_weight("title", &config.field_weights) * weight;
            matched_any = true;
        }
        let content_tf = count_term_occurrences(&doc.content, term);
        if content_tf > 0 {
            hits.content += term_score(content_tf, term) * calculate_field_weight("content", &config.field_weights) * weight;
            matched_any = true;
        }
        let description_tf = count_term_occurrences(&doc.description, term);
        if description_tf > 0 {
            hits.description +=
                term_score(description_tf, term) * calculate_field_weight("description", &config.field_weights) * weight;
            matched_any = true;
        }
        let keyword_tf = count_term_occurrences(&keywords_text, term);
        if keyword_tf > 0 {
            hits.keyword += term_score(keyword_tf, term) * calculate_field_weight("keywords", &config.field_weights) * weight;
            matched_any = true;
        }
        let url_tf = count_term_occurrences(&doc.url, term);
        if url_tf > 0 {
            hits.url += term_score(url_tf, term) * calculate_field_weight("url", &config.field_weights) * weight;
            matched_any = true;
        }

        if matched_any {
            hits.matched_terms += 1;
        }
    }

    hits
}

fn apply_boosts(score: &mut DocumentScore, doc: &ScorableDocument, query: &QueryInfo, config: &ScoringConfig) {
    let mut boost = 1.0;
    let full_text = format!("{} {} {}", doc.title, doc.description, doc.content);
    if query.exact_phrases.iter().any(|phrase| contains_exact_phrase(&full_text, phrase)) {
        boost *= config.boost_factors.exact_match_boost;
        score.exact_match_score = config.boost_factors.exact_match_boost;
    }
    if query.terms.iter().any(|term| count_term_occurrences(&doc.title, term) > 0) {
        boost *= config.boost_factors.title_match_boost;
    }
    if config.authoritative_domains.iter().any(|d| d.eq_ignore_ascii_case(&doc.domain)) {
        boost *= config.boost_factors.domain_authority_boost;
    }
    boost *= freshness_multiplier(doc.indexed_at, config);
    score.boost_score = boost;
    score.total_score *= boost;
}

/// Linear decay from `freshnessBoost` at age 0 down to `1.0` at
/// `2 * freshness_window_days`, per spec §4.10's "freshness boost based on
/// indexedAt age". Documents indexed in the future (clock skew) get the
/// full boost rather than an undefined negative age.
fn freshness_multiplier(indexed_at: DateTime<Utc>, config: &ScoringConfig) -> f64 {
    let window = config.freshness_window_days.max(1) as f64;
    let age_days = (Utc::now() - indexed_at).num_seconds() as f64 / 86_400.0;
    let age_days = age_days.max(0.0);
    let extra = config.boost_factors.freshness_boost - 1.0;
    if age_days >= 2.0 * window {
        1.0
    } else if age_days <= window {
        1.0 + extra
    } else {
        1.0 + extra * (1.0 - (age_days - window) / window)
    }
}

fn finalize(mut score: DocumentScore, doc: &ScorableDocument, query: &QueryInfo, config: &ScoringConfig, hits: &FieldHits) -> DocumentScore {
    score.title_score = hits.title;
    score.content_score = hits.content;
    score.description_score = hits.description;
    score.keyword_score = hits.keyword;
    score.url_score = hits.url;
    score.field_weight_score = hits.title + hits.content + hits.description + hits.keyword + hits.url;
    score.matched_terms = hits.matched_terms;
    score.total_terms = query.terms.len();
    score.total_score = score.field_weight_score;
    apply_boosts(&mut score, doc, query, config);
    score.explanation = format!(
        "{}/{} terms matched in {} (base={:.3})",
        score.matched_terms, score.total_terms, doc.url, doc.base_score
    );
    score
}

fn score_bm25(doc: &ScorableDocument, query: &QueryInfo, config: &ScoringConfig, corpus: &CorpusStats) -> DocumentScore {
    let doc_len = doc.content_length() as f64;
    let params = config.bm25_params;
    let hits = field_hits(doc, query, config, |tf, term| {
        let df = corpus.document_frequency(term) as f64;
        let n = corpus.total_documents as f64;
        let idf = ((n - df + 0.5) / (df + 0.5)).max(f64::EPSILON).ln();
        let tf = tf as f64;
        let denom = tf + params.k1 * (1.0 - params.b + params.b * (doc_len / corpus.avg_document_length));
        idf * (tf * (params.k1 + 1.0)) / denom.max(f64::EPSILON)
    });

    let score = DocumentScore { document_id: doc.id.clone(), ..Default::default() };
    finalize(score, doc, query, config, &hits)
}

fn score_tfidf(doc: &ScorableDocument, query: &QueryInfo, config: &ScoringConfig, corpus: &CorpusStats) -> DocumentScore {
    let hits = field_hits(doc, query, config, |tf, term| {
        let df = corpus.document_frequency(term) as f64;
        let n = corpus.total_documents as f64;
        let idf = (n / (1.0 + df)).ln().max(0.0);
        calculate_term_frequency(tf, &config.tf_params) * idf
    });

    let score = DocumentScore { document_id: doc.id.clone(), ..Default::default() };
    finalize(score, doc, query, config, &hits)
}

/// Hybrid blends the index's own relevance score with BM25, per spec
/// §4.10's "base-score blending": `0.3 * indexBaseScore + 0.7 * algorithmScore`
/// when the index actually produced a positive base score.
fn score_hybrid(doc: &ScorableDocument, query: &QueryInfo, config: &ScoringConfig, corpus: &CorpusStats) -> DocumentScore {
    let mut bm25 = score_bm25(doc, query, config, corpus);
    if doc.base_score > 0.0 {
        bm25.total_score = 0.3 * doc.base_score + 0.7 * bm25.total_score;
    }
    bm25
}

/// `rankResults` (spec §4.10): scores every document, drops anything below
/// `minScore`, optionally normalizes to `[0, 1]`, then sorts by score
/// descending with a deterministic tie-break on document id (spec P10/P11).
pub fn rank_results(
    algorithm: ScoringAlgorithm,
    docs: &[ScorableDocument],
    query_str: &str,
    config: &ScoringConfig,
    corpus: &CorpusStats,
    top_k: usize,
) -> Vec<DocumentScore> {
    let query = extract_query_info(query_str);
    let mut scores: Vec<DocumentScore> = docs
        .iter()
        .map(|doc| algorithm.score_document(doc, &query, config, corpus))
        .filter(|s| s.total_score >= config.min_score)
        .collect();

    if config.normalize_scores {
        if let Some(max) = scores.iter().map(|s| s.total_score).fold(None, |acc: Option<f64>, x| {
            Some(acc.map_or(x, |m| m.max(x)))
        }) {
            if max > 0.0 {
                for s in &mut scores {
                    s.total_score /= max;
                }
            }
        }
    }

    scores.sort_by(|a, b| {
        b.total_score.partial_cmp(&a.total_score).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.document_id.cmp(&b.document_id))
    });

    if top_k > 0 {
        scores.truncate(top_k);
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str, content: &str) -> ScorableDocument {
        ScorableDocument {
            id: id.to_string(),
            url: format!("https://example.com/{id}"),
            title: title.to_string(),
            content: content.to_string(),
            description: String::new(),
            keywords: vec![],
            domain: "example.com".to_string(),
            base_score: 1.0,
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn title_matches_outrank_content_only_matches() {
        let config = ScoringConfig::create_default();
        let corpus = CorpusStats::default();
        let query = extract_query_info("rust");

        let title_doc = doc("a", "Rust programming", "unrelated text");
        let content_doc = doc("b", "Unrelated", "some rust appears here");

        let a = ScoringAlgorithm::Bm25.score_document(&title_doc, &query, &config, &corpus);
        let b = ScoringAlgorithm::Bm25.score_document(&content_doc, &query, &config, &corpus);
        assert!(a.total_score > b.total_score);
    }

    #[test]
    fn rank_results_is_deterministic_for_tied_scores() {
        let config = ScoringConfig::create_default();
        let corpus = CorpusStats::default();
        let docs = vec![doc("z", "rust", "rust"), doc("a", "rust", "rust")];
        let ranked = rank_results(ScoringAlgorithm::TfIdf, &docs, "rust", &config, &corpus, 0);
        assert_eq!(ranked[0].document_id, "a");
    }

    #[test]
    fn below_min_score_documents_are_dropped() {
        let mut config = ScoringConfig::create_default();
        config.min_score = 1000.0;
        let corpus = CorpusStats::default();
        let docs = vec![doc("a", "rust", "rust")];
        let ranked = rank_results(ScoringAlgorithm::Bm25, &docs, "rust", &config, &corpus, 0);
        assert!(ranked.is_empty());
    }

    #[test]
    fn exact_phrase_match_boosts_score() {
        let config = ScoringConfig::create_default();
        let corpus = CorpusStats::default();
        let query = extract_query_info("\"rust search\"");
        let matching = doc("a", "", "a rust search engine");
        let not_matching = doc("b", "", "rust and search separately");

        let a = ScoringAlgorithm::Bm25.score_document(&matching, &query, &config, &corpus);
        let b = ScoringAlgorithm::Bm25.score_document(&not_matching, &query, &config, &corpus);
        assert!(a.boost_score >= b.boost_score);
    }

    #[test]
    fn domain_authority_boost_applies_only_to_allow_listed_domains() {
        let mut config = ScoringConfig::create_default();
        config.authoritative_domains = vec!["example.com".to_string()];
        let corpus = CorpusStats::default();
        let query = extract_query_info("rust");

        let mut listed = doc("a", "rust", "rust");
        listed.domain = "example.com".to_string();
        let mut unlisted = doc("b", "rust", "rust");
        unlisted.domain = "other.com".to_string();

        let a = ScoringAlgorithm::Bm25.score_document(&listed, &query, &config, &corpus);
        let b = ScoringAlgorithm::Bm25.score_document(&unlisted, &query, &config, &corpus);
        assert!(a.boost_score > b.boost_score);
    }

    #[test]
    fn freshness_boost_decays_with_age() {
        let config = ScoringConfig::create_default();
        let corpus = CorpusStats::default();
        let query = extract_query_info("rust");

        let mut fresh = doc("a", "rust", "rust");
        fresh.indexed_at = Utc::now();
        let mut stale = doc("b", "rust", "rust");
        stale.indexed_at = Utc::now() - chrono::Duration::days(365);

        let a = ScoringAlgorithm::Bm25.score_document(&fresh, &query, &config, &corpus);
        let b = ScoringAlgorithm::Bm25.score_document(&stale, &query, &config, &corpus);
        assert!(a.boost_score > b.boost_score);
    }
}
