//! Scoring configuration (spec §4.10/§9 Design Note), grounded 1:1 in
//! `original_source/include/search_engine/scoring/SearchScorer.h`'s
//! `ScoringConfig` (field weights, TF params, BM25 params, boost factors).

#[derive(Debug, Clone, Copy)]
pub struct FieldWeights {
    pub title: f64,
    pub description: f64,
    pub content: f64,
    pub keywords: f64,
    pub url: f64,
    pub domain: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { title: 5.0, description: 3.0, content: 1.0, keywords: 4.0, url: 0.5, domain: 0.8 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TfParams {
    pub use_log_normalization: bool,
    pub max_term_frequency: f64,
    pub normalize_by_length: bool,
}

impl Default for TfParams {
    fn default() -> Self {
        Self { use_log_normalization: true, max_term_frequency: 10.0, normalize_by_length: true }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoostFactors {
    pub exact_match_boost: f64,
    pub title_match_boost: f64,
    pub domain_authority_boost: f64,
    pub freshness_boost: f64,
}

impl Default for BoostFactors {
    fn default() -> Self {
        Self { exact_match_boost: 2.0, title_match_boost: 1.5, domain_authority_boost: 1.2, freshness_boost: 1.1 }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub field_weights: FieldWeights,
    pub tf_params: TfParams,
    pub bm25_params: Bm25Params,
    pub boost_factors: BoostFactors,
    pub min_score: f64,
    pub normalize_scores: bool,
    /// Domains eligible for `boost_factors.domain_authority_boost` (spec
    /// §4.10's "configurable allow-list of domains"). Empty by default;
    /// an operator populates it for domains it trusts.
    pub authoritative_domains: Vec<String>,
    /// Documents indexed within this many days still get the full
    /// `boost_factors.freshness_boost`; it decays linearly to 1.0 by
    /// `2 * freshness_window_days`.
    pub freshness_window_days: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::create_default()
    }
}

impl ScoringConfig {
    pub fn create_default() -> Self {
        Self {
            field_weights: FieldWeights::default(),
            tf_params: TfParams::default(),
            bm25_params: Bm25Params::default(),
            boost_factors: BoostFactors::default(),
            min_score: 0.01,
            normalize_scores: true,
            authoritative_domains: Vec::new(),
            freshness_window_days: 30,
        }
    }

    pub fn create_title_heavy() -> Self {
        let mut cfg = Self::create_default();
        cfg.field_weights.title = 8.0;
        cfg.field_weights.description = 2.0;
        cfg.field_weights.content = 0.5;
        cfg
    }

    pub fn create_content_heavy() -> Self {
        let mut cfg = Self::create_default();
        cfg.field_weights.content = 3.0;
        cfg.field_weights.title = 3.0;
        cfg
    }

    pub fn create_balanced() -> Self {
        let mut cfg = Self::create_default();
        cfg.field_weights.title = 2.0;
        cfg.field_weights.description = 2.0;
        cfg.field_weights.content = 1.5;
        cfg.field_weights.keywords = 2.0;
        cfg
    }
}

/// Per-domain corpus statistics feeding BM25/TF-IDF (spec §9 Open Question:
/// "Corpus statistics refresh policy", resolved in SPEC_FULL §9).
#[derive(Debug, Clone)]
pub struct CorpusStats {
    pub avg_document_length: f64,
    pub total_documents: usize,
    pub document_frequencies: std::collections::HashMap<String, usize>,
}

impl Default for CorpusStats {
    fn default() -> Self {
        Self { avg_document_length: 100.0, total_documents: 1000, document_frequencies: std::collections::HashMap::new() }
    }
}

impl CorpusStats {
    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequencies.get(term).copied().unwrap_or(1)
    }
}
