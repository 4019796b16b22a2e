//! Scorer (C11): ranks indexed documents against a parsed query.

pub mod config;
pub mod scorer;

pub use config::{Bm25Params, BoostFactors, CorpusStats, FieldWeights, ScoringConfig, TfParams};
pub use scorer::{extract_query_info, rank_results, QueryInfo, ScorableDocument, ScoringAlgorithm};
