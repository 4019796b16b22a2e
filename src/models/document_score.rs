/// Detailed scoring breakdown for one document against one query (spec §3).
#[derive(Debug, Clone, Default)]
pub struct DocumentScore {
    pub document_id: String,
    pub total_score: f64,

    pub title_score: f64,
    pub content_score: f64,
    pub description_score: f64,
    pub keyword_score: f64,
    pub url_score: f64,

    pub term_frequency_score: f64,
    pub field_weight_score: f64,
    pub exact_match_score: f64,
    pub boost_score: f64,

    pub matched_terms: usize,
    pub total_terms: usize,

    pub explanation: String,
}

impl DocumentScore {
    pub fn coverage(&self) -> f64 {
        if self.total_terms == 0 {
            0.0
        } else {
            self.matched_terms as f64 / self.total_terms as f64
        }
    }
}
