use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lexical: LexicalConfig,
    pub semantic: SemanticConfig,
    pub ranking: RankingConfig,
}

impl EngineConfig {
    /// Read a JSON config file; absent keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConfig {
    pub max_features: usize,
    pub ngram_range: (usize, usize),
    /// Terms found in fewer documents are dropped.
    pub min_df: usize,
    /// Terms found in more than this share of documents are dropped.
    pub max_df: f64,
    /// Document-frequency pruning is skipped for corpora smaller than this.
    pub df_pruning_min_docs: usize,
    pub stop_words: bool,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self { max_features: 5000, ngram_range: (1, 2), min_df: 2, max_df: 0.8, df_pruning_min_docs: 10, stop_words: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub enabled: bool,
    /// Pre-trained table (GloVe or word2vec text format). When unset the table
    /// is trained on the corpus.
    pub pretrained: Option<PathBuf>,
    pub dimensions: usize,
    pub window: usize,
    pub min_count: usize,
    pub epochs: usize,
    pub negative: usize,
    pub sample: f64,
    pub alpha: f32,
    pub min_alpha: f32,
    pub seed: u64,
    pub min_sentences: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretrained: None,
            dimensions: 100,
            window: 5,
            min_count: 2,
            epochs: 5,
            negative: 5,
            sample: 1e-3,
            alpha: 0.025,
            min_alpha: 0.0001,
            seed: 1,
            min_sentences: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Documents passed from the lexical stage to semantic scoring.
    pub candidate_pool: usize,
    pub min_similarity: f32,
    pub lexical_weight: f32,
    pub semantic_weight: f32,
    /// With no semantic model, report the lexical score unscaled instead of
    /// `lexical_weight * lexical`.
    pub rescale_lexical_only: bool,
    pub default_results: usize,
    pub max_results: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 100,
            min_similarity: 0.05,
            lexical_weight: 0.7,
            semantic_weight: 0.3,
            rescale_lexical_only: false,
            default_results: 10,
            max_results: 100,
        }
    }
}
