use crate::config::{EngineConfig, SemanticConfig};
use crate::corpus::{load_or_sample, Document};
use crate::embedding::EmbeddingTable;
use crate::error::{EngineError, Result};
use crate::index::LexicalIndex;
use crate::tokenizer::{normalize, split_sentences};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    /// Seconds, rounded to 4 decimals.
    pub execution_time: f64,
}

impl SearchResponse {
    fn empty(query: &str) -> Self {
        Self { query: query.to_string(), results: Vec::new(), total_results: 0, execution_time: 0.0 }
    }
}

/// Fitted hybrid ranker. Built once, then only read; share it behind an `Arc`.
#[derive(Debug)]
pub struct SearchEngine {
    config: EngineConfig,
    documents: Vec<Document>,
    normalized: Vec<String>, // parallel to `documents`
    lexical: LexicalIndex,
    semantic: Option<EmbeddingTable>,
}

impl SearchEngine {
    /// Fit the lexical index and the embedding table over `documents`.
    ///
    /// Only an empty corpus is an error; embedding failures leave the engine
    /// scoring lexically.
    pub fn build(documents: Vec<Document>, config: EngineConfig) -> Result<Self> {
        if documents.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }
        let normalized: Vec<String> = documents.iter().map(|d| normalize(&document_text(d))).collect();
        let lexical = LexicalIndex::fit(&normalized, &config.lexical)?;
        let semantic = build_semantic(&documents, &config.semantic);
        tracing::info!(
            num_docs = documents.len(),
            vocabulary = lexical.vocabulary_len(),
            semantic = semantic.is_some(),
            "search engine ready"
        );
        Ok(Self { config, documents, normalized, lexical, semantic })
    }

    /// Load the corpus at `path` (falling back to the built-in sample corpus)
    /// and build the engine.
    pub fn bootstrap<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Self> {
        Self::build(load_or_sample(path), config)
    }

    pub fn config(&self) -> &EngineConfig { &self.config }
    pub fn documents(&self) -> &[Document] { &self.documents }
    pub fn has_semantic(&self) -> bool { self.semantic.is_some() }
    pub fn vocabulary_len(&self) -> usize { self.lexical.vocabulary_len() }

    pub fn search(&self, query: &str, max_results: Option<usize>) -> SearchResponse {
        if query.trim().is_empty() {
            return SearchResponse::empty(query);
        }
        let start = Instant::now();
        let ranking = &self.config.ranking;
        let limit = max_results.unwrap_or(ranking.default_results).clamp(1, ranking.max_results.max(1));

        let processed = normalize(query);
        let query_vector = self.lexical.transform(&processed);
        let lexical_scores = self.lexical.similarity(&query_vector);
        tracing::debug!(query = %processed, terms = query_vector.entries.len(), "lexical scores computed");

        let candidates = top_candidates(&lexical_scores, ranking.candidate_pool.min(self.documents.len()));
        debug_assert!(
            candidates.windows(2).all(|w| lexical_scores[w[0]] >= lexical_scores[w[1]]),
            "candidates must be sorted by descending lexical score"
        );

        let mut scored: Vec<(usize, f32)> = Vec::new();
        for &doc in &candidates {
            let lexical = lexical_scores[doc];
            // Sorted descending: nothing after the first miss can qualify
            if lexical < ranking.min_similarity {
                break;
            }
            let combined = match &self.semantic {
                Some(table) => {
                    let semantic = table.similarity(&processed, &self.normalized[doc]);
                    ranking.lexical_weight * lexical + ranking.semantic_weight * semantic
                }
                None if ranking.rescale_lexical_only => lexical,
                None => ranking.lexical_weight * lexical,
            };
            scored.push((doc, combined.clamp(0.0, 1.0)));
        }
        let considered = scored.len();

        scored.sort_by(|a, b| by_score_desc(a.1, b.1).then(a.0.cmp(&b.0)));
        scored.truncate(limit);

        let results: Vec<SearchResult> = scored
            .into_iter()
            .map(|(doc, score)| {
                let d = &self.documents[doc];
                SearchResult { id: d.id.clone(), title: d.title.clone(), content: d.content.clone(), category: d.category.clone(), score }
            })
            .collect();

        let elapsed = start.elapsed().as_secs_f64();
        tracing::info!(
            query = %query,
            candidates = candidates.len(),
            considered,
            returned = results.len(),
            took_s = elapsed,
            "search complete"
        );
        SearchResponse {
            query: query.to_string(),
            total_results: results.len(),
            results,
            execution_time: (elapsed * 10_000.0).round() / 10_000.0,
        }
    }
}

fn document_text(doc: &Document) -> String {
    format!("{} {}", doc.title, doc.content)
}

fn build_semantic(documents: &[Document], cfg: &SemanticConfig) -> Option<EmbeddingTable> {
    if !cfg.enabled {
        tracing::info!("semantic scoring disabled, using lexical scores only");
        return None;
    }
    let table = match &cfg.pretrained {
        Some(path) => EmbeddingTable::load(path),
        None => {
            let sentences: Vec<Vec<String>> = documents.iter().flat_map(|d| split_sentences(&document_text(d))).collect();
            EmbeddingTable::train(&sentences, cfg)
        }
    };
    match table {
        Ok(table) => Some(table),
        Err(err) => {
            tracing::warn!(error = %err, "embeddings unavailable, continuing with lexical scores only");
            None
        }
    }
}

fn by_score_desc(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Indices of the `n` best scores, descending, ties by corpus order.
fn top_candidates(scores: &[f32], n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    let cmp = |a: &usize, b: &usize| by_score_desc(scores[*a], scores[*b]).then(a.cmp(b));
    if n == 0 {
        return Vec::new();
    }
    if n < order.len() {
        order.select_nth_unstable_by(n - 1, cmp);
        order.truncate(n);
    }
    order.sort_by(cmp);
    order
}
