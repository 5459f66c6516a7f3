use crate::config::LexicalConfig;
use crate::error::{EngineError, Result};
use crate::tokenizer::analyze;
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // l2-normalized tf-idf weight
}

/// Unit-length sparse vector in the fitted term space, sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// TF-IDF document-term matrix, stored column-wise as per-term postings.
#[derive(Debug)]
pub struct LexicalIndex {
    config: LexicalConfig,
    dictionary: HashMap<String, TermId>,
    idf: Vec<f32>,
    postings: Vec<Vec<Posting>>, // indexed by term id, each sorted by doc_id
    num_docs: u32,
}

struct TermStats {
    df: u32,
    total_tf: u64,
}

impl LexicalIndex {
    /// Fit vocabulary and weights over the normalized corpus texts.
    pub fn fit<S: AsRef<str>>(texts: &[S], config: &LexicalConfig) -> Result<Self> {
        if texts.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }
        let n = texts.len();

        // Intern every n-gram and count per document
        let mut interned: HashMap<String, usize> = HashMap::new();
        let mut terms: Vec<String> = Vec::new();
        let mut stats: Vec<TermStats> = Vec::new();
        let mut doc_counts: Vec<Vec<(usize, u32)>> = Vec::with_capacity(n);
        for text in texts {
            let mut counts: HashMap<usize, u32> = HashMap::new();
            for gram in analyze(text.as_ref(), config.ngram_range, config.stop_words) {
                let id = match interned.get(&gram) {
                    Some(&id) => id,
                    None => {
                        let id = terms.len();
                        interned.insert(gram.clone(), id);
                        terms.push(gram);
                        stats.push(TermStats { df: 0, total_tf: 0 });
                        id
                    }
                };
                *counts.entry(id).or_insert(0) += 1;
            }
            for (&id, &tf) in counts.iter() {
                stats[id].df += 1;
                stats[id].total_tf += tf as u64;
            }
            doc_counts.push(counts.into_iter().collect());
        }

        // Document-frequency pruning
        let prune = n >= config.df_pruning_min_docs;
        let max_doc_count = config.max_df * n as f64;
        let mut kept: Vec<usize> = (0..terms.len())
            .filter(|&id| {
                !prune || (stats[id].df as usize >= config.min_df && stats[id].df as f64 <= max_doc_count)
            })
            .collect();
        if kept.len() > config.max_features {
            kept.sort_by(|&a, &b| stats[b].total_tf.cmp(&stats[a].total_tf).then_with(|| terms[a].cmp(&terms[b])));
            kept.truncate(config.max_features);
        }
        kept.sort_by(|&a, &b| terms[a].cmp(&terms[b]));

        let mut remap: Vec<Option<TermId>> = vec![None; terms.len()];
        let mut dictionary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (term_id, &old) in kept.iter().enumerate() {
            remap[old] = Some(term_id as TermId);
            dictionary.insert(terms[old].clone(), term_id as TermId);
            idf.push(smoothed_idf(n, stats[old].df));
        }
        if dictionary.is_empty() {
            tracing::warn!(num_docs = n, "no terms left after pruning, lexical scores will all be zero");
        }

        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); dictionary.len()];
        for (doc_id, counts) in doc_counts.into_iter().enumerate() {
            let mut row: Vec<(TermId, f32)> = counts
                .into_iter()
                .filter_map(|(old, tf)| remap[old].map(|tid| (tid, tf as f32 * idf[tid as usize])))
                .collect();
            row.sort_by_key(|(tid, _)| *tid);
            let norm = l2_norm(row.iter().map(|(_, w)| *w));
            if norm == 0.0 { continue; }
            for (tid, w) in row {
                postings[tid as usize].push(Posting { doc_id: doc_id as DocId, weight: w / norm });
            }
        }

        tracing::info!(num_docs = n, num_terms = dictionary.len(), "lexical index fitted");
        Ok(Self { config: config.clone(), dictionary, idf, postings, num_docs: n as u32 })
    }

    /// Project a normalized text into the fitted term space. Unknown terms are ignored.
    pub fn transform(&self, normalized: &str) -> SparseVector {
        let mut tf: BTreeMap<TermId, u32> = BTreeMap::new();
        for gram in analyze(normalized, self.config.ngram_range, self.config.stop_words) {
            if let Some(&tid) = self.dictionary.get(&gram) {
                *tf.entry(tid).or_insert(0) += 1;
            }
        }
        let mut entries: Vec<(TermId, f32)> =
            tf.into_iter().map(|(tid, count)| (tid, count as f32 * self.idf[tid as usize])).collect();
        let norm = l2_norm(entries.iter().map(|(_, w)| *w));
        if norm == 0.0 {
            return SparseVector::default();
        }
        for (_, w) in entries.iter_mut() { *w /= norm; }
        SparseVector { entries }
    }

    /// Cosine similarity of `query` against every document, in corpus order.
    pub fn similarity(&self, query: &SparseVector) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_docs as usize];
        for &(tid, q_w) in &query.entries {
            for p in &self.postings[tid as usize] {
                scores[p.doc_id as usize] += p.weight * q_w; // cosine since both sides are unit length
            }
        }
        for s in scores.iter_mut() { *s = s.clamp(0.0, 1.0); }
        scores
    }

    pub fn num_docs(&self) -> usize { self.num_docs as usize }
    pub fn vocabulary_len(&self) -> usize { self.dictionary.len() }
    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }
    pub fn idf(&self, term: &str) -> Option<f32> { self.term_id(term).map(|tid| self.idf[tid as usize]) }
}

fn smoothed_idf(num_docs: usize, df: u32) -> f32 {
    (((1 + num_docs) as f64 / (1 + df) as f64).ln() + 1.0) as f32
}

fn l2_norm(values: impl Iterator<Item = f32>) -> f32 {
    values.map(|w| w * w).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LexicalConfig { LexicalConfig::default() }

    #[test]
    fn empty_corpus_is_rejected() {
        let texts: Vec<String> = Vec::new();
        assert!(matches!(LexicalIndex::fit(&texts, &cfg()), Err(EngineError::EmptyCorpus)));
    }

    #[test]
    fn vocabulary_is_sorted_and_excludes_stop_words() {
        let idx = LexicalIndex::fit(&["the rust compiler", "rust borrow checker"], &cfg()).unwrap();
        assert!(idx.term_id("the").is_none());
        assert!(idx.term_id("rust compiler").is_some());
        assert!(idx.term_id("borrow").unwrap() < idx.term_id("rust").unwrap());
    }

    #[test]
    fn idf_is_smoothed() {
        let idx = LexicalIndex::fit(&["rust compiler", "rust borrow"], &cfg()).unwrap();
        assert!((idx.idf("rust").unwrap() - 1.0).abs() < 1e-6);
        let expected = ((3.0f64 / 2.0).ln() + 1.0) as f32;
        assert!((idx.idf("borrow").unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn document_frequency_pruning_on_large_corpora() {
        let mut texts: Vec<String> = (0..10).map(|i| format!("common filler{i}")).collect();
        texts[0].push_str(" shared");
        texts[1].push_str(" shared");
        let idx = LexicalIndex::fit(&texts, &cfg()).unwrap();
        // in every document: above max_df
        assert!(idx.term_id("common").is_none());
        // in one document: below min_df
        assert!(idx.term_id("filler3").is_none());
        assert!(idx.term_id("shared").is_some());
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let config = LexicalConfig { max_features: 2, ngram_range: (1, 1), ..cfg() };
        let idx = LexicalIndex::fit(&["alpha alpha beta", "alpha gamma gamma", "delta"], &config).unwrap();
        assert_eq!(idx.vocabulary_len(), 2);
        assert!(idx.term_id("alpha").is_some());
        assert!(idx.term_id("gamma").is_some());
    }

    #[test]
    fn cosine_scores_rank_matching_documents() {
        let idx = LexicalIndex::fit(&["rust systems programming", "python scripting", "rust"], &cfg()).unwrap();
        let q = idx.transform("rust");
        let scores = idx.similarity(&q);
        assert_eq!(scores[1], 0.0);
        assert!(scores[2] > scores[0]);
        assert!((scores[2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn out_of_vocabulary_query_is_empty() {
        let idx = LexicalIndex::fit(&["rust systems", "python scripting"], &cfg()).unwrap();
        let q = idx.transform("haskell");
        assert!(q.is_empty());
        assert!(idx.similarity(&q).iter().all(|s| *s == 0.0));
    }
}
