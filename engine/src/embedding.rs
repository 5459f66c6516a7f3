//! Dense word vectors for the semantic half of the ranking.
//!
//! Vectors come either from a pre-trained table on disk (GloVe text format, or
//! word2vec text format with its `count dim` header line) or from a skip-gram
//! model trained on the corpus itself with negative sampling. Training uses a
//! seeded RNG on one thread, so a given corpus and config always produce the
//! same table.

use crate::config::SemanticConfig;
use crate::error::{EngineError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::path::Path;

const MAX_EXP: f32 = 6.0;

#[derive(Debug)]
pub struct EmbeddingTable {
    dimensions: usize,
    vocab: HashMap<String, usize>,
    vectors: Vec<f32>, // row-major, vocab.len() x dimensions
}

impl EmbeddingTable {
    pub fn dimensions(&self) -> usize { self.dimensions }
    pub fn len(&self) -> usize { self.vocab.len() }
    pub fn is_empty(&self) -> bool { self.vocab.is_empty() }
    pub fn contains(&self, word: &str) -> bool { self.vocab.contains_key(word) }

    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        let row = *self.vocab.get(word)?;
        Some(&self.vectors[row * self.dimensions..(row + 1) * self.dimensions])
    }

    /// Mean of the vectors of all known tokens; `None` when no token is known.
    pub fn embed<'a, I>(&self, tokens: I) -> Option<Vec<f32>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut sum = vec![0.0f32; self.dimensions];
        let mut known = 0usize;
        for token in tokens {
            if let Some(v) = self.vector(token) {
                for (acc, x) in sum.iter_mut().zip(v) { *acc += x; }
                known += 1;
            }
        }
        if known == 0 {
            return None;
        }
        let inv = 1.0 / known as f32;
        for acc in sum.iter_mut() { *acc *= inv; }
        Some(sum)
    }

    /// Cosine similarity of the mean vectors of two normalized texts, floored
    /// at zero. Zero when either side has no known token.
    pub fn similarity(&self, a: &str, b: &str) -> f32 {
        match (self.embed(a.split_whitespace()), self.embed(b.split_whitespace())) {
            (Some(va), Some(vb)) => cosine(&va, &vb).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Load a whitespace-separated text table, one `word v1 .. vN` per line.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut dimensions: Option<usize> = None;
        let mut vocab = HashMap::new();
        let mut vectors = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else { continue };
            let values: Vec<&str> = fields.collect();
            // word2vec `count dim` header; a 1-d row like `1 0.5` is data
            if i == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                if let Ok(dim) = values[0].parse::<usize>() {
                    dimensions = Some(dim);
                    continue;
                }
            }
            let dim = *dimensions.get_or_insert(values.len());
            if values.len() != dim || dim == 0 {
                return Err(EngineError::InvalidEmbeddings {
                    line: line_no,
                    reason: format!("expected {dim} components, found {}", values.len()),
                });
            }
            if vocab.contains_key(word) { continue; }
            for v in values {
                let x = v.parse::<f32>().map_err(|e| EngineError::InvalidEmbeddings {
                    line: line_no,
                    reason: format!("{v:?}: {e}"),
                })?;
                vectors.push(x);
            }
            vocab.insert(word.to_string(), vocab.len());
        }
        match dimensions {
            Some(dimensions) if !vocab.is_empty() => Ok(Self { dimensions, vocab, vectors }),
            _ => Err(EngineError::InvalidEmbeddings { line: 0, reason: "no vectors".into() }),
        }
    }

    /// Train skip-gram vectors with negative sampling over tokenized sentences.
    pub fn train(sentences: &[Vec<String>], cfg: &SemanticConfig) -> Result<Self> {
        if sentences.len() < cfg.min_sentences {
            return Err(EngineError::InsufficientTrainingData(format!(
                "{} sentences, need at least {}",
                sentences.len(),
                cfg.min_sentences
            )));
        }
        if cfg.dimensions == 0 {
            return Err(EngineError::InsufficientTrainingData("zero dimensions".into()));
        }

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for sentence in sentences {
            for word in sentence {
                *counts.entry(word.as_str()).or_insert(0) += 1;
            }
        }
        let mut words: Vec<(&str, u64)> =
            counts.into_iter().filter(|(_, c)| *c >= cfg.min_count as u64).collect();
        if words.is_empty() {
            return Err(EngineError::InsufficientTrainingData(format!(
                "no word occurs at least {} times",
                cfg.min_count
            )));
        }
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let vocab: HashMap<String, usize> = words.iter().enumerate().map(|(i, (w, _))| (w.to_string(), i)).collect();
        let freqs: Vec<u64> = words.iter().map(|(_, c)| *c).collect();

        let mut trainer = SkipGram::new(&freqs, cfg);
        let encoded: Vec<Vec<usize>> = sentences
            .iter()
            .map(|s| s.iter().filter_map(|w| vocab.get(w).copied()).collect())
            .collect();
        trainer.run(&encoded);

        tracing::info!(
            vocabulary = vocab.len(),
            dimensions = cfg.dimensions,
            sentences = sentences.len(),
            epochs = cfg.epochs,
            "skip-gram embeddings trained"
        );
        Ok(Self { dimensions: cfg.dimensions, vocab, vectors: trainer.syn0 })
    }
}

struct SkipGram<'a> {
    cfg: &'a SemanticConfig,
    dim: usize,
    syn0: Vec<f32>,
    syn1neg: Vec<f32>,
    keep_probability: Vec<f64>,
    noise_cumulative: Vec<f64>,
    rng: StdRng,
}

impl<'a> SkipGram<'a> {
    fn new(freqs: &[u64], cfg: &'a SemanticConfig) -> Self {
        let dim = cfg.dimensions;
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let syn0 = (0..freqs.len() * dim).map(|_| (rng.gen::<f32>() - 0.5) / dim as f32).collect();
        let syn1neg = vec![0.0; freqs.len() * dim];

        let total: u64 = freqs.iter().sum();
        let threshold = cfg.sample * total as f64;
        let keep_probability = freqs
            .iter()
            .map(|&c| {
                if cfg.sample <= 0.0 {
                    1.0
                } else {
                    let c = c as f64;
                    (((c / threshold).sqrt() + 1.0) * threshold / c).min(1.0)
                }
            })
            .collect();

        let mut acc = 0.0;
        let noise_cumulative = freqs
            .iter()
            .map(|&c| {
                acc += (c as f64).powf(0.75);
                acc
            })
            .collect();

        Self { cfg, dim, syn0, syn1neg, keep_probability, noise_cumulative, rng }
    }

    fn run(&mut self, sentences: &[Vec<usize>]) {
        let per_epoch: usize = sentences.iter().map(Vec::len).sum();
        let total = (per_epoch * self.cfg.epochs).max(1) as f32;
        let mut seen = 0usize;
        let mut neu1e = vec![0.0f32; self.dim];
        for _ in 0..self.cfg.epochs {
            for sentence in sentences {
                let progress = seen as f32 / total;
                let alpha = (self.cfg.alpha - (self.cfg.alpha - self.cfg.min_alpha) * progress).max(self.cfg.min_alpha);
                seen += sentence.len();

                let kept: Vec<usize> = sentence
                    .iter()
                    .copied()
                    .filter(|&w| self.keep_probability[w] >= self.rng.gen::<f64>())
                    .collect();
                for (pos, &center) in kept.iter().enumerate() {
                    let reduced = self.cfg.window - self.rng.gen_range(0..self.cfg.window.max(1)).min(self.cfg.window);
                    let start = pos.saturating_sub(reduced);
                    let end = (pos + reduced + 1).min(kept.len());
                    for (ctx_pos, &context) in kept.iter().enumerate().take(end).skip(start) {
                        if ctx_pos != pos {
                            self.train_pair(context, center, alpha, &mut neu1e);
                        }
                    }
                }
            }
        }
    }

    fn sample_noise(&mut self) -> usize {
        let total = *self.noise_cumulative.last().unwrap_or(&0.0);
        let r = self.rng.gen::<f64>() * total;
        self.noise_cumulative.partition_point(|&c| c <= r).min(self.noise_cumulative.len() - 1)
    }

    fn train_pair(&mut self, input: usize, target: usize, alpha: f32, neu1e: &mut [f32]) {
        let dim = self.dim;
        neu1e.iter_mut().for_each(|x| *x = 0.0);
        let l1 = input * dim;
        for d in 0..=self.cfg.negative {
            let (word, label) = if d == 0 {
                (target, 1.0)
            } else {
                let w = self.sample_noise();
                if w == target { continue; }
                (w, 0.0)
            };
            let l2 = word * dim;
            let f = dot(&self.syn0[l1..l1 + dim], &self.syn1neg[l2..l2 + dim]);
            let g = (label - sigmoid(f)) * alpha;
            for i in 0..dim {
                neu1e[i] += g * self.syn1neg[l2 + i];
                self.syn1neg[l2 + i] += g * self.syn0[l1 + i];
            }
        }
        for i in 0..dim {
            self.syn0[l1 + i] += neu1e[i];
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    let x = x.clamp(-MAX_EXP, MAX_EXP);
    1.0 / (1.0 + (-x).exp())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let na = dot(a, a).sqrt();
    let nb = dot(b, b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}
