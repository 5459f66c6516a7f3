//! Hybrid lexical + semantic ranking over a fixed news corpus.

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ranker;
pub mod tokenizer;

pub use config::{EngineConfig, LexicalConfig, RankingConfig, SemanticConfig};
pub use corpus::{sample_documents, Document, RecordMapping};
pub use embedding::EmbeddingTable;
pub use error::{EngineError, Result};
pub use index::{DocId, LexicalIndex, Posting, SparseVector, TermId};
pub use ranker::{SearchEngine, SearchResponse, SearchResult};
