use anyhow::{Context, Result};
use clap::Parser;
use engine::{EngineConfig, SearchEngine};
use server::{build_app, AppOptions};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "server", about = "Hybrid TF-IDF + embedding news search service")]
struct Args {
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,
    /// Corpus file (JSON, `{"documents": [...]}` or JSON Lines)
    #[arg(long, env = "DOCUMENTS_PATH", default_value = "data/documents.json")]
    documents: PathBuf,
    /// Engine configuration as JSON; flags below override it
    #[arg(long, env = "ENGINE_CONFIG")]
    config: Option<PathBuf>,
    /// Default number of results per query
    #[arg(long, env = "MAX_RESULTS")]
    max_results: Option<usize>,
    /// Minimum lexical similarity a candidate needs
    #[arg(long, env = "MIN_SIMILARITY_THRESHOLD")]
    min_similarity: Option<f32>,
    /// Vocabulary cap for the TF-IDF index
    #[arg(long, env = "TFIDF_MAX_FEATURES")]
    max_features: Option<usize>,
    /// Score with TF-IDF only
    #[arg(long, env = "DISABLE_SEMANTIC", default_value_t = false)]
    no_semantic: bool,
    /// Pre-trained word vectors (GloVe / word2vec text format) instead of training on the corpus
    #[arg(long, env = "EMBEDDINGS_PATH")]
    embeddings: Option<PathBuf>,
    /// Comma-separated allowed origins; unset allows any
    #[arg(long, env = "CORS_ALLOW_ORIGIN", value_delimiter = ',')]
    cors_allow_origin: Vec<String>,
}

impl Args {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut cfg = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)
                .with_context(|| format!("reading engine config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(k) = self.max_results { cfg.ranking.default_results = k; }
        if let Some(t) = self.min_similarity { cfg.ranking.min_similarity = t; }
        if let Some(m) = self.max_features { cfg.lexical.max_features = m; }
        if self.no_semantic { cfg.semantic.enabled = false; }
        if let Some(path) = &self.embeddings { cfg.semantic.pretrained = Some(path.clone()); }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = args.engine_config()?;

    // Fit the models before binding so no request sees a partial engine
    let documents = args.documents.clone();
    let engine = tokio::task::spawn_blocking(move || SearchEngine::bootstrap(documents, config)).await??;
    let app = build_app(Arc::new(engine), AppOptions { cors_allow_origins: args.cors_allow_origin.clone() });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
