use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine::corpus::parse_records;
use engine::{Document, RecordMapping};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

const PROGRESS_EVERY: usize = 10_000;

#[derive(Parser)]
#[command(name = "loader")]
#[command(about = "Normalize raw news datasets into the search corpus format", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map raw article records onto {id, title, content, category}
    Normalize {
        /// Input path (JSON/JSONL file or a directory of them)
        #[arg(long)]
        input: String,
        /// Output corpus file
        #[arg(long, default_value = "data/documents.json")]
        output: String,
        /// Only process the first N records
        #[arg(long)]
        max_documents: Option<usize>,
        /// Category for records that carry none
        #[arg(long, default_value = "News")]
        default_category: String,
    },
}

#[derive(Serialize)]
struct CorpusFile<'a> {
    documents: &'a [Document],
}

#[derive(Debug, PartialEq)]
struct Summary {
    records: usize,
    written: usize,
    skipped: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { input, output, max_documents, default_category } => {
            let mapping = RecordMapping { default_category, prefix_title: true };
            let summary = normalize_dataset(Path::new(&input), Path::new(&output), max_documents, &mapping)?;
            tracing::info!(records = summary.records, written = summary.written, skipped = summary.skipped, output, "corpus written");
            Ok(())
        }
    }
}

fn input_files(input: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn normalize_dataset(input: &Path, output: &Path, max_documents: Option<usize>, mapping: &RecordMapping) -> Result<Summary> {
    let files = input_files(input);
    anyhow::ensure!(!files.is_empty(), "no JSON or JSONL input found at {}", input.display());

    let mut records: Vec<Value> = Vec::new();
    for file in &files {
        let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        let parsed = parse_records(&text).with_context(|| format!("parsing {}", file.display()))?;
        tracing::info!(file = %file.display(), records = parsed.len(), "dataset file read");
        records.extend(parsed);
    }
    if let Some(max) = max_documents {
        records.truncate(max);
    }

    let (documents, skipped) = mapping.map_records_with_progress(&records, |processed| {
        if processed % PROGRESS_EVERY == 0 {
            tracing::info!(processed, "normalizing");
        }
    });
    if skipped > 0 {
        tracing::warn!(skipped, "records without content were dropped");
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(output).with_context(|| format!("creating {}", output.display()))?);
    serde_json::to_writer_pretty(writer, &CorpusFile { documents: &documents })?;

    Ok(Summary { records: records.len(), written: documents.len(), skipped })
}
