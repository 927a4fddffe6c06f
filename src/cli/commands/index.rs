//! isqa index - Build the retrieval index from chunk records

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::indexer::build_index;
use crate::search::embeddings::HashEmbedder;

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// JSON array of chunk records: [{"pdf": ..., "text": ...}]
    #[arg(value_name = "CHUNKS")]
    pub chunks: PathBuf,

    /// Output directory (overrides config)
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &IndexArgs) -> Result<()> {
    let records = Corpus::read_records(&args.chunks)?;
    let index_dir = args.out.clone().unwrap_or_else(|| ctx.index_dir());
    let embedder = HashEmbedder::new(ctx.config.embedding.dims);
    let start = Instant::now();

    if ctx.robot_mode {
        let summary = build_index(records, &index_dir, &embedder, None)?;
        return emit_json(&robot_ok(serde_json::json!({
            "summary": summary,
            "elapsed_ms": u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        })));
    }

    println!("{}", "Indexing chunks...".bold());
    println!();

    let pb = ProgressBar::new(records.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("embedding");

    let summary = build_index(records, &index_dir, &embedder, Some(&pb))?;
    pb.finish_and_clear();

    println!(
        "{} Indexed {} chunks from {} documents in {:.2}s",
        "✓".green().bold(),
        summary.chunks,
        summary.documents,
        start.elapsed().as_secs_f64()
    );
    println!("  {} {}", "index:".dimmed(), summary.index_dir.display());
    Ok(())
}
