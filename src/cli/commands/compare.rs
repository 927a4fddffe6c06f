//! isqa compare - Top score of every mode, side by side

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::app::AppContext;
use crate::batch::{compare, read_questions};
use crate::cli::output::{HumanLayout, emit_human, emit_json, format_score, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Questions file (defaults to the reranker bootstrap questions)
    #[arg(long, value_name = "PATH")]
    pub questions: Option<PathBuf>,

    /// Number of contexts per mode (default from config)
    #[arg(short, long)]
    pub k: Option<usize>,
}

pub fn run(ctx: &AppContext, args: &CompareArgs) -> Result<()> {
    let questions: Vec<String> = match &args.questions {
        Some(path) => read_questions(path)?.into_iter().map(|q| q.q).collect(),
        None => ctx.config.reranker.bootstrap_questions.clone(),
    };
    let engine = ctx.open_engine()?;
    let model = engine.model();
    info!(
        weights = ?model.weights,
        bias = model.bias,
        examples = model.examples,
        positives = model.positives,
        "learned reranker"
    );

    let k = args.k.unwrap_or(ctx.config.retrieval.default_k);
    let rows = compare(&engine, &questions, k)?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(rows));
    }

    let mut layout = HumanLayout::new();
    layout.title("Top score per mode");
    for row in &rows {
        layout.section(&row.question);
        layout.kv("baseline", &format_score(row.baseline_top_score));
        layout.kv("hybrid", &format_score(row.hybrid_top_score));
        layout.kv("learned", &format_score(row.learned_top_score));
        layout.blank();
    }
    emit_human(layout);
    Ok(())
}
