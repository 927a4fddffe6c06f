//! isqa batch - Answer a questions file in every mode

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::batch::{BatchRunner, read_questions, write_results};
use crate::cli::output::{emit_json, robot_ok, robot_partial};
use crate::error::Result;
use crate::search::fusion::Mode;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON array of questions: [{"q": ...}]
    #[arg(value_name = "QUESTIONS")]
    pub questions: PathBuf,

    /// Where to write the results
    #[arg(short, long, value_name = "PATH", default_value = "results.json")]
    pub output: PathBuf,

    /// Number of contexts per answer (default from config)
    #[arg(short, long)]
    pub k: Option<usize>,
}

pub fn run(ctx: &AppContext, args: &BatchArgs) -> Result<()> {
    let questions = read_questions(&args.questions)?;
    let engine = ctx.open_engine()?;
    let k = args.k.unwrap_or(ctx.config.retrieval.default_k);

    let records = BatchRunner::new(&engine, ctx.config.batch.clone(), k).run(&questions);
    write_results(&args.output, &records)?;

    let failures: Vec<String> = records
        .iter()
        .flat_map(|record| {
            record.results.iter().filter_map(move |(mode, response)| {
                response
                    .error
                    .as_ref()
                    .map(|err| format!("{} ({mode}): {err}", record.question))
            })
        })
        .collect();

    if ctx.robot_mode {
        let data = serde_json::json!({
            "questions": records.len(),
            "output": args.output.display().to_string(),
        });
        if failures.is_empty() {
            return emit_json(&robot_ok(data));
        }
        return emit_json(&robot_partial(data, records.len(), failures));
    }

    for failure in &failures {
        println!("{} {failure}", "✗".red());
    }
    println!(
        "{} Answered {} questions in {} modes, saved to {}",
        "✓".green().bold(),
        records.len(),
        Mode::ALL.len(),
        args.output.display()
    );
    Ok(())
}
