//! isqa ask - Answer one question

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, format_score};
use crate::engine::{QueryRequest, QueryResponse};
use crate::error::Result;
use crate::search::fusion::Mode;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question to answer
    pub question: String,

    /// Number of contexts to retrieve (default from config)
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Fusion mode
    #[arg(long, value_enum, default_value_t = Mode::Hybrid)]
    pub mode: Mode,
}

pub fn run(ctx: &AppContext, args: &AskArgs) -> Result<()> {
    let engine = ctx.open_engine()?;
    let request = QueryRequest {
        q: args.question.clone(),
        k: args.k.unwrap_or(ctx.config.retrieval.default_k),
        mode: args.mode,
    };
    let response = engine.answer(&request)?;

    if ctx.robot_mode {
        emit_json(&response)
    } else {
        emit_human(render(&request, &response));
        Ok(())
    }
}

fn render(request: &QueryRequest, response: &QueryResponse) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title(&request.q);
    layout.kv("mode", response.reranker_used.as_str());

    match &response.answer {
        Some(answer) => {
            layout.kv("top score", &format_score(response.top_score()));
            layout.blank();
            layout.push_line(answer.clone());
            layout.blank();
            layout.section("Contexts");
            for (rank, context) in response.contexts.iter().enumerate() {
                layout.bullet(&format!(
                    "{}. {} {}",
                    rank + 1,
                    context.pdf.as_str().cyan(),
                    format_score(Some(context.score)).dimmed()
                ));
            }
        }
        None => {
            layout.blank();
            layout.push_line(
                response
                    .message
                    .as_deref()
                    .unwrap_or_default()
                    .yellow()
                    .to_string(),
            );
        }
    }
    layout
}
