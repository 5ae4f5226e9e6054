//! One-shot research in the terminal.

use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

use delve_core::{ProgressEvent, ResearchPipeline, ResearchSummary};

/// Output format for `delve ask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutput {
    /// Spinner for progress, streamed answer, then the parsed summary.
    Pretty,
    /// Raw `data: <json>` frames, exactly as the server would send them.
    Frames,
}

/// Runs `query` through `pipeline` and prints progress to stdout.
///
/// Returns an error if the run ended in a failure event.
pub async fn run(
    pipeline: ResearchPipeline,
    query: &str,
    output: AskOutput,
) -> color_eyre::Result<()> {
    let mut events = pipeline.run(query)?;
    let mut stdout = std::io::stdout();

    if output == AskOutput::Frames {
        let mut failure = None;
        while let Some(event) = events.next().await {
            write!(stdout, "{}", event.sse_frame()?)?;
            stdout.flush()?;
            failure = failure.or_else(|| failure_message(&event));
        }
        return match failure {
            Some(message) => Err(color_eyre::eyre::eyre!(message)),
            None => Ok(()),
        };
    }

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    while let Some(event) = events.next().await {
        if let Some(message) = status_message(&event) {
            spinner.set_message(message);
        }

        match event {
            ProgressEvent::SearchResult {
                title,
                url,
                index,
                total,
            } => {
                spinner.println(format!("  [{index}/{total}] {title} <{url}>"));
            }
            ProgressEvent::AiChunk { content } => {
                if !spinner.is_finished() {
                    spinner.finish_and_clear();
                }
                write!(stdout, "{content}")?;
                stdout.flush()?;
            }
            ProgressEvent::Complete {
                summary,
                sources_count,
                ..
            } => {
                spinner.finish_and_clear();
                let parsed = ResearchSummary::parse(&summary);
                println!("\n\n--- {sources_count} sources ---");
                println!("Summary: {}", parsed.summary);
                for insight in &parsed.insights {
                    println!("  * {insight}");
                }
            }
            ref failed @ (ProgressEvent::Error { .. } | ProgressEvent::AiError { .. }) => {
                spinner.finish_and_clear();
                let message = failure_message(failed).unwrap_or_default();
                return Err(color_eyre::eyre::eyre!(message));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Spinner text for a progress event.
fn status_message(event: &ProgressEvent) -> Option<String> {
    let message = match event {
        ProgressEvent::Start { .. } => "Starting research...".to_string(),
        ProgressEvent::SearchStart => "Searching the web...".to_string(),
        ProgressEvent::SearchComplete { sources_found } => {
            format!("Found {sources_found} sources")
        }
        ProgressEvent::AnalysisStart => "Analyzing with AI...".to_string(),
        ProgressEvent::AiThinking => "AI is processing...".to_string(),
        _ => return None,
    };
    Some(message)
}

fn failure_message(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::Error { message } => Some(message.clone()),
        ProgressEvent::AiError { error } => Some(format!("AI error: {error}")),
        _ => None,
    }
}
