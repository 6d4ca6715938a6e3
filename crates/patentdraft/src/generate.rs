use crate::client::OpenAiClient;
use crate::config::ConfigStore;
use crate::prelude::{eprintln, println, *};
use crate::task::{Generator, TaskHandle};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use patentdraft_core::request::{GenerationOutcome, Stage};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, clap::Parser)]
#[command(name = "generate")]
#[command(about = "Generate a patent disclosure draft")]
pub struct App {
    /// Invention title (ideally naming the technical features and field of use)
    #[clap(long, short = 't', env = "PATENTDRAFT_TITLE")]
    title: String,

    /// Key points of the technical solution and its effects
    #[clap(long, short = 'i', env = "PATENTDRAFT_IDEAS")]
    ideas: String,

    /// Directory the document is written to
    #[clap(long, short = 'o', env = "PATENTDRAFT_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct GenerateOutput {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    characters: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let store = Arc::new(ConfigStore::load(global.config_path())?);
    let backend = OpenAiClient::new().map_err(|e| eyre!("{}", e))?;
    let generator = Generator::new(Arc::clone(&store), Arc::new(backend));

    let request = generator.request(&app.title, &app.ideas, &app.out_dir)?;

    if global.verbose {
        eprintln!("Config: {}", store.path().display());
        eprintln!("Endpoint: {}", request.config().openai.base_url);
        eprintln!("Model: {}", request.config().openai.model);
        eprintln!("Output directory: {}", request.destination_dir().display());
    }

    let handle = generator.start_generation(request)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .context("Invalid spinner template")?,
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message("Generating disclosure draft...");

    let outcome = wait_for_outcome(handle, tokio::signal::ctrl_c(), &spinner).await;
    spinner.finish_and_clear();

    match outcome {
        None => {
            if app.json {
                print_json(&GenerateOutput {
                    status: "cancelled",
                    saved_path: None,
                    characters: None,
                    stage: None,
                    reason: None,
                })?;
            } else {
                eprintln!("{}", "Generation cancelled, nothing was written".yellow());
            }
            Ok(())
        }
        Some(GenerationOutcome::Success {
            content,
            saved_path,
        }) => {
            if app.json {
                print_json(&GenerateOutput {
                    status: "success",
                    saved_path: Some(saved_path.display().to_string()),
                    characters: Some(content.chars().count()),
                    stage: None,
                    reason: None,
                })?;
            } else {
                println!(
                    "{} Disclosure saved to {}",
                    "✔".green(),
                    saved_path.display().to_string().bold()
                );
            }
            Ok(())
        }
        Some(GenerationOutcome::Failure { reason }) => {
            if app.json {
                print_json(&GenerateOutput {
                    status: "failure",
                    saved_path: None,
                    characters: None,
                    stage: reason.stage(),
                    reason: Some(reason.to_string()),
                })?;
            }
            Err(eyre!(reason))
        }
    }
}

/// Await the task, requesting cancellation when `interrupt` fires.
///
/// The remote call cannot be interrupted, so an interrupt only flags the task
/// and keeps waiting. An interrupt source that fails to install is logged and
/// otherwise ignored.
async fn wait_for_outcome<S>(
    handle: TaskHandle,
    interrupt: S,
    spinner: &ProgressBar,
) -> Option<GenerationOutcome>
where
    S: Future<Output = std::io::Result<()>>,
{
    let canceller = handle.canceller();
    let pending = handle.outcome();
    tokio::pin!(pending);

    tokio::select! {
        outcome = &mut pending => outcome,
        signal = interrupt => {
            match signal {
                Ok(()) => {
                    canceller.cancel();
                    spinner.set_message(
                        "Cancelling, waiting for the in-flight request to return...",
                    );
                }
                Err(err) => log::warn!("Ctrl-C handler unavailable, cancellation disabled: {err}"),
            }
            pending.await
        }
    }
}

fn print_json(output: &GenerateOutput) -> Result<()> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
    println!("{}", json);
    Ok(())
}
