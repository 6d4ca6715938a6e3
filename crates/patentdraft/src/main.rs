#![allow(unused)]

use crate::prelude::*;
use clap::Parser;
use std::path::PathBuf;

mod client;
mod config;
mod config_cmd;
mod error;
mod generate;
mod naming;
mod prelude;
mod prompt_cmd;
mod task;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Draft patent disclosure documents (专利交底书) with an OpenAI-compatible model"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Path to the JSON configuration file
    #[clap(long, env = "PATENTDRAFT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "PATENTDRAFT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

impl Global {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::default_config_path)
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Generate a disclosure draft and save it as Markdown
    Generate(crate::generate::App),

    /// Inspect, edit, and test the connection configuration
    Config(crate::config_cmd::App),

    /// Print the composed instruction without calling the model
    Prompt(crate::prompt_cmd::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Generate(sub_app) => crate::generate::run(sub_app, app.global).await,
        SubCommands::Config(sub_app) => crate::config_cmd::run(sub_app, app.global).await,
        SubCommands::Prompt(sub_app) => crate::prompt_cmd::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
