use crate::config::ConfigStore;
use crate::prelude::{println, *};
use patentdraft_core::completion::build_chat_request;
use patentdraft_core::prompt::compose;

#[derive(Debug, clap::Parser)]
#[command(name = "prompt")]
#[command(about = "Print the instruction that would be sent, without calling the model")]
pub struct App {
    /// Invention title
    #[clap(long, short = 't')]
    title: String,

    /// Key points of the technical solution
    #[clap(long, short = 'i')]
    ideas: String,

    /// Print the full chat-completion request body as JSON
    #[arg(long)]
    json: bool,
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let title = app.title.trim();
    let ideas = app.ideas.trim();
    if title.is_empty() || ideas.is_empty() {
        return Err(eyre!("Both --title and --ideas must be non-empty"));
    }

    let prompt = compose(title, ideas);

    if app.json {
        let store = ConfigStore::open(global.config_path());
        let request = build_chat_request(&prompt, &store.snapshot());
        println!("{}", serde_json::to_string_pretty(&request)?);
    } else {
        println!("{}", prompt);
    }

    Ok(())
}
