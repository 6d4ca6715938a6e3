use crate::client::OpenAiClient;
use crate::config::ConfigStore;
use crate::prelude::{eprintln, println, *};
use crate::task::Generator;
use colored::Colorize;
use patentdraft_core::config::{mask_secret, Configuration};
use std::sync::Arc;

#[derive(Debug, clap::Parser)]
#[command(name = "config")]
#[command(about = "Inspect and edit the connection configuration")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Show the effective configuration (defaults merged with the file)
    #[clap(name = "show")]
    Show(ShowOptions),

    /// Update configuration values and save them to the file
    #[clap(name = "set")]
    Set(SetOptions),

    /// Check that the endpoint accepts the configured API key
    #[clap(name = "test")]
    Test,

    /// Print the configuration file path
    #[clap(name = "path")]
    Path,
}

#[derive(Debug, clap::Args)]
pub struct ShowOptions {
    /// Output as JSON (the API key stays masked)
    #[arg(long)]
    json: bool,
}

#[derive(Debug, clap::Args, Default)]
pub struct SetOptions {
    /// API key for the completion service
    #[clap(long)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API (e.g., "https://api.openai.com/v1")
    #[clap(long)]
    base_url: Option<String>,

    /// Model identifier
    #[clap(long)]
    model: Option<String>,

    /// Sampling temperature between 0 and 1
    #[clap(long)]
    temperature: Option<f64>,

    /// Maximum tokens to generate (0 clears the limit)
    #[clap(long)]
    max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[clap(long)]
    timeout_secs: Option<u64>,
}

impl SetOptions {
    fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.base_url.is_none()
            && self.model.is_none()
            && self.temperature.is_none()
            && self.max_tokens.is_none()
            && self.timeout_secs.is_none()
    }

    /// Apply the given values on top of `config`, leaving the rest untouched.
    fn apply(&self, mut config: Configuration) -> Configuration {
        if let Some(api_key) = &self.api_key {
            config.openai.api_key = api_key.trim().to_string();
        }
        if let Some(base_url) = &self.base_url {
            config.openai.base_url = base_url.trim().to_string();
        }
        if let Some(model) = &self.model {
            config.openai.model = model.trim().to_string();
        }
        if let Some(temperature) = self.temperature {
            config.generation.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.generation.max_tokens = (max_tokens > 0).then_some(max_tokens);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.openai.timeout_secs = timeout_secs;
        }
        config
    }
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let store = ConfigStore::open(global.config_path());

    if global.verbose {
        eprintln!("Config: {}", store.path().display());
    }

    match app.command {
        Commands::Show(options) => show(&store, options),
        Commands::Set(options) => set(&store, options),
        Commands::Test => test(store).await,
        Commands::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
    }
}

fn show(store: &ConfigStore, options: ShowOptions) -> Result<()> {
    let mut config = (*store.snapshot()).clone();
    config.openai.api_key = mask_secret(&config.openai.api_key);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut table = key_value_table();
    table.add_row(prettytable::row!["File", store.path().display()]);
    table.add_row(prettytable::row!["API key", config.openai.api_key]);
    table.add_row(prettytable::row!["Base URL", config.openai.base_url]);
    table.add_row(prettytable::row!["Model", config.openai.model]);
    table.add_row(prettytable::row![
        "Temperature",
        config.generation.temperature
    ]);
    let max_tokens = config
        .generation
        .max_tokens
        .map(|n| n.to_string())
        .unwrap_or_else(|| "(model default)".to_string());
    table.add_row(prettytable::row!["Max tokens", max_tokens]);
    table.add_row(prettytable::row![
        "Timeout",
        format!("{}s", config.openai.timeout_secs)
    ]);
    table.printstd();

    if let Err(err) = store.snapshot().validate() {
        println!("\n{} {}", "!".yellow(), err);
    }

    Ok(())
}

fn set(store: &ConfigStore, options: SetOptions) -> Result<()> {
    if options.is_empty() {
        return Err(eyre!(
            "Nothing to update. Pass at least one of --api-key, --base-url, --model, --temperature, --max-tokens, --timeout-secs"
        ));
    }

    let updated = options.apply((*store.snapshot()).clone());

    updated.validate_params()?;
    // Saving without a key is allowed so the other fields can be filled in first.
    if updated.openai.api_key.trim().is_empty() {
        eprintln!("{} No API key configured yet", "!".yellow());
    }

    store
        .save(&updated)
        .with_context(|| format!("Failed to save {}", store.path().display()))?;

    println!(
        "{} Configuration saved to {}",
        "✔".green(),
        store.path().display()
    );

    Ok(())
}

async fn test(store: ConfigStore) -> Result<()> {
    let store = Arc::new(store);
    let config = store.validated()?;
    let client = OpenAiClient::new().map_err(|e| eyre!("{}", e))?;
    let generator = Generator::new(Arc::clone(&store), Arc::new(client));

    if generator.test_connection().await {
        println!(
            "{} Connected to {} with model {}",
            "✔".green(),
            config.openai.base_url,
            config.openai.model
        );
        Ok(())
    } else {
        Err(eyre!(
            "Connection to {} failed (run with RUST_LOG=warn for details)",
            config.openai.base_url
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;

    #[test]
    fn test_set_rejects_invalid_params_without_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let store = ConfigStore::open(&path);

        let options = SetOptions {
            temperature: Some(5.0),
            ..Default::default()
        };
        assert!(set(&store, options).is_err());
        assert!(!path.exists());
        assert_eq!(
            store.snapshot().generation.temperature,
            Configuration::default().generation.temperature
        );

        let options = SetOptions {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(set(&store, options).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_set_saves_valid_params_without_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let store = ConfigStore::open(&path);

        let options = SetOptions {
            model: Some("DeepSeek-R1".to_string()),
            ..Default::default()
        };
        set(&store, options).unwrap();

        assert!(path.exists());
        assert_eq!(store.snapshot().openai.model, "DeepSeek-R1");
        assert!(store.snapshot().openai.api_key.is_empty());
    }

    #[test]
    fn test_set_options_apply_only_given_fields() {
        let options = SetOptions {
            model: Some(" DeepSeek-R1 ".to_string()),
            max_tokens: Some(2048),
            ..Default::default()
        };
        let updated = options.apply(Configuration::default());

        assert_eq!(updated.openai.model, "DeepSeek-R1");
        assert_eq!(updated.generation.max_tokens, Some(2048));
        assert_eq!(updated.openai.base_url, Configuration::default().openai.base_url);
    }

    #[test]
    fn test_set_options_zero_max_tokens_clears_limit() {
        let mut config = Configuration::default();
        config.generation.max_tokens = Some(512);

        let options = SetOptions {
            max_tokens: Some(0),
            ..Default::default()
        };
        assert_eq!(options.apply(config).generation.max_tokens, None);
    }

    #[test]
    fn test_set_options_is_empty() {
        assert!(SetOptions::default().is_empty());
        assert!(!SetOptions {
            temperature: Some(0.2),
            ..Default::default()
        }
        .is_empty());
    }
}
