#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};

use super::{Config, OpenAiConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("Aula Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Model Provider").bold().yellow());
    eprintln!("Configure the OpenAI-compatible API used for embeddings and chat.");
    eprintln!();

    configure_openai(&mut config.openai)?;

    eprintln!();
    if config.openai.api_key.is_none() && std::env::var("OPENAI_API_KEY").is_err() {
        eprintln!(
            "{}",
            style("Warning: no API key configured and OPENAI_API_KEY is unset").yellow()
        );
        eprintln!("Document ingestion and chat will fail until a key is provided.");
        eprintln!();
    }

    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Model Provider:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.openai.base_url).cyan());
    eprintln!(
        "  API Key: {}",
        if config.openai.api_key.is_some() {
            style("configured").green()
        } else {
            style("from OPENAI_API_KEY").yellow()
        }
    );
    eprintln!(
        "  Embedding Model: {}",
        style(&config.openai.embedding_model).cyan()
    );
    eprintln!("  Chat Model: {}", style(&config.openai.chat_model).cyan());
    eprintln!(
        "  Request Timeout: {}s",
        style(config.openai.timeout_seconds).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Chunking:").bold().yellow());
    eprintln!("  Chunk Size: {}", style(config.chunking.chunk_size).cyan());
    eprintln!("  Overlap: {}", style(config.chunking.overlap).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = super::get_config_dir()?;
    match Config::load_from(&config_dir) {
        Ok(config) => {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        }
        Err(_) => {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                openai: OpenAiConfig::default(),
                chunking: crate::ingestion::chunking::ChunkingConfig::default(),
                base_dir: config_dir,
            })
        }
    }
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(openai.base_url.clone())
        .validate_with(|input: &String| -> Result<(), String> {
            let candidate = OpenAiConfig {
                base_url: input.clone(),
                ..OpenAiConfig::default()
            };
            candidate.api_url().map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;
    openai.base_url = base_url;

    let api_key: String = Password::new()
        .with_prompt("API key (leave empty to use OPENAI_API_KEY)")
        .allow_empty_password(true)
        .interact()?;
    if !api_key.trim().is_empty() {
        openai.api_key = Some(api_key);
    }

    openai.embedding_model = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .interact_text()?;

    openai.chat_model = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .interact_text()?;

    Ok(())
}
