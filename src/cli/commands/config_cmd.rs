//! Configuration display.

use console::style;

use crate::config::Config;

/// Print the effective configuration with the API key masked.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => eprintln!("{} Loaded from {}", style("→").dim(), path.display()),
        None => eprintln!("{} No config file found; showing defaults", style("!").yellow()),
    }
    if config.llm.api_key.is_none() {
        eprintln!(
            "{} No API key set (GEMINI_API_KEY or GOOGLE_API_KEY)",
            style("!").yellow()
        );
    }
    println!("{}", config.to_redacted_toml()?);
    Ok(())
}
