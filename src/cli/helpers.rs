//! Shared helper functions for CLI commands.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::llm::GeminiClient;
use crate::models::PageImage;
use crate::render::{PageRenderer, PdftoppmRenderer};
use crate::verify::Verifier;

/// Spinner shown while waiting on the model.
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render every page of a PDF at the configured resolution.
pub async fn render_pdf(config: &Config, path: &Path) -> anyhow::Result<Vec<PageImage>> {
    let renderer = PdftoppmRenderer::new(config.render.dpi);
    let owned = path.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || renderer.render_file(&owned))
        .await?
        .with_context(|| format!("Failed to render {}", path.display()))?;
    if pages.is_empty() {
        anyhow::bail!("{} has no pages", path.display());
    }
    Ok(pages)
}

/// Verifier backed by the Gemini client.
pub fn build_verifier(config: &Config) -> anyhow::Result<Verifier<GeminiClient>> {
    let client = GeminiClient::new(config.llm.clone())
        .map_err(|e| anyhow::anyhow!("{}\n  → {}", e, e.remediation()))?;
    Ok(Verifier::new(client, config.verify.clone()))
}
