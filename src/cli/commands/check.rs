//! Document check and disclosure cross-check commands.

use std::path::{Path, PathBuf};

use console::style;

use crate::cli::display::{print_result, PageLayout};
use crate::cli::helpers::{build_verifier, render_pdf, spinner};
use crate::config::Config;
use crate::models::{CheckResult, DocumentType};

fn finish(result: &CheckResult, layout: &PageLayout, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print_result(result, layout);
    }
    if result.is_failed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Check a single document.
pub async fn cmd_check(
    config: &Config,
    pdf: &Path,
    document_type: DocumentType,
    json: bool,
) -> anyhow::Result<()> {
    let verifier = build_verifier(config)?;
    let pages = render_pdf(config, pdf).await?;

    if !json {
        eprintln!(
            "{} {} ({} pages, {})",
            style("→").dim(),
            pdf.display(),
            pages.len(),
            document_type.display_name()
        );
    }

    let pb = spinner(format!("Checking with {}...", config.llm.model));
    let result = verifier.run(&pages, document_type, None).await;
    pb.finish_and_clear();

    finish(&result, &PageLayout::single(pdf), json)
}

/// Cross-check a disclosure draft against one or more evidence PDFs.
pub async fn cmd_cross_check(
    config: &Config,
    evidence: &[PathBuf],
    disclosure: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let verifier = build_verifier(config)?;

    let mut evidence_pages = Vec::new();
    let mut layout = PageLayout::default();
    for path in evidence {
        let pages = render_pdf(config, path).await?;
        layout.push(path, pages.len());
        evidence_pages.extend(pages);
    }
    let disclosure_pages = render_pdf(config, disclosure).await?;
    layout.push(disclosure, disclosure_pages.len());

    if !json {
        eprintln!(
            "{} {} evidence pages, {} disclosure pages",
            style("→").dim(),
            evidence_pages.len(),
            disclosure_pages.len()
        );
    }

    let pb = spinner(format!("Cross-checking with {}...", config.llm.model));
    let result = verifier
        .run(&disclosure_pages, DocumentType::Disclosure, Some(&evidence_pages))
        .await;
    pb.finish_and_clear();

    finish(&result, &layout, json)
}
