//! Human-readable result output.

use std::path::Path;

use console::style;

use crate::models::{CheckResult, CheckStatus, Finding, Location, Severity};
use crate::verify::remediation_for;

/// Maps indices into the combined image list back to source files.
#[derive(Debug, Default)]
pub struct PageLayout {
    files: Vec<(String, usize)>,
}

impl PageLayout {
    pub fn single(path: &Path) -> Self {
        let mut layout = Self::default();
        layout.push(path, usize::MAX);
        layout
    }

    pub fn push(&mut self, path: &Path, pages: usize) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.files.push((name, pages));
    }

    /// "file.pdf p.3" for a zero-based combined index.
    pub fn describe(&self, index: usize) -> String {
        let mut remaining = index;
        for (name, pages) in &self.files {
            if remaining < *pages {
                return if self.files.len() == 1 {
                    format!("p.{}", remaining + 1)
                } else {
                    format!("{} p.{}", name, remaining + 1)
                };
            }
            remaining -= pages;
        }
        format!("image {}", index)
    }
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Error => style("error").red().bold().to_string(),
        Severity::Warning => style("warning").yellow().bold().to_string(),
        Severity::Info => style("info").blue().to_string(),
    }
}

fn location_label(location: &Location, layout: &PageLayout) -> String {
    match location {
        Location::Region { page, .. } => layout.describe(*page),
        Location::Label { label } => label.clone(),
    }
}

fn print_finding(finding: &Finding, layout: &PageLayout) {
    let location = finding
        .location
        .as_ref()
        .map(|l| format!(" [{}]", location_label(l, layout)))
        .unwrap_or_default();
    println!(
        "{}{} {}{}",
        severity_label(finding.severity),
        style(format!("({})", finding.category)).dim(),
        finding.message,
        style(location).dim()
    );
    if let (Some(expected), Some(actual)) = (&finding.expected, &finding.actual) {
        println!(
            "    {} expected {} / found {}",
            style("→").dim(),
            style(expected).green(),
            style(actual).red()
        );
    }
}

pub fn print_result(result: &CheckResult, layout: &PageLayout) {
    if result.is_failed() {
        if let Some(finding) = result.findings.first() {
            println!("{} {}", style("✗").red(), finding.message);
            if let Some(hint) = remediation_for(&finding.category) {
                println!("  {} {}", style("→").dim(), hint);
            }
        }
        return;
    }

    for finding in &result.findings {
        print_finding(finding, layout);
    }
    if !result.findings.is_empty() {
        println!();
    }

    let summary = format!(
        "{} errors, {} warnings, {} info",
        result.count(Severity::Error),
        result.count(Severity::Warning),
        result.count(Severity::Info)
    );
    match result.status {
        CheckStatus::Completed => println!("{} No errors found ({})", style("✓").green(), summary),
        _ => println!("{} Issues found ({})", style("✗").red(), summary),
    }
}
