//! PDF page rendering and evidence cropping.

mod crop;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::models::PageImage;

pub use crop::{EvidenceCropper, PaddedCropper};

const PDFTOPPM_NOT_FOUND: &str =
    "pdftoppm not found. Install poppler-utils (apt install poppler-utils / brew install poppler)";

/// Errors from rendering or cropping.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Input is not a PDF")]
    NotPdf,

    #[error("Renderer not available: {0}")]
    ToolMissing(String),

    #[error("Rendering failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a PDF into one image per page, in page order.
pub trait PageRenderer: Send + Sync {
    fn render(&self, pdf: &[u8]) -> Result<Vec<PageImage>, RenderError>;

    fn render_file(&self, path: &Path) -> Result<Vec<PageImage>, RenderError> {
        let bytes = fs::read(path)?;
        self.render(&bytes)
    }
}

/// Renderer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new(200)
    }
}

/// Whether the bytes look like a PDF.
pub fn is_pdf(bytes: &[u8]) -> bool {
    infer::get(bytes).is_some_and(|kind| kind.mime_type() == "application/pdf")
}

/// Page number from a pdftoppm output name such as `page-07.jpg`.
fn page_number(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("page-")?
        .strip_suffix(".jpg")?
        .parse()
        .ok()
}

/// Rendered page files in page order.
///
/// pdftoppm pads the number to the width of the page count, so names are
/// sorted numerically rather than lexically.
fn collect_pages(dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    let mut pages: Vec<(u32, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|path| page_number(&path).map(|n| (n, path)))
        .collect();
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

impl PageRenderer for PdftoppmRenderer {
    fn render(&self, pdf: &[u8]) -> Result<Vec<PageImage>, RenderError> {
        if !is_pdf(pdf) {
            return Err(RenderError::NotPdf);
        }

        let temp = tempfile::tempdir()?;
        let input = temp.path().join("input.pdf");
        fs::write(&input, pdf)?;
        let output_prefix = temp.path().join("page");

        let output = Command::new("pdftoppm")
            .args(["-jpeg", "-r", &self.dpi.to_string()])
            .arg(&input)
            .arg(&output_prefix)
            .output();

        match output {
            Ok(out) if out.status.success() => {}
            Ok(out) => {
                return Err(RenderError::Failed(format!(
                    "pdftoppm exited with {}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::ToolMissing(PDFTOPPM_NOT_FOUND.to_string()))
            }
            Err(e) => return Err(RenderError::Io(e)),
        }

        let files = collect_pages(temp.path())?;
        if files.is_empty() {
            return Err(RenderError::Failed("PDF has no renderable pages".to_string()));
        }
        debug!("Rendered {} pages at {} DPI", files.len(), self.dpi);

        files
            .iter()
            .enumerate()
            .map(|(index, path)| Ok(PageImage::jpeg(index, fs::read(path)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rejects_non_pdf() {
        let renderer = PdftoppmRenderer::default();
        let err = renderer.render(b"hello world").unwrap_err();
        assert!(matches!(err, RenderError::NotPdf));
    }

    #[test]
    fn test_pdf_magic() {
        assert!(is_pdf(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n"));
        assert!(!is_pdf(b"\xFF\xD8\xFF\xE0"));
    }

    #[test]
    fn test_page_number() {
        assert_eq!(page_number(Path::new("/tmp/page-1.jpg")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/page-012.jpg")), Some(12));
        assert_eq!(page_number(Path::new("/tmp/input.pdf")), None);
    }

    #[test]
    fn test_collect_pages_sorts_numerically() {
        let temp = TempDir::new().unwrap();
        for name in ["page-10.jpg", "page-02.jpg", "page-01.jpg", "input.pdf"] {
            std::fs::write(temp.path().join(name), b"x").unwrap();
        }
        let pages = collect_pages(temp.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["page-01.jpg", "page-02.jpg", "page-10.jpg"]);
    }
}
