//! Evidence crop command.

use std::path::Path;

use anyhow::Context;
use console::style;

use crate::models::BoundingBox;
use crate::render::{EvidenceCropper, PaddedCropper};

/// Parse `ymin,xmin,ymax,xmax` (normalised 0-1000).
fn parse_box(raw: &str) -> anyhow::Result<BoundingBox> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("Invalid box '{}': expected four numbers", raw))?;
    let values: [f64; 4] = values
        .try_into()
        .map_err(|_| anyhow::anyhow!("Invalid box '{}': expected ymin,xmin,ymax,xmax", raw))?;
    BoundingBox::from_box_2d(values)
        .ok_or_else(|| anyhow::anyhow!("Invalid box '{}': empty or inverted region", raw))
}

pub fn cmd_crop(image: &Path, bbox: &str, output: &Path) -> anyhow::Result<()> {
    let bbox = parse_box(bbox)?;
    let bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read {}", image.display()))?;

    let png = PaddedCropper::default().crop(&bytes, &bbox)?;
    std::fs::write(output, png).with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{} Saved crop to {}", style("✓").green(), output.display());
    Ok(())
}
