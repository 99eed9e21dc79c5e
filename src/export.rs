//! Export pipeline: compose a draft, rasterize it and name the result

use std::path::{Path, PathBuf};

use log::info;

use crate::draft::ReportDraft;
use crate::rendering::{compose, Rasterizer, TextSnapshot};
use crate::Result;

/// Token used in file names when the pet has no name
pub const FALLBACK_FILE_TOKEN: &str = "pet";

/// A finished report image
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub file_name: String,
    pub png_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    pub text: TextSnapshot,
}

impl ExportedReport {
    /// Write the PNG into `dir`, creating it if needed. Returns the full path.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.png_data)?;
        info!("saved {} ({} bytes)", path.display(), self.png_data.len());
        Ok(path)
    }
}

/// Download name for a draft's report: `grooming-report-<name>.png`
pub fn report_file_name(draft: &ReportDraft) -> String {
    let name: String = draft
        .pet
        .name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let name = name.trim_matches('.');
    let name = if name.is_empty() { FALLBACK_FILE_TOKEN } else { name };
    format!("grooming-report-{}.png", name)
}

/// Compose and rasterize `draft`. Every call takes a fresh snapshot unless
/// the rasterizer was configured to reuse them.
pub fn export_report(draft: &ReportDraft, rasterizer: &Rasterizer) -> Result<ExportedReport> {
    let doc = compose(draft, draft.template());
    let shot = rasterizer.rasterize(&doc)?;
    let report = ExportedReport {
        file_name: report_file_name(draft),
        png_data: shot.png_data,
        width: shot.width,
        height: shot.height,
        pixel_ratio: shot.pixel_ratio,
        text: shot.text,
    };
    info!(
        "exported {} ({}x{} at {:.2}x)",
        report.file_name, report.width, report.height, report.pixel_ratio
    );
    Ok(report)
}
