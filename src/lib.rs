//! Groomcard
//!
//! Builds shareable grooming report cards: uploaded photos are normalized,
//! the groomer's notes can be rewritten by a hosted text service, and the
//! finished report is rasterized into a high-resolution PNG.
//!
//! # Features
//!
//! - **Image normalization**: decode, orient, bound to 1200px and re-encode
//!   every photo as JPEG
//! - **Rasterization**: two-pass snapshot of the composed card at 3x over an
//!   opaque background
//! - **Note rewriting** (`rewrite`, default): optional friendlier notes from
//!   a hosted text-generation service
//!
//! # Example
//!
//! ```no_run
//! use groomcard::{export_report, ReportDraft, Rasterizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut draft = ReportDraft::new();
//! draft.pet.name = "Mochi".to_string();
//! draft.services.insert("Bath");
//! draft.set_notes("very calm today");
//!
//! let report = export_report(&draft, &Rasterizer::default())?;
//! report.save(".")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result, RewriteError};

pub mod draft;
pub mod photo;
pub mod template;

// Card layout and rasterization
pub mod rendering;

// Note rewriting (HTTP client behind the `rewrite` feature)
pub mod rewrite;

pub mod export;
pub mod settings;

// Async facade backed by a worker thread
pub mod studio;

pub use draft::{Gender, PetInfo, PhotoRole, ReportDraft, ServiceSet};
pub use export::{export_report, report_file_name, ExportedReport};
pub use photo::{normalize, Photo};
pub use rendering::{RasterConfig, Rasterizer, Screenshot, TextSnapshot};
pub use rewrite::{
    enhance_notes, enhance_notes_or_keep, NotesRewriter, RewriteConfig, RewriteRequest,
};
pub use studio::Studio;
pub use template::Template;

#[cfg(feature = "rewrite")]
pub use rewrite::GeminiRewriter;

/// Configuration for normalizing photos and exporting reports
///
/// The defaults keep photos small enough to embed in the card while the
/// rasterizer produces a sharp image for sharing.
///
/// # Examples
///
/// ```
/// let cfg = groomcard::ExportConfig::default();
/// assert_eq!(cfg.max_dimension, 1200);
/// assert_eq!(cfg.raster.pixel_ratio, 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Longest allowed edge of a normalized photo, in pixels
    pub max_dimension: u32,
    /// JPEG quality for normalized photos (1-100)
    pub jpeg_quality: u8,
    /// Rasterizer settings
    pub raster: RasterConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1200,
            jpeg_quality: 80,
            raster: RasterConfig::default(),
        }
    }
}
