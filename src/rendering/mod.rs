//! Rendering: card layout, paint commands and rasterization

pub mod layout;
pub mod paint;
pub mod raster;

use sha2::{Digest, Sha256};

pub use layout::{compose, LayoutNode, Section};
pub use paint::PaintCommand;
pub use raster::{RasterConfig, Rasterizer};

/// The text painted onto a report, for inspection and tests
///
/// `text` holds every painted string in paint order, one per line; wrapped
/// paragraphs appear unwrapped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSnapshot {
    pub title: String,
    pub text: String,
}

/// A composed report, ready to be rasterized
#[derive(Debug, Clone)]
pub struct ReportDocument {
    /// Logical size in CSS pixels
    pub width: f32,
    pub height: f32,
    pub commands: Vec<PaintCommand>,
    pub sections: Vec<LayoutNode>,
    pub text: TextSnapshot,
}

impl ReportDocument {
    pub fn to_svg(&self) -> String {
        paint::to_svg(self.width, self.height, &self.commands)
    }

    /// Hex SHA-256 of the serialized document
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.to_svg().as_bytes()))
    }
}

/// A rasterized report
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    /// Pixel ratio the snapshot was actually rendered at
    pub pixel_ratio: f32,
    pub png_data: Vec<u8>,
    pub text: TextSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::ReportDraft;
    use crate::template;

    #[test]
    fn digest_follows_content() {
        let mut draft = ReportDraft::new();
        draft.set_notes("calm");
        let a = compose(&draft, template::resolve("modern-blue"));
        let b = compose(&draft, template::resolve("modern-blue"));
        assert_eq!(a.digest(), b.digest());
        draft.set_notes("wiggly");
        let c = compose(&draft, template::resolve("modern-blue"));
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
