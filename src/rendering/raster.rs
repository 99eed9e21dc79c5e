//! Report rasterizer
//!
//! A snapshot is taken in two passes over the same document: a warm-up pass
//! whose output is thrown away, a settle pause, then the real pass at the
//! configured pixel ratio over an opaque background. The warm-up loads the
//! font database and decodes every embedded photo once so that failures
//! surface before the expensive high-resolution pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use log::{debug, warn};
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};

use crate::rendering::{ReportDocument, Screenshot};
use crate::template::parse_hex;
use crate::{Error, Result};

/// Tunables for the rasterizer
#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfig {
    /// Output pixels per logical pixel
    pub pixel_ratio: f32,
    /// Pause between the warm-up pass and the real pass, in milliseconds
    pub settle_ms: u64,
    /// Opaque fill painted under the report (`#rrggbb`)
    pub background: String,
    /// Always run both passes, never reuse an earlier snapshot
    pub cache_bust: bool,
    /// Upper bound on output pixels; the pixel ratio is lowered to fit
    pub max_pixels: u64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 3.0,
            settle_ms: 400,
            background: "#ffffff".to_string(),
            cache_bust: true,
            max_pixels: 48_000_000,
        }
    }
}

static FONT_DB: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

fn font_db() -> Arc<fontdb::Database> {
    FONT_DB
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            debug!("loaded {} font faces", db.len());
            Arc::new(db)
        })
        .clone()
}

/// Turns composed reports into PNG snapshots
pub struct Rasterizer {
    config: RasterConfig,
    last: Mutex<Option<(String, Screenshot)>>,
    renders: AtomicU64,
}

impl Rasterizer {
    pub fn new(config: RasterConfig) -> Self {
        Self {
            config,
            last: Mutex::new(None),
            renders: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Number of full-resolution passes performed so far
    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::SeqCst)
    }

    /// The pixel ratio that will actually be used for a `width x height`
    /// report, lowered when the configured ratio would exceed `max_pixels`.
    pub fn effective_pixel_ratio(&self, width: f32, height: f32) -> Result<f32> {
        let ratio = self.config.pixel_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::ConfigError(format!("invalid pixel ratio {}", ratio)));
        }
        let area = f64::from(width) * f64::from(height);
        if !area.is_finite() || area <= 0.0 {
            return Err(Error::RasterizationError(format!(
                "report has no area ({}x{})",
                width, height
            )));
        }

        let fit = (self.config.max_pixels as f64 / area).sqrt() as f32;
        if fit < 1.0 {
            return Err(Error::RasterizationError(format!(
                "a {}x{} report does not fit in {} pixels even at 1x",
                width, height, self.config.max_pixels
            )));
        }
        if ratio > fit {
            warn!(
                "capping pixel ratio {} -> {:.2} to stay within {} pixels",
                ratio, fit, self.config.max_pixels
            );
            return Ok(fit);
        }
        Ok(ratio)
    }

    /// Snapshot `doc` into a PNG.
    ///
    /// Blocks for the settle interval; call from a worker thread or
    /// `spawn_blocking` when on an async runtime.
    pub fn rasterize(&self, doc: &ReportDocument) -> Result<Screenshot> {
        let svg = doc.to_svg();
        let digest = doc.digest();

        if !self.config.cache_bust {
            if let Ok(guard) = self.last.lock() {
                if let Some((key, shot)) = guard.as_ref() {
                    if *key == digest {
                        debug!("reusing snapshot {}", &digest[..12]);
                        return Ok(shot.clone());
                    }
                }
            }
        }

        let (r, g, b) = parse_hex(&self.config.background).ok_or_else(|| {
            Error::ConfigError(format!("invalid background color '{}'", self.config.background))
        })?;
        let ratio = self.effective_pixel_ratio(doc.width, doc.height)?;

        let started = Instant::now();
        let warm_tree = parse_tree(&svg)?;
        render_pass(&warm_tree, doc.width, doc.height, 1.0, None)?;
        debug!("warm-up pass done in {:?}", started.elapsed());

        if self.config.settle_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.settle_ms));
        }

        let tree = if self.config.cache_bust {
            parse_tree(&svg)?
        } else {
            warm_tree
        };
        let pixmap = render_pass(
            &tree,
            doc.width,
            doc.height,
            ratio,
            Some(Color::from_rgba8(r, g, b, 255)),
        )?;
        let png_data = pixmap
            .encode_png()
            .map_err(|e| Error::RasterizationError(format!("PNG encoding failed: {}", e)))?;
        self.renders.fetch_add(1, Ordering::SeqCst);

        let shot = Screenshot {
            width: pixmap.width(),
            height: pixmap.height(),
            pixel_ratio: ratio,
            png_data,
            text: doc.text.clone(),
        };
        debug!(
            "rasterized {}x{} at {:.2}x in {:?}",
            shot.width,
            shot.height,
            ratio,
            started.elapsed()
        );

        if let Ok(mut guard) = self.last.lock() {
            *guard = if self.config.cache_bust {
                None
            } else {
                Some((digest, shot.clone()))
            };
        }
        Ok(shot)
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(RasterConfig::default())
    }
}

fn parse_tree(svg: &str) -> Result<Tree> {
    let mut options = Options::default();
    options.fontdb = font_db();
    Tree::from_str(svg, &options)
        .map_err(|e| Error::RasterizationError(format!("failed to parse report markup: {}", e)))
}

fn render_pass(
    tree: &Tree,
    width: f32,
    height: f32,
    ratio: f32,
    background: Option<Color>,
) -> Result<Pixmap> {
    let w = (width * ratio).ceil() as u32;
    let h = (height * ratio).ceil() as u32;
    let mut pixmap = Pixmap::new(w, h).ok_or_else(|| {
        Error::RasterizationError(format!("could not allocate a {}x{} surface", w, h))
    })?;
    if let Some(color) = background {
        pixmap.fill(color);
    }
    resvg::render(tree, Transform::from_scale(ratio, ratio), &mut pixmap.as_mut());
    Ok(pixmap)
}
