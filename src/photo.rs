//! Photo normalization
//!
//! Every uploaded photo is decoded, oriented, bounded to a maximum edge
//! length and re-encoded as JPEG before it is attached to a draft. This
//! keeps the in-memory draft and the rasterized card small regardless of
//! what the camera produced.

use std::io::Cursor;
use std::path::Path;

use base64::Engine as Base64Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use log::debug;

use crate::{Error, ExportConfig, Result};

/// MIME type of every normalized photo
pub const PHOTO_MIME: &str = "image/jpeg";

/// A normalized, encoded photo
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    /// JPEG quality the photo was encoded with (1-100)
    pub quality: u8,
}

impl Photo {
    /// Render the photo as a `data:` URI for embedding in the report
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("mime", &self.mime)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("quality", &self.quality)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Compute the output dimensions for a `width x height` source.
///
/// Sources whose longer edge already fits, or a `max_dimension` of zero, are
/// returned unchanged. Otherwise
/// the longer edge becomes exactly `max_dimension` and the shorter edge is
/// scaled by the same factor and rounded.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        return (width, height);
    }
    let scale = f64::from(max_dimension) / f64::from(longest);
    let scaled = |v: u32| ((f64::from(v) * scale).round() as u32).clamp(1, max_dimension);
    if width >= height {
        (max_dimension, scaled(height))
    } else {
        (scaled(width), max_dimension)
    }
}

/// Decode, bound and re-encode a photo.
///
/// Fails with [`Error::DecodeError`] when the bytes are not a readable image.
pub fn normalize(bytes: &[u8], config: &ExportConfig) -> Result<Photo> {
    if config.max_dimension == 0 {
        return Err(Error::ConfigError("max_dimension must be positive".into()));
    }

    let img = decode_oriented(bytes)?;
    let (src_w, src_h) = (img.width(), img.height());
    if src_w == 0 || src_h == 0 {
        return Err(Error::DecodeError("image has no pixels".into()));
    }

    let (w, h) = target_dimensions(src_w, src_h, config.max_dimension);
    let resized = if (w, h) == (src_w, src_h) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Lanczos3)
    };

    let rgb = flatten_on_white(&resized);
    let quality = config.jpeg_quality.clamp(1, 100);
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality)
        .encode_image(&rgb)
        .map_err(|e| Error::DecodeError(format!("JPEG encoding failed: {}", e)))?;

    debug!(
        "normalized photo {}x{} -> {}x{} ({} bytes, q{})",
        src_w,
        src_h,
        w,
        h,
        data.len(),
        quality
    );

    Ok(Photo {
        data,
        mime: PHOTO_MIME,
        width: w,
        height: h,
        quality,
    })
}

/// Read a photo from disk and normalize it off the async executor.
pub async fn normalize_file(path: impl AsRef<Path>, config: &ExportConfig) -> Result<Photo> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let config = config.clone();
    let name = path.display().to_string();
    tokio::task::spawn_blocking(move || normalize(&bytes, &config))
        .await
        .map_err(|e| Error::Other(format!("Normalization task for {} failed: {}", name, e)))?
}

/// Decode an image and apply the orientation recorded in its metadata.
fn decode_oriented(bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::DecodeError(format!("Failed to read image header: {}", e)))?;
    if reader.format().is_none() {
        return Err(Error::DecodeError("unrecognized image format".into()));
    }

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation().ok();
    let mut img = DynamicImage::from_decoder(decoder)?;
    if let Some(orientation) = orientation {
        img.apply_orientation(orientation);
    }
    Ok(img)
}

/// Drop the alpha channel by compositing over white; JPEG has no alpha.
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}
