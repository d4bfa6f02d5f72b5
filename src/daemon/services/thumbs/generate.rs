//! Thumbnail rendering.
//!
//! Still images are decoded with the `image` crate, rotated per their EXIF
//! orientation, downscaled so the longer edge matches the target width and
//! re-encoded as JPEG. Everything else is treated as video: a single frame is
//! pulled with `ffmpeg` and bounded by width only, so portrait clips keep the
//! requested width.
//! When rendering fails the caller falls back to [`placeholder`].

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, Rgb, RgbImage};

use crate::constants::{DEFAULT_VIDEO_OFFSET_SECS, THUMB_JPEG_QUALITY};
use crate::daemon::services::gallery::FileClass;

/// Renders JPEG thumbnail bytes for a source file.
///
/// Implementations are called on the blocking pool.
pub trait Thumbnailer: Send + Sync + 'static {
    /// Render `source` at most `width` pixels wide (images: on the longer
    /// edge).
    ///
    /// # Errors
    ///
    /// Any decode, extraction or encode failure. Callers degrade to a
    /// placeholder rather than surfacing the error.
    fn render(&self, source: &Path, width: u32) -> Result<Vec<u8>>;
}

/// Image decoding plus `ffmpeg` frame extraction for video.
#[derive(Debug, Clone)]
pub struct MediaThumbnailer {
    ffmpeg: PathBuf,
    video_offset_secs: f64,
}

impl Default for MediaThumbnailer {
    fn default() -> Self {
        Self::new("ffmpeg", DEFAULT_VIDEO_OFFSET_SECS)
    }
}

impl MediaThumbnailer {
    pub fn new(ffmpeg: impl Into<PathBuf>, video_offset_secs: f64) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            video_offset_secs,
        }
    }

    fn render_image(source: &Path, width: u32) -> Result<Vec<u8>> {
        let mut decoder = ImageReader::open(source)
            .with_context(|| format!("Failed to open {}", source.display()))?
            .with_guessed_format()
            .context("Failed to sniff image format")?
            .into_decoder()
            .context("Unsupported image format")?;
        let orientation = decoder.orientation().context("Failed to read orientation")?;
        let mut image = DynamicImage::from_decoder(decoder).context("Failed to decode image")?;
        image.apply_orientation(orientation);
        encode_jpeg(&image, width)
    }

    fn render_video(&self, source: &Path, width: u32) -> Result<Vec<u8>> {
        let frame = tempfile::Builder::new()
            .prefix(".frame-")
            .suffix(".jpg")
            .tempfile()
            .context("Failed to create frame file")?;

        let status = Command::new(&self.ffmpeg)
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg("-ss")
            .arg(format!("{:.2}", self.video_offset_secs))
            .arg("-i")
            .arg(source)
            .args(["-frames:v", "1"])
            .arg("-vf")
            .arg(format!("scale='min({width},iw)':-2"))
            .args(["-q:v", "3"])
            .arg(frame.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run {}", self.ffmpeg.display()))?;

        if !status.success() {
            bail!("ffmpeg exited with {status}");
        }

        let image = image::open(frame.path()).context("ffmpeg produced no readable frame")?;
        encode_frame(&image, width)
    }
}

impl Thumbnailer for MediaThumbnailer {
    fn render(&self, source: &Path, width: u32) -> Result<Vec<u8>> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match FileClass::of(&name) {
            Some(FileClass::Image) => Self::render_image(source, width),
            _ => self.render_video(source, width),
        }
    }
}

/// Downscale (never upscale) to `width` on the longer edge and encode.
///
/// Output is baseline JPEG at quality 85; the `image` encoder has no
/// progressive mode.
pub fn encode_jpeg(image: &DynamicImage, width: u32) -> Result<Vec<u8>> {
    let longer = image.width().max(image.height());
    let rgb = if longer > width {
        image.resize(width, width, FilterType::Lanczos3).to_rgb8()
    } else {
        image.to_rgb8()
    };
    write_jpeg(&rgb)
}

/// Downscale (never upscale) a video frame to `width` pixels wide, keeping
/// its aspect ratio, and encode.
fn encode_frame(frame: &DynamicImage, width: u32) -> Result<Vec<u8>> {
    let rgb = if frame.width() > width {
        let height = u64::from(frame.height()) * u64::from(width) / u64::from(frame.width());
        let height = u32::try_from(height).unwrap_or(u32::MAX).max(1);
        frame.resize_exact(width, height, FilterType::Lanczos3).to_rgb8()
    } else {
        frame.to_rgb8()
    };
    write_jpeg(&rgb)
}

fn write_jpeg(rgb: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, THUMB_JPEG_QUALITY))
        .context("Failed to encode JPEG")?;
    Ok(bytes)
}

const PLACEHOLDER_BACKGROUND: Rgb<u8> = Rgb([40, 40, 48]);
const PLACEHOLDER_FOREGROUND: Rgb<u8> = Rgb([240, 240, 240]);

/// A 16:9 dark frame with a light "play" triangle, as JPEG.
///
/// # Errors
///
/// Only if JPEG encoding of an in-memory buffer fails.
pub fn placeholder(width: u32) -> Result<Vec<u8>> {
    let width = width.max(1);
    let height = (width * 9 / 16).max(1);
    let mut canvas = RgbImage::from_pixel(width, height, PLACEHOLDER_BACKGROUND);

    let (w, h) = (width as f32, height as f32);
    let a = (0.38 * w, 0.30 * h);
    let b = (0.72 * w, 0.50 * h);
    let c = (0.38 * w, 0.70 * h);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let p = (x as f32 + 0.5, y as f32 + 0.5);
        if inside_triangle(p, a, b, c) {
            *pixel = PLACEHOLDER_FOREGROUND;
        }
    }

    encode_jpeg(&DynamicImage::ImageRgb8(canvas), width)
}

fn inside_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let edge = |u: (f32, f32), v: (f32, f32)| (v.0 - u.0) * (p.1 - u.1) - (v.1 - u.1) * (p.0 - u.0);
    let (d1, d2, d3) = (edge(a, b), edge(b, c), edge(c, a));
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
