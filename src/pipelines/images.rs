//! Image pipeline: per-format optimization of everything under `src/img`.
//!
//! Raster formats are decoded (which also validates them) and re-encoded;
//! SVG is cleaned textually. The smaller of the original and optimized bytes
//! is written, so an image never grows. Files are independent and are
//! processed in parallel.

use crate::build::{discover_sources, BuildContext, FileError, PipelineKind, PipelineOutput};
use crate::pipelines::{format_size, static_regex, write_output, PipelineError};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, ImageFormat};
use rayon::prelude::*;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static SVG_SEGMENT: OnceLock<Regex> = OnceLock::new();
static SVG_PRESERVE_SPACE: OnceLock<Regex> = OnceLock::new();

/// One scan over the document. `keep` covers elements whose content is
/// significant (text runs, stylesheets, scripts, CDATA); `noise` is removed
/// with the whitespace after it; `gap` is whitespace following a tag.
const SVG_SEGMENT_PATTERN: &str = concat!(
    r"(?s)(?P<keep><text\b.*?</text>|<style\b.*?</style>|<script\b.*?</script>",
    r"|<!\[CDATA\[.*?\]\]>)(?P<tail>\s*)",
    r"|(?P<noise>(?:<\?xml.*?\?>|<!--.*?-->|<!DOCTYPE[^>]*>",
    r"|<metadata\b.*?</metadata>|<metadata\b[^>]*/>",
    r"|<sodipodi:namedview\b[^>]*/>|<sodipodi:namedview\b.*?</sodipodi:namedview>)\s*)",
    r"|(?P<gap>>\s+)",
);
const SVG_PRESERVE_SPACE_PATTERN: &str = r#"xml:space\s*=\s*["']preserve["']"#;

/// Image formats handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// `.png`, re-encoded with maximum compression
    Png,
    /// `.jpg`/`.jpeg`, re-encoded at the configured quality
    Jpeg,
    /// `.gif`, validated and copied
    Gif,
    /// `.svg`, cleaned as text
    Svg,
}

impl ImageKind {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "gif" => Some(ImageKind::Gif),
            "svg" => Some(ImageKind::Svg),
            _ => None,
        }
    }
}

/// Outcome of optimizing one file.
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    /// Written output path
    pub target: PathBuf,
    /// Source size in bytes
    pub original_size: usize,
    /// Output size in bytes (never above `original_size`)
    pub written_size: usize,
}

impl OptimizedImage {
    /// Bytes saved by optimization.
    pub fn saved(&self) -> usize {
        self.original_size - self.written_size
    }
}

/// Optimizes image bytes.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptimizer {
    jpeg_quality: u8,
}

impl ImageOptimizer {
    /// Create an optimizer; quality is clamped to `1..=100`.
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality: jpeg_quality.clamp(1, 100) }
    }

    /// Optimize `bytes`, returning whichever of original and optimized is smaller.
    ///
    /// Empty or undecodable input is an error.
    pub fn optimize(&self, kind: ImageKind, bytes: &[u8]) -> Result<Vec<u8>, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::Image("empty file".to_string()));
        }

        let optimized = match kind {
            ImageKind::Png => self.optimize_png(bytes)?,
            ImageKind::Jpeg => self.optimize_jpeg(bytes)?,
            ImageKind::Gif => {
                decode(bytes, ImageFormat::Gif)?;
                bytes.to_vec()
            }
            ImageKind::Svg => optimize_svg(bytes)?,
        };

        if optimized.len() < bytes.len() {
            Ok(optimized)
        } else {
            Ok(bytes.to_vec())
        }
    }

    fn optimize_png(&self, bytes: &[u8]) -> Result<Vec<u8>, PipelineError> {
        let img = decode(bytes, ImageFormat::Png)?;
        let mut buf = Vec::new();
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive)
            .write_image(img.as_bytes(), img.width(), img.height(), img.color())
            .map_err(|e| PipelineError::Image(e.to_string()))?;
        Ok(buf)
    }

    fn optimize_jpeg(&self, bytes: &[u8]) -> Result<Vec<u8>, PipelineError> {
        let rgb = decode(bytes, ImageFormat::Jpeg)?.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| PipelineError::Image(e.to_string()))?;
        Ok(buf)
    }

    /// Optimize one source file and write it below `out_dir`, keeping its
    /// path relative to `src_dir`.
    pub fn process_file(
        &self,
        source: &Path,
        src_dir: &Path,
        out_dir: &Path,
    ) -> Result<OptimizedImage, PipelineError> {
        let kind = ImageKind::from_path(source)
            .ok_or_else(|| PipelineError::Image("unsupported image format".to_string()))?;
        let relative = source.strip_prefix(src_dir).map_err(|_| {
            PipelineError::Image(format!("{} is outside {}", source.display(), src_dir.display()))
        })?;
        let target = out_dir.join(relative);

        let original = fs::read(source).map_err(|e| PipelineError::Io(source.to_path_buf(), e))?;
        let optimized = self.optimize(kind, &original)?;
        write_output(&target, &optimized)?;

        Ok(OptimizedImage {
            target,
            original_size: original.len(),
            written_size: optimized.len(),
        })
    }
}

fn decode(bytes: &[u8], format: ImageFormat) -> Result<image::DynamicImage, PipelineError> {
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PipelineError::Image(e.to_string()))
}

/// Strip the XML prolog, comments, doctype, metadata and editor views, and
/// collapse whitespace between tags.
///
/// Text, style and script content is left exactly as written, and a
/// document declaring `xml:space="preserve"` keeps all of its whitespace.
pub fn optimize_svg(bytes: &[u8]) -> Result<Vec<u8>, PipelineError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| PipelineError::Image(format!("SVG is not valid UTF-8: {}", e)))?;
    if !text.contains("<svg") {
        return Err(PipelineError::Image("missing <svg> root element".to_string()));
    }

    let collapse = !static_regex(&SVG_PRESERVE_SPACE, SVG_PRESERVE_SPACE_PATTERN).is_match(text);
    let segments = static_regex(&SVG_SEGMENT, SVG_SEGMENT_PATTERN);
    let cleaned = segments.replace_all(text, |caps: &Captures| {
        let end = caps.get(0).map_or(text.len(), |m| m.end());
        let before_tag = collapse && text[end..].starts_with('<');
        if caps.name("noise").is_some() {
            String::new()
        } else if let Some(keep) = caps.name("keep") {
            match caps.name("tail") {
                Some(tail) if !before_tag => format!("{}{}", keep.as_str(), tail.as_str()),
                _ => keep.as_str().to_string(),
            }
        } else if before_tag {
            ">".to_string()
        } else {
            caps[0].to_string()
        }
    });
    Ok(cleaned.trim().as_bytes().to_vec())
}

/// Optimize every image below `src/img` into `dist/img`.
///
/// Failing files are reported as [`FileError`]s; the others are still written.
pub fn run(ctx: &BuildContext) -> Result<PipelineOutput, PipelineError> {
    let sources = discover_sources(ctx, PipelineKind::Images)?;
    let optimizer = ImageOptimizer::new(ctx.config().images.jpeg_quality);
    let src_dir = ctx.src_dir(PipelineKind::Images);
    let out_dir = ctx.out_dir(PipelineKind::Images);

    let results: Vec<_> = sources
        .par_iter()
        .map(|source| (source, optimizer.process_file(source, &src_dir, &out_dir)))
        .collect();

    let mut output = PipelineOutput::default();
    let mut saved = 0;
    for (source, result) in results {
        match result {
            Ok(image) => {
                tracing::debug!(
                    "{}: {} -> {}",
                    source.display(),
                    format_size(image.original_size),
                    format_size(image.written_size)
                );
                saved += image.saved();
                output.outputs.push(image.target);
            }
            Err(e) => output.errors.push(FileError::new(source, e.to_string())),
        }
    }

    if !output.outputs.is_empty() {
        tracing::info!(
            "optimized {} image(s), saved {}",
            output.outputs.len(),
            format_size(saved)
        );
    }
    Ok(output)
}
