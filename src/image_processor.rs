//! # Image Processing Module
//!
//! Questo modulo implementa la pipeline di transcodifica per un singolo file.
//!
//! ## Pipeline per file
//!
//! 1. **Classificazione**: estensioni ignorate (GIF/SVG/ICO) non vengono mai aperte
//! 2. **Lettura**: stat (timestamp) + lettura bytes; file vuoto → errore
//! 3. **Formato**: rilevato dai magic bytes, fallback sull'estensione
//! 4. **Frame**: WebP animati, APNG, GIF (anche con estensione sbagliata) e TIFF
//!    multipagina → skip "animated"
//! 5. **Decode**: una sola volta in un `DynamicImage` immutabile
//! 6. **Policy**: qualità/compressione dal [`Baseline`], resize Lanczos3 se serve
//! 7. **Encode primario** (stesso formato del sorgente):
//!    - JPEG: mozjpeg progressivo, 4:2:0, scan ottimizzati; fallback sull'encoder di `image`
//!    - PNG: encoder `image` con filtro adattivo + oxipng
//!    - TIFF: re-encode lossless
//!    - WebP: re-encode lossy alla qualità alternate
//! 8. **Twin WebP** (solo per sorgenti non WebP) alla qualità alternate
//! 9. **Scrittura atomica** di primario e twin, poi ripristino dei timestamp
//!
//! ## Tabella encoder
//!
//! | Sorgente | Primario                | Twin        |
//! |----------|-------------------------|-------------|
//! | JPEG     | mozjpeg (q primary)     | WebP (q alt)|
//! | PNG      | PNG + oxipng (level)    | WebP (q alt)|
//! | TIFF     | TIFF lossless           | WebP (q alt)|
//! | WebP     | WebP (q alt)            | nessuno     |
//!
//! ## Errori
//!
//! Ogni errore (decode, encode, scrittura) diventa `TranscodeStatus::Failed`
//! per quel file; i file fratelli non ne risentono.
//!
//! ## Size guard
//!
//! Se l'output primario non ridimensionato non è più piccolo di
//! `original × size_threshold`, il file originale resta invariato (nessuna
//! scrittura del primario); il twin viene comunque prodotto.

use crate::atomic::{restore_times, write_atomic, FileStamps};
use crate::config::Config;
use crate::error::OptimizeError;
use crate::file_manager::{lower_extension, AssetKind, FileManager};
use crate::optimizer::path_resolver::PathResolver;
use crate::policy::{fit_within, Baseline, QualityPolicy};
use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngDecoder, PngEncoder};
use image::codecs::webp::WebPDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, ImageFormat};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Why a file was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    IgnoredFormat,
    Animated { frames: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::IgnoredFormat => f.write_str("ignored format"),
            SkipReason::Animated { .. } => f.write_str("animated"),
        }
    }
}

/// Exactly one outcome per file per run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TranscodeStatus {
    Optimized,
    Simulated,
    Skipped(SkipReason),
    Failed(String),
}

impl TranscodeStatus {
    /// Skip reason or error message, if any
    pub fn reason(&self) -> Option<String> {
        match self {
            TranscodeStatus::Skipped(reason) => Some(reason.to_string()),
            TranscodeStatus::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TranscodeStatus::Optimized => "optimized",
            TranscodeStatus::Simulated => "simulated",
            TranscodeStatus::Skipped(_) => "skipped",
            TranscodeStatus::Failed(_) => "failed",
        }
    }
}

/// Facts read from the source before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    pub format: ImageFormat,
    pub channels: u8,
}

/// Result of processing one file
#[derive(Debug, Clone, Serialize)]
pub struct TranscodeResult {
    pub path: PathBuf,
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    pub alternate_bytes: Option<u64>,
    pub alternate_path: Option<PathBuf>,
    pub resized: bool,
    pub savings_percent: f64,
    pub dimensions: Option<(u32, u32)>,
    pub policy: Option<QualityPolicy>,
    /// Primary output kept the original bytes
    pub kept_original: bool,
    pub status: TranscodeStatus,
}

impl TranscodeResult {
    fn with_status(path: &Path, original_bytes: u64, status: TranscodeStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            original_bytes,
            optimized_bytes: original_bytes,
            alternate_bytes: None,
            alternate_path: None,
            resized: false,
            savings_percent: 0.0,
            dimensions: None,
            policy: None,
            kept_original: false,
            status,
        }
    }

    pub fn skipped(path: &Path, reason: SkipReason) -> Self {
        Self::with_status(path, 0, TranscodeStatus::Skipped(reason))
    }

    pub fn failed(path: &Path, message: impl ToString) -> Self {
        Self::with_status(path, 0, TranscodeStatus::Failed(message.to_string()))
    }
}

/// Encoded outputs for one file, not yet written
struct Encoded {
    primary: Vec<u8>,
    alternate: Option<(PathBuf, Vec<u8>)>,
    resized: bool,
    dimensions: (u32, u32),
    policy: QualityPolicy,
}

/// Per-file transcoder. Cheap to clone; shares no mutable state.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    baseline: Baseline,
    size_threshold: f64,
    dry_run: bool,
}

impl ImageProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            baseline: Baseline::from(config),
            size_threshold: config.size_threshold,
            dry_run: config.dry_run,
        }
    }

    /// Run the full pipeline for one file. Blocking: call from a blocking context.
    pub fn process(&self, path: &Path) -> TranscodeResult {
        match FileManager::classify(path) {
            AssetKind::Ignored => return TranscodeResult::skipped(path, SkipReason::IgnoredFormat),
            AssetKind::Irrelevant => {
                let ext = lower_extension(path);
                return TranscodeResult::failed(path, OptimizeError::UnsupportedFormat(ext));
            }
            AssetKind::Optimizable => {}
        }

        match self.try_process(path) {
            Ok(result) => result,
            Err(e) => TranscodeResult::failed(path, e),
        }
    }

    fn try_process(&self, path: &Path) -> Result<TranscodeResult, OptimizeError> {
        let stat = std::fs::metadata(path)?;
        let stamps = FileStamps::from(&stat);
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(OptimizeError::EmptyInput);
        }
        let original_bytes = bytes.len() as u64;
        let ext = lower_extension(path);

        let format = detect_format(&bytes, &ext)?;
        let frames = count_frames(&bytes, format);
        if frames > 1 {
            debug!("{} has {} frames, skipping", path.display(), frames);
            return Ok(TranscodeResult::with_status(
                path,
                original_bytes,
                TranscodeStatus::Skipped(SkipReason::Animated { frames }),
            ));
        }

        let img = image::load_from_memory_with_format(&bytes, format)?;
        let metadata = ImageMetadata {
            width: img.width(),
            height: img.height(),
            frames,
            format,
            channels: img.color().channel_count(),
        };
        if metadata.width == 0 || metadata.height == 0 {
            return Err(OptimizeError::Metadata(format!(
                "{}x{}",
                metadata.width, metadata.height
            )));
        }

        let encoded = self.encode_all(path, &ext, img, &metadata, original_bytes)?;

        let kept_original = !encoded.resized
            && (encoded.primary.len() as f64) >= original_bytes as f64 * self.size_threshold;
        let optimized_bytes = if kept_original {
            original_bytes
        } else {
            encoded.primary.len() as u64
        };

        let (alternate_path, alternate_bytes) = match &encoded.alternate {
            Some((p, data)) => (Some(p.clone()), Some(data.len() as u64)),
            None => (None, None),
        };

        let mut result = TranscodeResult {
            path: path.to_path_buf(),
            original_bytes,
            optimized_bytes,
            alternate_bytes,
            alternate_path,
            resized: encoded.resized,
            savings_percent: FileManager::calculate_reduction(original_bytes, optimized_bytes),
            dimensions: Some(encoded.dimensions),
            policy: Some(encoded.policy),
            kept_original,
            status: TranscodeStatus::Simulated,
        };

        if self.dry_run {
            return Ok(result);
        }

        if !kept_original {
            write_atomic(path, &encoded.primary)?;
        }
        if let Some((twin_path, data)) = &encoded.alternate {
            write_atomic(twin_path, data)?;
        }

        if !kept_original {
            restore_times(path, &stamps);
        }
        if let Some((twin_path, _)) = &encoded.alternate {
            restore_times(twin_path, &stamps);
        }

        result.status = TranscodeStatus::Optimized;
        Ok(result)
    }

    fn encode_all(
        &self,
        path: &Path,
        ext: &str,
        img: DynamicImage,
        metadata: &ImageMetadata,
        original_bytes: u64,
    ) -> Result<Encoded, OptimizeError> {
        let policy = self
            .baseline
            .choose(metadata.width, metadata.height, original_bytes);

        let img = if policy.should_resize {
            let (w, h) = fit_within(metadata.width, metadata.height, policy.target_max_dimension);
            debug!(
                "Resizing {} from {}x{} to {}x{}",
                path.display(),
                metadata.width,
                metadata.height,
                w,
                h
            );
            img.resize_exact(w, h, FilterType::Lanczos3)
        } else {
            img
        };
        let dimensions = (img.width(), img.height());

        let primary = match ext {
            "jpg" | "jpeg" => encode_jpeg(&img, policy.primary_quality)?,
            "png" => encode_png(&img, policy.compression_level, metadata.channels)?,
            "tif" | "tiff" => encode_tiff(&img)?,
            "webp" => encode_webp(&img, policy.alternate_quality)?,
            other => return Err(OptimizeError::UnsupportedFormat(other.to_string())),
        };

        let alternate = match PathResolver::alternate_path(path) {
            Some(twin_path) => Some((twin_path, encode_webp(&img, policy.alternate_quality)?)),
            None => None,
        };

        Ok(Encoded {
            primary,
            alternate,
            resized: policy.should_resize,
            dimensions,
            policy,
        })
    }
}

/// Container format from magic bytes, falling back to the extension
pub fn detect_format(bytes: &[u8], ext: &str) -> Result<ImageFormat, OptimizeError> {
    image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_extension(ext))
        .ok_or_else(|| OptimizeError::UnsupportedFormat(ext.to_string()))
}

/// Number of frames/pages in the container. Anything unreadable counts as one
/// frame and is left for the decoder to reject.
pub fn count_frames(bytes: &[u8], format: ImageFormat) -> usize {
    let counted = match format {
        ImageFormat::WebP => count_webp_frames(bytes).map_err(|e| e.to_string()),
        ImageFormat::Png => count_apng_frames(bytes).map_err(|e| e.to_string()),
        ImageFormat::Gif => count_gif_frames(bytes).map_err(|e| e.to_string()),
        ImageFormat::Tiff => count_tiff_pages(bytes).map_err(|e| e.to_string()),
        _ => Ok(1),
    };
    match counted {
        Ok(n) => n.max(1),
        Err(e) => {
            debug!("Frame count failed, assuming single frame: {}", e);
            1
        }
    }
}

fn count_webp_frames(bytes: &[u8]) -> Result<usize, image::ImageError> {
    let decoder = WebPDecoder::new(Cursor::new(bytes))?;
    if !decoder.has_animation() {
        return Ok(1);
    }
    Ok(decoder.into_frames().count())
}

fn count_apng_frames(bytes: &[u8]) -> Result<usize, image::ImageError> {
    let decoder = PngDecoder::new(Cursor::new(bytes))?;
    if !decoder.is_apng()? {
        return Ok(1);
    }
    Ok(decoder.apng()?.into_frames().count())
}

/// GIF content can hide behind any optimizable extension
fn count_gif_frames(bytes: &[u8]) -> Result<usize, image::ImageError> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    Ok(decoder.into_frames().count())
}

fn count_tiff_pages(bytes: &[u8]) -> Result<usize, tiff::TiffError> {
    let mut decoder = tiff::decoder::Decoder::new(Cursor::new(bytes))?;
    let mut pages = 1;
    while decoder.more_images() {
        decoder.next_image()?;
        pages += 1;
    }
    Ok(pages)
}

/// Progressive mozjpeg with 4:2:0 subsampling; baseline `image` encoder if mozjpeg fails
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, OptimizeError> {
    let rgb = img.to_rgb8();
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);

    let mozjpeg_result = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(w, h);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_chroma_sampling_pixel_sizes((1, 1), (2, 2));
        comp.set_optimize_scans(true);
        comp.set_optimize_coding(true);

        let mut started = comp.start_compress(Vec::new())?;
        started.write_scanlines(rgb.as_raw())?;
        started.finish()
    }));

    match mozjpeg_result {
        Ok(Ok(bytes)) => return Ok(bytes),
        Ok(Err(e)) => warn!("mozjpeg failed, using fallback encoder: {}", e),
        Err(_) => warn!("mozjpeg panicked, using fallback encoder"),
    }

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| OptimizeError::encode("JPEG", e))?;
    Ok(buf)
}

/// Lossless PNG: adaptive filtering, then oxipng at a preset derived from `level` (0-9)
pub fn encode_png(img: &DynamicImage, level: u8, channels: u8) -> Result<Vec<u8>, OptimizeError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| OptimizeError::encode("PNG", e))?;

    let preset = (u32::from(level.min(9)) * 6 / 9) as u8;
    let mut opts = oxipng::Options::from_preset(preset);
    opts.strip = oxipng::StripChunks::Safe;
    opts.palette_reduction = channels <= 3;

    oxipng::optimize_from_memory(&buf, &opts).map_err(|e| OptimizeError::encode("PNG", e))
}

/// Lossless TIFF re-encode
pub fn encode_tiff(img: &DynamicImage) -> Result<Vec<u8>, OptimizeError> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Tiff)
        .map_err(|e| OptimizeError::encode("TIFF", e))?;
    Ok(cursor.into_inner())
}

/// Lossy WebP, method 6 with sharp YUV
pub fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, OptimizeError> {
    let (w, h) = (img.width(), img.height());
    let mut config =
        webp::WebPConfig::new().map_err(|_| OptimizeError::encode("WebP", "invalid config"))?;
    config.quality = quality as f32;
    config.method = 6;
    config.use_sharp_yuv = 1;

    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), w, h).encode_advanced(&config)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), w, h).encode_advanced(&config)
    };
    let memory = encoded.map_err(|e| OptimizeError::encode("WebP", format!("{:?}", e)))?;

    Ok(memory.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Band;
    use crate::test_helpers::{
        animated_gif_bytes, animated_webp_bytes, gradient_image, jpeg_bytes, png_bytes, tiff_bytes,
        two_page_tiff_bytes,
    };
    use std::fs;
    use tempfile::TempDir;

    fn processor(dry_run: bool) -> ImageProcessor {
        ImageProcessor::new(&Config {
            dry_run,
            ..Default::default()
        })
    }

    #[test]
    fn test_ignored_format_is_never_read() {
        let temp_dir = TempDir::new().unwrap();
        // Does not exist: any read attempt would fail the file
        let path = temp_dir.path().join("spinner.gif");
        let result = processor(false).process(&path);
        assert_eq!(result.status, TranscodeStatus::Skipped(SkipReason::IgnoredFormat));
        assert!(!path.exists());
        assert!(!temp_dir.path().join("spinner.webp").exists());
    }

    #[test]
    fn test_empty_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.jpg");
        fs::write(&path, b"").unwrap();
        let result = processor(false).process(&path);
        assert!(matches!(result.status, TranscodeStatus::Failed(_)));
    }

    #[test]
    fn test_corrupt_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\nthis is not a png").unwrap();
        let result = processor(false).process(&path);
        assert!(matches!(result.status, TranscodeStatus::Failed(_)));
        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG\r\n\x1a\nthis is not a png");
    }

    #[test]
    fn test_animated_webp_is_skipped_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("loader.webp");
        let original = animated_webp_bytes(10);
        fs::write(&path, &original).unwrap();

        let result = processor(false).process(&path);

        assert_eq!(
            result.status,
            TranscodeStatus::Skipped(SkipReason::Animated { frames: 10 })
        );
        assert_eq!(result.status.reason().as_deref(), Some("animated"));
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_multi_page_tiff_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scan.tiff");
        fs::write(&path, two_page_tiff_bytes()).unwrap();
        let result = processor(false).process(&path);
        assert!(matches!(
            result.status,
            TranscodeStatus::Skipped(SkipReason::Animated { frames: 2 })
        ));
    }

    #[test]
    fn test_animated_gif_behind_png_name_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("banner.png");
        let bytes = animated_gif_bytes(2);
        fs::write(&path, &bytes).unwrap();

        let result = processor(false).process(&path);

        assert_eq!(
            result.status,
            TranscodeStatus::Skipped(SkipReason::Animated { frames: 2 })
        );
        assert_eq!(fs::read(&path).unwrap(), bytes);
        assert!(!temp_dir.path().join("banner.webp").exists());
    }

    #[test]
    fn test_count_frames_single_images() {
        assert_eq!(count_frames(&png_bytes(8, 8), ImageFormat::Png), 1);
        assert_eq!(count_frames(&jpeg_bytes(8, 8, 90), ImageFormat::Jpeg), 1);
        assert_eq!(count_frames(&tiff_bytes(8, 8), ImageFormat::Tiff), 1);
    }

    #[test]
    fn test_jpeg_produces_primary_and_twin() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        fs::write(&path, jpeg_bytes(640, 480, 100)).unwrap();

        let result = processor(false).process(&path);

        assert_eq!(result.status, TranscodeStatus::Optimized);
        let twin = temp_dir.path().join("photo.webp");
        assert_eq!(result.alternate_path.as_deref(), Some(twin.as_path()));
        assert!(twin.exists());
        assert_eq!(&fs::read(&twin).unwrap()[..4], b"RIFF");
        let decoded = image::load_from_memory(&fs::read(&path).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (640, 480));
        assert!(result.savings_percent >= 0.0);
    }

    #[test]
    fn test_small_png_policy_and_twin_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("icon.png");
        fs::write(&path, png_bytes(600, 400)).unwrap();

        let result = processor(false).process(&path);

        assert_eq!(result.status, TranscodeStatus::Optimized);
        let policy = result.policy.unwrap();
        assert_eq!(policy.band, Band::Small);
        assert_eq!(policy.compression_level, 6);
        assert_eq!(policy.alternate_quality, 88);
        assert!(!result.resized);

        let primary = image::load_from_memory(&fs::read(&path).unwrap()).unwrap();
        let twin = image::load_from_memory(&fs::read(temp_dir.path().join("icon.webp")).unwrap())
            .unwrap();
        assert_eq!((primary.width(), primary.height()), (600, 400));
        assert_eq!((twin.width(), twin.height()), (600, 400));
    }

    #[test]
    fn test_webp_source_gets_no_twin() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("banner.webp");
        let img = gradient_image(64, 64);
        fs::write(&path, encode_webp(&img, 95).unwrap()).unwrap();

        let result = processor(false).process(&path);

        assert!(!matches!(result.status, TranscodeStatus::Failed(_)));
        assert!(result.alternate_path.is_none());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_tiff_reencoded_losslessly() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scan.tif");
        fs::write(&path, tiff_bytes(32, 32)).unwrap();

        let result = processor(false).process(&path);

        assert_eq!(result.status, TranscodeStatus::Optimized);
        let before = gradient_image(32, 32).to_rgb8();
        let after = image::load_from_memory(&fs::read(&path).unwrap())
            .unwrap()
            .to_rgb8();
        assert_eq!(before, after);
        assert!(temp_dir.path().join("scan.webp").exists());
    }

    #[test]
    fn test_oversized_image_is_resized_into_box() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wide.png");
        fs::write(&path, png_bytes(300, 120)).unwrap();

        let small_box = ImageProcessor::new(&Config {
            max_dimension: 100,
            ..Default::default()
        });
        let result = small_box.process(&path);

        assert!(result.resized);
        assert_eq!(result.dimensions, Some((100, 40)));
        let primary = image::load_from_memory(&fs::read(&path).unwrap()).unwrap();
        assert_eq!((primary.width(), primary.height()), (100, 40));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        let original = jpeg_bytes(320, 240, 100);
        fs::write(&path, &original).unwrap();

        let result = processor(true).process(&path);

        assert_eq!(result.status, TranscodeStatus::Simulated);
        assert!(result.alternate_bytes.is_some());
        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(!temp_dir.path().join("photo.webp").exists());
    }

    #[test]
    fn test_second_pass_is_not_inflating() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        fs::write(&path, jpeg_bytes(640, 480, 100)).unwrap();

        let first = processor(false).process(&path);
        assert_eq!(first.status, TranscodeStatus::Optimized);

        let second = processor(true).process(&path);
        assert_eq!(second.status, TranscodeStatus::Simulated);
        assert!(!second.resized);
        assert!(second.savings_percent >= 0.0);
    }

    #[test]
    fn test_timestamps_restored_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        fs::write(&path, jpeg_bytes(200, 200, 100)).unwrap();
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_400_000_000);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(past)
            .unwrap();

        processor(false).process(&path);

        let twin = temp_dir.path().join("photo.webp");
        assert_eq!(fs::metadata(&twin).unwrap().modified().unwrap(), past);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), past);
    }

    #[test]
    fn test_jpeg_encoder_output_decodes() {
        let img = gradient_image(48, 32);
        let bytes = encode_jpeg(&img, 80).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (48, 32));
    }
}
