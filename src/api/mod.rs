//! High-level, ergonomic library API: build stickers in memory, process a photo
//! file straight to an exported artifact, and batch helpers for directories.
//! Prefer these entrypoints over the low-level processing modules.
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{debug, error, info, warn};

use crate::core::params::StickerParams;
use crate::core::processing::pipeline::{StickerImage, build_sticker, run_pipeline};
use crate::error::{Error, Result};
use crate::io::export::{StickerArtifact, StickerExporter};
use crate::io::reader::{list_images, load_image};
use crate::segmentation::{AlphaChannelSegmenter, MaskFileSegmenter, Segmenter};
use crate::types::{ForegroundMask, RasterImage};

/// Build a sticker from an image and an already computed mask (no oracle, no disk I/O)
pub fn create_sticker(
    image: RasterImage,
    mask: ForegroundMask,
    params: &StickerParams,
) -> Result<StickerImage> {
    build_sticker(image, mask, params)
}

/// Build a sticker, asking `segmenter` for the mask
pub fn create_sticker_with(
    segmenter: &Arc<dyn Segmenter>,
    image: RasterImage,
    params: &StickerParams,
) -> Result<StickerImage> {
    run_pipeline(segmenter, image, params, &AtomicBool::new(false))
}

/// Decode `input`, build its sticker and export it
pub fn process_file_to_artifact(
    input: &Path,
    segmenter: &Arc<dyn Segmenter>,
    params: &StickerParams,
    exporter: &StickerExporter,
) -> Result<StickerArtifact> {
    info!("Processing {:?}", input);
    let image = load_image(input)?;
    let sticker = create_sticker_with(segmenter, image, params)?;
    exporter.save(&sticker)
}

/// Batch processing report
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub artifacts: Vec<PathBuf>,
}

fn masks_by_stem(mask_dir: &Path) -> Result<HashMap<OsString, PathBuf>> {
    let mut masks = HashMap::new();
    for path in list_images(mask_dir)? {
        if let Some(stem) = path.file_stem() {
            masks.insert(stem.to_os_string(), path);
        }
    }
    Ok(masks)
}

/// Turn every image in `input_dir` into an exported sticker.
///
/// With `mask_dir`, each input uses the mask file sharing its file stem and
/// inputs without one are skipped. Without it, each input's own alpha channel
/// is the mask. If `continue_on_error` is true, failures are counted in the
/// report and processing continues; otherwise the first error is returned.
pub fn process_directory(
    input_dir: &Path,
    mask_dir: Option<&Path>,
    params: &StickerParams,
    exporter: &StickerExporter,
    continue_on_error: bool,
) -> Result<BatchReport> {
    params.validate()?;
    let masks = mask_dir.map(masks_by_stem).transpose()?;
    let alpha: Arc<dyn Segmenter> = Arc::new(AlphaChannelSegmenter);

    let mut report = BatchReport::default();
    for input in list_images(input_dir)? {
        let segmenter = match &masks {
            Some(masks) => {
                let mask = input.file_stem().and_then(|stem| masks.get(stem));
                match mask {
                    Some(mask) => Arc::new(MaskFileSegmenter::new(mask)) as Arc<dyn Segmenter>,
                    None => {
                        warn!("No mask for {:?}, skipping", input);
                        report.skipped += 1;
                        continue;
                    }
                }
            }
            None => Arc::clone(&alpha),
        };

        match process_file_to_artifact(&input, &segmenter, params, exporter) {
            Ok(artifact) => {
                debug!("{:?} -> {:?}", input, artifact.primary_path());
                report.artifacts.push(artifact.primary_path().to_path_buf());
                report.processed += 1;
            }
            Err(e) => {
                error!("Failed to process {:?}: {}", input, e);
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    info!(
        "Batch done: processed={} skipped={} errors={}",
        report.processed, report.skipped, report.errors
    );
    Ok(report)
}

/// Like [`process_directory`], failing when the input directory holds no images
pub fn process_directory_strict(
    input_dir: &Path,
    mask_dir: Option<&Path>,
    params: &StickerParams,
    exporter: &StickerExporter,
) -> Result<BatchReport> {
    let report = process_directory(input_dir, mask_dir, params, exporter, false)?;
    if report.processed == 0 {
        return Err(Error::MissingArgument {
            arg: format!("images in {}", input_dir.display()),
        });
    }
    Ok(report)
}
