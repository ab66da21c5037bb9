use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::core::params::StickerParams;
use crate::core::processing::border::{WHITE, add_border};
use crate::core::processing::composite::composite;
use crate::core::processing::crop::compute_crop_region;
use crate::core::processing::resize::resize_sticker;
use crate::error::{Error, Result};
use crate::segmentation::{OracleError, Segmenter};
use crate::types::{CropRegion, ForegroundMask, RasterImage};

/// A finished sticker together with the crop that produced it.
#[derive(Debug, Clone)]
pub struct StickerImage {
    pub image: RasterImage,
    pub source_width: u32,
    pub source_height: u32,
    pub crop: CropRegion,
}

fn checkpoint(cancel: &AtomicBool, next_stage: &str) -> Result<()> {
    if cancel.load(Ordering::Acquire) {
        info!("Run cancelled before {}", next_stage);
        return Err(Error::Cancelled);
    }
    trace!("Entering stage: {}", next_stage);
    Ok(())
}

/// Composite, crop, resize and (optionally) frame a sticker from an image and
/// its mask. Stages run strictly in order on the calling thread.
pub fn build_sticker(
    source: RasterImage,
    mask: ForegroundMask,
    params: &StickerParams,
) -> Result<StickerImage> {
    build_sticker_cancellable(source, mask, params, &AtomicBool::new(false))
}

pub fn build_sticker_cancellable(
    source: RasterImage,
    mask: ForegroundMask,
    params: &StickerParams,
    cancel: &AtomicBool,
) -> Result<StickerImage> {
    params.validate()?;
    let (source_width, source_height) = source.dimensions();

    checkpoint(cancel, "composite")?;
    let composited = composite(source, mask)?;

    checkpoint(cancel, "crop")?;
    let crop = compute_crop_region(&composited, params.alpha_threshold, params.padding_fraction)?;

    checkpoint(cancel, "resize")?;
    let mut image = resize_sticker(composited, crop, params.target_size, params.filter)?;

    if let Some(border) = params.border.filter(|b| *b > 0) {
        checkpoint(cancel, "border")?;
        image = add_border(&image, border, WHITE)?;
    }

    Ok(StickerImage {
        image,
        source_width,
        source_height,
        crop,
    })
}

/// Run the oracle on a helper thread and give up after `timeout`.
///
/// On timeout the helper is detached; its result is dropped when it finishes.
fn segment_bounded(
    segmenter: &Arc<dyn Segmenter>,
    image: RasterImage,
    timeout: Duration,
) -> Result<(RasterImage, ForegroundMask)> {
    let shared = Arc::new(image);
    let (tx, rx) = mpsc::channel();
    {
        let segmenter = Arc::clone(segmenter);
        let image = Arc::clone(&shared);
        thread::spawn(move || {
            let result = segmenter.segment(&image);
            drop(image);
            let _ = tx.send(result);
        });
    }

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            let mask = result?;
            let image = Arc::try_unwrap(shared).unwrap_or_else(|arc| (*arc).clone());
            Ok((image, mask))
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!("Segmentation exceeded {:?}, abandoning", timeout);
            Err(OracleError::Timeout(timeout).into())
        }
        Err(RecvTimeoutError::Disconnected) => Err(OracleError::Inference(
            "segmentation worker exited without a result".to_string(),
        )
        .into()),
    }
}

/// Full run: oracle, then [`build_sticker_cancellable`].
pub fn run_pipeline(
    segmenter: &Arc<dyn Segmenter>,
    image: RasterImage,
    params: &StickerParams,
    cancel: &AtomicBool,
) -> Result<StickerImage> {
    let start = Instant::now();
    params.validate()?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }

    checkpoint(cancel, "segmentation")?;
    debug!("Segmenting {}x{} image", width, height);
    let (image, mask) = match params.oracle_timeout() {
        Some(timeout) => segment_bounded(segmenter, image, timeout)?,
        None => {
            let mask = segmenter.segment(&image)?;
            (image, mask)
        }
    };
    debug!("Oracle returned {}x{} mask", mask.width(), mask.height());

    let sticker = build_sticker_cancellable(image, mask, params, cancel)?;
    info!(
        "Sticker ready: {}x{} in {:.2?}",
        sticker.image.width(),
        sticker.image.height(),
        start.elapsed()
    );
    Ok(sticker)
}
