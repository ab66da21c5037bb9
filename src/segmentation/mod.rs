//! Segmentation oracle boundary.
//!
//! The model that turns a photo into a foreground-probability mask is an
//! external collaborator. The pipeline only sees the [`Segmenter`] trait, so a
//! real model, a mask file on disk, or a synthetic closure in a test can be
//! injected interchangeably.
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::types::{ForegroundMask, RasterImage};

/// Failure reported by a segmentation backend.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("segmentation model unavailable: {0}")]
    Unavailable(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("segmentation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Maps an image to a foreground mask.
///
/// Implementations must be shareable across the orchestrator's worker thread.
/// `close` releases the backing model; the orchestrator calls it exactly once
/// when it is dropped.
pub trait Segmenter: Send + Sync {
    fn segment(&self, image: &RasterImage) -> Result<ForegroundMask, OracleError>;

    fn close(&self) {}
}

impl<F> Segmenter for F
where
    F: Fn(&RasterImage) -> Result<ForegroundMask, OracleError> + Send + Sync,
{
    fn segment(&self, image: &RasterImage) -> Result<ForegroundMask, OracleError> {
        self(image)
    }
}

/// Reads a precomputed mask from a grayscale image file (white = subject).
#[derive(Debug, Clone)]
pub struct MaskFileSegmenter {
    path: PathBuf,
}

impl MaskFileSegmenter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Segmenter for MaskFileSegmenter {
    fn segment(&self, _image: &RasterImage) -> Result<ForegroundMask, OracleError> {
        debug!("Loading mask from {:?}", self.path);
        let luma = image::open(&self.path)
            .map_err(|e| OracleError::Unavailable(format!("{}: {}", self.path.display(), e)))?
            .to_luma8();
        ForegroundMask::from_luma(&luma).map_err(|e| OracleError::MalformedInput(e.to_string()))
    }
}

/// Treats the input's own alpha channel as the mask, for already cut-out images.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaChannelSegmenter;

impl Segmenter for AlphaChannelSegmenter {
    fn segment(&self, image: &RasterImage) -> Result<ForegroundMask, OracleError> {
        ForegroundMask::from_alpha(image).map_err(|e| OracleError::MalformedInput(e.to_string()))
    }
}
