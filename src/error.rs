//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Stage failures of the sticker pipeline map to dedicated variants so callers
//! (and the orchestrator's `Failed` state) can tell them apart.
use std::path::PathBuf;

use thiserror::Error;

use crate::segmentation::OracleError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Cannot crop an empty image ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Crop region {left},{top}+{size} lies outside a {width}x{height} image")]
    InvalidCropRegion {
        left: u32,
        top: u32,
        size: u32,
        width: u32,
        height: u32,
    },

    #[error("Segmentation failed: {0}")]
    SegmentationFailed(#[from] OracleError),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Export to {path:?} failed: {source}")]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secondary export to {path:?} failed: {source}")]
    SecondaryExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A sticker run is already in progress")]
    Busy,

    #[error("Sticker run was cancelled")]
    Cancelled,

    #[error("No finished sticker is available")]
    NoSticker,

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    pub fn processing<E: std::fmt::Display>(e: E) -> Self {
        Error::Processing(e.to_string())
    }

    /// Short, stable name of the error kind, used in logs and batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "Io",
            Error::Json(_) => "Json",
            Error::InvalidDimensions { .. } => "InvalidDimensions",
            Error::EmptyImage { .. } => "EmptyImage",
            Error::InvalidCropRegion { .. } => "InvalidCropRegion",
            Error::SegmentationFailed(_) => "SegmentationFailed",
            Error::EncodingFailed(_) => "EncodingFailed",
            Error::DecodingFailed(_) => "DecodingFailed",
            Error::ExportFailed { .. } => "ExportFailed",
            Error::SecondaryExportFailed { .. } => "SecondaryExportFailed",
            Error::Busy => "Busy",
            Error::Cancelled => "Cancelled",
            Error::NoSticker => "NoSticker",
            Error::InvalidArgument { .. } => "InvalidArgument",
            Error::MissingArgument { .. } => "MissingArgument",
            Error::Processing(_) => "Processing",
        }
    }
}
