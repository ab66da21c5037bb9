use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::processing::crop::{DEFAULT_ALPHA_THRESHOLD, DEFAULT_PADDING_FRACTION};
use crate::error::{Error, Result};
use crate::types::{OutputFormat, ResizeFilter, STICKER_SIZE};

/// Sticker pipeline parameters suitable for config files and CLI presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickerParams {
    /// Alpha values strictly above this count as subject when cropping
    pub alpha_threshold: u8,
    /// Padding around the subject as a fraction of its larger extent
    pub padding_fraction: f64,
    /// Edge length of the output sticker in pixels
    pub target_size: u32,
    pub filter: ResizeFilter,
    pub format: OutputFormat,
    /// Optional white border in pixels, added after resizing
    pub border: Option<u32>,
    /// Abandon the segmentation oracle after this many milliseconds
    pub oracle_timeout_ms: Option<u64>,
}

impl Default for StickerParams {
    fn default() -> Self {
        Self {
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            padding_fraction: DEFAULT_PADDING_FRACTION,
            target_size: STICKER_SIZE,
            filter: ResizeFilter::Bilinear,
            format: OutputFormat::Webp,
            border: None,
            oracle_timeout_ms: None,
        }
    }
}

impl StickerParams {
    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(Error::InvalidArgument {
                arg: "target_size",
                value: self.target_size.to_string(),
            });
        }
        if !self.padding_fraction.is_finite() || self.padding_fraction < 0.0 {
            return Err(Error::InvalidArgument {
                arg: "padding_fraction",
                value: self.padding_fraction.to_string(),
            });
        }
        if self.oracle_timeout_ms == Some(0) {
            return Err(Error::InvalidArgument {
                arg: "oracle_timeout_ms",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn oracle_timeout(&self) -> Option<Duration> {
        self.oracle_timeout_ms.map(Duration::from_millis)
    }
}

/// Where exported stickers go and how they are named
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Application-private, always-writable location used for sharing
    pub cache_dir: PathBuf,
    /// User-visible location; writes here may fail without failing the export
    pub shared_dir: PathBuf,
    pub file_prefix: String,
    /// Write a JSON metadata sidecar next to the cached sticker
    pub sidecar: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("stickerkit").join("stickers"),
            shared_dir: PathBuf::from("Stickers"),
            file_prefix: "sticker".to_string(),
            sidecar: false,
        }
    }
}

/// Combined config file layout: `{ "params": {...}, "export": {...} }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickerConfig {
    pub params: StickerParams,
    pub export: ExportConfig,
}

impl StickerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: StickerConfig = serde_json::from_str(&text)?;
        config.params.validate()?;
        Ok(config)
    }
}
