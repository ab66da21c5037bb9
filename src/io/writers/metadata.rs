use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::io::export::write_atomic;
use crate::types::{CropRegion, OutputFormat};

/// JSON sidecar describing how a sticker was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerMetadata {
    pub created_at: DateTime<Local>,
    pub source_width: u32,
    pub source_height: u32,
    pub crop: CropRegion,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub mime_type: String,
    pub encoded_bytes: usize,
}

/// Sidecar path for a sticker file: `sticker_x.webp` -> `sticker_x.json`.
pub fn sidecar_path(sticker: &Path) -> PathBuf {
    sticker.with_extension("json")
}

/// Write `metadata` as pretty JSON next to `sticker`, returning the sidecar path.
pub fn write_sidecar(sticker: &Path, metadata: &StickerMetadata) -> Result<PathBuf> {
    let path = sidecar_path(sticker);
    let json = serde_json::to_string_pretty(metadata)?;
    write_atomic(&path, json.as_bytes())?;
    info!("Wrote metadata sidecar {:?}", path);
    Ok(path)
}

pub fn read_sidecar(path: &Path) -> Result<StickerMetadata> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
