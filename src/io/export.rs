//! Dual-target sticker export.
//!
//! A sticker is encoded once and the same bytes are written to two places: a
//! primary, application-private location the share sheet reads from, and a
//! secondary, user-visible location that may be unavailable. Only the primary
//! write can fail an export. Both writes go through a temp file in the target
//! directory, so a failed write never leaves a partial file behind.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::{NamedTempFile, PersistError};
use tracing::{debug, info, warn};

use crate::core::params::ExportConfig;
use crate::core::processing::pipeline::StickerImage;
use crate::error::{Error, Result};
use crate::io::writers::lossless::encode_sticker;
use crate::io::writers::metadata::{StickerMetadata, write_sidecar};
use crate::types::{OutputFormat, RasterImage};

/// Same-second exports get `_1`, `_2`, ... up to this many attempts.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Where an export landed. `secondary_error` records a swallowed
/// `SecondaryExportFailed`.
#[derive(Debug)]
pub struct ExportResult {
    pub primary_path: PathBuf,
    pub secondary_path: Option<PathBuf>,
    pub secondary_error: Option<Error>,
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}

fn parent_of(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Write `bytes` to a temp file next to where `path` will live.
fn stage(path: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let dir = parent_of(path);
    ensure_dir(dir)?;
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".sticker-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Atomically replace `path` with `bytes`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    stage(path, bytes)?
        .persist(path)
        .map_err(|PersistError { error, .. }| error)?;
    Ok(())
}

fn write_secondary(path: &Path, bytes: &[u8]) -> (Option<PathBuf>, Option<Error>) {
    match write_atomic(path, bytes) {
        Ok(()) => {
            info!("Saved durable copy to {:?}", path);
            (Some(path.to_path_buf()), None)
        }
        Err(source) => {
            warn!("Durable copy to {:?} failed, keeping primary only: {}", path, source);
            (
                None,
                Some(Error::SecondaryExportFailed {
                    path: path.to_path_buf(),
                    source,
                }),
            )
        }
    }
}

/// Write already-encoded sticker bytes to both destinations.
pub fn export_bytes(bytes: &[u8], primary: &Path, secondary: &Path) -> Result<ExportResult> {
    write_atomic(primary, bytes).map_err(|source| Error::ExportFailed {
        path: primary.to_path_buf(),
        source,
    })?;
    info!("Saved sticker to {:?} ({} bytes)", primary, bytes.len());

    let (secondary_path, secondary_error) = write_secondary(secondary, bytes);
    Ok(ExportResult {
        primary_path: primary.to_path_buf(),
        secondary_path,
        secondary_error,
    })
}

/// Encode `image` once and write it to `primary` (fatal on failure) and
/// `secondary` (recorded on failure).
pub fn export(
    image: &RasterImage,
    primary: &Path,
    secondary: &Path,
    format: OutputFormat,
) -> Result<ExportResult> {
    let bytes = encode_sticker(image, format)?;
    export_bytes(&bytes, primary, secondary)
}

/// An exported sticker: pixels, encoded bytes and the files holding them.
#[derive(Debug)]
pub struct StickerArtifact {
    pub image: RasterImage,
    pub encoded: Vec<u8>,
    pub format: OutputFormat,
    pub export: ExportResult,
    pub sidecar_path: Option<PathBuf>,
}

impl StickerArtifact {
    /// The file to hand to a share target.
    pub fn primary_path(&self) -> &Path {
        &self.export.primary_path
    }

    pub fn secondary_path(&self) -> Option<&Path> {
        self.export.secondary_path.as_deref()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Delete every file this artifact wrote. Files already gone are ignored.
    pub fn cleanup(&self) -> Result<()> {
        let paths = std::iter::once(self.primary_path())
            .chain(self.secondary_path())
            .chain(self.sidecar_path.as_deref());
        for path in paths {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed {:?}", path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Names, encodes and writes stickers into the configured directories.
#[derive(Debug, Clone)]
pub struct StickerExporter {
    config: ExportConfig,
    format: OutputFormat,
}

impl StickerExporter {
    pub fn new(config: ExportConfig, format: OutputFormat) -> Self {
        Self { config, format }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// `{prefix}_{yyyyMMdd_HHmmss}[_{n}].{ext}`
    pub fn file_name(&self, captured_at: &DateTime<Local>, attempt: u32) -> String {
        let stamp = captured_at.format("%Y%m%d_%H%M%S");
        let ext = self.format.extension();
        if attempt == 0 {
            format!("{}_{}.{}", self.config.file_prefix, stamp, ext)
        } else {
            format!("{}_{}_{}.{}", self.config.file_prefix, stamp, attempt, ext)
        }
    }

    /// Look up a previously cached sticker by file name.
    pub fn find_sticker(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.config.cache_dir.join(file_name);
        path.is_file().then_some(path)
    }

    pub fn save(&self, sticker: &StickerImage) -> Result<StickerArtifact> {
        self.save_at(sticker, Local::now())
    }

    /// Export with an explicit capture time.
    ///
    /// The primary file is claimed with a no-clobber rename, so two exports in
    /// the same second end up in distinct files. The durable copy reuses the
    /// primary's final name.
    pub fn save_at(
        &self,
        sticker: &StickerImage,
        captured_at: DateTime<Local>,
    ) -> Result<StickerArtifact> {
        let bytes = encode_sticker(&sticker.image, self.format)?;
        let cache_dir = &self.config.cache_dir;

        let export_failed = |path: PathBuf, source: io::Error| Error::ExportFailed { path, source };

        let first = cache_dir.join(self.file_name(&captured_at, 0));
        let mut staged = stage(&first, &bytes).map_err(|e| export_failed(first.clone(), e))?;

        let mut primary = None;
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = cache_dir.join(self.file_name(&captured_at, attempt));
            match staged.persist_noclobber(&candidate) {
                Ok(_) => {
                    primary = Some(candidate);
                    break;
                }
                Err(PersistError { error, file }) if error.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("{:?} exists, trying next suffix", candidate);
                    staged = file;
                }
                Err(PersistError { error, .. }) => return Err(export_failed(candidate, error)),
            }
        }
        let primary = primary.ok_or_else(|| {
            export_failed(
                first.clone(),
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "no free sticker file name for this second",
                ),
            )
        })?;
        info!("Saved sticker to {:?} ({} bytes)", primary, bytes.len());

        let file_name = primary
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(self.file_name(&captured_at, 0)));
        let (secondary_path, secondary_error) =
            write_secondary(&self.config.shared_dir.join(file_name), &bytes);

        let sidecar_path = if self.config.sidecar {
            let metadata = StickerMetadata {
                created_at: captured_at,
                source_width: sticker.source_width,
                source_height: sticker.source_height,
                crop: sticker.crop,
                width: sticker.image.width(),
                height: sticker.image.height(),
                format: self.format,
                mime_type: self.format.mime_type().to_string(),
                encoded_bytes: bytes.len(),
            };
            match write_sidecar(&primary, &metadata) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Metadata sidecar for {:?} not written: {}", primary, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(StickerArtifact {
            image: sticker.image.clone(),
            encoded: bytes,
            format: self.format,
            export: ExportResult {
                primary_path: primary,
                secondary_path,
                secondary_error,
            },
            sidecar_path,
        })
    }
}
