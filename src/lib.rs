#![doc = r#"
STICKERKIT — turn a photo and a foreground mask into a square, transparent sticker.

The crate composites a segmentation mask into an image's alpha channel, finds the
subject's bounding box, crops a padded square around it, resamples it to a fixed
sticker size (512 px by default) and exports it as lossless WebP or PNG to two
locations: an application-private cache used for sharing and a user-visible
folder whose failures are tolerated. It powers the `stickerkit` CLI and can be
embedded in your own Rust applications.

Stability
---------
The public library API is experimental in initial releases and may evolve.

Quick start: in-memory sticker
------------------------------
```rust
use stickerkit::{create_sticker, ForegroundMask, RasterImage, StickerParams};

fn main() -> stickerkit::Result<()> {
    let photo = RasterImage::from_pixel(400, 300, image::Rgba([200, 120, 80, 255]));
    let mask = ForegroundMask::from_fn(400, 300, |x, y| {
        if (100..300).contains(&x) && (50..250).contains(&y) { 1.0 } else { 0.0 }
    })?;

    let sticker = create_sticker(photo, mask, &StickerParams::default())?;
    assert_eq!(sticker.image.dimensions(), (512, 512));
    Ok(())
}
```

Pluggable segmentation
----------------------
Any `Fn(&RasterImage) -> Result<ForegroundMask, OracleError> + Send + Sync`
is a [`Segmenter`]. [`MaskFileSegmenter`] reads a grayscale mask from disk and
[`AlphaChannelSegmenter`] reuses an already cut-out image's alpha.

Background runs and export
--------------------------
```rust,no_run
use std::sync::Arc;
use stickerkit::{
    AlphaChannelSegmenter, ExportConfig, OutputFormat, PipelineStatus, StickerExporter,
    StickerOrchestrator, StickerParams,
};

fn main() -> stickerkit::Result<()> {
    let photo = stickerkit::io::load_image(std::path::Path::new("/photos/cat.png"))?;
    let mut orchestrator =
        StickerOrchestrator::new(Arc::new(AlphaChannelSegmenter), StickerParams::default());

    let done = orchestrator.submit(photo)?;
    if let Ok(PipelineStatus::Succeeded) = done.recv() {
        let exporter = StickerExporter::new(ExportConfig::default(), OutputFormat::Webp);
        let artifact = orchestrator.export(&exporter)?;
        println!("share {:?} as {}", artifact.primary_path(), artifact.mime_type());
    }
    Ok(())
}
```

Batch helpers
-------------
```rust,no_run
use std::path::Path;
use stickerkit::{process_directory, ExportConfig, OutputFormat, StickerExporter, StickerParams};

fn main() -> stickerkit::Result<()> {
    let exporter = StickerExporter::new(ExportConfig::default(), OutputFormat::Webp);
    let report = process_directory(
        Path::new("/photos"),
        Some(Path::new("/masks")),
        &StickerParams::default(),
        &exporter,
        true, // continue_on_error
    )?;

    println!("processed={} skipped={} errors={}", report.processed, report.skipped, report.errors);
    Ok(())
}
```

Error handling
--------------
All public functions return `stickerkit::Result<T>`; match on `stickerkit::Error`
to handle specific cases. A failed write to the user-visible folder is not an
error: it is recorded in `ExportResult::secondary_error`.

Useful modules
--------------
- [`api`] — high-level entry points.
- [`orchestrator`] — background runs, state machine and cancellation.
- [`core`] — composite, crop, resize and border stages plus parameters.
- [`io`] — image decoding, sticker encoding and dual-target export.
- [`segmentation`] — the segmentation oracle boundary.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod segmentation;
pub mod types;

// Curated public API surface
// Types
pub use core::params::{ExportConfig, StickerConfig, StickerParams};
pub use core::processing::pipeline::StickerImage;
pub use error::{Error, Result};
pub use types::{
    BoundingBox, CropRegion, ForegroundMask, OutputFormat, RasterImage, ResizeFilter, STICKER_SIZE,
};

// Pipeline stages
pub use core::processing::composite::composite;
pub use core::processing::crop::compute_crop_region;
pub use core::processing::resize::resize_sticker;

// Segmentation
pub use segmentation::{AlphaChannelSegmenter, MaskFileSegmenter, OracleError, Segmenter};

// Export
pub use io::export::{ExportResult, StickerArtifact, StickerExporter, export};

// Orchestration
pub use orchestrator::{PipelineStatus, StickerOrchestrator};

// High-level API re-exports
pub use api::{
    BatchReport, create_sticker, create_sticker_with, process_directory,
    process_directory_strict, process_file_to_artifact,
};
