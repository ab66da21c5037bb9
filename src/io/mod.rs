//! I/O layer: decoding input photos, encoding stickers, and writing them to
//! the primary and durable export locations.
pub mod reader;
pub use reader::{list_images, load_image};

pub mod export;
pub use export::{ExportResult, StickerArtifact, StickerExporter};

pub mod writers;
