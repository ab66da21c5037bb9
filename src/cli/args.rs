use clap::Parser;
use std::path::PathBuf;

use stickerkit::{OutputFormat, ResizeFilter};

#[derive(Parser, Debug)]
#[command(name = "stickerkit", version, about = "Turn photos into transparent stickers")]
pub struct CliArgs {
    /// Input photo (single file mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Grayscale mask for the input photo (white = subject). Without it the
    /// photo's own alpha channel is used
    #[arg(short, long)]
    pub mask: Option<PathBuf>,

    /// Input directory of photos (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory of masks matched to inputs by file stem (batch mode)
    #[arg(long)]
    pub mask_dir: Option<PathBuf>,

    /// Primary output directory; stickers here are the ones handed to share targets
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// User-visible output directory; failing to write here is only a warning
    #[arg(long)]
    pub shared_dir: Option<PathBuf>,

    /// JSON config file with `params` and `export` sections
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format (webp or png)
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Sticker edge length in pixels
    #[arg(long)]
    pub size: Option<u32>,

    /// Alpha values above this count as subject when cropping
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Padding around the subject as a fraction of its larger extent
    #[arg(long)]
    pub padding: Option<f64>,

    /// Resampling filter (bilinear, catmull-rom, lanczos3)
    #[arg(long, value_enum)]
    pub filter: Option<ResizeFilter>,

    /// Add a white border of this many pixels around the sticker
    #[arg(long)]
    pub border: Option<u32>,

    /// Give up on segmentation after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Write a JSON metadata sidecar next to each cached sticker
    #[arg(long, default_value_t = false)]
    pub sidecar: bool,

    /// Enable logging (RUST_LOG overrides the default `debug` level)
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: continue with other photos when one fails
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}
