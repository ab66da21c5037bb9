//! Shared types and enums used across stickerkit.
//! Includes the pixel containers (`RasterImage`, `ForegroundMask`), the crop
//! geometry (`BoundingBox`, `CropRegion`), and the CLI-facing enums
//! `OutputFormat` and `ResizeFilter`.
use clap::ValueEnum;
use image::RgbaImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fixed edge length of a finished sticker, in pixels.
pub const STICKER_SIZE: u32 = 512;

/// 8-bit RGBA raster, row-major. Camera and gallery input is decoded into this
/// with alpha = 255.
pub type RasterImage = RgbaImage;

/// Per-pixel foreground confidence in `[0, 1]`, shape `(height, width)`.
///
/// The mask may have a different resolution than the image it belongs to; the
/// compositor maps between the two with nearest-pixel scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct ForegroundMask {
    data: Array2<f32>,
}

impl ForegroundMask {
    /// Wrap a `(rows, cols)` confidence array. Zero-area arrays are rejected.
    pub fn new(data: Array2<f32>) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: u32::try_from(cols).unwrap_or(u32::MAX),
                height: u32::try_from(rows).unwrap_or(u32::MAX),
            });
        }
        Ok(Self { data })
    }

    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> f32,
    {
        let data = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            f(x as u32, y as u32)
        });
        Self::new(data)
    }

    /// Uniform mask, mostly useful for tests and for "keep everything" runs.
    pub fn filled(width: u32, height: u32, confidence: f32) -> Result<Self> {
        Self::new(Array2::from_elem(
            (height as usize, width as usize),
            confidence,
        ))
    }

    /// Interpret a grayscale image as a mask: `confidence = luma / 255`.
    pub fn from_luma(luma: &image::GrayImage) -> Result<Self> {
        Self::from_fn(luma.width(), luma.height(), |x, y| {
            luma.get_pixel(x, y)[0] as f32 / 255.0
        })
    }

    /// Reuse an existing alpha channel as the foreground confidence.
    pub fn from_alpha(image: &RasterImage) -> Result<Self> {
        Self::from_fn(image.width(), image.height(), |x, y| {
            image.get_pixel(x, y)[3] as f32 / 255.0
        })
    }

    pub fn width(&self) -> u32 {
        self.data.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.data.nrows() as u32
    }

    pub fn confidence(&self, x: u32, y: u32) -> f32 {
        self.data[[y as usize, x as usize]]
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }
}

/// Inclusive pixel bounds of the opaque content of an image.
///
/// A scan that finds no content yields `None` instead of a degenerate box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }
}

/// Square region inside an image: `left + size <= width`, `top + size <= height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub size: u32,
}

impl CropRegion {
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.size > 0
            && self.left as u64 + self.size as u64 <= width as u64
            && self.top as u64 + self.size as u64 <= height as u64
    }
}

/// Lossless, alpha-preserving output containers.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Png => "png",
        }
    }

    /// Content type declared to share targets.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Png => "image/png",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Webp => write!(f, "WebP (lossless)"),
            OutputFormat::Png => write!(f, "PNG"),
        }
    }
}

/// Convolution filter used when scaling the crop to the sticker size.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    #[default]
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl std::fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResizeFilter::Bilinear => write!(f, "Bilinear"),
            ResizeFilter::CatmullRom => write!(f, "CatmullRom"),
            ResizeFilter::Lanczos3 => write!(f, "Lanczos3"),
        }
    }
}
