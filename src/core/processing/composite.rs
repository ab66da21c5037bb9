use ndarray::parallel::prelude::*;
use ndarray::{ArrayViewMut3, Axis};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{ForegroundMask, RasterImage};

/// Nearest mask index for a source coordinate: `floor(i * dst / src)`, clamped.
pub fn nearest_index(i: u32, source_len: u32, mask_len: u32) -> usize {
    let scaled = (i as u64 * mask_len as u64) / source_len as u64;
    scaled.min(mask_len as u64 - 1) as usize
}

/// Convert a confidence to an 8-bit alpha: `round(c * 255)`; NaN reads as 0.
pub fn confidence_to_alpha(confidence: f32) -> u8 {
    if confidence.is_nan() {
        return 0;
    }
    (confidence.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Overwrite the alpha channel of `source` with the foreground mask.
///
/// The mask is sampled with independent nearest-pixel scaling on each axis, so
/// it may have any resolution. RGB is left untouched and the output has the
/// source's dimensions. Rows are filled in parallel; the result does not depend
/// on scheduling.
pub fn composite(source: RasterImage, mask: ForegroundMask) -> Result<RasterImage> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    let (mask_width, mask_height) = (mask.width(), mask.height());

    debug!(
        "Compositing {}x{} image with {}x{} mask",
        width, height, mask_width, mask_height
    );

    let mask_columns: Vec<usize> = (0..width)
        .map(|x| nearest_index(x, width, mask_width))
        .collect();
    let confidences = mask.as_array();

    let mut buffer = source.into_raw();
    {
        let mut pixels =
            ArrayViewMut3::from_shape((height as usize, width as usize, 4), buffer.as_mut_slice())
                .map_err(Error::processing)?;

        pixels
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(y, mut row)| {
                let mask_row = nearest_index(y as u32, height, mask_height);
                for (x, mut pixel) in row.axis_iter_mut(Axis(0)).enumerate() {
                    pixel[3] = confidence_to_alpha(confidences[[mask_row, mask_columns[x]]]);
                }
            });
    }

    info!("Applied foreground mask to {}x{} image", width, height);

    RasterImage::from_raw(width, height, buffer)
        .ok_or_else(|| Error::Processing("composited buffer has unexpected length".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RasterImage {
        RasterImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 99, 255])
        })
    }

    #[test]
    fn rgb_is_preserved_and_alpha_is_replaced() {
        let source = gradient(16, 9);
        let mask = ForegroundMask::from_fn(16, 9, |x, _| if x < 8 { 0.0 } else { 1.0 }).unwrap();
        let out = composite(source.clone(), mask).unwrap();

        assert_eq!(out.dimensions(), source.dimensions());
        for (a, b) in out.pixels().zip(source.pixels()) {
            assert_eq!(a.0[..3], b.0[..3]);
        }
        assert_eq!(out.get_pixel(3, 4)[3], 0);
        assert_eq!(out.get_pixel(12, 4)[3], 255);
    }

    #[test]
    fn composite_is_deterministic() {
        let mask = ForegroundMask::from_fn(5, 7, |x, y| (x + y) as f32 / 10.0).unwrap();
        let a = composite(gradient(33, 21), mask.clone()).unwrap();
        let b = composite(gradient(33, 21), mask).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn smaller_mask_is_scaled_with_nearest_pixel() {
        // 2x2 mask over a 4x4 image: each mask cell covers a 2x2 block.
        let mask = ForegroundMask::from_fn(2, 2, |x, y| if x == 1 && y == 0 { 1.0 } else { 0.0 })
            .unwrap();
        let out = composite(gradient(4, 4), mask).unwrap();
        assert_eq!(out.get_pixel(2, 0)[3], 255);
        assert_eq!(out.get_pixel(3, 1)[3], 255);
        assert_eq!(out.get_pixel(1, 0)[3], 0);
        assert_eq!(out.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn larger_mask_is_sampled_down() {
        let mask = ForegroundMask::from_fn(10, 10, |x, _| x as f32 / 9.0).unwrap();
        let out = composite(gradient(2, 1), mask).unwrap();
        // x=0 -> mask column 0, x=1 -> mask column 5
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 0)[3], confidence_to_alpha(5.0 / 9.0));
    }

    #[test]
    fn alpha_rounds_and_clamps() {
        assert_eq!(confidence_to_alpha(0.5), 128);
        assert_eq!(confidence_to_alpha(0.0), 0);
        assert_eq!(confidence_to_alpha(1.0), 255);
        assert_eq!(confidence_to_alpha(1.7), 255);
        assert_eq!(confidence_to_alpha(-0.2), 0);
        assert_eq!(confidence_to_alpha(f32::NAN), 0);
    }

    #[test]
    fn zero_area_source_is_rejected() {
        let mask = ForegroundMask::filled(1, 1, 1.0).unwrap();
        let err = composite(RasterImage::new(0, 5), mask).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { width: 0, height: 5 }));
    }

    #[test]
    fn nearest_index_never_exceeds_mask() {
        for x in 0..1000 {
            assert!(nearest_index(x, 1000, 256) < 256);
        }
        assert_eq!(nearest_index(999, 1000, 256), 255);
    }
}
