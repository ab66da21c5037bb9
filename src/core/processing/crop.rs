use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{BoundingBox, CropRegion, RasterImage};

/// Pixels with alpha strictly above this count as subject.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 10;

/// Padding added around the subject, as a fraction of its larger extent.
pub const DEFAULT_PADDING_FRACTION: f64 = 0.20;

/// Scan the alpha channel for pixels above `alpha_threshold`.
///
/// Returns `None` when no pixel qualifies.
pub fn find_content_bounds(image: &RasterImage, alpha_threshold: u8) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] <= alpha_threshold {
            continue;
        }
        let b = bounds.get_or_insert(BoundingBox {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        });
        b.min_x = b.min_x.min(x);
        b.min_y = b.min_y.min(y);
        b.max_x = b.max_x.max(x);
        b.max_y = b.max_y.max(y);
    }

    bounds
}

/// Centered square of side `min(width, height)`.
pub fn centered_square(width: u32, height: u32) -> CropRegion {
    let size = width.min(height);
    CropRegion {
        left: (width - size) / 2,
        top: (height - size) / 2,
        size,
    }
}

/// Pad `bounds` and turn it into a square that stays inside `width` x `height`.
///
/// Each edge is clamped independently after padding, so the padded box can be
/// lopsided next to an image border. If the square would not fit, it is moved
/// inward and finally shrunk; at extreme aspect ratios that shrink can cut
/// subject pixels.
pub fn square_around(
    bounds: BoundingBox,
    width: u32,
    height: u32,
    padding_fraction: f64,
) -> CropRegion {
    let (w, h) = (width as i64, height as i64);
    let content_extent = bounds.width().max(bounds.height());
    // Anything past the larger dimension clamps to the image edges anyway.
    let padding = ((content_extent as f64 * padding_fraction).floor() as i64).min(w.max(h));

    let crop_left = (bounds.min_x as i64 - padding).clamp(0, w);
    let crop_top = (bounds.min_y as i64 - padding).clamp(0, h);
    let crop_right = (bounds.max_x as i64 + padding).clamp(0, w);
    let crop_bottom = (bounds.max_y as i64 + padding).clamp(0, h);

    let crop_width = crop_right - crop_left;
    let crop_height = crop_bottom - crop_top;

    let mut size = crop_width.max(crop_height).max(1);
    let left = crop_left - (size - crop_width) / 2;
    let top = crop_top - (size - crop_height) / 2;

    // `min` before `max`: when size exceeds a dimension the range is empty and
    // the origin pins to 0.
    let left = left.min(w - size).max(0);
    let top = top.min(h - size).max(0);
    size = size.min(w - left).min(h - top);

    debug!(
        "Padded box {}..{} x {}..{} (padding {}), square {} at {},{}",
        crop_left, crop_right, crop_top, crop_bottom, padding, size, left, top
    );

    CropRegion {
        left: left as u32,
        top: top as u32,
        size: size as u32,
    }
}

/// Find the square crop that frames the opaque subject of a composited image.
///
/// Falls back to a centered square when nothing exceeds `alpha_threshold`.
pub fn compute_crop_region(
    image: &RasterImage,
    alpha_threshold: u8,
    padding_fraction: f64,
) -> Result<CropRegion> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }
    if !padding_fraction.is_finite() || padding_fraction < 0.0 {
        return Err(Error::InvalidArgument {
            arg: "padding_fraction",
            value: padding_fraction.to_string(),
        });
    }

    let region = match find_content_bounds(image, alpha_threshold) {
        Some(bounds) => {
            debug!("Content bounds: {:?}", bounds);
            square_around(bounds, width, height, padding_fraction)
        }
        None => {
            info!("No content above alpha {}, using centered crop", alpha_threshold);
            centered_square(width, height)
        }
    };

    info!(
        "Crop region: left={}, top={}, size={} (image {}x{})",
        region.left, region.top, region.size, width, height
    );
    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn with_opaque_rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RasterImage {
        RasterImage::from_fn(width, height, |x, y| {
            let inside = (x0..=x1).contains(&x) && (y0..=y1).contains(&y);
            Rgba([200, 150, 100, if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn bounds_are_inclusive() {
        let img = with_opaque_rect(50, 40, 10, 5, 20, 30);
        let b = find_content_bounds(&img, DEFAULT_ALPHA_THRESHOLD).unwrap();
        assert_eq!(
            b,
            BoundingBox {
                min_x: 10,
                min_y: 5,
                max_x: 20,
                max_y: 30
            }
        );
    }

    #[test]
    fn threshold_is_strict() {
        let img = RasterImage::from_pixel(8, 8, Rgba([0, 0, 0, 10]));
        assert!(find_content_bounds(&img, 10).is_none());
        assert!(find_content_bounds(&img, 9).is_some());
    }

    #[test]
    fn centered_subject_gets_padded_square() {
        // 1000x1000 with content spanning 300..=700.
        let img = with_opaque_rect(1000, 1000, 300, 300, 700, 700);
        let region = compute_crop_region(&img, 10, 0.2).unwrap();
        assert_eq!(
            region,
            CropRegion {
                left: 220,
                top: 220,
                size: 560
            }
        );
    }

    #[test]
    fn padding_uses_floor_of_extent() {
        // Extent 399 -> padding floor(79.8) = 79.
        let img = with_opaque_rect(1000, 1000, 300, 300, 699, 699);
        let region = compute_crop_region(&img, 10, 0.2).unwrap();
        assert_eq!(
            region,
            CropRegion {
                left: 221,
                top: 221,
                size: 557
            }
        );
    }

    #[test]
    fn no_content_falls_back_to_centered_square() {
        let img = RasterImage::from_pixel(300, 200, Rgba([1, 2, 3, 0]));
        let region = compute_crop_region(&img, 10, 0.2).unwrap();
        assert_eq!(
            region,
            CropRegion {
                left: 50,
                top: 0,
                size: 200
            }
        );
    }

    #[test]
    fn wide_subject_is_squared_and_centered() {
        // Content 100 wide, 20 tall: padding 20, box 140x60 -> square 140.
        let img = with_opaque_rect(400, 400, 150, 190, 250, 210);
        let region = compute_crop_region(&img, 10, 0.2).unwrap();
        assert_eq!(region.size, 140);
        assert_eq!(region.left, 130);
        assert_eq!(region.top, 130);
    }

    #[test]
    fn padding_is_clamped_at_image_edges() {
        // Subject touching the top-left corner.
        let img = with_opaque_rect(200, 200, 0, 0, 49, 49);
        let region = compute_crop_region(&img, 10, 0.2).unwrap();
        // padding = 9, box 0..58 on both axes.
        assert_eq!(
            region,
            CropRegion {
                left: 0,
                top: 0,
                size: 58
            }
        );
    }

    #[test]
    fn single_pixel_subject_yields_positive_region() {
        let img = with_opaque_rect(10, 10, 9, 9, 9, 9);
        let region = compute_crop_region(&img, 10, 0.2).unwrap();
        assert!(region.size > 0);
        assert!(region.fits_within(10, 10));
    }

    #[test]
    fn extreme_aspect_ratio_shrinks_and_may_cut_content() {
        // Tall subject in a very wide, short image: the square is limited by the
        // image height, so part of the subject's width can fall outside.
        let img = with_opaque_rect(1000, 50, 100, 0, 900, 49);
        let region = compute_crop_region(&img, 10, 0.2).unwrap();
        assert!(region.fits_within(1000, 50));
        assert_eq!(region.size, 50);
        let bounds = find_content_bounds(&img, 10).unwrap();
        assert!(region.left > bounds.min_x || region.left + region.size < bounds.max_x);
    }

    #[test]
    fn huge_padding_fraction_covers_whole_image() {
        let img = with_opaque_rect(10, 10, 2, 2, 5, 5);
        let region = compute_crop_region(&img, 10, 1e300).unwrap();
        assert_eq!(
            region,
            CropRegion {
                left: 0,
                top: 0,
                size: 10
            }
        );
    }

    #[test]
    fn empty_image_is_an_error() {
        let err = compute_crop_region(&RasterImage::new(0, 10), 10, 0.2).unwrap_err();
        assert!(matches!(err, Error::EmptyImage { .. }));
    }

    #[test]
    fn negative_padding_is_rejected() {
        let img = RasterImage::new(4, 4);
        assert!(matches!(
            compute_crop_region(&img, 10, -0.1),
            Err(Error::InvalidArgument { .. })
        ));
    }
}
