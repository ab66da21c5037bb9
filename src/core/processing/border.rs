use image::Rgba;
use image::imageops::overlay;
use tracing::info;

use crate::error::{Error, Result};
use crate::types::RasterImage;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Frame a sticker with a solid `border`-pixel margin.
///
/// The canvas is filled with `color` and the sticker is blended on top, so an
/// opaque colour also fills the sticker's transparent areas. Output is
/// `(width + 2 * border) x (height + 2 * border)`.
pub fn add_border(image: &RasterImage, border: u32, color: Rgba<u8>) -> Result<RasterImage> {
    let (width, height) = image.dimensions();
    let out_width = border
        .checked_mul(2)
        .and_then(|b| b.checked_add(width))
        .ok_or(Error::InvalidArgument {
            arg: "border",
            value: border.to_string(),
        })?;
    let out_height = border
        .checked_mul(2)
        .and_then(|b| b.checked_add(height))
        .ok_or(Error::InvalidArgument {
            arg: "border",
            value: border.to_string(),
        })?;

    info!(
        "Adding {}px border: {}x{} -> {}x{}",
        border, width, height, out_width, out_height
    );

    let mut canvas = RasterImage::from_pixel(out_width, out_height, color);
    overlay(&mut canvas, image, border as i64, border as i64);
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_grows_canvas_and_fills_margin() {
        let img = RasterImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let out = add_border(&img, 2, WHITE).unwrap();
        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(*out.get_pixel(0, 0), WHITE);
        assert_eq!(*out.get_pixel(7, 3), WHITE);
        assert_eq!(*out.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn transparent_border_keeps_transparency() {
        let img = RasterImage::from_pixel(2, 2, Rgba([9, 9, 9, 0]));
        let out = add_border(&img, 1, Rgba([0, 0, 0, 0])).unwrap();
        assert!(out.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn overflowing_border_is_rejected() {
        let img = RasterImage::new(1, 1);
        assert!(add_border(&img, u32::MAX, WHITE).is_err());
    }
}
