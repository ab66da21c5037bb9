use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{CropRegion, RasterImage, ResizeFilter};

fn to_fast_filter(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Bilinear => FilterType::Bilinear,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Crop `region` out of `image` and scale it to `target_size` x `target_size`.
///
/// Resampling runs on premultiplied alpha so transparent pixels do not bleed
/// their (arbitrary) colour into the subject's edge.
pub fn resize_sticker(
    image: RasterImage,
    region: CropRegion,
    target_size: u32,
    filter: ResizeFilter,
) -> Result<RasterImage> {
    let (width, height) = image.dimensions();
    if target_size == 0 {
        return Err(Error::InvalidDimensions {
            width: target_size,
            height: target_size,
        });
    }
    if !region.fits_within(width, height) {
        return Err(Error::InvalidCropRegion {
            left: region.left,
            top: region.top,
            size: region.size,
            width,
            height,
        });
    }

    info!(
        "Resizing {}px crop at {},{} to {}x{} ({})",
        region.size, region.left, region.top, target_size, target_size, filter
    );

    let src_image = Image::from_vec_u8(width, height, image.into_raw(), PixelType::U8x4)
        .map_err(Error::processing)?;
    let mut dst_image = Image::new(target_size, target_size, PixelType::U8x4);

    let options = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(to_fast_filter(filter)))
        .crop(
            region.left as f64,
            region.top as f64,
            region.size as f64,
            region.size as f64,
        )
        .use_alpha(true);

    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(Error::processing)?;

    debug!("Resize complete");

    RasterImage::from_raw(target_size, target_size, dst_image.into_vec())
        .ok_or_else(|| Error::Processing("resized buffer has unexpected length".to_string()))
}
