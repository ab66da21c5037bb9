use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{OutputFormat, RasterImage};

/// Encode an RGBA sticker into a lossless container that keeps alpha.
pub fn encode_sticker(image: &RasterImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let (width, height) = image.dimensions();

    match format {
        OutputFormat::Webp => WebPEncoder::new_lossless(&mut buffer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        OutputFormat::Png => PngEncoder::new(&mut buffer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    }
    .map_err(|e| Error::EncodingFailed(e.to_string()))?;

    debug!(
        "Encoded {}x{} sticker as {}: {} bytes",
        width,
        height,
        format,
        buffer.len()
    );
    Ok(buffer)
}

/// Decode sticker bytes (any format `image` understands) back to RGBA.
pub fn decode_sticker(bytes: &[u8]) -> Result<RasterImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| Error::DecodingFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn soft_edged(size: u32) -> RasterImage {
        RasterImage::from_fn(size, size, |x, y| {
            Rgba([(x * 3) as u8, (y * 5) as u8, 77, ((x + y) * 4 % 256) as u8])
        })
    }

    #[test]
    fn webp_round_trip_keeps_alpha_exactly() {
        let img = soft_edged(48);
        let bytes = encode_sticker(&img, OutputFormat::Webp).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");

        let decoded = decode_sticker(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), img.dimensions());
        for (a, b) in decoded.pixels().zip(img.pixels()) {
            assert_eq!(a[3], b[3]);
            if b[3] > 0 {
                assert_eq!(a.0, b.0);
            }
        }
    }

    #[test]
    fn png_round_trip_is_exact() {
        let img = soft_edged(33);
        let bytes = encode_sticker(&img, OutputFormat::Png).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_sticker(&bytes).unwrap(), img);
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            decode_sticker(b"definitely not an image"),
            Err(Error::DecodingFailed(_))
        ));
    }
}
