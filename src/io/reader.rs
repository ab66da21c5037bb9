use std::fs;
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::types::RasterImage;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff"];

/// Decode an image file into RGBA. Inputs without alpha come back fully opaque.
pub fn load_image(path: &Path) -> Result<RasterImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let decoded = reader
        .decode()
        .map_err(|e| Error::DecodingFailed(format!("{}: {}", path.display(), e)))?;
    let rgba = decoded.to_rgba8();
    debug!(
        "Loaded {:?}: {}x{}",
        path,
        rgba.width(),
        rgba.height()
    );
    Ok(rgba)
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        } else {
            trace!("Not an image, ignoring: {:?}", path);
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn rgb_input_becomes_opaque_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])).save(&path).unwrap();

        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert!(img.pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_image(Path::new("/no/such/photo.jpg")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn corrupt_file_is_decoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\nnot really").unwrap();
        assert!(matches!(load_image(&path), Err(Error::DecodingFailed(_))));
    }

    #[test]
    fn listing_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<_> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.JPG"]);
    }
}
