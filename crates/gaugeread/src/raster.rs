//! Decoding and encoding of raw image bytes.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

use crate::error::{GaugeError, Result};

/// Decode encoded image bytes (PNG, JPEG, ...) into an RGB pixel grid.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(GaugeError::EmptyImage);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Luma conversion of an RGB image.
pub fn to_gray(rgb: &RgbImage) -> GrayImage {
    DynamicImage::ImageRgb8(rgb.clone()).to_luma8()
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn png_roundtrip_preserves_pixels() {
        let mut rgb = RgbImage::new(8, 6);
        rgb.put_pixel(3, 2, Rgb([200, 10, 30]));
        let bytes = encode_png(&DynamicImage::ImageRgb8(rgb.clone())).expect("encode");
        let back = decode(&bytes).expect("decode");
        assert_eq!(back.dimensions(), (8, 6));
        assert_eq!(back.get_pixel(3, 2), &Rgb([200, 10, 30]));
    }

    #[test]
    fn gray_conversion_keeps_extremes() {
        let mut rgb = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        rgb.put_pixel(0, 0, Rgb([0, 0, 0]));
        let gray = to_gray(&rgb);
        assert_eq!(gray.get_pixel(0, 0), &Luma([0]));
        assert_eq!(gray.get_pixel(1, 1), &Luma([255]));
    }

    #[test]
    fn rejects_empty_and_garbage_input() {
        assert!(matches!(decode(&[]), Err(GaugeError::EmptyImage)));
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(GaugeError::ImageDecode(_))
        ));
    }
}
