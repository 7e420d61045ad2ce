//! Image I/O

use crate::error::*;
use crate::pbrt::*;
use crate::spectrum::*;
use image::{ImageBuffer, ImageFormat, Rgb};

/// Write RGB pixels in row-major order to an 8-bit image. The format is
/// deduced from the file extension.
///
/// * `path`   - Output file path.
/// * `pixels` - Pixel colors.
/// * `width`  - Width of image.
/// * `height` - Height of image.
pub fn write_image(path: &str, pixels: &[Spectrum], width: usize, height: usize) -> Result<()> {
    info!("Writing image {path} with resolution {width}x{height}");

    let image_error = |source| Error::Image {
        path: path.to_owned(),
        source,
    };
    let format = ImageFormat::from_path(path).map_err(image_error)?;

    let mut imgbuf = ImageBuffer::new(width as u32, height as u32);
    for (i, px) in pixels.iter().enumerate().take(width * height) {
        let x = (i % width) as u32;
        let y = (i / width) as u32;
        imgbuf.put_pixel(x, y, Rgb(to_8_bit(px)));
    }

    imgbuf.save_with_format(path, format).map_err(image_error)
}

/// Apply gamma correction and quantize a color to 8-bit channels.
///
/// * `c` - Linear color.
fn to_8_bit(c: &Spectrum) -> [u8; 3] {
    let q = |v: Float| clamp(255.0 * gamma_correct(v) + 0.5, 0.0, 255.0) as u8;
    [q(c[0]), q(c[1]), q(c[2])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_extremes() {
        assert_eq!(to_8_bit(&Spectrum::ZERO), [0, 0, 0]);
        assert_eq!(to_8_bit(&Spectrum::ONE), [255, 255, 255]);
        assert_eq!(to_8_bit(&Spectrum::new(4.0)), [255, 255, 255]);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let r = write_image("out.unknown-ext", &[Spectrum::ZERO], 1, 1);
        assert!(matches!(r, Err(Error::Image { .. })));
    }
}
