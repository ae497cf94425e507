//! Image normalization and vertical stitching of webtoon panels.

use std::path::Path;

use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage};

/// Convert to RGB, compositing any alpha channel over white.
pub fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }
    let rgba = img.into_rgba8();
    let mut out = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Stack images top to bottom on a black canvas.
///
/// The canvas is as wide as the widest image and as tall as all heights
/// combined; narrower images are centered horizontally. Returns `None` for
/// an empty slice.
pub fn stack_vertically(images: &[RgbImage]) -> Option<RgbImage> {
    let width = images.iter().map(|i| i.width()).max()?;
    let height: u32 = images.iter().map(|i| i.height()).sum();

    let mut canvas = RgbImage::new(width, height);
    let mut y = 0i64;
    for img in images {
        let x = ((width - img.width()) / 2) as i64;
        imageops::replace(&mut canvas, img, x, y);
        y += img.height() as i64;
    }
    Some(canvas)
}

/// Encode as JPEG at `path`.
pub fn save_jpeg(img: &RgbImage, path: &Path) -> Result<(), image::ImageError> {
    img.save_with_format(path, ImageFormat::Jpeg)
}
