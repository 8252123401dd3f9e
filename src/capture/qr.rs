//! QR lookup on in-memory images.
//!
//! Both adapters funnel their pixels through [`decode_image`]: convert to
//! greyscale, optionally crop the centered scan box, hand the buffer to
//! `rqrr`, and return the first grid that decodes.

use image::{imageops, DynamicImage, GrayImage};

/// Decode the first readable QR code in `image`.
///
/// When `scan_box` is set and smaller than the image, only the centered
/// square of that size is searched.
#[must_use]
pub fn decode_image(image: &DynamicImage, scan_box: Option<u32>) -> Option<String> {
    let gray = image.to_luma8();
    let region = match scan_box {
        Some(size) => center_region(&gray, size),
        None => gray,
    };
    decode_luma(&region)
}

/// Decode the first readable QR code in a greyscale buffer.
#[must_use]
pub fn decode_luma(gray: &GrayImage) -> Option<String> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    if width == 0 || height == 0 {
        return None;
    }

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        gray.get_pixel(x as u32, y as u32).0[0]
    });

    let grids = prepared.detect_grids();
    log::trace!("Detected {} candidate grid(s)", grids.len());

    for grid in grids {
        match grid.decode() {
            Ok((_, content)) => return Some(content),
            Err(e) => log::debug!("QR grid found but not decodable: {:?}", e),
        }
    }

    None
}

/// Crop the centered `size`×`size` square, or return the image unchanged
/// when it already fits.
#[must_use]
pub fn center_region(gray: &GrayImage, size: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if size == 0 || (width <= size && height <= size) {
        return gray.clone();
    }

    let crop_w = size.min(width);
    let crop_h = size.min(height);
    let x = (width - crop_w) / 2;
    let y = (height - crop_h) / 2;
    imageops::crop_imm(gray, x, y, crop_w, crop_h).to_image()
}
