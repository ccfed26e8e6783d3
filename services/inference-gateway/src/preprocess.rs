//! Image bytes -> normalized NCHW input tensor.

use image::imageops::FilterType;
use image::DynamicImage;

/// ImageNet channel statistics the exported backbone was trained with.
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decodes any format the `image` crate can sniff from the bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Resizes to `side x side` RGB and lays the pixels out channel-major (`[3, side, side]`),
/// each value scaled to `[0, 1]` then standardized with [`MEAN`] / [`STD`].
pub fn to_chw(img: &DynamicImage, side: u32) -> Vec<f32> {
    let rgb = img.resize_exact(side, side, FilterType::Triangle).to_rgb8();
    let plane = (side * side) as usize;
    let mut out = vec![0f32; 3 * plane];
    for (i, px) in rgb.pixels().enumerate() {
        for c in 0..3 {
            let v = px.0[c] as f32 / 255.0;
            out[c * plane + i] = (v - MEAN[c]) / STD[c];
        }
    }
    out
}

pub fn image_to_input(bytes: &[u8], side: u32) -> Result<Vec<f32>, image::ImageError> {
    let img = decode(bytes)?;
    Ok(to_chw(&img, side))
}
