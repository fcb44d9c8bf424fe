use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, ImageResult, Rgba, RgbaImage};

/// Satu lapisan raster yang ditempel di atas background.
/// Offset boleh negatif; bagian di luar background dipotong.
#[derive(Debug, Clone)]
pub struct Layer {
    pub image: RgbaImage,
    pub left: i64,
    pub top: i64,
}

impl Layer {
    pub fn new(image: RgbaImage, left: i64, top: i64) -> Self {
        Self { image, left, top }
    }
}

// =====================================================================
// PUBLIC PURE API
// =====================================================================
// - Pure function
// - Deterministic
// - Aman dipanggil dari thread mana pun
// =====================================================================

/// Posisi vertikal teks: `round(height * percent / 100)`.
pub fn text_baseline(height: u32, percent: u32) -> u32 {
    ((u64::from(height) * u64::from(percent) + 50) / 100) as u32
}

/// Tinggi baru saat lebar diubah ke `target_width`, rasio aspek dipertahankan.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let width = u64::from(width.max(1));
    let scaled = (u64::from(height) * u64::from(target_width) + width / 2) / width;
    (scaled as u32).max(1)
}

/// Offset kiri agar layer berada di tengah horizontal background.
/// Pembulatan mengikuti half-up (`floor(x + 0.5)`).
pub fn centered_left(base_width: u32, layer_width: u32) -> i64 {
    let diff = i64::from(base_width) - i64::from(layer_width);
    diff.div_euclid(2) + diff.rem_euclid(2)
}

pub fn resize_to_width(img: &DynamicImage, target_width: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    img.resize_exact(target_width, scaled_height(w, h, target_width), FilterType::Lanczos3)
        .to_rgba8()
}

/// Tempel satu layer ke base, menghasilkan raster baru.
pub fn composite(base: &RgbaImage, layer: &Layer) -> RgbaImage {
    let (bw, bh) = base.dimensions();
    ImageBuffer::from_fn(bw, bh, |x, y| blend_pixel(base, layer, x, y))
}

/// Ratakan semua layer secara berurutan (layer terakhir paling atas).
pub fn flatten(base: RgbaImage, layers: &[Layer]) -> RgbaImage {
    layers.iter().fold(base, |acc, layer| composite(&acc, layer))
}

pub fn encode_png(img: &RgbaImage) -> ImageResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}

//
// =====================================================================
// HELPER PURE FUNCTIONS (PRIVATE)
// =====================================================================
//

// -----------------------------------------------------
// Ambil pixel layer di koordinat background (jika tertutup layer)
// -----------------------------------------------------
fn layer_pixel(layer: &Layer, x: u32, y: u32) -> Option<Rgba<u8>> {
    let lx = i64::from(x) - layer.left;
    let ly = i64::from(y) - layer.top;
    let (lw, lh) = layer.image.dimensions();

    let is_inside_layer = lx >= 0 && ly >= 0 && lx < i64::from(lw) && ly < i64::from(lh);

    is_inside_layer.then(|| *layer.image.get_pixel(lx as u32, ly as u32))
}

// -----------------------------------------------------
// Blend satu pixel (PURE, no side effect)
// -----------------------------------------------------
fn blend_pixel(base: &RgbaImage, layer: &Layer, x: u32, y: u32) -> Rgba<u8> {
    let base_px = *base.get_pixel(x, y);

    match layer_pixel(layer, x, y) {
        Some(layer_px) => source_over(base_px, layer_px),
        None => base_px,
    }
}

// -----------------------------------------------------
// Operator "source over" untuk alpha lurus (non-premultiplied)
// -----------------------------------------------------
fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let src_alpha = f32::from(src.0[3]) / 255.0;
    let dst_alpha = f32::from(dst.0[3]) / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);

    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| blend_channel(dst.0[i], dst_alpha, src.0[i], src_alpha, out_alpha);

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_alpha * 255.0).round() as u8,
    ])
}

// -----------------------------------------------------
// Blend satu channel warna (PURE matematis)
// -----------------------------------------------------
fn blend_channel(dst: u8, dst_alpha: f32, src: u8, src_alpha: f32, out_alpha: f32) -> u8 {
    let value = (f32::from(src) * src_alpha + f32::from(dst) * dst_alpha * (1.0 - src_alpha)) / out_alpha;
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn text_baseline_rounds_half_up() {
        assert_eq!(text_baseline(600, 15), 90);
        assert_eq!(text_baseline(10, 15), 2);
        assert_eq!(text_baseline(0, 15), 0);
    }

    #[test]
    fn scaled_height_keeps_aspect_ratio() {
        assert_eq!(scaled_height(200, 100, 100), 50);
        assert_eq!(scaled_height(300, 100, 100), 33);
        assert_eq!(scaled_height(50, 80, 100), 160);
        assert_eq!(scaled_height(1000, 1, 100), 1);
    }

    #[test]
    fn centered_left_handles_odd_and_oversized_layers() {
        assert_eq!(centered_left(800, 100), 350);
        assert_eq!(centered_left(801, 100), 351);
        assert_eq!(centered_left(99, 100), 0);
        assert_eq!(centered_left(60, 100), -20);
    }

    #[test]
    fn composite_places_opaque_layer_at_offset() {
        let base = RgbaImage::from_pixel(10, 10, BLUE);
        let layer = Layer::new(RgbaImage::from_pixel(2, 3, RED), 4, 5);

        let out = composite(&base, &layer);

        assert_eq!(*out.get_pixel(4, 5), RED);
        assert_eq!(*out.get_pixel(5, 7), RED);
        assert_eq!(*out.get_pixel(6, 5), BLUE);
        assert_eq!(*out.get_pixel(4, 8), BLUE);
        assert_eq!(out.dimensions(), (10, 10));
    }

    #[test]
    fn composite_clips_layer_outside_base() {
        let base = RgbaImage::from_pixel(4, 4, BLUE);
        let layer = Layer::new(RgbaImage::from_pixel(4, 4, RED), -2, -2);

        let out = composite(&base, &layer);

        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(1, 1), RED);
        assert_eq!(*out.get_pixel(2, 2), BLUE);
    }

    #[test]
    fn transparent_layer_pixels_keep_background() {
        let base = RgbaImage::from_pixel(2, 2, BLUE);
        let layer = Layer::new(RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 0])), 0, 0);

        let out = composite(&base, &layer);

        assert_eq!(*out.get_pixel(1, 1), BLUE);
    }

    #[test]
    fn half_transparent_layer_blends_channels() {
        let base = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let layer = Layer::new(RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 128])), 0, 0);

        let px = *composite(&base, &layer).get_pixel(0, 0);

        assert_eq!(px.0[3], 255);
        assert!((126..=130).contains(&px.0[0]));
    }

    #[test]
    fn flatten_applies_layers_in_order() {
        let base = RgbaImage::from_pixel(3, 1, BLUE);
        let white = Rgba([255, 255, 255, 255]);
        let layers = [
            Layer::new(RgbaImage::from_pixel(2, 1, white), 0, 0),
            Layer::new(RgbaImage::from_pixel(1, 1, RED), 1, 0),
        ];

        let out = flatten(base, &layers);

        assert_eq!(*out.get_pixel(0, 0), white);
        assert_eq!(*out.get_pixel(1, 0), RED);
        assert_eq!(*out.get_pixel(2, 0), BLUE);
    }

    #[test]
    fn resize_to_width_uses_target_width() {
        let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 100, RED));
        let resized = resize_to_width(&logo, 100);
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn encode_png_produces_decodable_image() {
        let img = RgbaImage::from_pixel(7, 3, RED);
        let bytes = encode_png(&img).unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (7, 3));
    }
}
