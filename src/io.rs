use anyhow::{Context, Result, bail};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::Path;

use crate::grid::PixelGrid;

/// Decode an image file into a grid. Grayscale and other alpha-free formats
/// are widened to RGB; anything with an alpha channel is refused.
pub fn load_image(path: &Path) -> Result<PixelGrid> {
    let img = image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    if img.color().has_alpha() {
        bail!("Unrecognized pixel format (try removing the alpha channel).");
    }
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let pixels = rgb.pixels().map(|p| p.0).collect();
    PixelGrid::from_pixels(w as usize, h as usize, pixels)
        .with_context(|| format!("decoded pixel count does not match {w}x{h}"))
}

pub fn to_rgb_image(grid: &PixelGrid) -> RgbImage {
    let width = grid.width();
    ImageBuffer::from_fn(width as u32, grid.height() as u32, |x, y| {
        Rgb(grid.pixels()[y as usize * width + x as usize])
    })
}

/// Encode `grid` as PNG. Fails if `path` already exists.
pub fn save_png(grid: &PixelGrid, path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    to_rgb_image(grid)
        .write_to(&mut writer, ImageFormat::Png)
        .with_context(|| format!("failed to encode {}", path.display()))?;
    Ok(())
}
