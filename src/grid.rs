use rayon::prelude::*;

/// One RGB pixel, channels in `[r, g, b]` order.
pub type Color = [u8; 3];

/// Rectangular area of a grid, addressed by its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Dense row-major RGB buffer. Every `(x, y)` inside the bounds has exactly
/// one color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Color>, // length = width * height
}

impl PixelGrid {
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Wrap an existing row-major pixel vector. Returns `None` when the
    /// length does not match `width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Color {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.pixels[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[Color] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn contains(&self, region: &Region) -> bool {
        region.x + region.width <= self.width && region.y + region.height <= self.height
    }

    /// Read-only view of `region`. Panics if the region leaves the grid.
    pub fn patch(&self, region: Region) -> Patch<'_> {
        assert!(
            self.contains(&region),
            "region {region:?} exceeds {}x{} grid",
            self.width,
            self.height
        );
        Patch { grid: self, region }
    }

    /// Overwrite every pixel inside `region` with `color`.
    pub fn fill(&mut self, region: Region, color: Color) {
        assert!(
            self.contains(&region),
            "region {region:?} exceeds {}x{} grid",
            self.width,
            self.height
        );
        for y in region.y..region.y + region.height {
            let start = y * self.width + region.x;
            self.pixels[start..start + region.width].fill(color);
        }
    }

    /// Owned copy for consumers that must not alias the live buffer.
    pub fn snapshot(&self) -> PixelGrid {
        self.clone()
    }

    /// Per-channel mean, rounded half to even.
    pub fn average_color(&self) -> Color {
        let sums = self
            .pixels
            .par_iter()
            .fold(
                || [0u64; 3],
                |mut acc, p| {
                    for (s, &c) in acc.iter_mut().zip(p) {
                        *s += c as u64;
                    }
                    acc
                },
            )
            .reduce(|| [0u64; 3], |a, b| [a[0] + b[0], a[1] + b[1], a[2] + b[2]]);

        let n = self.pixels.len() as u64;
        sums.map(|s| round_half_even(s, n) as u8)
    }
}

fn round_half_even(num: u64, den: u64) -> u64 {
    let (q, r) = (num / den, num % den);
    match (2 * r).cmp(&den) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q & 1),
    }
}

/// Borrowed rectangular view into a [`PixelGrid`].
#[derive(Clone, Copy)]
pub struct Patch<'a> {
    grid: &'a PixelGrid,
    region: Region,
}

impl<'a> Patch<'a> {
    pub fn width(&self) -> usize {
        self.region.width
    }

    pub fn height(&self) -> usize {
        self.region.height
    }

    /// Rows top to bottom, each a slice of `width` pixels.
    pub fn rows(&self) -> impl Iterator<Item = &'a [Color]> + 'a {
        let Region { x, y, width, height } = self.region;
        let grid = self.grid;
        (y..y + height).map(move |row| &grid.row(row)[x..x + width])
    }
}
