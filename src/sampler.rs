use rand::Rng;

use crate::error::PaintError;
use crate::grid::{Color, Region};

/// Candidate solid-color rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rectangle {
    pub region: Region,
    pub color: Color,
}

/// Draws random rectangles that always fit a fixed canvas.
#[derive(Clone, Copy, Debug)]
pub struct RectSampler {
    canvas_width: usize,
    canvas_height: usize,
    max_size: usize,
}

impl RectSampler {
    /// Fails when the canvas cannot hold a `max_size` square.
    pub fn new(canvas_width: usize, canvas_height: usize, max_size: usize) -> Result<Self, PaintError> {
        if max_size == 0 {
            return Err(PaintError::ZeroRectSize);
        }
        if canvas_width < max_size {
            return Err(PaintError::TooNarrow { min: max_size, width: canvas_width });
        }
        if canvas_height < max_size {
            return Err(PaintError::TooShort { min: max_size, height: canvas_height });
        }
        Ok(Self {
            canvas_width,
            canvas_height,
            max_size,
        })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Rectangle {
        let width = rng.random_range(1..=self.max_size);
        let height = rng.random_range(1..=self.max_size);
        let x = rng.random_range(0..=self.canvas_width - width);
        let y = rng.random_range(0..=self.canvas_height - height);
        let color = [rng.random::<u8>(), rng.random::<u8>(), rng.random::<u8>()];
        Rectangle {
            region: Region { x, y, width, height },
            color,
        }
    }
}
