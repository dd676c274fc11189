use rayon::prelude::*;

use crate::grid::{Color, Patch, PixelGrid};

/// Weighted Manhattan distance, weights 2/3/1 for r/g/b. At most 1530.
#[inline]
pub fn color_diff(a: Color, b: Color) -> u64 {
    2 * a[0].abs_diff(b[0]) as u64 + 3 * a[1].abs_diff(b[1]) as u64 + a[2].abs_diff(b[2]) as u64
}

/// Sum of [`color_diff`] over corresponding pixels of two equally sized patches.
pub fn patch_diff(a: Patch<'_>, b: Patch<'_>) -> u64 {
    assert!(
        a.width() == b.width() && a.height() == b.height(),
        "patch size mismatch: {}x{} vs {}x{}",
        a.width(),
        a.height(),
        b.width(),
        b.height()
    );
    a.rows()
        .zip(b.rows())
        .map(|(ra, rb)| ra.iter().zip(rb).map(|(&p, &q)| color_diff(p, q)).sum::<u64>())
        .sum()
}

/// Error of a patch against a solid fill of `color`.
pub fn patch_color_diff(patch: Patch<'_>, color: Color) -> u64 {
    patch
        .rows()
        .map(|row| row.iter().map(|&p| color_diff(p, color)).sum::<u64>())
        .sum()
}

/// Brute-force error over two whole grids.
pub fn total_error(a: &PixelGrid, b: &PixelGrid) -> u64 {
    assert!(
        a.width() == b.width() && a.height() == b.height(),
        "grid size mismatch: {}x{} vs {}x{}",
        a.width(),
        a.height(),
        b.width(),
        b.height()
    );
    let w = a.width();
    a.pixels()
        .par_chunks(w)
        .zip(b.pixels().par_chunks(w))
        .map(|(ra, rb)| ra.iter().zip(rb).map(|(&p, &q)| color_diff(p, q)).sum::<u64>())
        .sum()
}
