use thiserror::Error;

/// Configuration problems detected before any search work starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaintError {
    #[error("Maximum rectangle size must be 1 or greater.")]
    ZeroRectSize,

    #[error("Must be at least {min} pixels wide (image is {width}).")]
    TooNarrow { min: usize, width: usize },

    #[error("Must be at least {min} pixels tall (image is {height}).")]
    TooShort { min: usize, height: usize },
}
