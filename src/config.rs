use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Approximate an image by painting random rectangles", long_about = None)]
pub struct Config {
    /// Image to approximate
    pub input: PathBuf,

    /// Where the final PNG is written (must not exist yet)
    pub output: PathBuf,

    /// Number of rectangles to paint
    #[arg(default_value_t = 1000)]
    pub rectangles: u64,

    /// Maximum width and height of a rectangle (px)
    #[arg(default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_rect_size: u32,

    /// Keep painting until the time limit or until killed; ignores RECTANGLES
    #[arg(long)]
    pub forever: bool,

    /// Stop at the first round boundary after this many seconds
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Log progress every N rectangles
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    pub print_every: u64,

    /// Also write an intermediate PNG every N rectangles
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub checkpoint_every: Option<u64>,

    /// RNG seed (optional)
    #[arg(long)]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_defaults() {
        let cfg = Config::try_parse_from(["rect-approx", "in.jpg", "out.png"]).unwrap();
        assert_eq!(cfg.rectangles, 1000);
        assert_eq!(cfg.max_rect_size, 20);
        assert_eq!(cfg.print_every, 100);
        assert!(!cfg.forever);
        assert!(cfg.checkpoint_every.is_none());
    }

    #[test]
    fn test_zero_rectangles_allowed() {
        let cfg = Config::try_parse_from(["rect-approx", "in.jpg", "out.png", "0", "5"]).unwrap();
        assert_eq!(cfg.rectangles, 0);
        assert_eq!(cfg.max_rect_size, 5);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(Config::try_parse_from(["rect-approx", "in.jpg", "out.png", "10", "0"]).is_err());
        assert!(Config::try_parse_from(["rect-approx", "in.jpg", "out.png", "-1"]).is_err());
        assert!(Config::try_parse_from(["rect-approx", "in.jpg", "out.png", "abc"]).is_err());
        assert!(Config::try_parse_from(["rect-approx", "in.jpg", "out.png", "--print-every", "0"]).is_err());
    }
}
