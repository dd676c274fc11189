use log::debug;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::PaintError;
use crate::grid::PixelGrid;
use crate::metric::{patch_color_diff, patch_diff, total_error};
use crate::sampler::{RectSampler, Rectangle};

// ---------------- Round bookkeeping -------------------------------------------

/// Outcome of one accepted rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Round {
    pub rectangle: Rectangle,
    /// Error of the covered area before painting.
    pub old_error: u64,
    /// Error of the covered area after painting.
    pub new_error: u64,
}

/// State handed to a [`Checkpointer`]. Only ever built between rounds, so the
/// canvas never shows a partially painted rectangle.
pub struct Progress<'a> {
    pub canvas: &'a PixelGrid,
    pub round: u64,
    pub running_error: u64,
    pub initial_error: u64,
}

impl Progress<'_> {
    /// How much closer the canvas is to the target than the blank canvas was, in percent.
    pub fn improvement_pct(&self) -> f64 {
        if self.initial_error == 0 {
            return 100.0;
        }
        (1.0 - self.running_error as f64 / self.initial_error as f64) * 100.0
    }
}

/// Observer called every `interval()` accepted rounds.
pub trait Checkpointer {
    fn interval(&self) -> u64;
    fn checkpoint(&mut self, progress: &Progress<'_>);
}

// ---------------- Initial canvas ----------------------------------------------

/// Validated starting point of a run.
pub struct Initial {
    pub canvas: PixelGrid,
    pub running_error: u64,
    pub sampler: RectSampler,
}

/// Build the flat canvas (target's average color) and its full error. The
/// size check happens here, before any candidate is drawn.
pub fn initialize(target: &PixelGrid, max_rect_size: usize) -> Result<Initial, PaintError> {
    let sampler = RectSampler::new(target.width(), target.height(), max_rect_size)?;
    let canvas = PixelGrid::filled(target.width(), target.height(), target.average_color());
    let running_error = total_error(&canvas, target);
    Ok(Initial {
        canvas,
        running_error,
        sampler,
    })
}

// ---------------- Hill climbing -----------------------------------------------

/// Hill-climbing painter. Owns the canvas; the running error is maintained
/// incrementally and always equals `total_error(canvas, target)`.
pub struct Painter<R> {
    target: PixelGrid,
    canvas: PixelGrid,
    sampler: RectSampler,
    rng: R,
    initial_error: u64,
    running_error: u64,
    round: u64,
    cancel: Arc<AtomicBool>,
}

impl<R: Rng> Painter<R> {
    pub fn new(target: PixelGrid, max_rect_size: usize, rng: R) -> Result<Self, PaintError> {
        let Initial {
            canvas,
            running_error,
            sampler,
        } = initialize(&target, max_rect_size)?;
        Ok(Self {
            target,
            canvas,
            sampler,
            rng,
            initial_error: running_error,
            running_error,
            round: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that stops any run at the next round boundary once set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn canvas(&self) -> &PixelGrid {
        &self.canvas
    }

    pub fn running_error(&self) -> u64 {
        self.running_error
    }

    /// True when the canvas equals the target, so `step` can never return.
    pub fn is_optimal(&self) -> bool {
        self.running_error == 0
    }

    /// Accepted rounds so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn progress(&self) -> Progress<'_> {
        Progress {
            canvas: &self.canvas,
            round: self.round,
            running_error: self.running_error,
            initial_error: self.initial_error,
        }
    }

    /// Paint `rectangle` if it strictly lowers the error of the area it covers.
    pub fn propose(&mut self, rectangle: Rectangle) -> Option<Round> {
        let target_patch = self.target.patch(rectangle.region);
        let old_error = patch_diff(target_patch, self.canvas.patch(rectangle.region));
        let new_error = patch_color_diff(target_patch, rectangle.color);
        // ties are rejected
        if new_error >= old_error {
            return None;
        }

        self.canvas.fill(rectangle.region, rectangle.color);
        self.running_error -= old_error - new_error;
        self.round += 1;
        Some(Round {
            rectangle,
            old_error,
            new_error,
        })
    }

    /// Draw one random rectangle and propose it.
    pub fn try_candidate(&mut self) -> Option<Round> {
        let rectangle = self.sampler.sample(&mut self.rng);
        self.propose(rectangle)
    }

    /// Retry random candidates until one is accepted. Never returns once the
    /// canvas already matches the target, since no candidate can improve on it.
    pub fn step(&mut self) -> Round {
        let mut attempts: u64 = 1;
        loop {
            if let Some(round) = self.try_candidate() {
                debug!(
                    "round {} accepted after {attempts} attempt(s): {:?} delta {}",
                    self.round,
                    round.rectangle,
                    round.old_error - round.new_error
                );
                return round;
            }
            attempts += 1;
        }
    }

    // ---------------- Run loops ------------------------------------------------

    /// Paint `rounds` more rectangles, or fewer if the cancel flag is raised.
    pub fn run_bounded(&mut self, rounds: u64, checkpointers: &mut [&mut dyn Checkpointer]) {
        let end = self.round + rounds;
        self.run_until_cancelled(|p| p.round >= end, checkpointers);
    }

    /// Paint until `cancelled` returns true or the cancel flag is raised. Both
    /// are only consulted between rounds.
    pub fn run_until_cancelled<F>(&mut self, mut cancelled: F, checkpointers: &mut [&mut dyn Checkpointer])
    where
        F: FnMut(&Progress<'_>) -> bool,
    {
        while !self.is_cancelled() && !cancelled(&self.progress()) {
            self.step();
            let progress = self.progress();
            for cp in checkpointers.iter_mut() {
                let every = cp.interval();
                if every > 0 && progress.round % every == 0 {
                    cp.checkpoint(&progress);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Color, Region};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noise(width: usize, height: usize, seed: u64) -> PixelGrid {
        let mut rng = StdRng::seed_from_u64(seed);
        let pixels = (0..width * height)
            .map(|_| [rng.random::<u8>(), rng.random::<u8>(), rng.random::<u8>()])
            .collect();
        PixelGrid::from_pixels(width, height, pixels).unwrap()
    }

    struct Recorder {
        every: u64,
        seen: Vec<(u64, u64)>,
        canvas_errors: Vec<u64>,
        target: PixelGrid,
    }

    impl Checkpointer for Recorder {
        fn interval(&self) -> u64 {
            self.every
        }

        fn checkpoint(&mut self, progress: &Progress<'_>) {
            self.seen.push((progress.round, progress.running_error));
            self.canvas_errors.push(total_error(progress.canvas, &self.target));
        }
    }

    #[test]
    fn test_initialize_uniform_target_has_zero_error() {
        let target = PixelGrid::filled(4, 4, [100, 100, 100]);
        let initial = initialize(&target, 2).unwrap();
        assert_eq!(initial.canvas, target);
        assert_eq!(initial.running_error, 0);
    }

    #[test]
    fn test_no_improvement_at_optimum() {
        let target = PixelGrid::filled(4, 4, [100, 100, 100]);
        let mut painter = Painter::new(target, 4, StdRng::seed_from_u64(3)).unwrap();
        assert!(painter.is_optimal());
        for _ in 0..10_000 {
            assert!(painter.try_candidate().is_none());
        }
        assert_eq!(painter.round(), 0);
        assert_eq!(painter.running_error(), 0);
    }

    #[test]
    fn test_oversized_rect_fails_before_sampling() {
        let target = noise(8, 5, 1);
        assert_eq!(
            initialize(&target, 6).err(),
            Some(PaintError::TooShort { min: 6, height: 5 })
        );
        assert!(Painter::new(target, 9, StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_pixel_corrections_reach_zero() {
        let black: Color = [0, 0, 0];
        let white: Color = [255, 255, 255];
        let target = PixelGrid::from_pixels(2, 2, vec![black, white, white, black]).unwrap();
        let mut painter = Painter::new(target.clone(), 1, StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(painter.canvas().get(0, 0), [128, 128, 128]);
        assert!(painter.running_error() > 0);

        for y in 0..2 {
            for x in 0..2 {
                let rectangle = Rectangle {
                    region: Region { x, y, width: 1, height: 1 },
                    color: target.get(x, y),
                };
                assert!(painter.propose(rectangle).is_some());
            }
        }
        assert_eq!(painter.round(), 4);
        assert_eq!(painter.running_error(), 0);
        assert_eq!(painter.canvas(), &target);
    }

    #[test]
    fn test_propose_rejects_ties() {
        let target = PixelGrid::from_pixels(2, 1, vec![[10, 10, 10], [30, 30, 30]]).unwrap();
        let mut painter = Painter::new(target, 1, StdRng::seed_from_u64(0)).unwrap();
        // canvas is [20, 20, 20]; [0, 0, 0] is equally far from [10, 10, 10]
        let tie = Rectangle {
            region: Region { x: 0, y: 0, width: 1, height: 1 },
            color: [0, 0, 0],
        };
        assert!(painter.propose(tie).is_none());
        assert_eq!(painter.canvas().get(0, 0), [20, 20, 20]);
    }

    #[test]
    fn test_running_error_matches_brute_force() {
        let target = noise(24, 17, 11);
        let mut painter = Painter::new(target.clone(), 6, StdRng::seed_from_u64(5)).unwrap();
        assert!(!painter.is_optimal());
        assert_eq!(painter.running_error(), total_error(painter.canvas(), &target));

        let mut last = painter.running_error();
        for _ in 0..300 {
            let round = painter.step();
            assert!(round.new_error < round.old_error);
            assert!(painter.running_error() < last);
            last = painter.running_error();
            assert_eq!(painter.running_error(), total_error(painter.canvas(), &target));
        }
    }

    #[test]
    fn test_run_bounded_counts_rounds_and_checkpoints() {
        let target = noise(16, 16, 2);
        let mut painter = Painter::new(target.clone(), 4, StdRng::seed_from_u64(8)).unwrap();
        let mut recorder = Recorder {
            every: 10,
            seen: Vec::new(),
            canvas_errors: Vec::new(),
            target,
        };
        painter.run_bounded(45, &mut [&mut recorder as &mut dyn Checkpointer]);

        assert_eq!(painter.round(), 45);
        let rounds: Vec<u64> = recorder.seen.iter().map(|&(r, _)| r).collect();
        assert_eq!(rounds, vec![10, 20, 30, 40]);
        for (&(_, running), &actual) in recorder.seen.iter().zip(&recorder.canvas_errors) {
            assert_eq!(running, actual);
        }
    }

    #[test]
    fn test_run_bounded_zero_rounds_is_noop() {
        let target = noise(8, 8, 4);
        let mut painter = Painter::new(target, 3, StdRng::seed_from_u64(1)).unwrap();
        let before = painter.canvas().clone();
        painter.run_bounded(0, &mut []);
        assert_eq!(painter.canvas(), &before);
        assert_eq!(painter.round(), 0);
    }

    #[test]
    fn test_run_until_cancelled_stops_on_round_boundary() {
        let target = noise(12, 12, 9);
        let mut painter = Painter::new(target.clone(), 5, StdRng::seed_from_u64(2)).unwrap();
        let mut polls = 0;
        painter.run_until_cancelled(
            |p| {
                polls += 1;
                p.running_error < p.initial_error / 2 || p.round >= 2_000
            },
            &mut [],
        );
        assert_eq!(polls, painter.round() + 1);
        assert_eq!(painter.running_error(), total_error(painter.canvas(), &target));
    }

    struct StopAt {
        round: u64,
        flag: Arc<AtomicBool>,
    }

    impl Checkpointer for StopAt {
        fn interval(&self) -> u64 {
            1
        }

        fn checkpoint(&mut self, progress: &Progress<'_>) {
            if progress.round == self.round {
                self.flag.store(true, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn test_cancel_flag_stops_bounded_run_between_rounds() {
        let target = noise(16, 12, 21);
        let mut painter = Painter::new(target.clone(), 4, StdRng::seed_from_u64(6)).unwrap();
        let mut stop = StopAt {
            round: 7,
            flag: painter.cancel_flag(),
        };
        painter.run_bounded(1_000, &mut [&mut stop as &mut dyn Checkpointer]);

        assert!(painter.is_cancelled());
        assert_eq!(painter.round(), 7);
        assert_eq!(painter.running_error(), total_error(painter.canvas(), &target));

        // a raised flag keeps later runs from painting at all
        painter.run_until_cancelled(|_| false, &mut []);
        assert_eq!(painter.round(), 7);
    }
}
