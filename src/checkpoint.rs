use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use crate::grid::PixelGrid;
use crate::io::save_png;
use crate::search::{Checkpointer, Progress};

/// Logs a status line every `every` rounds.
pub struct ProgressLog {
    every: u64,
}

impl ProgressLog {
    pub fn new(every: u64) -> Self {
        Self { every }
    }
}

impl Checkpointer for ProgressLog {
    fn interval(&self) -> u64 {
        self.every
    }

    fn checkpoint(&mut self, progress: &Progress<'_>) {
        info!(
            "{:6} rectangle(s) painted. Canvas differs from original image {:4.1}% less than blank canvas did.",
            progress.round,
            progress.improvement_pct()
        );
    }
}

/// Counts reported by [`SnapshotWriter::finish`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub written: u64,
    pub failed: u64,
    pub skipped: u64,
}

type Job = (u64, PathBuf, PixelGrid);

/// Writes intermediate PNGs named `<stem>-<round>.png` beside the final output.
///
/// A single worker thread encodes copies of the canvas. At most one write is
/// in progress and one more queued; checkpoints arriving while the queue is
/// full are skipped, so a slow disk never piles up canvas copies.
pub struct SnapshotWriter {
    every: u64,
    dir: PathBuf,
    stem: String,
    queue: Option<SyncSender<Job>>,
    worker: Option<JoinHandle<(u64, u64)>>,
    skipped: u64,
}

impl SnapshotWriter {
    pub fn new(output: &Path, every: u64) -> Self {
        Self::with_sink(output, every, save_png)
    }

    /// Same as [`SnapshotWriter::new`] but encodes through `sink`.
    pub fn with_sink<F>(output: &Path, every: u64, sink: F) -> Self
    where
        F: Fn(&PixelGrid, &Path) -> anyhow::Result<()> + Send + 'static,
    {
        let dir = output.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "canvas".to_string());

        let (tx, rx) = mpsc::sync_channel::<Job>(1);
        let worker = thread::spawn(move || {
            let (mut written, mut failed) = (0, 0);
            for (round, path, canvas) in rx {
                match sink(&canvas, &path) {
                    Ok(()) => {
                        info!("Checkpoint written to {}", path.display());
                        written += 1;
                    }
                    Err(e) => {
                        warn!("Skipping checkpoint at round {round}: {e:#}");
                        failed += 1;
                    }
                }
            }
            (written, failed)
        });

        Self {
            every,
            dir,
            stem,
            queue: Some(tx),
            worker: Some(worker),
            skipped: 0,
        }
    }

    pub fn path_for(&self, round: u64) -> PathBuf {
        self.dir.join(format!("{}-{round:06}.png", self.stem))
    }

    /// Drain the queue and stop the worker.
    pub fn finish(mut self) -> WriterStats {
        self.shutdown()
    }

    fn shutdown(&mut self) -> WriterStats {
        drop(self.queue.take());
        let (written, failed) = match self.worker.take().map(JoinHandle::join) {
            Some(Ok(counts)) => counts,
            Some(Err(_)) => {
                warn!("checkpoint writer thread panicked");
                (0, 0)
            }
            None => (0, 0),
        };
        WriterStats {
            written,
            failed,
            skipped: self.skipped,
        }
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shutdown();
        }
    }
}

impl Checkpointer for SnapshotWriter {
    fn interval(&self) -> u64 {
        self.every
    }

    fn checkpoint(&mut self, progress: &Progress<'_>) {
        let Some(queue) = &self.queue else { return };
        let job = (progress.round, self.path_for(progress.round), progress.canvas.snapshot());
        match queue.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!("writer busy, dropping checkpoint at round {}", progress.round);
                self.skipped += 1;
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("checkpoint writer stopped; no further checkpoints");
                self.queue = None;
            }
        }
    }
}
