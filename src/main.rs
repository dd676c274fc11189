// rect-approx/src/main.rs
// Approximate an image by painting random solid rectangles, keeping only the
// ones that bring the canvas closer to the original.
// -----------------------------------------------------------------------------
// BUILD
//   cargo run --release -- photo.jpg out.png 5000 20 --checkpoint-every 1000
// Ctrl-C stops at the next round boundary and still writes out.png; a second
// Ctrl-C exits immediately.
// -----------------------------------------------------------------------------

mod checkpoint;
mod config;
mod error;
mod grid;
mod io;
mod metric;
mod sampler;
mod search;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use checkpoint::{ProgressLog, SnapshotWriter};
use config::Config;
use search::{Checkpointer, Painter};

// ---------------- MAIN --------------------------------------------------------
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let start = Instant::now();
    let cfg = Config::parse();

    if !cfg.input.is_file() {
        bail!("Input file not found.");
    }
    if cfg.output.exists() {
        bail!("Output file already exists.");
    }

    info!("Reading {}...", cfg.input.display());
    let target = io::load_image(&cfg.input)?;

    let rng = match cfg.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let mut painter = Painter::new(target, cfg.max_rect_size as usize, rng)?;
    info!(
        "Creating a blank canvas filled with color {:?}...",
        painter.canvas().get(0, 0)
    );
    if painter.is_optimal() && (cfg.forever || cfg.rectangles > 0) {
        warn!("Canvas already matches the image; no rectangle can improve it, so painting will not finish. Press Ctrl-C twice to quit.");
    }

    let cancel = painter.cancel_flag();
    ctrlc::set_handler(move || {
        if cancel.swap(true, Ordering::Relaxed) {
            std::process::exit(130);
        }
        eprintln!("Stopping after the current rectangle...");
    })
    .context("failed to install Ctrl-C handler")?;

    // ---------------- Checkpointers --------------------------------------------
    let mut progress = ProgressLog::new(cfg.print_every);
    let mut snapshots = cfg
        .checkpoint_every
        .map(|every| SnapshotWriter::new(&cfg.output, every));
    let mut checkpointers: Vec<&mut dyn Checkpointer> = Vec::new();
    checkpointers.push(&mut progress);
    if let Some(writer) = snapshots.as_mut() {
        checkpointers.push(writer);
    }

    // ---------------- Paint ----------------------------------------------------
    let deadline = cfg.duration.map(|secs| start + Duration::from_secs(secs));
    let out_of_time = || deadline.is_some_and(|d| Instant::now() >= d);

    if cfg.forever {
        info!(
            "Painting rectangles of maximum width & height {} on canvas until stopped...",
            cfg.max_rect_size
        );
        painter.run_until_cancelled(|_| out_of_time(), &mut checkpointers);
    } else {
        info!(
            "Painting {} rectangle(s) of maximum width & height {} on canvas...",
            cfg.rectangles, cfg.max_rect_size
        );
        match deadline {
            None => painter.run_bounded(cfg.rectangles, &mut checkpointers),
            Some(_) => {
                let end = cfg.rectangles;
                painter.run_until_cancelled(|p| p.round >= end || out_of_time(), &mut checkpointers);
            }
        }
    }
    drop(checkpointers);
    if painter.is_cancelled() {
        info!("Interrupted after {} rectangle(s).", painter.round());
    }
    if let Some(writer) = snapshots {
        let stats = writer.finish();
        info!(
            "Checkpoints: {} written, {} failed, {} skipped while the writer was busy.",
            stats.written, stats.failed, stats.skipped
        );
    }

    // ---------------- Output ---------------------------------------------------
    info!(
        "Painted {} rectangle(s); canvas differs from original image {:.1}% less than blank canvas did.",
        painter.round(),
        painter.progress().improvement_pct()
    );
    info!("Writing canvas to {}...", cfg.output.display());
    io::save_png(painter.canvas(), &cfg.output)?;

    info!("Time elapsed: {:.1} second(s).", start.elapsed().as_secs_f64());
    Ok(())
}
