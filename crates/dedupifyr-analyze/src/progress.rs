//! Detection progress reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use dedupifyr_core::ComparisonKind;

/// Stages every detection run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    /// Request accepted, nothing read yet.
    Initialized,
    /// Image descriptors (and fingerprints) are ready.
    ImagesBuilt,
    /// All scoring work is done.
    PairwiseCompared,
    /// Results are assembled and about to be returned.
    ResultsAggregated,
}

/// Progress information during a detection run.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionProgress {
    /// Which strategy is running.
    pub kind: ComparisonKind,
    /// Phase just entered.
    pub phase: RunPhase,
    /// Image descriptors built so far.
    pub images_built: u64,
    /// Pairwise comparisons performed so far.
    pub comparisons: u64,
    /// Duplicates recorded so far.
    pub duplicates_found: u64,
    /// Time elapsed since the run started.
    pub elapsed: Duration,
}

impl DetectionProgress {
    /// Comparisons per second so far.
    pub fn comparisons_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.comparisons as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Per-run counters that publish a [`DetectionProgress`] on every phase change.
#[derive(Debug)]
pub(crate) struct ProgressReporter {
    kind: ComparisonKind,
    start_time: Instant,
    images_built: AtomicU64,
    comparisons: AtomicU64,
    duplicates_found: AtomicU64,
    tx: broadcast::Sender<DetectionProgress>,
}

impl ProgressReporter {
    pub fn new(kind: ComparisonKind, tx: broadcast::Sender<DetectionProgress>) -> Self {
        Self {
            kind,
            start_time: Instant::now(),
            images_built: AtomicU64::new(0),
            comparisons: AtomicU64::new(0),
            duplicates_found: AtomicU64::new(0),
            tx,
        }
    }

    pub fn record_images(&self, count: usize) {
        self.images_built.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_comparisons(&self, count: usize) {
        self.comparisons.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_duplicates(&self, count: usize) {
        self.duplicates_found.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn enter(&self, phase: RunPhase) {
        let snapshot = self.snapshot(phase);
        debug!(
            kind = %self.kind,
            ?phase,
            images = snapshot.images_built,
            comparisons = snapshot.comparisons,
            duplicates = snapshot.duplicates_found,
            "phase changed"
        );
        // No subscribers is fine
        let _ = self.tx.send(snapshot);
    }

    pub fn snapshot(&self, phase: RunPhase) -> DetectionProgress {
        DetectionProgress {
            kind: self.kind,
            phase,
            images_built: self.images_built.load(Ordering::Relaxed),
            comparisons: self.comparisons.load(Ordering::Relaxed),
            duplicates_found: self.duplicates_found.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
        }
    }
}
