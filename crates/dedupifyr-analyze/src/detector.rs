//! Entry point for detection runs.

use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, info};

use dedupifyr_core::{
    ComparisonKind, ComparisonOptions, ComparisonRequest, DeDupifyrResult, DetectError,
};
use dedupifyr_scan::{FsImageSource, ImageSource};

use crate::fingerprint::{FingerprintProvider, ReversedBase64};
use crate::progress::{DetectionProgress, ProgressReporter};
use crate::strategy::{
    DetectionStrategy, DirectoryComparison, PairComparison, SingleComparison, StrategyContext,
};

/// Runs comparison requests against an [`ImageSource`].
///
/// The detector is reusable: options and source stay fixed while any number
/// of requests are run. Each run is independent and returns either every
/// result or an error.
pub struct Detector<S: ImageSource = FsImageSource> {
    source: S,
    options: ComparisonOptions,
    fingerprinter: Box<dyn FingerprintProvider>,
    progress_tx: broadcast::Sender<DetectionProgress>,
}

impl Detector<FsImageSource> {
    /// Detector over the local file system.
    pub fn new(options: ComparisonOptions) -> Self {
        let source = FsImageSource::with_threads(options.threads());
        Self::with_source(source, options)
    }
}

impl<S: ImageSource> Detector<S> {
    /// Detector over a custom image source.
    pub fn with_source(source: S, options: ComparisonOptions) -> Self {
        let (progress_tx, _) = broadcast::channel(64);
        Self {
            source,
            options,
            fingerprinter: Box::new(ReversedBase64),
            progress_tx,
        }
    }

    /// Replace the fingerprint provider.
    pub fn with_fingerprinter(mut self, fingerprinter: impl FingerprintProvider + 'static) -> Self {
        self.fingerprinter = Box::new(fingerprinter);
        self
    }

    /// Subscribe to progress updates. One update is sent per phase change.
    pub fn subscribe(&self) -> broadcast::Receiver<DetectionProgress> {
        self.progress_tx.subscribe()
    }

    /// The options every run uses.
    pub fn options(&self) -> &ComparisonOptions {
        &self.options
    }

    /// The image source runs read from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Validate `request` and run the matching strategy.
    pub fn run(&self, request: &ComparisonRequest) -> Result<Vec<DeDupifyrResult>, DetectError> {
        request.validate()?;
        let start = Instant::now();

        let results = match self.options.threads() {
            0 => self.run_strategy(request)?,
            threads => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| DetectError::ThreadPool {
                        message: e.to_string(),
                    })?;
                pool.install(|| self.run_strategy(request))?
            }
        };

        info!(
            kind = %request.kind,
            results = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "detection complete"
        );
        Ok(results)
    }

    fn run_strategy(&self, request: &ComparisonRequest) -> Result<Vec<DeDupifyrResult>, DetectError> {
        let progress = ProgressReporter::new(request.kind, self.progress_tx.clone());
        let ctx = StrategyContext {
            source: &self.source,
            options: &self.options,
            fingerprinter: self.fingerprinter.as_ref(),
            progress: &progress,
        };

        let strategy = strategy_for(request.kind, ctx);
        debug!(kind = %strategy.kind(), "running strategy");
        strategy.run(request)
    }
}

fn strategy_for<'a>(
    kind: ComparisonKind,
    ctx: StrategyContext<'a>,
) -> Box<dyn DetectionStrategy + 'a> {
    match kind {
        ComparisonKind::AllInDirectory => Box::new(DirectoryComparison::new(ctx)),
        ComparisonKind::Pair => Box::new(PairComparison::new(ctx)),
        ComparisonKind::SingleAgainstDirectory => Box::new(SingleComparison::new(ctx)),
    }
}
