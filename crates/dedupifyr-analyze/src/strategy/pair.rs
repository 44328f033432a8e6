use std::path::Path;

use tracing::info;

use dedupifyr_core::{
    ComparisonKind, ComparisonRequest, DeDupifyrResult, DetectError, DuplicateImage, LocalImage,
    RequestError,
};

use super::{DetectionStrategy, StrategyContext, build_local_images, canonical};
use crate::fingerprint::Granularity;
use crate::progress::RunPhase;
use crate::similarity::{PixelComparison, Similarity};

/// Two specific images, compared pixel by pixel.
///
/// The raw score is always recorded; the bias does not apply. Naming the
/// same file twice yields one result with no duplicates and no decoding.
pub(crate) struct PairComparison<'a> {
    ctx: StrategyContext<'a>,
    comparator: PixelComparison,
}

impl<'a> PairComparison<'a> {
    pub fn new(ctx: StrategyContext<'a>) -> Self {
        let comparator = PixelComparison::new(ctx.options.tolerance());
        Self { ctx, comparator }
    }
}

fn pair_paths(request: &ComparisonRequest) -> Result<(&Path, &Path), RequestError> {
    match (request.first_image.as_deref(), request.second_image.as_deref()) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(RequestError::InvalidPairComparison {
            message: "two images are required".into(),
            source: None,
        }),
    }
}

impl DetectionStrategy for PairComparison<'_> {
    fn kind(&self) -> ComparisonKind {
        ComparisonKind::Pair
    }

    fn build_images(&self, request: &ComparisonRequest) -> Result<Vec<LocalImage>, DetectError> {
        let (first, second) = pair_paths(request)?;
        let paths = [first.to_path_buf(), second.to_path_buf()];
        let images = build_local_images(
            self.ctx.source,
            self.ctx.fingerprinter,
            Granularity::Full,
            &paths,
        )?;
        self.ctx.progress.record_images(images.len());
        Ok(images)
    }

    fn score(&self, source: &LocalImage, target: &LocalImage) -> Result<f64, DetectError> {
        let (decoded_source, decoded_target) = rayon::join(
            || self.ctx.source.decode(&source.path),
            || self.ctx.source.decode(&target.path),
        );
        let similarity = self.comparator.score(&decoded_source?, &decoded_target?);
        self.ctx.progress.record_comparisons(1);
        Ok(similarity)
    }

    fn run(&self, request: &ComparisonRequest) -> Result<Vec<DeDupifyrResult>, DetectError> {
        self.ctx.progress.enter(RunPhase::Initialized);

        let (first, second) = pair_paths(request)?;
        if canonical(first) == canonical(second) {
            info!(path = %first.display(), "both paths name the same image");
            let paths = [first.to_path_buf()];
            let mut images = build_local_images(
                self.ctx.source,
                self.ctx.fingerprinter,
                Granularity::Full,
                &paths,
            )?;
            self.ctx.progress.record_images(images.len());
            self.ctx.progress.enter(RunPhase::ImagesBuilt);
            self.ctx.progress.enter(RunPhase::PairwiseCompared);
            self.ctx.progress.enter(RunPhase::ResultsAggregated);
            return Ok(images.pop().map(DeDupifyrResult::new).into_iter().collect());
        }

        let mut images = self.build_images(request)?;
        self.ctx.progress.enter(RunPhase::ImagesBuilt);

        let (Some(target), Some(source)) = (images.pop(), images.pop()) else {
            return Ok(Vec::new());
        };
        let similarity = self.score(&source, &target)?;
        self.ctx.progress.enter(RunPhase::PairwiseCompared);

        info!(
            source = %source.path.display(),
            target = %target.path.display(),
            similarity = similarity * 100.0,
            "pair compared"
        );
        let mut result = DeDupifyrResult::new(source);
        result.push(DuplicateImage::new(target, similarity));
        self.ctx.progress.record_duplicates(1);

        self.ctx.progress.enter(RunPhase::ResultsAggregated);
        Ok(vec![result])
    }
}
