use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use dedupifyr_core::{
    ComparisonKind, ComparisonRequest, DeDupifyrResult, DetectError, DuplicateImage, LocalImage,
    RequestError,
};

use super::{
    DetectionStrategy, StrategyContext, build_local_image, build_local_images, canonical,
    direct_comparison,
};
use crate::fingerprint::Granularity;
use crate::progress::RunPhase;
use crate::similarity::{Similarity, fingerprint_comparator};

/// One image against every other image in a directory.
///
/// The source itself is never reported, even when it lives in the
/// searched directory. Matches keep the directory's enumeration order.
pub(crate) struct SingleComparison<'a> {
    ctx: StrategyContext<'a>,
    comparator: Box<dyn Similarity<str>>,
}

impl<'a> SingleComparison<'a> {
    pub fn new(ctx: StrategyContext<'a>) -> Self {
        let comparator = fingerprint_comparator(ctx.options);
        Self { ctx, comparator }
    }

    fn build_others(&self, image: &Path, directory: &Path) -> Result<Vec<LocalImage>, DetectError> {
        let excluded = canonical(image);
        let mut paths = self.ctx.source.list_images(directory, self.ctx.options)?;
        paths.retain(|path| canonical(path) != excluded);

        Ok(build_local_images(
            self.ctx.source,
            self.ctx.fingerprinter,
            Granularity::SINGLE,
            &paths,
        )?)
    }
}

fn single_paths(request: &ComparisonRequest) -> Result<(&Path, &Path), RequestError> {
    match (request.first_image.as_deref(), request.directory.as_deref()) {
        (Some(image), Some(directory)) => Ok((image, directory)),
        _ => Err(RequestError::InvalidSingleComparison {
            message: "an image and a directory are required".into(),
            source: None,
        }),
    }
}

impl DetectionStrategy for SingleComparison<'_> {
    fn kind(&self) -> ComparisonKind {
        ComparisonKind::SingleAgainstDirectory
    }

    /// The source image first, followed by the directory's other images.
    fn build_images(&self, request: &ComparisonRequest) -> Result<Vec<LocalImage>, DetectError> {
        let (image, directory) = single_paths(request)?;

        let (source, others) = rayon::join(
            || {
                build_local_image(
                    self.ctx.source,
                    self.ctx.fingerprinter,
                    Granularity::SINGLE,
                    image,
                )
            },
            || self.build_others(image, directory),
        );

        let mut images = vec![source?];
        images.extend(others?);
        self.ctx.progress.record_images(images.len());
        Ok(images)
    }

    fn score(&self, source: &LocalImage, target: &LocalImage) -> Result<f64, DetectError> {
        Ok(self
            .comparator
            .score(source.fingerprint.as_str(), target.fingerprint.as_str()))
    }

    fn run(&self, request: &ComparisonRequest) -> Result<Vec<DeDupifyrResult>, DetectError> {
        self.ctx.progress.enter(RunPhase::Initialized);

        let images = self.build_images(request)?;
        self.ctx.progress.enter(RunPhase::ImagesBuilt);

        let Some((source, others)) = images.split_first() else {
            return Ok(Vec::new());
        };
        debug!(
            source = %source.path.display(),
            candidates = others.len(),
            "comparing against directory"
        );

        let bias = self.ctx.options.bias();
        let matches: Vec<DuplicateImage> = others
            .par_iter()
            .map(|other| direct_comparison(source, other, bias, |s, t| self.score(s, t)))
            .collect::<Result<Vec<_>, DetectError>>()?
            .into_iter()
            .flatten()
            .collect();
        self.ctx.progress.record_comparisons(others.len());
        self.ctx.progress.record_duplicates(matches.len());
        self.ctx.progress.enter(RunPhase::PairwiseCompared);

        info!(
            source = %source.path.display(),
            duplicates = matches.len(),
            "single comparison finished"
        );
        let mut result = DeDupifyrResult::new(source.clone());
        result.duplicates = matches;

        self.ctx.progress.enter(RunPhase::ResultsAggregated);
        Ok(vec![result])
    }
}
