use rayon::prelude::*;
use tracing::{debug, info};

use dedupifyr_core::{
    ComparisonKind, ComparisonRequest, DeDupifyrResult, DedupPolicy, DetectError,
    DuplicateImage, LocalImage, RequestError,
};

use super::{DetectionStrategy, StrategyContext, build_local_images, direct_comparison};
use crate::fingerprint::Granularity;
use crate::progress::RunPhase;
use crate::similarity::{Similarity, fingerprint_comparator};

/// Every image in a directory against every other image.
///
/// Roots are taken in enumeration order. Each root is compared against the
/// rest in parallel, then the root and its matches are marked visited so
/// they never become roots themselves. Under [`DedupPolicy::Strict`] visited
/// images are also skipped as comparison targets.
pub(crate) struct DirectoryComparison<'a> {
    ctx: StrategyContext<'a>,
    comparator: Box<dyn Similarity<str>>,
}

impl<'a> DirectoryComparison<'a> {
    pub fn new(ctx: StrategyContext<'a>) -> Self {
        let comparator = fingerprint_comparator(ctx.options);
        Self { ctx, comparator }
    }

    fn check_for_duplicates(
        &self,
        images: &[LocalImage],
    ) -> Result<Vec<DeDupifyrResult>, DetectError> {
        let bias = self.ctx.options.bias();
        let strict = self.ctx.options.dedup_policy() == DedupPolicy::Strict;

        // Indexed by enumeration position; paths are unique within a listing.
        let mut visited = vec![false; images.len()];
        let mut results = Vec::new();

        for (root_idx, root) in images.iter().enumerate() {
            if visited[root_idx] {
                continue;
            }

            let candidates: Vec<usize> = (0..images.len())
                .filter(|&idx| idx != root_idx && !(strict && visited[idx]))
                .collect();

            let matches: Vec<(usize, DuplicateImage)> = candidates
                .par_iter()
                .map(|&idx| -> Result<Option<(usize, DuplicateImage)>, DetectError> {
                    let found =
                        direct_comparison(root, &images[idx], bias, |s, t| self.score(s, t))?;
                    Ok(found.map(|found| (idx, found)))
                })
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .collect();

            self.ctx.progress.record_comparisons(candidates.len());
            visited[root_idx] = true;

            if matches.is_empty() {
                continue;
            }

            let mut result = DeDupifyrResult::new(root.clone());
            for (idx, found) in matches {
                visited[idx] = true;
                result.push(found);
            }
            debug!(
                source = %root.path.display(),
                duplicates = result.duplicate_count(),
                "found duplicates"
            );
            self.ctx.progress.record_duplicates(result.duplicate_count());
            results.push(result);
        }

        Ok(results)
    }
}

impl DetectionStrategy for DirectoryComparison<'_> {
    fn kind(&self) -> ComparisonKind {
        ComparisonKind::AllInDirectory
    }

    fn build_images(&self, request: &ComparisonRequest) -> Result<Vec<LocalImage>, DetectError> {
        let directory = request.directory.as_deref().ok_or_else(|| {
            RequestError::InvalidDirectoryComparison {
                message: "no directory given".into(),
                source: None,
            }
        })?;

        let paths = self.ctx.source.list_images(directory, self.ctx.options)?;
        let images = build_local_images(
            self.ctx.source,
            self.ctx.fingerprinter,
            Granularity::DIRECTORY,
            &paths,
        )?;
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
        info!(count = images.len(), "checking images for duplicates");

        let results = self.check_for_duplicates(&images)?;
        self.ctx.progress.enter(RunPhase::PairwiseCompared);

        info!(groups = results.len(), "directory comparison finished");
        self.ctx.progress.enter(RunPhase::ResultsAggregated);
        Ok(results)
    }
}
