use rayon::prelude::*;

use super::Similarity;

/// Classic edit distance between two sequences.
///
/// Uses the usual `(n + 1) x (m + 1)` recurrence, keeping only two rows.
pub fn levenshtein<T: PartialEq>(source: &[T], target: &[T]) -> usize {
    if source.is_empty() {
        return target.len();
    }
    if target.is_empty() {
        return source.len();
    }

    let mut previous: Vec<usize> = (0..=target.len()).collect();
    let mut current = vec![0; target.len() + 1];

    for (i, s) in source.iter().enumerate() {
        current[0] = i + 1;
        for (j, t) in target.iter().enumerate() {
            let cost = usize::from(s != t);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[target.len()]
}

/// Edit-distance similarity: `1 - distance / max_len`.
///
/// Inputs longer than `chunk_threshold` characters are cut into
/// `chunk_count` aligned windows whose distances are computed in parallel
/// and summed. That sum is an upper bound on the true distance, so long
/// inputs score at or below their exact similarity.
#[derive(Debug, Clone, Copy)]
pub struct EditDistance {
    chunk_threshold: usize,
    chunk_count: usize,
}

impl Default for EditDistance {
    fn default() -> Self {
        Self {
            chunk_threshold: 4096,
            chunk_count: 256,
        }
    }
}

impl EditDistance {
    /// Comparator that never chunks.
    pub fn exact() -> Self {
        Self {
            chunk_threshold: usize::MAX,
            chunk_count: 1,
        }
    }

    /// Override when inputs are chunked and into how many windows.
    pub fn with_chunking(chunk_threshold: usize, chunk_count: usize) -> Self {
        Self {
            chunk_threshold,
            chunk_count: chunk_count.max(1),
        }
    }

    /// Edit distance between two strings, counted in characters.
    pub fn distance(&self, source: &str, target: &str) -> usize {
        let source: Vec<char> = source.chars().collect();
        let target: Vec<char> = target.chars().collect();
        self.distance_chars(&source, &target)
    }

    fn distance_chars(&self, source: &[char], target: &[char]) -> usize {
        let max_len = source.len().max(target.len());
        if max_len <= self.chunk_threshold {
            return levenshtein(source, target);
        }

        let width = max_len.div_ceil(self.chunk_count);
        (0..self.chunk_count)
            .into_par_iter()
            .map(|i| {
                let start = i * width;
                levenshtein(window(source, start, width), window(target, start, width))
            })
            .sum()
    }
}

fn window<T>(seq: &[T], start: usize, width: usize) -> &[T] {
    let start = start.min(seq.len());
    let end = (start + width).min(seq.len());
    &seq[start..end]
}

impl Similarity<str> for EditDistance {
    fn score(&self, source: &str, target: &str) -> f64 {
        if source.is_empty() || target.is_empty() {
            return 0.0;
        }
        if source == target {
            return 1.0;
        }

        let source: Vec<char> = source.chars().collect();
        let target: Vec<char> = target.chars().collect();
        let max_len = source.len().max(target.len());
        let distance = self.distance_chars(&source, &target);

        (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
    }
}
