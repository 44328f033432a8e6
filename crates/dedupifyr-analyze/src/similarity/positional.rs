use super::Similarity;

/// Position-by-position comparison of two fingerprints.
///
/// Each mismatching byte costs `1 / len`. Once the running score drops
/// below the bias the comparison stops, so a failing score is only known
/// to be below the bias, not exact.
#[derive(Debug, Clone, Copy)]
pub struct PositionalComparison {
    bias: f64,
}

impl PositionalComparison {
    /// Comparator that gives up below `bias` (a fraction in `[0, 1]`).
    pub fn new(bias: f64) -> Self {
        Self { bias }
    }

    /// Comparator that always scans the whole input.
    pub fn exhaustive() -> Self {
        Self { bias: 0.0 }
    }
}

impl Similarity<str> for PositionalComparison {
    fn score(&self, source: &str, target: &str) -> f64 {
        let (source, target) = (source.as_bytes(), target.as_bytes());
        if source.is_empty() || source.len() != target.len() {
            return 0.0;
        }

        let len = source.len() as f64;
        let mut mismatches = 0usize;
        let mut score = 1.0;
        for (a, b) in source.iter().zip(target) {
            if a != b {
                mismatches += 1;
                score = 1.0 - mismatches as f64 / len;
                if score < self.bias {
                    break;
                }
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        let cmp = PositionalComparison::new(0.8);
        assert_eq!(cmp.score("abcd", "abcd"), 1.0);
    }

    #[test]
    fn test_one_mismatch() {
        let cmp = PositionalComparison::exhaustive();
        assert!((cmp.score("abcd", "abcx") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        let cmp = PositionalComparison::exhaustive();
        assert_eq!(cmp.score("abc", "abcd"), 0.0);
        assert_eq!(cmp.score("", ""), 0.0);
    }

    #[test]
    fn test_early_exit_below_bias() {
        // Stops after the first mismatch since 0.9 < 0.95
        let cmp = PositionalComparison::new(0.95);
        let score = cmp.score("aaaaaaaaaa", "bbbbbbbbbb");
        assert!((score - 0.9).abs() < 1e-12);
        assert!(score < 0.95);

        let full = PositionalComparison::exhaustive().score("aaaaaaaaaa", "bbbbbbbbbb");
        assert!(full.abs() < 1e-12);
    }
}
