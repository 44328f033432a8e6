//! Comparison options.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::OptionsError;

/// Default bias percentage.
pub const DEFAULT_BIAS_PERCENT: f64 = 80.0;

/// Extensions considered images unless configured otherwise.
pub const DEFAULT_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp"];

/// How deep to look inside a directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum SearchDepth {
    /// Only the files directly inside the directory.
    #[default]
    #[strum(to_string = "top", serialize = "top-only")]
    #[serde(rename = "top", alias = "top-only")]
    TopOnly,
    /// The directory and every sub-directory.
    #[strum(to_string = "all", serialize = "recursive")]
    #[serde(rename = "all", alias = "recursive")]
    Recursive,
}

/// Named tolerance bands for pixel comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Strictness {
    /// Channel values must be identical.
    Equal,
    /// Small deviation allowed.
    #[default]
    Fuzzy,
    /// Wide deviation allowed.
    Loose,
}

impl Strictness {
    /// Radius of the band, in channel units.
    pub fn tolerance(self) -> u8 {
        match self {
            Strictness::Equal => 0,
            Strictness::Fuzzy => 5,
            Strictness::Loose => 15,
        }
    }
}

/// Which string comparator the bulk strategies score fingerprints with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FingerprintMetric {
    /// Position-by-position character comparison with early exit.
    #[default]
    Positional,
    /// Levenshtein distance (chunked for long fingerprints).
    #[strum(to_string = "edit-distance", serialize = "levenshtein")]
    #[serde(alias = "levenshtein")]
    EditDistance,
}

/// Whether images already claimed as duplicates may still be compared
/// against later roots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DedupPolicy {
    /// Claimed images are never roots, but remain comparison targets.
    #[default]
    Lenient,
    /// Claimed images are neither roots nor comparison targets.
    Strict,
}

/// A tolerance radius, parsed from a strictness name or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ToleranceRepr", into = "u8")]
pub struct Tolerance(pub u8);

#[derive(Deserialize)]
#[serde(untagged)]
enum ToleranceRepr {
    Radius(u8),
    Named(String),
}

impl TryFrom<ToleranceRepr> for Tolerance {
    type Error = OptionsError;

    fn try_from(repr: ToleranceRepr) -> Result<Self, Self::Error> {
        match repr {
            ToleranceRepr::Radius(radius) => Ok(Self(radius)),
            ToleranceRepr::Named(name) => name.parse(),
        }
    }
}

impl From<Tolerance> for u8 {
    fn from(tolerance: Tolerance) -> Self {
        tolerance.0
    }
}

impl From<Strictness> for Tolerance {
    fn from(strictness: Strictness) -> Self {
        Self(strictness.tolerance())
    }
}

impl FromStr for Tolerance {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(strictness) = Strictness::from_str(s) {
            return Ok(strictness.into());
        }
        s.parse::<u8>()
            .map(Self)
            .map_err(|_| OptionsError::invalid("strictness", s))
    }
}

/// Validated, read-only configuration for one detection run.
#[derive(Debug, Clone, PartialEq, Builder, Serialize)]
#[builder(
    setter(into),
    build_fn(validate = "Self::validate", error = "OptionsError")
)]
pub struct ComparisonOptions {
    /// How deep to enumerate directories.
    search_depth: SearchDepth,

    /// Per-byte tolerance band for pixel comparison.
    #[builder(default = "Strictness::Fuzzy.tolerance()")]
    tolerance: u8,

    /// Bias threshold as entered, `0..=100`.
    bias_percent: f64,

    /// String comparator for fingerprint scoring.
    #[builder(default)]
    metric: FingerprintMetric,

    /// Claim handling for directory comparisons.
    #[builder(default)]
    dedup_policy: DedupPolicy,

    /// Lowercase extensions, without the leading dot.
    #[builder(default = "default_extensions()")]
    extensions: Vec<String>,

    /// Worker threads (0 = shared default pool).
    #[builder(default = "0")]
    threads: usize,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn check_bias(value: f64) -> Result<(), OptionsError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(OptionsError::BiasOutOfBounds { value })
    }
}

impl ComparisonOptionsBuilder {
    fn validate(&self) -> Result<(), OptionsError> {
        if let Some(bias) = self.bias_percent {
            check_bias(bias)?;
        }
        if let Some(ref extensions) = self.extensions {
            if extensions.is_empty() {
                return Err(OptionsError::invalid("extensions", ""));
            }
        }
        Ok(())
    }
}

impl ComparisonOptions {
    /// Create a new options builder. Search depth and bias have no default.
    pub fn builder() -> ComparisonOptionsBuilder {
        ComparisonOptionsBuilder::default()
    }

    /// Build options from `(flag, value)` pairs layered over `base`
    /// (or the defaults when there is no base).
    pub fn from_flags<I, K, V>(flags: I, base: Option<&ComparisonOptions>) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut raw = RawOptions::default();
        for (flag, value) in flags {
            raw.set(flag.as_ref(), value.as_ref())?;
        }
        raw.resolve(base)
    }

    /// Search depth.
    pub fn search_depth(&self) -> SearchDepth {
        self.search_depth
    }

    /// Tolerance band radius.
    pub fn tolerance(&self) -> u8 {
        self.tolerance
    }

    /// Bias threshold normalized to `0.0..=1.0`.
    pub fn bias(&self) -> f64 {
        self.bias_percent / 100.0
    }

    /// Bias threshold as entered.
    pub fn bias_percent(&self) -> f64 {
        self.bias_percent
    }

    /// Fingerprint comparator.
    pub fn metric(&self) -> FingerprintMetric {
        self.metric
    }

    /// Claim handling policy.
    pub fn dedup_policy(&self) -> DedupPolicy {
        self.dedup_policy
    }

    /// Allowed extensions, lowercase, without dots.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Worker thread count (0 = default pool).
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Check whether a path carries one of the allowed extensions.
    pub fn is_image_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            search_depth: SearchDepth::TopOnly,
            tolerance: Strictness::Fuzzy.tolerance(),
            bias_percent: DEFAULT_BIAS_PERCENT,
            metric: FingerprintMetric::Positional,
            dedup_policy: DedupPolicy::Lenient,
            extensions: default_extensions(),
            threads: 0,
        }
    }
}

/// Partially specified options, as read from flags or an options file.
///
/// Every field is optional; [`RawOptions::resolve`] fills the gaps from a
/// base set of options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawOptions {
    /// Directory level.
    pub level: Option<SearchDepth>,
    /// Bias percentage, `0..=100`.
    pub bias: Option<f64>,
    /// Strictness name or tolerance radius.
    pub strictness: Option<Tolerance>,
    /// Fingerprint comparator.
    pub metric: Option<FingerprintMetric>,
    /// Claim handling.
    pub dedup: Option<DedupPolicy>,
    /// Allowed extensions.
    pub extensions: Option<Vec<String>>,
    /// Worker threads.
    pub threads: Option<usize>,
}

impl RawOptions {
    /// Set a single option from its flag name (long or short, dashes optional).
    pub fn set(&mut self, flag: &str, value: &str) -> Result<(), OptionsError> {
        let name = flag.trim().trim_start_matches('-');
        let value = value.trim();
        match name.to_ascii_lowercase().as_str() {
            "level" | "l" => {
                self.level = Some(parse_enum("level", value)?);
            }
            "bias" | "b" => {
                let bias: f64 = value
                    .trim_end_matches('%')
                    .parse()
                    .map_err(|_| OptionsError::invalid("bias", value))?;
                self.bias = Some(bias);
            }
            "strictness" | "s" => {
                self.strictness = Some(value.parse()?);
            }
            "metric" | "m" => {
                self.metric = Some(parse_enum("metric", value)?);
            }
            "dedup" | "d" => {
                self.dedup = Some(parse_enum("dedup", value)?);
            }
            "extensions" | "e" => {
                let extensions: Vec<String> = value
                    .split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect();
                self.extensions = Some(extensions);
            }
            "threads" | "t" => {
                let threads = value
                    .parse()
                    .map_err(|_| OptionsError::invalid("threads", value))?;
                self.threads = Some(threads);
            }
            _ => {
                return Err(OptionsError::UnknownFlag {
                    flag: flag.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: RawOptions) -> RawOptions {
        RawOptions {
            level: overrides.level.or(self.level),
            bias: overrides.bias.or(self.bias),
            strictness: overrides.strictness.or(self.strictness),
            metric: overrides.metric.or(self.metric),
            dedup: overrides.dedup.or(self.dedup),
            extensions: overrides.extensions.or(self.extensions),
            threads: overrides.threads.or(self.threads),
        }
    }

    /// Turn into validated options, taking unset values from `base` or the
    /// defaults.
    pub fn resolve(self, base: Option<&ComparisonOptions>) -> Result<ComparisonOptions, OptionsError> {
        let base = base.cloned().unwrap_or_default();

        ComparisonOptions::builder()
            .search_depth(self.level.unwrap_or(base.search_depth))
            .tolerance(self.strictness.map(u8::from).unwrap_or(base.tolerance))
            .bias_percent(self.bias.unwrap_or(base.bias_percent))
            .metric(self.metric.unwrap_or(base.metric))
            .dedup_policy(self.dedup.unwrap_or(base.dedup_policy))
            .extensions(self.extensions.unwrap_or(base.extensions))
            .threads(self.threads.unwrap_or(base.threads))
            .build()
    }

    /// Flag/value pairs for every set field, for display.
    pub fn to_flags(&self) -> HashMap<&'static str, String> {
        let mut flags = HashMap::new();
        if let Some(level) = self.level {
            flags.insert("level", level.to_string());
        }
        if let Some(bias) = self.bias {
            flags.insert("bias", bias.to_string());
        }
        if let Some(strictness) = self.strictness {
            flags.insert("strictness", strictness.0.to_string());
        }
        if let Some(metric) = self.metric {
            flags.insert("metric", metric.to_string());
        }
        if let Some(dedup) = self.dedup {
            flags.insert("dedup", dedup.to_string());
        }
        if let Some(ref extensions) = self.extensions {
            flags.insert("extensions", extensions.join(","));
        }
        if let Some(threads) = self.threads {
            flags.insert("threads", threads.to_string());
        }
        flags
    }
}

fn parse_enum<T: FromStr>(option: &str, value: &str) -> Result<T, OptionsError> {
    value
        .parse()
        .map_err(|_| OptionsError::invalid(option, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ComparisonOptions::builder()
            .search_depth(SearchDepth::Recursive)
            .bias_percent(90)
            .tolerance(Strictness::Loose.tolerance())
            .build()
            .unwrap();

        assert_eq!(options.search_depth(), SearchDepth::Recursive);
        assert_eq!(options.tolerance(), 15);
        assert!((options.bias() - 0.9).abs() < f64::EPSILON);
        assert_eq!(options.metric(), FingerprintMetric::Positional);
        assert_eq!(options.threads(), 0);
    }

    #[test]
    fn test_builder_requires_depth_and_bias() {
        let err = ComparisonOptions::builder()
            .bias_percent(50)
            .build()
            .unwrap_err();
        assert!(matches!(err, OptionsError::Incomplete { ref option } if option == "search_depth"));

        let err = ComparisonOptions::builder()
            .search_depth(SearchDepth::TopOnly)
            .build()
            .unwrap_err();
        assert!(matches!(err, OptionsError::Incomplete { ref option } if option == "bias_percent"));
    }

    #[test]
    fn test_bias_bounds() {
        for bad in [150.0, -5.0, 100.5] {
            let err = ComparisonOptions::builder()
                .search_depth(SearchDepth::TopOnly)
                .bias_percent(bad)
                .build()
                .unwrap_err();
            assert!(matches!(err, OptionsError::BiasOutOfBounds { .. }));
        }

        let low = ComparisonOptions::from_flags([("bias", "0")], None).unwrap();
        assert_eq!(low.bias(), 0.0);
        let high = ComparisonOptions::from_flags([("bias", "100")], None).unwrap();
        assert_eq!(high.bias(), 1.0);
    }

    #[test]
    fn test_strictness_parsing() {
        assert_eq!("Equal".parse::<Tolerance>().unwrap(), Tolerance(0));
        assert_eq!("fuzzy".parse::<Tolerance>().unwrap(), Tolerance(5));
        assert_eq!("LOOSE".parse::<Tolerance>().unwrap(), Tolerance(15));
        assert_eq!("42".parse::<Tolerance>().unwrap(), Tolerance(42));
        assert!("300".parse::<Tolerance>().is_err());
        assert!("wobbly".parse::<Tolerance>().is_err());
    }

    #[test]
    fn test_search_depth_parsing() {
        assert_eq!("top".parse::<SearchDepth>().unwrap(), SearchDepth::TopOnly);
        assert_eq!("ALL".parse::<SearchDepth>().unwrap(), SearchDepth::Recursive);
        assert_eq!("recursive".parse::<SearchDepth>().unwrap(), SearchDepth::Recursive);
        assert_eq!(SearchDepth::Recursive.to_string(), "all");
    }

    #[test]
    fn test_from_flags_layers_on_base() {
        let base = ComparisonOptions::from_flags([("level", "all"), ("bias", "60")], None).unwrap();
        let updated = ComparisonOptions::from_flags([("-s", "loose")], Some(&base)).unwrap();

        assert_eq!(updated.search_depth(), SearchDepth::Recursive);
        assert_eq!(updated.bias_percent(), 60.0);
        assert_eq!(updated.tolerance(), 15);
    }

    #[test]
    fn test_from_flags_rejects_unknown_and_bad_values() {
        let err = ComparisonOptions::from_flags([("colour", "red")], None).unwrap_err();
        assert!(matches!(err, OptionsError::UnknownFlag { .. }));

        let err = ComparisonOptions::from_flags([("level", "sideways")], None).unwrap_err();
        assert!(matches!(err, OptionsError::InvalidValue { .. }));

        let err = ComparisonOptions::from_flags([("b", "lots")], None).unwrap_err();
        assert!(matches!(err, OptionsError::InvalidValue { .. }));
    }

    #[test]
    fn test_extensions_flag() {
        let options = ComparisonOptions::from_flags([("extensions", ".PNG, jpg")], None).unwrap();
        assert_eq!(options.extensions(), ["png", "jpg"]);
        assert!(options.is_image_path(Path::new("/a/b.Png")));
        assert!(!options.is_image_path(Path::new("/a/b.gif")));
        assert!(!options.is_image_path(Path::new("/a/noext")));
    }

    #[test]
    fn test_raw_merge_prefers_overrides() {
        let file = RawOptions {
            bias: Some(70.0),
            level: Some(SearchDepth::Recursive),
            ..Default::default()
        };
        let cli = RawOptions {
            bias: Some(95.0),
            ..Default::default()
        };

        let merged = file.merge(cli);
        assert_eq!(merged.bias, Some(95.0));
        assert_eq!(merged.level, Some(SearchDepth::Recursive));
        assert_eq!(merged.to_flags().get("bias").map(String::as_str), Some("95"));
    }
}
