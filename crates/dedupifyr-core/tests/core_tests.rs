use dedupifyr_core::{
    ComparisonKind, ComparisonOptions, ComparisonRequest, DedupPolicy, FingerprintMetric,
    OptionsError, RawOptions, RequestError, SearchDepth,
};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::write(root.join("first.png"), b"first").unwrap();
    fs::write(root.join("second.jpg"), b"second").unwrap();
    fs::create_dir(root.join("others")).unwrap();
    fs::write(root.join("others/third.png"), b"third").unwrap();

    temp
}

fn join(a: &PathBuf, b: &PathBuf) -> String {
    format!("{},{}", a.display(), b.display())
}

#[test]
fn test_parse_directory_request() {
    let temp = create_fixture();
    let request = ComparisonRequest::parse(temp.path().to_str().unwrap()).unwrap();

    assert_eq!(request.kind, ComparisonKind::AllInDirectory);
    assert_eq!(request.directory.as_deref(), Some(temp.path()));
    assert!(request.first_image.is_none());
    assert!(request.second_image.is_none());
}

#[test]
fn test_parse_single_request() {
    let temp = create_fixture();
    let image = temp.path().join("first.png");
    let dir = temp.path().join("others");

    let request = ComparisonRequest::parse(&join(&image, &dir)).unwrap();

    assert_eq!(request.kind, ComparisonKind::SingleAgainstDirectory);
    assert_eq!(request.first_image, Some(image));
    assert_eq!(request.directory, Some(dir));
}

#[test]
fn test_parse_pair_request_trims_whitespace() {
    let temp = create_fixture();
    let first = temp.path().join("first.png");
    let second = temp.path().join("second.jpg");

    let input = format!("  {} ,  {} ", first.display(), second.display());
    let request = ComparisonRequest::parse(&input).unwrap();

    assert_eq!(request.kind, ComparisonKind::Pair);
    assert_eq!(request.first_image, Some(first));
    assert_eq!(request.second_image, Some(second));
}

#[test]
fn test_parse_blank_input() {
    assert!(matches!(
        ComparisonRequest::parse("   "),
        Err(RequestError::MissingInput)
    ));
}

#[test]
fn test_missing_directory_is_kind_specific() {
    let temp = create_fixture();
    let missing = temp.path().join("nope");

    let err = ComparisonRequest::parse(missing.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, RequestError::InvalidDirectoryComparison { .. }));

    // Underlying not-found cause is chained
    let cause = err.source().unwrap();
    let io = cause.downcast_ref::<std::io::Error>().unwrap();
    assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_missing_pair_image() {
    let temp = create_fixture();
    let first = temp.path().join("first.png");
    let missing = temp.path().join("ghost.png");

    let err = ComparisonRequest::parse(&join(&first, &missing)).unwrap_err();
    assert!(matches!(err, RequestError::InvalidPairComparison { .. }));
}

#[test]
fn test_missing_single_image() {
    let temp = create_fixture();
    let missing = temp.path().join("ghost.png");
    let dir = temp.path().join("others");

    let err = ComparisonRequest::parse(&join(&missing, &dir)).unwrap_err();
    assert!(matches!(err, RequestError::InvalidSingleComparison { .. }));
}

#[test]
fn test_absent_fields_fail_validation() {
    let all = ComparisonRequest::new(ComparisonKind::AllInDirectory, None, None, None);
    assert!(matches!(
        all.validate(),
        Err(RequestError::InvalidDirectoryComparison { source: None, .. })
    ));

    let pair = ComparisonRequest::new(
        ComparisonKind::Pair,
        None,
        Some(PathBuf::from("/a.png")),
        None,
    );
    assert!(matches!(
        pair.validate(),
        Err(RequestError::InvalidPairComparison { source: None, .. })
    ));

    let single = ComparisonRequest::new(
        ComparisonKind::SingleAgainstDirectory,
        None,
        Some(PathBuf::from("/a.png")),
        None,
    );
    assert!(matches!(
        single.validate(),
        Err(RequestError::InvalidSingleComparison { source: None, .. })
    ));
}

#[test]
fn test_directory_given_as_pair_image() {
    let temp = create_fixture();
    let request = ComparisonRequest::pair(temp.path().join("others"), temp.path().join("first.png"));
    assert!(matches!(
        request.validate(),
        Err(RequestError::InvalidPairComparison { .. })
    ));
}

#[test]
fn test_parse_as_tagged_kind() {
    let temp = create_fixture();
    let first = temp.path().join("first.png");
    let second = temp.path().join("second.jpg");

    let request = ComparisonRequest::parse_as("pair", &join(&first, &second)).unwrap();
    assert_eq!(request.kind, ComparisonKind::Pair);

    let err = ComparisonRequest::parse_as("triple", &join(&first, &second)).unwrap_err();
    assert!(matches!(err, RequestError::UnsupportedKind { ref kind } if kind == "triple"));

    // A directory tag with two paths has no directory to search
    let err = ComparisonRequest::parse_as("all", &join(&first, &second)).unwrap_err();
    assert!(matches!(err, RequestError::InvalidDirectoryComparison { .. }));
}

#[test]
fn test_default_options() {
    let options = ComparisonOptions::default();

    assert_eq!(options.search_depth(), SearchDepth::TopOnly);
    assert_eq!(options.tolerance(), 5);
    assert_eq!(options.bias_percent(), 80.0);
    assert_eq!(options.metric(), FingerprintMetric::Positional);
    assert_eq!(options.dedup_policy(), DedupPolicy::Lenient);
    assert!(options.extensions().iter().any(|e| e == "png"));
}

#[test]
fn test_options_from_flags_full() {
    let options = ComparisonOptions::from_flags(
        [
            ("--level", "all"),
            ("--bias", "92.5"),
            ("--strictness", "equal"),
            ("--metric", "levenshtein"),
            ("--dedup", "strict"),
            ("--threads", "3"),
        ],
        None,
    )
    .unwrap();

    assert_eq!(options.search_depth(), SearchDepth::Recursive);
    assert!((options.bias() - 0.925).abs() < 1e-12);
    assert_eq!(options.tolerance(), 0);
    assert_eq!(options.metric(), FingerprintMetric::EditDistance);
    assert_eq!(options.dedup_policy(), DedupPolicy::Strict);
    assert_eq!(options.threads(), 3);
}

#[test]
fn test_bias_out_of_bounds_from_flags() {
    for bad in ["150", "-5", "100.01"] {
        let err = ComparisonOptions::from_flags([("bias", bad)], None).unwrap_err();
        assert!(matches!(err, OptionsError::BiasOutOfBounds { .. }), "{bad}");
    }
    for (good, normalized) in [("0", 0.0), ("100", 1.0), ("55", 0.55)] {
        let options = ComparisonOptions::from_flags([("bias", good)], None).unwrap();
        assert!((options.bias() - normalized).abs() < 1e-12);
    }
}

#[test]
fn test_raw_options_from_toml() {
    let raw: RawOptions = toml::from_str(
        r#"
        level = "all"
        bias = 75
        strictness = "loose"
        metric = "edit-distance"
        extensions = ["png", "jpg"]
        "#,
    )
    .unwrap();

    let options = raw.resolve(None).unwrap();
    assert_eq!(options.search_depth(), SearchDepth::Recursive);
    assert_eq!(options.bias_percent(), 75.0);
    assert_eq!(options.tolerance(), 15);
    assert_eq!(options.metric(), FingerprintMetric::EditDistance);
    assert_eq!(options.extensions().len(), 2);

    let numeric: RawOptions = toml::from_str("strictness = 9").unwrap();
    assert_eq!(numeric.resolve(None).unwrap().tolerance(), 9);

    assert!(toml::from_str::<RawOptions>("colour = \"red\"").is_err());
}
