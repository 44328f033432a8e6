//! Comparison requests and their validation.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::RequestError;

/// The shape of comparison being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum ComparisonKind {
    /// Every image in a directory against every other.
    #[strum(to_string = "all", serialize = "directory", serialize = "dir")]
    AllInDirectory,
    /// Two specific images against each other.
    #[strum(to_string = "pair")]
    Pair,
    /// One image against every image in a directory.
    #[strum(to_string = "single")]
    SingleAgainstDirectory,
}

/// A request for one detection run.
///
/// Which fields must be present depends on [`ComparisonKind`]; see
/// [`ComparisonRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// Kind of comparison.
    pub kind: ComparisonKind,
    /// Directory to search.
    pub directory: Option<PathBuf>,
    /// First (or only) image.
    pub first_image: Option<PathBuf>,
    /// Second image, for pairs.
    pub second_image: Option<PathBuf>,
}

impl ComparisonRequest {
    /// Create a request from raw parts. Nothing is checked until
    /// [`validate`](Self::validate).
    pub fn new(
        kind: ComparisonKind,
        directory: Option<PathBuf>,
        first_image: Option<PathBuf>,
        second_image: Option<PathBuf>,
    ) -> Self {
        Self {
            kind,
            directory,
            first_image,
            second_image,
        }
    }

    /// Compare every image in `directory`.
    pub fn all_in_directory(directory: impl Into<PathBuf>) -> Self {
        Self::new(ComparisonKind::AllInDirectory, Some(directory.into()), None, None)
    }

    /// Compare two images.
    pub fn pair(first: impl Into<PathBuf>, second: impl Into<PathBuf>) -> Self {
        Self::new(
            ComparisonKind::Pair,
            None,
            Some(first.into()),
            Some(second.into()),
        )
    }

    /// Compare one image against a directory.
    pub fn single(image: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        Self::new(
            ComparisonKind::SingleAgainstDirectory,
            Some(directory.into()),
            Some(image.into()),
            None,
        )
    }

    /// Parse a raw request string and validate it.
    ///
    /// - `"<dir>"` compares everything in the directory.
    /// - `"<image>,<dir>"` compares the image against the directory.
    /// - `"<image>,<image>"` compares the two images.
    pub fn parse(input: &str) -> Result<Self, RequestError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RequestError::MissingInput);
        }

        let request = match split_pair(input) {
            Some((first, second)) if Path::new(second).is_dir() => Self::single(first, second),
            Some((first, second)) => Self::pair(first, second),
            None => Self::all_in_directory(input),
        };

        request.validate()?;
        Ok(request)
    }

    /// Parse a raw request string with an explicit kind tag and validate it.
    pub fn parse_as(tag: &str, input: &str) -> Result<Self, RequestError> {
        let kind = ComparisonKind::from_str(tag.trim()).map_err(|_| RequestError::UnsupportedKind {
            kind: tag.trim().to_string(),
        })?;

        let input = input.trim();
        if input.is_empty() {
            return Err(RequestError::MissingInput);
        }

        let parts = split_pair(input);
        let request = match kind {
            ComparisonKind::AllInDirectory => match parts {
                None => Self::all_in_directory(input),
                Some(_) => Self::new(kind, None, None, None),
            },
            ComparisonKind::Pair => match parts {
                Some((first, second)) => Self::pair(first, second),
                None => Self::new(kind, None, Some(input.into()), None),
            },
            ComparisonKind::SingleAgainstDirectory => match parts {
                Some((image, directory)) => Self::single(image, directory),
                None => Self::new(kind, None, Some(input.into()), None),
            },
        };

        request.validate()?;
        Ok(request)
    }

    /// Check that the fields required by the kind are present and exist on
    /// disk. Read-only.
    pub fn validate(&self) -> Result<(), RequestError> {
        match self.kind {
            ComparisonKind::AllInDirectory => {
                let Some(directory) = self.directory.as_deref() else {
                    return Err(RequestError::InvalidDirectoryComparison {
                        message: "Cannot request a directory comparison without a directory"
                            .into(),
                        source: None,
                    });
                };
                if !directory.is_dir() {
                    return Err(RequestError::InvalidDirectoryComparison {
                        message: format!(
                            "The directory '{}' does not exist",
                            directory.display()
                        ),
                        source: RequestError::not_found(directory),
                    });
                }
            }
            ComparisonKind::Pair => {
                let (Some(first), Some(second)) =
                    (self.first_image.as_deref(), self.second_image.as_deref())
                else {
                    return Err(RequestError::InvalidPairComparison {
                        message: "Cannot request a pair comparison without 2 images".into(),
                        source: None,
                    });
                };
                for image in [first, second] {
                    if !image.is_file() {
                        return Err(RequestError::InvalidPairComparison {
                            message: format!("The image '{}' does not exist", image.display()),
                            source: RequestError::not_found(image),
                        });
                    }
                }
            }
            ComparisonKind::SingleAgainstDirectory => {
                let (Some(image), Some(directory)) =
                    (self.first_image.as_deref(), self.directory.as_deref())
                else {
                    return Err(RequestError::InvalidSingleComparison {
                        message: "Cannot perform a single comparison without an image to \
                                  compare and a directory to check against"
                            .into(),
                        source: None,
                    });
                };
                if !image.is_file() {
                    return Err(RequestError::InvalidSingleComparison {
                        message: format!("The image '{}' does not exist", image.display()),
                        source: RequestError::not_found(image),
                    });
                }
                if !directory.is_dir() {
                    return Err(RequestError::InvalidSingleComparison {
                        message: format!(
                            "The directory '{}' does not exist",
                            directory.display()
                        ),
                        source: RequestError::not_found(directory),
                    });
                }
            }
        }
        Ok(())
    }

    /// Short human description of the request.
    pub fn describe(&self) -> String {
        let show = |p: &Option<PathBuf>| {
            p.as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "?".to_string())
        };
        match self.kind {
            ComparisonKind::AllInDirectory => format!("all images in '{}'", show(&self.directory)),
            ComparisonKind::Pair => format!(
                "'{}' with '{}'",
                show(&self.first_image),
                show(&self.second_image)
            ),
            ComparisonKind::SingleAgainstDirectory => format!(
                "'{}' with all images in '{}'",
                show(&self.first_image),
                show(&self.directory)
            ),
        }
    }
}

/// Split `"a,b"` into trimmed halves. Only the first comma splits.
fn split_pair(input: &str) -> Option<(&str, &str)> {
    input
        .split_once(',')
        .map(|(first, second)| (first.trim(), second.trim()))
}
