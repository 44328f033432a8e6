//! Content fingerprints.
//!
//! A fingerprint is a cheap stand-in for file equality: identical bytes
//! always produce identical fingerprints. Nothing stronger is promised, and
//! the providers here are drop-in points rather than a stable format.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;

use dedupifyr_core::Fingerprint;

/// Buffers at least this large are fingerprinted in parallel.
const PARALLEL_THRESHOLD: usize = 1024 * 1024;

/// Bytes per parallel base64 chunk. Must stay a multiple of 3 so chunks
/// encode without padding and concatenate into the sequential encoding.
const BASE64_CHUNK: usize = 3 * 64 * 1024;

/// Turns raw bytes into a [`Fingerprint`].
pub trait FingerprintProvider: Send + Sync {
    /// Fingerprint `bytes`. Must be deterministic and accept empty input.
    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint;
}

/// Reverses the bytes and base64-encodes them.
///
/// Deliberately weak: the fingerprint is as long as the input (times 4/3),
/// which is what lets the character comparators measure partial similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReversedBase64;

impl FingerprintProvider for ReversedBase64 {
    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        let reversed: Vec<u8> = bytes.iter().rev().copied().collect();

        if reversed.len() < PARALLEL_THRESHOLD {
            return Fingerprint::new(STANDARD.encode(&reversed));
        }

        let pieces: Vec<String> = reversed
            .par_chunks(BASE64_CHUNK)
            .map(|chunk| STANDARD.encode(chunk))
            .collect();
        Fingerprint::new(pieces.concat())
    }
}

/// BLAKE3 digest as lowercase hex.
///
/// Only useful for exact matching: a single changed byte changes the whole
/// digest, so partial scores between different files are noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hex;

impl FingerprintProvider for Blake3Hex {
    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        let hash = if bytes.len() < PARALLEL_THRESHOLD {
            blake3::hash(bytes)
        } else {
            let mut hasher = blake3::Hasher::new();
            hasher.update_rayon(bytes);
            hasher.finalize()
        };
        Fingerprint::new(hash.to_hex().to_string())
    }
}

/// How much of a file a strategy fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// The whole file.
    Full,
    /// `len / divisor` leading bytes, but never fewer than
    /// `min(len, floor)`, so small files are not reduced to nothing.
    Leading { divisor: usize, floor: usize },
}

impl Granularity {
    /// Leading sixteenth, used when every image in a directory is compared.
    pub const DIRECTORY: Granularity = Granularity::Leading {
        divisor: 16,
        floor: 4096,
    };

    /// Leading eighth, used for one image against a directory.
    pub const SINGLE: Granularity = Granularity::Leading {
        divisor: 8,
        floor: 4096,
    };

    /// The slice of `bytes` to fingerprint.
    pub fn select<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        match *self {
            Granularity::Full => bytes,
            Granularity::Leading { divisor, floor } => {
                let len = bytes.len();
                let take = (len / divisor.max(1)).max(floor.min(len));
                &bytes[..take]
            }
        }
    }
}
