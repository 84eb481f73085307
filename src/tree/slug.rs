//! URL segment normalization

use unicode_normalization::UnicodeNormalization;

/// Normalize a URL segment before it is compared with stored slugs
///
/// Unicode is normalized to NFC so that composed and decomposed spellings of the same slug
/// match the same row; surrounding whitespace is dropped.
pub fn normalize_segment(segment: &str) -> String {
    segment.trim().nfc().collect()
}
