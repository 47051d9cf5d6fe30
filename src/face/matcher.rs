//! Local fallback matcher: fingerprint both photos and compare.

use super::features::{cosine_similarity, extract};
use super::{MatchResult, MatchSource};

/// Minimum cosine similarity for a local match. Calibrated empirically for
/// the byte-sampling fingerprint; tune together with `features::extract`.
pub const MATCH_THRESHOLD: f32 = 0.60;

#[inline]
fn is_match(similarity: f32) -> bool {
    similarity >= MATCH_THRESHOLD
}

/// Compare a stored reference photo against a freshly captured one.
///
/// Fail-closed: this is a security-relevant gate, so degenerate input ends up
/// as `{matched: false, similarity: 0.0}` rather than an error.
pub fn compare_photos(stored: &str, captured: &str) -> MatchResult {
    let similarity = cosine_similarity(&extract(stored), &extract(captured));

    MatchResult {
        matched: is_match(similarity),
        similarity,
        confidence: None,
        source: MatchSource::Local,
    }
}
