//! Byte-sampling face fingerprint.
//!
//! This is NOT a real face embedding: it samples the encoded photo bytes at a
//! fixed stride and min-max normalizes them, so it is sensitive to the
//! encoding, not the face. It exists purely as a degraded fallback when the
//! recognition provider is down and must not be used as a production-grade
//! identity check on its own.

/// Fingerprint dimensionality, matching the provider's embedding size.
pub const FINGERPRINT_LEN: usize = 128;

/// Derive a fixed-length fingerprint from an encoded photo.
///
/// Deterministic and total: any input, including empty, yields a 128-element
/// vector with all values in [0, 1].
pub fn extract(photo: &str) -> Vec<f32> {
    let data = photo.as_bytes();
    let step = data.len() / FINGERPRINT_LEN;

    let mut features = Vec::with_capacity(FINGERPRINT_LEN);
    for i in 0..FINGERPRINT_LEN {
        let idx = i * step;
        features.push(data.get(idx).copied().map_or(0.0, f32::from));
    }

    // Min-max normalize; degenerate (flat) vectors divide by 1.
    let max = features.iter().copied().fold(f32::MIN, f32::max);
    let min = features.iter().copied().fold(f32::MAX, f32::min);
    let range = if max - min == 0.0 { 1.0 } else { max - min };

    features.iter().map(|f| (f - min) / range).collect()
}

/// Cosine similarity between two fingerprints.
///
/// Returns 0 on length mismatch or when either vector has zero magnitude;
/// both are division-by-zero guards, not errors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 { 0.0 } else { dot / magnitude }
}
