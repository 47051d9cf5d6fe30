pub mod client;
pub mod features;
pub mod matcher;
pub mod recognizer;

/// Which path produced a match decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// The external recognition provider answered.
    External,
    /// The byte-sampling fallback matcher ran in-process.
    Local,
}

/// Outcome of matching a submitted photo against an employee's registered
/// face. Transient: computed per request, never persisted.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matched: bool,
    /// Normalized similarity in [0, 1].
    pub similarity: f32,
    /// Provider confidence in percent, present on the external path only.
    pub confidence: Option<f32>,
    pub source: MatchSource,
}
