//! Resolution report DTOs.

use serde::Serialize;

use crate::domain::entities::LoadOutcome;

/// Serializable view of one [`LoadOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeReport {
    /// Resolved locator.
    pub locator: String,
    /// `disk`, `local` or `network`; absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Image width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Image height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// True if served from the disk cache.
    pub from_cache: bool,
    /// True if resolution failed.
    pub failed: bool,
    /// Failure stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&LoadOutcome> for OutcomeReport {
    fn from(outcome: &LoadOutcome) -> Self {
        let (width, height) = outcome.dimensions().unzip();
        Self {
            locator: outcome.locator.to_string(),
            source: outcome.source().map(|s| s.to_string()),
            width,
            height,
            from_cache: outcome.from_cache,
            failed: outcome.failed,
            stage: outcome.error.as_ref().map(|e| e.stage().to_string()),
            error: outcome.error.as_ref().map(ToString::to_string),
        }
    }
}

impl std::fmt::Display for OutcomeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.source, self.width, self.height) {
            (Some(source), Some(w), Some(h)) => {
                write!(f, "ok     {source:<7} {w}x{h}  {}", self.locator)
            }
            _ => write!(
                f,
                "failed {:<7} {}  ({})",
                self.stage.as_deref().unwrap_or("-"),
                self.locator,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Aggregate of a batch resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// One entry per delivered outcome, in delivery order.
    pub outcomes: Vec<OutcomeReport>,
    /// Outcomes served from the disk cache.
    pub from_cache: usize,
    /// Outcomes freshly fetched.
    pub fetched: usize,
    /// Failed outcomes.
    pub failed: usize,
}

impl BatchReport {
    /// Builds a report from delivered outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: &[LoadOutcome]) -> Self {
        let from_cache = outcomes.iter().filter(|o| o.from_cache).count();
        let failed = outcomes.iter().filter(|o| o.failed).count();
        Self {
            outcomes: outcomes.iter().map(OutcomeReport::from).collect(),
            from_cache,
            fetched: outcomes.len() - from_cache - failed,
            failed,
        }
    }

    /// Returns true if every outcome succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
