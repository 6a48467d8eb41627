use std::path::Path;

use serde::{Deserialize, Serialize};

use scorebook_types::Rules;

use crate::error::{ScoringError, ScoringResult};

/// Configuration for a [`Scorer`](crate::Scorer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Reject deliveries whose striker, non-striker or bowler differ from
    /// the innings' current crease slots.
    pub enforce_expected_participants: bool,
    /// Require a playing XI from the roster provider and check every
    /// selected player against it.
    pub enforce_roster: bool,
    /// Extra match formats registered at startup.
    pub formats: Vec<Rules>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            enforce_expected_participants: true,
            enforce_roster: true,
            formats: Vec::new(),
        }
    }
}

impl ScorerConfig {
    /// Configuration for offline tools that replay recorded matches
    /// without a roster service.
    pub fn offline() -> Self {
        Self {
            enforce_roster: false,
            ..Default::default()
        }
    }

    pub fn from_toml_str(source: &str) -> ScoringResult<Self> {
        toml::from_str(source).map_err(|e| ScoringError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ScoringResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }
}
