//! Regime labels and the per-pair persisted regime state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse market-behavior classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Bull,
    Bear,
    Choppy,
    Neutral,
}

impl Regime {
    pub const ALL: [Regime; 4] = [Regime::Bull, Regime::Bear, Regime::Choppy, Regime::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Bull => "BULL",
            Regime::Bear => "BEAR",
            Regime::Choppy => "CHOPPY",
            Regime::Neutral => "NEUTRAL",
        }
    }

    /// Stable dense index, used for array-backed lookup tables.
    pub(crate) fn index(&self) -> usize {
        match self {
            Regime::Bull => 0,
            Regime::Bear => 1,
            Regime::Choppy => 2,
            Regime::Neutral => 3,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last classified regime for one pair.
///
/// Created with the configured initial label on first evaluation. Only the
/// classifier replaces it; an indeterminate classification leaves it as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeState {
    pub label: Regime,
    /// Open time of the candle that produced `label`. `None` until the first
    /// successful classification.
    pub last_updated: Option<DateTime<Utc>>,
}

impl RegimeState {
    pub fn new(label: Regime) -> Self {
        Self {
            label,
            last_updated: None,
        }
    }
}

impl Default for RegimeState {
    fn default() -> Self {
        Self::new(Regime::Neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_unique() {
        let mut seen = [false; 4];
        for r in Regime::ALL {
            assert!(!seen[r.index()]);
            seen[r.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn serde_lowercase() {
        assert_eq!(serde_json::to_string(&Regime::Choppy).unwrap(), "\"choppy\"");
        let r: Regime = serde_json::from_str("\"bear\"").unwrap();
        assert_eq!(r, Regime::Bear);
    }

    #[test]
    fn default_state_is_neutral_and_never_updated() {
        let state = RegimeState::default();
        assert_eq!(state.label, Regime::Neutral);
        assert!(state.last_updated.is_none());
    }
}
