//! Ratchet invariant enforcement for long stops.
//!
//! **Core Rule:** a stop may tighten, never loosen. Once a level has been
//! returned, every later level is at least as high, whatever the regime,
//! volatility or parameter set proposing it.

/// Ratchet state for one trade's stop-loss.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatchetState {
    /// High-water mark of every applied proposal.
    current_level: Option<f64>,
}

impl RatchetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_level(initial_level: f64) -> Self {
        Self {
            current_level: Some(initial_level).filter(|l| l.is_finite()),
        }
    }

    /// Apply a proposed stop level and return the ratcheted level.
    ///
    /// # Rules
    /// - stop can only rise: max of current and proposed
    /// - an undefined (`None` or non-finite) proposal changes nothing
    /// - with no current level the proposal becomes the level
    ///
    /// # Example
    /// ```
    /// use regime_core::risk::RatchetState;
    ///
    /// let mut ratchet = RatchetState::with_initial_level(95.0);
    /// assert_eq!(ratchet.apply(Some(100.0)), Some(100.0));
    /// assert_eq!(ratchet.apply(Some(90.0)), Some(100.0));
    /// assert_eq!(ratchet.apply(None), Some(100.0));
    /// ```
    pub fn apply(&mut self, proposed: Option<f64>) -> Option<f64> {
        let Some(proposed) = proposed.filter(|p| p.is_finite()) else {
            return self.current_level;
        };
        let level = match self.current_level {
            Some(current) => current.max(proposed),
            None => proposed,
        };
        self.current_level = Some(level);
        self.current_level
    }

    pub fn current_level(&self) -> Option<f64> {
        self.current_level
    }

    pub fn clear(&mut self) {
        self.current_level = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tightening_allowed() {
        let mut ratchet = RatchetState::with_initial_level(95.0);
        assert_eq!(ratchet.apply(Some(100.0)), Some(100.0));
        assert_eq!(ratchet.current_level(), Some(100.0));
    }

    #[test]
    fn loosening_blocked() {
        let mut ratchet = RatchetState::with_initial_level(100.0);
        assert_eq!(ratchet.apply(Some(90.0)), Some(100.0));
        assert_eq!(ratchet.current_level(), Some(100.0));
    }

    #[test]
    fn first_proposal_initializes() {
        let mut ratchet = RatchetState::new();
        assert_eq!(ratchet.current_level(), None);
        assert_eq!(ratchet.apply(Some(95.0)), Some(95.0));
    }

    #[test]
    fn undefined_proposal_keeps_level() {
        let mut ratchet = RatchetState::with_initial_level(97.0);
        assert_eq!(ratchet.apply(Some(f64::NAN)), Some(97.0));
        assert_eq!(ratchet.apply(None), Some(97.0));

        let mut empty = RatchetState::new();
        assert_eq!(empty.apply(None), None);
    }

    #[test]
    fn wider_regime_stop_does_not_loosen() {
        // BULL baseline -4%, then the regime flips to NEUTRAL with -5%.
        let mut ratchet = RatchetState::new();
        ratchet.apply(Some(96.0));
        assert_eq!(ratchet.apply(Some(95.0)), Some(96.0));
    }

    #[test]
    fn clear_resets() {
        let mut ratchet = RatchetState::with_initial_level(100.0);
        ratchet.clear();
        assert_eq!(ratchet.current_level(), None);
        assert_eq!(ratchet.apply(Some(90.0)), Some(90.0));
    }
}
