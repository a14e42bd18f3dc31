#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LatchState {
    Armed,
    Fired,
}

/// What happens to a fired latch once its condition stops holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RearmMode {
    /// Re-arm as soon as the condition clears (population alerts)
    OnClear,
    /// Stay fired until the owner is discarded (per-person alerts)
    Never,
}

/// Edge-triggered alert: reports `true` only on the Armed -> Fired transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertLatch {
    state: LatchState,
    rearm: RearmMode,
}

impl AlertLatch {
    pub fn new(rearm: RearmMode) -> Self {
        AlertLatch {
            state: LatchState::Armed,
            rearm,
        }
    }

    pub fn hysteresis() -> Self {
        AlertLatch::new(RearmMode::OnClear)
    }

    pub fn one_shot() -> Self {
        AlertLatch::new(RearmMode::Never)
    }

    /// Feed the current value of the triggering condition; returns true
    /// if this evaluation fired the alert.
    pub fn evaluate(&mut self, condition: bool) -> bool {
        match (self.state, condition) {
            (LatchState::Armed, true) => {
                self.state = LatchState::Fired;
                true
            }
            (LatchState::Fired, false) if self.rearm == RearmMode::OnClear => {
                self.state = LatchState::Armed;
                false
            }
            _ => false,
        }
    }

    pub fn is_fired(&self) -> bool {
        self.state == LatchState::Fired
    }

    pub fn reset(&mut self) {
        self.state = LatchState::Armed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hysteresis_fires_once_per_episode() {
        let mut latch = AlertLatch::hysteresis();
        let fired: Vec<bool> = [false, true, true, true, false, true, false]
            .into_iter()
            .map(|c| latch.evaluate(c))
            .collect();
        assert_eq!(fired, vec![false, true, false, false, false, true, false]);
        assert!(!latch.is_fired());
    }

    #[test]
    fn one_shot_never_rearms() {
        let mut latch = AlertLatch::one_shot();
        assert!(latch.evaluate(true));
        assert!(!latch.evaluate(false));
        assert!(!latch.evaluate(true));
        assert!(latch.is_fired());
    }

    #[test]
    fn reset_rearms() {
        let mut latch = AlertLatch::one_shot();
        latch.evaluate(true);
        latch.reset();
        assert!(latch.evaluate(true));
    }
}
