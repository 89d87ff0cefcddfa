//! # Signal Wait Conditions
//!
//! Conditions and wait hints understood by the native signal wait.

/// Comparison applied while waiting on a signal (`hsa_signal_condition_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SignalCondition {
    /// Signal value equals the compare value
    Eq  = 0,
    /// Signal value differs from the compare value
    Ne  = 1,
    /// Signal value is below the compare value
    Lt  = 2,
    /// Signal value is at or above the compare value
    Gte = 3,
}

impl SignalCondition {
    /// Evaluate the condition for an observed signal value
    pub const fn holds(self, value: i64, compare: i64) -> bool {
        match self {
            Self::Eq => value == compare,
            Self::Ne => value != compare,
            Self::Lt => value < compare,
            Self::Gte => value >= compare,
        }
    }
}

/// How the waiting thread should behave (`hsa_wait_state_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum WaitState {
    /// Thread may be descheduled while waiting
    Blocked = 0,
    /// Thread keeps spinning
    Active  = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditions() {
        assert!(SignalCondition::Lt.holds(0, 1));
        assert!(!SignalCondition::Lt.holds(1, 1));
        assert!(SignalCondition::Gte.holds(1, 1));
        assert!(SignalCondition::Eq.holds(-1, -1));
        assert!(SignalCondition::Ne.holds(2, 3));
    }
}
