//! Global state bits and their accounting policy.
//!
//! State bits represent cross-cutting modes (modal, redraw off, ...) that any
//! registered component may enter and exit. Entries and exits for the same
//! bit can come from multiple callers, which raises the question of how they
//! balance; see [`StateAccounting`].

/// Cross-cutting modes all registered components are notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    Modal,
    RedrawOff,
    WarningsOff,
    Recording,
}

impl StateId {
    pub(crate) const ALL: [StateId; 4] = [
        StateId::Modal,
        StateId::RedrawOff,
        StateId::WarningsOff,
        StateId::Recording,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            StateId::Modal => 1 << 0,
            StateId::RedrawOff => 1 << 1,
            StateId::WarningsOff => 1 << 2,
            StateId::Recording => 1 << 3,
        }
    }

    const fn index(self) -> usize {
        match self {
            StateId::Modal => 0,
            StateId::RedrawOff => 1,
            StateId::WarningsOff => 2,
            StateId::Recording => 3,
        }
    }
}

/// Who gets notified of a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateScope {
    /// Fan the transition out to every registered component.
    All,
    /// Record the transition without notifying anyone.
    Mine,
}

/// How enter/exit calls for the same bit are balanced.
///
/// The host contract describes refcounted semantics: n enters are symmetric
/// with n exits. The reference behavior is a flat OR on enter and an
/// unconditional AND-NOT on exit, which loses nesting depth when two callers
/// enter the same bit. `FlatBitmask` reproduces that behavior and is the
/// default; `RefCounted` balances enters against exits per bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateAccounting {
    #[default]
    FlatBitmask,
    RefCounted,
}

/// The currently-entered state bits under a chosen accounting policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBits {
    accounting: StateAccounting,
    mask: u32,
    counts: [u32; StateId::ALL.len()],
}

impl StateBits {
    pub fn new(accounting: StateAccounting) -> Self {
        Self {
            accounting,
            mask: 0,
            counts: [0; StateId::ALL.len()],
        }
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.mask & state.bit() != 0
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn enter(&mut self, state: StateId) {
        if let StateAccounting::RefCounted = self.accounting {
            self.counts[state.index()] = self.counts[state.index()].saturating_add(1);
        }
        self.mask |= state.bit();
    }

    /// Clears the bit (or one level of it) and returns whether it is still in
    /// effect afterwards. Under `FlatBitmask` this is always false. Exits
    /// without a matching enter are tolerated, never underflowing.
    pub fn exit(&mut self, state: StateId) -> bool {
        match self.accounting {
            StateAccounting::FlatBitmask => {
                self.mask &= !state.bit();
            }
            StateAccounting::RefCounted => {
                let count = &mut self.counts[state.index()];
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.mask &= !state.bit();
                }
            }
        }
        self.contains(state)
    }
}

impl Default for StateBits {
    fn default() -> Self {
        Self::new(StateAccounting::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_enter_exit_symmetry() {
        let mut bits = StateBits::default();
        bits.enter(StateId::Modal);
        assert!(bits.contains(StateId::Modal));
        assert!(!bits.exit(StateId::Modal));
        assert!(!bits.contains(StateId::Modal));
    }

    #[test]
    fn flat_exit_drops_nested_enters() {
        // Flat accounting loses nesting depth: two enters, one exit, bit gone.
        let mut bits = StateBits::new(StateAccounting::FlatBitmask);
        bits.enter(StateId::Modal);
        bits.enter(StateId::Modal);
        assert!(!bits.exit(StateId::Modal));
        assert!(!bits.contains(StateId::Modal));
    }

    #[test]
    fn flat_independent_bits() {
        let mut bits = StateBits::default();
        bits.enter(StateId::Modal);
        bits.enter(StateId::RedrawOff);
        bits.exit(StateId::Modal);
        assert!(bits.contains(StateId::RedrawOff));
        assert!(!bits.contains(StateId::Modal));
    }

    #[test]
    fn refcounted_balances_enters_and_exits() {
        let mut bits = StateBits::new(StateAccounting::RefCounted);
        bits.enter(StateId::Modal);
        bits.enter(StateId::Modal);
        assert!(bits.exit(StateId::Modal));
        assert!(bits.contains(StateId::Modal));
        assert!(!bits.exit(StateId::Modal));
        assert!(!bits.contains(StateId::Modal));
    }

    #[test]
    fn refcounted_exit_without_enter_does_not_underflow() {
        let mut bits = StateBits::new(StateAccounting::RefCounted);
        assert!(!bits.exit(StateId::Recording));
        bits.enter(StateId::Recording);
        assert!(bits.contains(StateId::Recording));
        assert!(!bits.exit(StateId::Recording));
    }
}
