//! Per-mint root window
//!
//! `current` is the most recently accepted root; `recent` holds previously
//! current roots, newest first, so provers racing a root update still pass.

use serde::{Deserialize, Serialize};

use crate::crypto::FieldElement;
use crate::error::LedgerError;

/// Default number of superseded roots kept per mint
pub const DEFAULT_ROOT_WINDOW: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootWindow {
    pub current: FieldElement,
    #[serde(default)]
    pub recent: Vec<FieldElement>,
}

impl RootWindow {
    pub fn new(current: FieldElement) -> Self {
        Self {
            current,
            recent: Vec::new(),
        }
    }

    /// Build a window from explicit parts, dropping duplicates and any copy
    /// of `current` from `recent`.
    pub fn from_parts(current: FieldElement, recent: Vec<FieldElement>, capacity: usize) -> Self {
        let mut window = Self::new(current);
        for root in recent {
            if root != current && !window.recent.contains(&root) {
                window.recent.push(root);
            }
        }
        window.recent.truncate(capacity);
        window
    }

    pub fn contains(&self, root: &FieldElement) -> bool {
        self.current == *root || self.recent.contains(root)
    }

    pub fn validate(&self, claimed: &FieldElement) -> Result<(), LedgerError> {
        if self.contains(claimed) {
            Ok(())
        } else {
            Err(LedgerError::RootMismatch {
                expected: self.current,
                recent: self.recent.clone(),
            })
        }
    }

    /// Make `new_root` current, pushing the old current onto `recent`.
    /// Advancing to the current root is a no-op.
    pub fn advance(&mut self, new_root: FieldElement, capacity: usize) {
        if new_root == self.current {
            return;
        }
        let previous = std::mem::replace(&mut self.current, new_root);
        self.recent.retain(|r| *r != previous && *r != new_root);
        self.recent.insert(0, previous);
        self.recent.truncate(capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn test_root_continuity() {
        let mut w = RootWindow::new(fe(0));
        w.advance(fe(1), 4);
        w.advance(fe(2), 4);
        assert!(w.validate(&fe(1)).is_ok());
        assert!(w.validate(&fe(2)).is_ok());
        assert_eq!(w.current, fe(2));
        assert_eq!(w.recent, vec![fe(1), fe(0)]);
    }

    #[test]
    fn test_window_bounded() {
        let mut w = RootWindow::new(fe(0));
        for i in 1..=5 {
            w.advance(fe(i), 3);
        }
        assert_eq!(w.recent, vec![fe(4), fe(3), fe(2)]);
        match w.validate(&fe(1)) {
            Err(LedgerError::RootMismatch { expected, recent }) => {
                assert_eq!(expected, fe(5));
                assert_eq!(recent.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_advance_to_current_is_noop() {
        let mut w = RootWindow::new(fe(7));
        w.advance(fe(7), 3);
        assert!(w.recent.is_empty());
    }

    #[test]
    fn test_readvance_to_recent_root_dedupes() {
        let mut w = RootWindow::new(fe(1));
        w.advance(fe(2), 8);
        w.advance(fe(1), 8);
        assert_eq!(w.current, fe(1));
        assert_eq!(w.recent, vec![fe(2)]);
    }

    #[test]
    fn test_from_parts_normalizes() {
        let w = RootWindow::from_parts(fe(1), vec![fe(1), fe(2), fe(2), fe(3)], 1);
        assert_eq!(w.recent, vec![fe(2)]);
    }
}
