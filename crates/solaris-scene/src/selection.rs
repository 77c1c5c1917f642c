//! The single selected body.

use crate::graph::BodyId;

/// Result of a [`Selection::select`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// The body was already selected.
    Unchanged(BodyId),
    Selected {
        previous: Option<BodyId>,
        current: BodyId,
    },
}

/// At most one selected body; a new selection replaces the old one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<BodyId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<BodyId> {
        self.current
    }

    pub fn is_selected(&self, body: BodyId) -> bool {
        self.current == Some(body)
    }

    /// Last write wins.
    pub fn select(&mut self, body: BodyId) -> SelectionChange {
        match self.current.replace(body) {
            Some(previous) if previous == body => SelectionChange::Unchanged(body),
            previous => SelectionChange::Selected {
                previous,
                current: body,
            },
        }
    }

    /// Drop the selection, returning what was selected.
    pub fn clear(&mut self) -> Option<BodyId> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        assert_eq!(Selection::new().current(), None);
    }

    #[test]
    fn test_selecting_b_replaces_a() {
        let mut selection = Selection::new();
        let a = BodyId(0);
        let b = BodyId(1);

        assert_eq!(
            selection.select(a),
            SelectionChange::Selected {
                previous: None,
                current: a
            }
        );
        assert_eq!(
            selection.select(b),
            SelectionChange::Selected {
                previous: Some(a),
                current: b
            }
        );
        assert_eq!(selection.current(), Some(b));
        assert!(!selection.is_selected(a));
    }

    #[test]
    fn test_reselecting_is_unchanged() {
        let mut selection = Selection::new();
        selection.select(BodyId(4));
        assert_eq!(
            selection.select(BodyId(4)),
            SelectionChange::Unchanged(BodyId(4))
        );
    }

    #[test]
    fn test_at_most_one_selected_over_any_sequence() {
        let mut selection = Selection::new();
        let picks = [3, 1, 1, 7, 0, 5, 5, 2];
        for (step, &pick) in picks.iter().enumerate() {
            selection.select(BodyId(pick));
            let selected: Vec<usize> = (0..8)
                .filter(|&i| selection.is_selected(BodyId(i)))
                .collect();
            assert_eq!(selected, vec![pick], "step {step}");
        }
    }

    #[test]
    fn test_clear_returns_previous() {
        let mut selection = Selection::new();
        selection.select(BodyId(2));
        assert_eq!(selection.clear(), Some(BodyId(2)));
        assert_eq!(selection.clear(), None);
    }
}
