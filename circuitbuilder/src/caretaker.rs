//! Linear undo/redo history
//!
//! The caretaker only stores snapshots and moves a cursor over them. It never
//! looks inside a snapshot; applying one is the caller's job.

use crate::memento::CircuitMemento;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("No history entry at position {requested} (history holds {len})")]
    OutOfRange { requested: i64, len: usize },
}

/// Snapshot history with a cursor on the current entry
#[derive(Debug, Clone)]
pub struct Caretaker<S = CircuitMemento> {
    history: Vec<S>,
    cursor: Option<usize>,
    limit: Option<usize>,
}

impl<S> Default for Caretaker<S> {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            cursor: None,
            limit: None,
        }
    }
}

impl<S> Caretaker<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` snapshots, dropping the oldest first.
    /// A limit of zero is treated as one.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Record a new current state, discarding any redo entries.
    pub fn add_snapshot(&mut self, snapshot: S) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.history.truncate(keep);
        self.history.push(snapshot);

        if let Some(limit) = self.limit {
            let excess = self.history.len().saturating_sub(limit);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }
        self.cursor = Some(self.history.len() - 1);
    }

    /// Step back and return the snapshot there.
    pub fn undo(&mut self) -> Result<&S, HistoryError> {
        let target = match self.cursor {
            Some(c) if c > 0 => c - 1,
            _ => return Err(self.out_of_range(-1)),
        };
        self.cursor = Some(target);
        Ok(&self.history[target])
    }

    /// Step forward and return the snapshot there.
    pub fn redo(&mut self) -> Result<&S, HistoryError> {
        let target = self.cursor.map_or(0, |c| c + 1);
        if target >= self.history.len() {
            return Err(self.out_of_range(target as i64));
        }
        self.cursor = Some(target);
        Ok(&self.history[target])
    }

    /// Put the cursor back where it was before a failed undo or redo.
    pub(crate) fn rewind_to(&mut self, cursor: Option<usize>) {
        self.cursor = cursor.filter(|c| *c < self.history.len());
    }

    fn out_of_range(&self, requested: i64) -> HistoryError {
        let err = HistoryError::OutOfRange {
            requested,
            len: self.history.len(),
        };
        tracing::warn!("{}", err);
        err
    }

    pub fn current(&self) -> Option<&S> {
        self.cursor.and_then(|c| self.history.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.map_or(false, |c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.history.len()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        let mut history: Caretaker<u32> = Caretaker::new();
        assert!(history.current().is_none());
        assert!(matches!(history.undo(), Err(HistoryError::OutOfRange { requested: -1, len: 0 })));
        assert!(matches!(history.redo(), Err(HistoryError::OutOfRange { requested: 0, len: 0 })));
    }

    #[test]
    fn test_undo_available_n_minus_one_times() {
        let mut history = Caretaker::new();
        for i in 0..5 {
            history.add_snapshot(i);
        }
        for expected in (0..4).rev() {
            assert_eq!(history.undo(), Ok(&expected));
        }
        assert!(history.undo().is_err());
        assert_eq!(history.current(), Some(&0));
    }

    #[test]
    fn test_undo_past_first_entry_reports_minus_one() {
        let mut history = Caretaker::new();
        history.add_snapshot('a');
        assert_eq!(
            history.undo(),
            Err(HistoryError::OutOfRange { requested: -1, len: 1 })
        );
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn test_rewind_to_restores_cursor() {
        let mut history = Caretaker::new();
        history.add_snapshot(1);
        history.add_snapshot(2);
        history.undo().unwrap();

        history.rewind_to(Some(1));
        assert_eq!(history.current(), Some(&2));
        history.rewind_to(Some(7));
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn test_redo_walks_forward() {
        let mut history = Caretaker::new();
        history.add_snapshot("a");
        history.add_snapshot("b");
        history.add_snapshot("c");
        history.undo().unwrap();
        history.undo().unwrap();

        assert_eq!(history.redo(), Ok(&"b"));
        assert_eq!(history.redo(), Ok(&"c"));
        assert!(history.redo().is_err());
        assert_eq!(history.cursor(), Some(2));
    }

    #[test]
    fn test_new_snapshot_truncates_redo() {
        let mut history = Caretaker::new();
        history.add_snapshot(1);
        history.add_snapshot(2);
        history.add_snapshot(3);
        history.undo().unwrap();

        history.add_snapshot(4);
        assert!(!history.can_redo());
        assert!(history.redo().is_err());
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo(), Ok(&2));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = Caretaker::with_limit(3);
        for i in 0..10 {
            history.add_snapshot(i);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&9));
        assert_eq!(history.undo(), Ok(&8));
        assert_eq!(history.undo(), Ok(&7));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_clear() {
        let mut history = Caretaker::new();
        history.add_snapshot(1);
        history.clear();
        assert!(history.is_empty());
        assert!(history.current().is_none());
    }
}
