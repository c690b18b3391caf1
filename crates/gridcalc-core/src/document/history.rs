use std::collections::VecDeque;

use gridcalc_engine::engine::{CellRange, CellRef};

use crate::sheet::CellSnapshot;

/// Represents an undoable edit.
///
/// `old` is captured before the edit. `new` is filled in when the action is
/// undone, so that redo can put back exactly what undo replaced.
#[derive(Clone, Debug, PartialEq)]
pub enum UndoAction {
    CellChange {
        at: CellRef,
        old: CellSnapshot,
        new: Option<CellSnapshot>,
    },
    /// Row-major snapshots of every position in `range`.
    RangeChange {
        range: CellRange,
        old: Vec<CellSnapshot>,
        new: Option<Vec<CellSnapshot>>,
    },
    ResizeColumn {
        col: usize,
        old: usize,
        new: Option<usize>,
    },
    ResizeRow {
        row: usize,
        old: usize,
        new: Option<usize>,
    },
}

/// Bounded undo history with a cursor.
///
/// Entries before the cursor can be undone, entries at or after it redone.
/// Recording truncates everything after the cursor; when full, the oldest
/// entry is dropped.
#[derive(Clone, Debug)]
pub struct UndoLog {
    actions: VecDeque<UndoAction>,
    current_index: usize,
    capacity: usize,
}

impl UndoLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        UndoLog {
            actions: VecDeque::with_capacity(capacity),
            current_index: 0,
            capacity,
        }
    }

    pub fn record(&mut self, action: UndoAction) {
        self.actions.truncate(self.current_index);
        if self.actions.len() == self.capacity {
            self.actions.pop_front();
        }
        self.actions.push_back(action);
        self.current_index = self.actions.len();
    }

    /// Move the cursor back over the action to undo.
    pub(crate) fn step_back(&mut self) -> Option<&mut UndoAction> {
        self.current_index = self.current_index.checked_sub(1)?;
        self.actions.get_mut(self.current_index)
    }

    /// Move the cursor forward over the action to redo.
    pub(crate) fn step_forward(&mut self) -> Option<&mut UndoAction> {
        if self.current_index >= self.actions.len() {
            return None;
        }
        self.current_index += 1;
        self.actions.get_mut(self.current_index - 1)
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index < self.actions.len()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn actions(&self) -> impl Iterator<Item = &UndoAction> {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resize(col: usize) -> UndoAction {
        UndoAction::ResizeColumn {
            col,
            old: 10,
            new: None,
        }
    }

    fn cols(log: &UndoLog) -> Vec<usize> {
        log.actions()
            .map(|a| match a {
                UndoAction::ResizeColumn { col, .. } => *col,
                _ => usize::MAX,
            })
            .collect()
    }

    #[test]
    fn test_full_log_evicts_oldest() {
        let mut log = UndoLog::new(3);
        for col in 0..5 {
            log.record(resize(col));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(cols(&log), vec![2, 3, 4]);
        assert_eq!(log.current_index(), 3);
    }

    #[test]
    fn test_record_truncates_redo_tail() {
        let mut log = UndoLog::new(10);
        log.record(resize(0));
        log.record(resize(1));
        log.record(resize(2));
        assert!(log.step_back().is_some());
        assert!(log.step_back().is_some());
        assert!(log.can_redo());
        log.record(resize(7));
        assert!(!log.can_redo());
        assert_eq!(cols(&log), vec![0, 7]);
    }

    #[test]
    fn test_cursor_bounds() {
        let mut log = UndoLog::new(2);
        assert!(!log.can_undo());
        assert!(log.step_back().is_none());
        assert_eq!(log.current_index(), 0);
        log.record(resize(0));
        assert!(log.step_forward().is_none());
        assert!(log.step_back().is_some());
        assert!(log.step_back().is_none());
        assert!(log.step_forward().is_some());
        assert!(!log.can_redo());
    }
}
