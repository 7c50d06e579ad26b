//! Per-view zoom and pan history.
//!
//! Every chart view registered with [`ZoomHistory`] keeps its own bounded undo stack of axis
//! ranges. The ranges on screen are pushed onto the stack *before* a zoom or drag-zoom starts,
//! so popping restores the view to what it showed before that gesture. When the stack is full
//! the oldest entry is evicted. Views never share history.
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::error::{NavCompareError, Result};

/// Closed interval on one chart axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        AxisRange { min, max }
    }
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Visible x and y ranges of a chart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewRanges {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl ViewRanges {
    pub fn new(x: AxisRange, y: AxisRange) -> Self {
        ViewRanges { x, y }
    }
}

/// Result of an undo request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UndoOutcome {
    /// The view now shows these ranges.
    Restored(ViewRanges),
    NothingToUndo,
}

#[derive(Clone, Debug)]
struct ViewHistory {
    full: ViewRanges,
    current: ViewRanges,
    stack: VecDeque<ViewRanges>,
}

/// Undo stacks for a set of named chart views.
#[derive(Clone, Debug)]
pub struct ZoomHistory {
    capacity: usize,
    views: BTreeMap<String, ViewHistory>,
}

impl Default for ZoomHistory {
    fn default() -> Self {
        ZoomHistory::new(20)
    }
}

impl ZoomHistory {
    /// Create a manager whose stacks hold at most `capacity` entries each.
    pub fn new(capacity: usize) -> Self {
        ZoomHistory {
            capacity,
            views: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register (or re-register) a view showing its full data-driven range.
    ///
    /// Re-registering replaces the full range and clears any existing history.
    pub fn register(&mut self, view: &str, full: ViewRanges) {
        self.views.insert(
            view.to_string(),
            ViewHistory {
                full,
                current: full,
                stack: VecDeque::with_capacity(self.capacity),
            },
        );
    }

    pub fn unregister(&mut self, view: &str) -> bool {
        self.views.remove(view).is_some()
    }

    pub fn views(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    fn view_mut(&mut self, view: &str) -> Result<&mut ViewHistory> {
        self.views
            .get_mut(view)
            .ok_or_else(|| NavCompareError::UnknownView(view.to_string()))
    }

    fn view(&self, view: &str) -> Result<&ViewHistory> {
        self.views
            .get(view)
            .ok_or_else(|| NavCompareError::UnknownView(view.to_string()))
    }

    /// Capture the ranges currently shown by `view` before a zoom or drag-zoom begins.
    pub fn begin_zoom(&mut self, view: &str) -> Result<()> {
        let capacity = self.capacity;
        let history = self.view_mut(view)?;
        if capacity == 0 {
            return Ok(());
        }
        if history.stack.len() == capacity {
            history.stack.pop_front();
        }
        history.stack.push_back(history.current);
        debug!("Zoom history for '{}' now holds {} entries", view, history.stack.len());
        Ok(())
    }

    /// Record the ranges a view settled on after a zoom, drag, or pan.
    pub fn apply(&mut self, view: &str, ranges: ViewRanges) -> Result<()> {
        self.view_mut(view)?.current = ranges;
        Ok(())
    }

    /// Pop the most recent snapshot of `view` and make it the current ranges.
    pub fn undo(&mut self, view: &str) -> Result<UndoOutcome> {
        let history = self.view_mut(view)?;
        match history.stack.pop_back() {
            Some(previous) => {
                history.current = previous;
                Ok(UndoOutcome::Restored(previous))
            }
            None => Ok(UndoOutcome::NothingToUndo),
        }
    }

    /// Clear the history of `view` and restore its full range.
    pub fn reset(&mut self, view: &str) -> Result<ViewRanges> {
        let history = self.view_mut(view)?;
        history.stack.clear();
        history.current = history.full;
        Ok(history.full)
    }

    pub fn current(&self, view: &str) -> Result<ViewRanges> {
        Ok(self.view(view)?.current)
    }

    /// Number of undo entries held for `view`.
    pub fn depth(&self, view: &str) -> Result<usize> {
        Ok(self.view(view)?.stack.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(x: f64) -> ViewRanges {
        ViewRanges::new(AxisRange::new(0.0, x), AxisRange::new(-x, x))
    }

    #[test]
    fn undo_restores_previous_ranges() {
        let mut history = ZoomHistory::new(20);
        history.register("error", ranges(100.0));
        history.begin_zoom("error").unwrap();
        history.apply("error", ranges(50.0)).unwrap();
        history.begin_zoom("error").unwrap();
        history.apply("error", ranges(10.0)).unwrap();

        assert_eq!(history.undo("error").unwrap(), UndoOutcome::Restored(ranges(50.0)));
        assert_eq!(history.current("error").unwrap(), ranges(50.0));
        assert_eq!(history.undo("error").unwrap(), UndoOutcome::Restored(ranges(100.0)));
        assert_eq!(history.undo("error").unwrap(), UndoOutcome::NothingToUndo);
    }
    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let mut history = ZoomHistory::new(20);
        history.register("speed", ranges(1.0));
        for i in 0..25 {
            history.begin_zoom("speed").unwrap();
            history.apply("speed", ranges(2.0 + i as f64)).unwrap();
            assert!(history.depth("speed").unwrap() <= 20);
        }
        assert_eq!(history.depth("speed").unwrap(), 20);
        let mut last = None;
        while let UndoOutcome::Restored(r) = history.undo("speed").unwrap() {
            last = Some(r);
        }
        // the first five snapshots (1.0, 2.0, ..., 5.0) were evicted
        assert_eq!(last, Some(ranges(6.0)));
    }
    #[test]
    fn reset_clears_and_restores_full_range() {
        let mut history = ZoomHistory::default();
        history.register("altitude", ranges(100.0));
        history.begin_zoom("altitude").unwrap();
        history.apply("altitude", ranges(3.0)).unwrap();
        assert_eq!(history.reset("altitude").unwrap(), ranges(100.0));
        assert_eq!(history.current("altitude").unwrap(), ranges(100.0));
        assert_eq!(history.undo("altitude").unwrap(), UndoOutcome::NothingToUndo);
    }
    #[test]
    fn views_are_independent() {
        let mut history = ZoomHistory::default();
        history.register("a", ranges(10.0));
        history.register("b", ranges(20.0));
        history.begin_zoom("a").unwrap();
        history.apply("a", ranges(5.0)).unwrap();
        assert_eq!(history.depth("b").unwrap(), 0);
        assert_eq!(history.undo("b").unwrap(), UndoOutcome::NothingToUndo);
        assert_eq!(history.undo("a").unwrap(), UndoOutcome::Restored(ranges(10.0)));
    }
    #[test]
    fn unknown_view_is_an_error() {
        let mut history = ZoomHistory::default();
        assert!(matches!(
            history.undo("missing"),
            Err(NavCompareError::UnknownView(_))
        ));
        assert!(history.begin_zoom("missing").is_err());
    }
}
