//! Linear undo/redo over whole-value snapshots.
//!
//! The history holds exactly one `present` value plus two stacks:
//!
//! - `past`, oldest first; undo pops from its tail.
//! - `future`, nearest redo first; redo pops from its head.
//!
//! Pushing a new value always discards `future`. Undo and redo at the
//! boundary are no-ops.

use std::{collections::VecDeque, mem};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History<T> {
  past:    VecDeque<T>,
  present: T,
  future:  VecDeque<T>,
  /// Maximum length of `past`; `None` keeps every step.
  limit:   Option<usize>,
}

impl<T> History<T> {
  /// Start an unbounded history at `initial`.
  pub fn new(initial: T) -> Self {
    Self {
      past:    VecDeque::new(),
      present: initial,
      future:  VecDeque::new(),
      limit:   None,
    }
  }

  /// Start a history that keeps at most `limit` undo steps. The oldest steps
  /// are dropped first.
  pub fn with_limit(initial: T, limit: usize) -> Self {
    Self {
      limit: Some(limit),
      ..Self::new(initial)
    }
  }

  pub fn present(&self) -> &T { &self.present }

  pub fn into_present(self) -> T { self.present }

  /// Prior values, oldest first.
  pub fn past(&self) -> impl ExactSizeIterator<Item = &T> { self.past.iter() }

  /// Undone values, nearest redo first.
  pub fn future(&self) -> impl ExactSizeIterator<Item = &T> {
    self.future.iter()
  }

  pub fn limit(&self) -> Option<usize> { self.limit }

  pub fn can_undo(&self) -> bool { !self.past.is_empty() }

  pub fn can_redo(&self) -> bool { !self.future.is_empty() }

  pub fn undo_depth(&self) -> usize { self.past.len() }

  pub fn redo_depth(&self) -> usize { self.future.len() }

  /// Make `next` the present value. The old present becomes the newest undo
  /// step and all redo steps are discarded.
  pub fn push(&mut self, next: T) {
    let previous = mem::replace(&mut self.present, next);
    self.past.push_back(previous);
    self.future.clear();
    self.enforce_limit();
  }

  /// Step back one value. Returns `false` (and changes nothing) when there is
  /// nothing to undo.
  pub fn undo(&mut self) -> bool {
    let Some(previous) = self.past.pop_back() else {
      return false;
    };
    let undone = mem::replace(&mut self.present, previous);
    self.future.push_front(undone);
    true
  }

  /// Re-apply the nearest undone value. Returns `false` (and changes nothing)
  /// when there is nothing to redo.
  pub fn redo(&mut self) -> bool {
    let Some(next) = self.future.pop_front() else {
      return false;
    };
    let current = mem::replace(&mut self.present, next);
    self.past.push_back(current);
    true
  }

  /// Overwrite the present value without recording an undo step. Both stacks
  /// are left as they are.
  pub fn replace_present(&mut self, value: T) { self.present = value; }

  /// Drop all undo and redo steps and start over at `value`.
  pub fn reset(&mut self, value: T) {
    self.past.clear();
    self.future.clear();
    self.present = value;
  }

  fn enforce_limit(&mut self) {
    if let Some(limit) = self.limit {
      while self.past.len() > limit {
        self.past.pop_front();
      }
    }
  }
}

impl<T: Default> Default for History<T> {
  fn default() -> Self { Self::new(T::default()) }
}
