//! Reversible change log.
//!
//! The engine is generic over the state it mutates. A [`Change`] knows how
//! to apply and revert itself against that state; a [`HistoryStep`] batches
//! the changes of one user-visible edit; [`History`] keeps the steps and an
//! undo cursor.
//!
//! Cursor movement and change execution are separate: `advance`/`revert`
//! only move the cursor and hand back the step, and the caller applies or
//! reverts it. This keeps replay from ever running a step twice.
//!
//! ```text
//! steps:   [s0] [s1] [s2]
//! cursor:             ^ cur_step = 2   (advance → None, revert → s2)
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A reversible unit of mutation.
pub trait Change<T> {
    /// Perform the change.
    fn apply(&self, target: &mut T) -> Result<()>;

    /// Undo the change. Must restore exactly the state `apply` started from.
    fn revert(&self, target: &mut T) -> Result<()>;

    /// Short label for logs.
    fn label(&self) -> &'static str {
        "change"
    }
}

/// Signature of a bound change function.
pub type ChangeFn<T, A> = fn(&mut T, &A) -> Result<()>;

/// A change built from plain functions and the arguments they were bound to.
///
/// Either side may be left unbound, in which case it is a no-op. The same
/// function pair can be bound to many argument values.
pub struct BoundChange<T, A> {
    on_apply: Option<ChangeFn<T, A>>,
    on_revert: Option<ChangeFn<T, A>>,
    args: A,
}

impl<T, A> BoundChange<T, A> {
    /// Bind arguments; both sides start as no-ops.
    pub fn new(args: A) -> Self {
        Self {
            on_apply: None,
            on_revert: None,
            args,
        }
    }

    pub fn on_apply(mut self, f: ChangeFn<T, A>) -> Self {
        self.on_apply = Some(f);
        self
    }

    pub fn on_revert(mut self, f: ChangeFn<T, A>) -> Self {
        self.on_revert = Some(f);
        self
    }

    /// The bound arguments.
    pub fn args(&self) -> &A {
        &self.args
    }
}

impl<T, A> Change<T> for BoundChange<T, A> {
    fn apply(&self, target: &mut T) -> Result<()> {
        match self.on_apply {
            Some(f) => f(target, &self.args),
            None => Ok(()),
        }
    }

    fn revert(&self, target: &mut T) -> Result<()> {
        match self.on_revert {
            Some(f) => f(target, &self.args),
            None => Ok(()),
        }
    }

    fn label(&self) -> &'static str {
        "bound"
    }
}

/// An entity that can be inserted into and removed from `T`.
pub trait Insertable<T> {
    fn insert_into(&self, target: &mut T) -> Result<()>;
    fn remove_from(&self, target: &mut T) -> Result<()>;
}

/// Symmetric create/destroy change: `is_add` picks which direction
/// `apply` goes, and `revert` goes the other way.
#[derive(Debug, Clone)]
pub struct AddRemoveChange<E> {
    entity: E,
    is_add: bool,
}

impl<E> AddRemoveChange<E> {
    pub fn add(entity: E) -> Self {
        Self { entity, is_add: true }
    }

    pub fn remove(entity: E) -> Self {
        Self { entity, is_add: false }
    }

    pub fn is_add(&self) -> bool {
        self.is_add
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }
}

impl<T, E: Insertable<T>> Change<T> for AddRemoveChange<E> {
    fn apply(&self, target: &mut T) -> Result<()> {
        if self.is_add {
            self.entity.insert_into(target)
        } else {
            self.entity.remove_from(target)
        }
    }

    fn revert(&self, target: &mut T) -> Result<()> {
        if self.is_add {
            self.entity.remove_from(target)
        } else {
            self.entity.insert_into(target)
        }
    }

    fn label(&self) -> &'static str {
        if self.is_add {
            "add"
        } else {
            "remove"
        }
    }
}

/// Semantic tag describing what kind of edit a step performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    /// Initial load or merge of a scene description.
    Import,
    /// Atoms or bonds added to an existing structure.
    Add,
    /// Positions changed.
    Move,
    /// Selection changed.
    Select,
    /// Entities removed.
    Remove,
    /// Entities mirrored.
    Mirror,
    /// Structure representation switched.
    Representation,
}

impl fmt::Display for EditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Add => write!(f, "add"),
            Self::Move => write!(f, "move"),
            Self::Select => write!(f, "select"),
            Self::Remove => write!(f, "remove"),
            Self::Mirror => write!(f, "mirror"),
            Self::Representation => write!(f, "representation"),
        }
    }
}

/// Changes of one user-visible edit, applied in order and reverted in
/// reverse order.
pub struct HistoryStep<T> {
    changes: Vec<Box<dyn Change<T> + Send>>,
    actions: BTreeSet<EditAction>,
}

impl<T> Default for HistoryStep<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HistoryStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStep")
            .field("changes", &self.changes.iter().map(|c| c.label()).collect::<Vec<_>>())
            .field("actions", &self.actions)
            .finish()
    }
}

impl<T> HistoryStep<T> {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
            actions: BTreeSet::new(),
        }
    }

    /// Builder: tag the step.
    pub fn with_action(mut self, action: EditAction) -> Self {
        self.actions.insert(action);
        self
    }

    /// Append a change.
    pub fn push<C: Change<T> + Send + 'static>(&mut self, change: C) {
        self.changes.push(Box::new(change));
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn actions(&self) -> &BTreeSet<EditAction> {
        &self.actions
    }

    /// Apply every change in order.
    ///
    /// On failure, changes already applied are reverted so `target` is left
    /// as it was.
    pub fn apply(&self, target: &mut T) -> Result<()> {
        for (done, change) in self.changes.iter().enumerate() {
            if let Err(e) = change.apply(target) {
                tracing::warn!(change = change.label(), error = %e, "History step apply failed, rolling back");
                for applied in self.changes[..done].iter().rev() {
                    applied.revert(target)?;
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Revert every change in reverse order, rolling forward again on
    /// failure.
    pub fn revert(&self, target: &mut T) -> Result<()> {
        let n = self.changes.len();
        for (i, change) in self.changes.iter().enumerate().rev() {
            if let Err(e) = change.revert(target) {
                tracing::warn!(change = change.label(), error = %e, "History step revert failed, rolling forward");
                for reverted in &self.changes[i + 1..n] {
                    reverted.apply(target)?;
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Ordered steps with an undo cursor.
pub struct History<T> {
    steps: Vec<HistoryStep<T>>,
    cur_step: isize,
    floor: isize,
}

impl<T> fmt::Debug for History<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("steps", &self.steps.len())
            .field("cur_step", &self.cur_step)
            .field("floor", &self.floor)
            .finish()
    }
}

impl<T> History<T> {
    /// Empty history. With `can_clear_scene = false` the first step can
    /// never be undone (cursor floor 0); otherwise undo may reach the empty
    /// state (floor -1).
    pub fn new(can_clear_scene: bool) -> Self {
        Self {
            steps: Vec::new(),
            cur_step: -1,
            floor: if can_clear_scene { -1 } else { 0 },
        }
    }

    /// Index of the current step, -1 before the first.
    pub fn cur_step(&self) -> isize {
        self.cur_step
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`, if any.
    pub fn step(&self, index: usize) -> Option<&HistoryStep<T>> {
        self.steps.get(index)
    }

    /// Append a step and make it current. Redo history past the cursor is
    /// discarded first.
    pub fn add_new_step(&mut self, step: HistoryStep<T>) {
        self.remove_further_steps();
        self.steps.push(step);
        self.cur_step = self.steps.len() as isize - 1;
        tracing::debug!(cur_step = self.cur_step, "History step added");
    }

    /// Drop every step after the cursor.
    pub fn remove_further_steps(&mut self) {
        self.steps.truncate((self.cur_step + 1) as usize);
    }

    pub fn can_advance(&self) -> bool {
        self.cur_step + 1 < self.steps.len() as isize
    }

    /// Move the cursor forward and return the step to re-apply.
    pub fn advance(&mut self) -> Option<&HistoryStep<T>> {
        if !self.can_advance() {
            tracing::debug!(cur_step = self.cur_step, "Nothing to redo");
            return None;
        }
        self.cur_step += 1;
        tracing::debug!(cur_step = self.cur_step, "History advanced");
        self.steps.get(self.cur_step as usize)
    }

    pub fn can_revert(&self) -> bool {
        self.cur_step > self.floor && self.cur_step >= 0
    }

    /// Move the cursor back and return the step to revert.
    pub fn revert(&mut self) -> Option<&HistoryStep<T>> {
        if !self.can_revert() {
            tracing::debug!(cur_step = self.cur_step, floor = self.floor, "Nothing to undo");
            return None;
        }
        let index = self.cur_step as usize;
        self.cur_step -= 1;
        tracing::debug!(cur_step = self.cur_step, "History reverted");
        self.steps.get(index)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.cur_step = -1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;

    fn push(v: &mut Vec<i32>, x: &i32) -> Result<()> {
        v.push(*x);
        Ok(())
    }

    fn pop(v: &mut Vec<i32>, x: &i32) -> Result<()> {
        match v.pop() {
            Some(y) if y == *x => Ok(()),
            _ => Err(SceneError::InconsistentRemoval(format!("expected {}", x))),
        }
    }

    fn fail(_: &mut Vec<i32>, x: &i32) -> Result<()> {
        Err(SceneError::InconsistentRemoval(format!("refusing {}", x)))
    }

    fn pusher(x: i32) -> BoundChange<Vec<i32>, i32> {
        BoundChange::new(x).on_apply(push).on_revert(pop)
    }

    struct Item(i32);

    impl Insertable<Vec<i32>> for Item {
        fn insert_into(&self, target: &mut Vec<i32>) -> Result<()> {
            target.push(self.0);
            Ok(())
        }
        fn remove_from(&self, target: &mut Vec<i32>) -> Result<()> {
            target.retain(|x| *x != self.0);
            Ok(())
        }
    }

    #[test]
    fn test_unbound_change_is_noop() {
        let c: BoundChange<Vec<i32>, ()> = BoundChange::new(());
        let mut v = vec![1];
        c.apply(&mut v).unwrap();
        c.revert(&mut v).unwrap();
        assert_eq!(v, vec![1]);
    }

    #[test]
    fn test_step_round_trip_reverses_order() {
        let mut step: HistoryStep<Vec<i32>> = HistoryStep::new().with_action(EditAction::Add);
        step.push(pusher(1));
        step.push(pusher(2));
        step.push(AddRemoveChange::add(Item(3)));
        assert!(step.has_changes());
        assert!(step.actions().contains(&EditAction::Add));

        let mut v = vec![0];
        step.apply(&mut v).unwrap();
        assert_eq!(v, vec![0, 1, 2, 3]);
        step.revert(&mut v).unwrap();
        assert_eq!(v, vec![0]);
    }

    #[test]
    fn test_remove_direction() {
        let c = AddRemoveChange::remove(Item(5));
        let mut v = vec![5, 6];
        Change::apply(&c, &mut v).unwrap();
        assert_eq!(v, vec![6]);
        Change::revert(&c, &mut v).unwrap();
        assert_eq!(v, vec![6, 5]);
        assert!(!c.is_add());
    }

    #[test]
    fn test_failed_apply_rolls_back() {
        let mut step: HistoryStep<Vec<i32>> = HistoryStep::new();
        step.push(pusher(1));
        step.push(BoundChange::new(9).on_apply(fail));
        let mut v = vec![0];
        assert!(step.apply(&mut v).is_err());
        assert_eq!(v, vec![0]);
    }

    #[test]
    fn test_undo_floor() {
        let mut h: History<Vec<i32>> = History::new(false);
        assert!(!h.can_revert());
        h.add_new_step(HistoryStep::new());
        assert_eq!(h.cur_step(), 0);
        assert!(!h.can_revert());
        assert!(h.revert().is_none());
        assert_eq!(h.cur_step(), 0);

        let mut h: History<Vec<i32>> = History::new(true);
        h.add_new_step(HistoryStep::new());
        assert!(h.revert().is_some());
        assert_eq!(h.cur_step(), -1);
        assert!(h.revert().is_none());
        assert_eq!(h.cur_step(), -1);
    }

    #[test]
    fn test_new_step_discards_redo() {
        let mut h: History<Vec<i32>> = History::new(true);
        h.add_new_step(HistoryStep::new());
        h.add_new_step(HistoryStep::new());
        h.revert();
        assert!(h.can_advance());
        h.add_new_step(HistoryStep::new());
        assert_eq!(h.len(), 2);
        assert!(!h.can_advance());
        assert!(h.advance().is_none());
    }

    #[test]
    fn test_cursor_moves_without_applying() {
        let mut h: History<Vec<i32>> = History::new(true);
        let mut step: HistoryStep<Vec<i32>> = HistoryStep::new();
        step.push(pusher(7));
        let mut v = Vec::new();
        step.apply(&mut v).unwrap();
        h.add_new_step(step);

        if let Some(step) = h.revert() {
            step.revert(&mut v).unwrap();
        }
        assert!(v.is_empty());
        if let Some(step) = h.advance() {
            step.apply(&mut v).unwrap();
        }
        assert_eq!(v, vec![7]);
    }
}
