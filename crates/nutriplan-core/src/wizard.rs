//! The diet-creator wizard.
//!
//! A fixed sequence of steps, each with a gate that must pass before the
//! wizard moves forward:
//!
//! ```text
//! Basics ──▶ Meals ──▶ Categorize ──▶ Preview
//!  name set   ≥1 ingredient   all categorized
//! ```
//!
//! Plan edits are undoable independently of categorization edits, and are
//! only accepted on `Basics` and `Meals`. Entering `Categorize` reseeds the
//! session from the plan's current shopping list, which keeps existing
//! buckets when the list did not change.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::debug;

use crate::{
  Error, Result,
  history::History,
  notify::{Notifier, TracingNotifier},
  plan::DietPlan,
  session::CategorizationSession,
  store::{Assignments, PlanStore},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Step {
  Basics,
  Meals,
  Categorize,
  Preview,
}

impl Step {
  pub fn next(self) -> Option<Self> { Self::iter().skip_while(|s| *s != self).nth(1) }

  pub fn previous(self) -> Option<Self> {
    Self::iter().take_while(|s| *s != self).last()
  }
}

/// Counts shown on the preview step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
  pub days:        usize,
  pub meals:       usize,
  pub ingredients: usize,
  /// Number of products per category.
  pub categories:  BTreeMap<String, usize>,
}

pub struct Wizard<N = TracingNotifier> {
  step:    Step,
  plan:    History<DietPlan>,
  session: CategorizationSession<N>,
}

impl<N: Notifier> Wizard<N> {
  /// Start at [`Step::Basics`] with `plan` (empty, or instantiated from a
  /// template).
  pub fn new(plan: DietPlan, notifier: N) -> Self {
    let session = CategorizationSession::for_plan(&plan, notifier);
    Self {
      step: Step::Basics,
      plan: History::new(plan),
      session,
    }
  }

  /// Bound both undo histories to `limit` steps.
  pub fn with_history_limit(self, limit: usize) -> Self {
    Self {
      step:    self.step,
      plan:    History::with_limit(self.plan.into_present(), limit),
      session: self.session.with_history_limit(limit),
    }
  }

  pub fn step(&self) -> Step { self.step }

  pub fn plan(&self) -> &DietPlan { self.plan.present() }

  pub fn plan_history(&self) -> &History<DietPlan> { &self.plan }

  pub fn session(&self) -> &CategorizationSession<N> { &self.session }

  pub fn session_mut(&mut self) -> &mut CategorizationSession<N> {
    &mut self.session
  }

  // ── Plan editing ──────────────────────────────────────────────────────

  fn ensure_plan_unlocked(&self) -> Result<()> {
    if self.step > Step::Meals {
      return Err(Error::PlanLocked { step: self.step });
    }
    Ok(())
  }

  /// Apply `edit` to a copy of the plan and record it as one undo step.
  /// Returns `false` when the edit left the plan unchanged.
  pub fn edit_plan(&mut self, edit: impl FnOnce(&mut DietPlan)) -> Result<bool> {
    self.ensure_plan_unlocked()?;
    let mut next = self.plan.present().clone();
    edit(&mut next);
    if next == *self.plan.present() {
      return Ok(false);
    }
    self.plan.push(next);
    Ok(true)
  }

  pub fn undo_plan(&mut self) -> Result<bool> {
    self.ensure_plan_unlocked()?;
    Ok(self.plan.undo())
  }

  pub fn redo_plan(&mut self) -> Result<bool> {
    self.ensure_plan_unlocked()?;
    Ok(self.plan.redo())
  }

  // ── Navigation ────────────────────────────────────────────────────────

  /// Why the current step cannot be left, if it cannot.
  pub fn blocker(&self) -> Option<String> {
    match self.step {
      Step::Basics if self.plan().name.trim().is_empty() => {
        Some("the plan needs a name".to_owned())
      }
      Step::Meals if self.plan().ingredient_count() == 0 => {
        Some("the plan has no ingredients".to_owned())
      }
      Step::Categorize if !self.session.can_proceed() => Some(format!(
        "{} product(s) still uncategorized",
        self.session.partition().uncategorized_count()
      )),
      _ => None,
    }
  }

  /// Move to the next step if the current one's gate passes. At the last
  /// step this is a no-op.
  pub fn next(&mut self) -> Result<Step> {
    if let Some(reason) = self.blocker() {
      return Err(Error::StepBlocked {
        step: self.step,
        reason,
      });
    }
    let Some(next) = self.step.next() else {
      return Ok(self.step);
    };

    if next == Step::Categorize {
      let list = self.plan().shopping_list();
      let reseeded = self.session.reseed(&list);
      debug!(reseeded, items = list.len(), "entering categorization");
    }
    self.step = next;
    Ok(next)
  }

  /// Move back one step. At the first step this is a no-op.
  pub fn back(&mut self) -> Step {
    if let Some(previous) = self.step.previous() {
      self.step = previous;
    }
    self.step
  }

  // ── Preview & save ────────────────────────────────────────────────────

  pub fn summary(&self) -> PlanSummary {
    let plan = self.plan();
    PlanSummary {
      days:        plan.days.len(),
      meals:       plan.days.iter().map(|d| d.meals.len()).sum(),
      ingredients: plan.ingredient_count(),
      categories:  self
        .session
        .partition()
        .categorized()
        .iter()
        .map(|(k, v)| (k.clone(), v.len()))
        .collect(),
    }
  }

  /// Persist the plan and its categorization. Only allowed on the preview
  /// step.
  pub async fn finish<S: PlanStore>(&self, store: &S) -> Result<Assignments> {
    if self.step != Step::Preview {
      return Err(Error::StepBlocked {
        step:   self.step,
        reason: "saving is only possible from the preview".to_owned(),
      });
    }
    if self.session.partition().source() != self.plan().shopping_list().as_slice() {
      return Err(Error::StepBlocked {
        step:   self.step,
        reason: "the categorization does not match the current plan".to_owned(),
      });
    }
    store
      .save_plan(self.plan())
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    self.session.save(store, self.plan().plan_id).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    plan::{DietDay, Ingredient, Meal},
    session::tests::{MemoryStore, RecordingNotifier},
  };

  fn wizard() -> Wizard<RecordingNotifier> {
    Wizard::new(DietPlan::new(""), RecordingNotifier::default())
  }

  fn add_breakfast(w: &mut Wizard<RecordingNotifier>) {
    w.edit_plan(|p| {
      p.days.push(
        DietDay::new("Dzień 1").with_meal(
          Meal::new("Śniadanie")
            .with_ingredient(Ingredient::new("mleko", 200.0, "ml"))
            .with_ingredient(Ingredient::new("płatki owsiane", 50.0, "g")),
        ),
      )
    })
    .unwrap();
  }

  fn categorize_all(w: &mut Wizard<RecordingNotifier>) {
    while let Some(p) = w.session().partition().uncategorized().first().cloned() {
      w.session_mut().assign("misc", &p);
    }
  }

  #[test]
  fn step_order() {
    assert_eq!(Step::Basics.next(), Some(Step::Meals));
    assert_eq!(Step::Preview.next(), None);
    assert_eq!(Step::Meals.previous(), Some(Step::Basics));
    assert_eq!(Step::Basics.previous(), None);
    assert_eq!(Step::Categorize.to_string(), "categorize");
  }

  #[test]
  fn gates_block_until_satisfied() {
    let mut w = wizard();
    assert!(matches!(
      w.next(),
      Err(Error::StepBlocked { step: Step::Basics, .. })
    ));

    w.edit_plan(|p| p.name = "Redukcja".into()).unwrap();
    assert_eq!(w.next().unwrap(), Step::Meals);
    assert!(w.next().is_err());

    add_breakfast(&mut w);
    assert_eq!(w.next().unwrap(), Step::Categorize);
    assert_eq!(w.session().partition().uncategorized_count(), 2);
    assert!(w.next().is_err());

    categorize_all(&mut w);
    assert_eq!(w.next().unwrap(), Step::Preview);
    assert_eq!(w.next().unwrap(), Step::Preview);
  }

  #[test]
  fn returning_with_unchanged_plan_keeps_categories() {
    let mut w = wizard();
    w.edit_plan(|p| p.name = "Masa".into()).unwrap();
    w.next().unwrap();
    add_breakfast(&mut w);
    w.next().unwrap();
    categorize_all(&mut w);

    w.back();
    assert_eq!(w.step(), Step::Meals);
    w.next().unwrap();
    assert!(w.session().can_proceed());
  }

  #[test]
  fn changed_plan_reseeds_categorization() {
    let mut w = wizard();
    w.edit_plan(|p| p.name = "Masa".into()).unwrap();
    w.next().unwrap();
    add_breakfast(&mut w);
    w.next().unwrap();
    categorize_all(&mut w);

    w.back();
    w.edit_plan(|p| p.days[0].meals[0].ingredients[0].quantity = 300.0).unwrap();
    w.next().unwrap();
    assert_eq!(w.session().partition().uncategorized_count(), 2);
  }

  #[test]
  fn plan_edits_are_undoable() {
    let mut w = wizard();
    assert!(w.edit_plan(|p| p.name = "A".into()).unwrap());
    assert!(w.edit_plan(|p| p.name = "B".into()).unwrap());
    assert!(!w.edit_plan(|p| p.name = "B".into()).unwrap());
    assert!(w.undo_plan().unwrap());
    assert_eq!(w.plan().name, "A");
    assert!(w.redo_plan().unwrap());
    assert_eq!(w.plan().name, "B");
  }

  #[test]
  fn history_limit_bounds_plan_undo() {
    let mut w = wizard().with_history_limit(1);
    w.edit_plan(|p| p.name = "A".into()).unwrap();
    w.edit_plan(|p| p.name = "B".into()).unwrap();
    assert!(w.undo_plan().unwrap());
    assert!(!w.undo_plan().unwrap());
    assert_eq!(w.plan().name, "A");
  }

  #[tokio::test]
  async fn plan_is_locked_after_categorization() {
    let mut w = wizard();
    let store = MemoryStore::default();
    w.edit_plan(|p| p.name = "Redukcja".into()).unwrap();
    w.next().unwrap();
    add_breakfast(&mut w);
    w.next().unwrap();

    let locked = |r: Result<bool>| matches!(r, Err(Error::PlanLocked { .. }));
    assert!(locked(w.edit_plan(|p| p.name = "Inna".into())));

    categorize_all(&mut w);
    w.next().unwrap();
    assert!(locked(w.undo_plan()));
    assert!(locked(w.redo_plan()));
    assert!(locked(w.edit_plan(|p| {
      p.days[0].meals[0]
        .ingredients
        .push(Ingredient::new("chleb", 1.0, "szt"))
    })));
    assert_eq!(w.plan().ingredient_count(), 2);

    let saved = w.finish(&store).await.unwrap();
    assert_eq!(saved["misc"].len(), 2);
  }

  #[tokio::test]
  async fn finish_refuses_a_stale_categorization() {
    let mut w = wizard();
    let store = MemoryStore::default();
    w.edit_plan(|p| p.name = "Redukcja".into()).unwrap();
    w.next().unwrap();
    add_breakfast(&mut w);
    w.next().unwrap();
    categorize_all(&mut w);
    w.next().unwrap();

    let mut changed = w.plan().clone();
    changed.days[0].meals[0]
      .ingredients
      .push(Ingredient::new("chleb", 1.0, "szt"));
    w.plan.push(changed);

    assert!(matches!(
      w.finish(&store).await,
      Err(Error::StepBlocked { step: Step::Preview, .. })
    ));
    assert!(store.get_plan(w.plan().plan_id).await.unwrap().is_none());
  }

  #[test]
  fn back_at_first_step_is_noop() {
    let mut w = wizard();
    assert_eq!(w.back(), Step::Basics);
  }

  #[tokio::test]
  async fn finish_saves_plan_and_assignments() {
    let mut w = wizard();
    let store = MemoryStore::default();
    w.edit_plan(|p| p.name = "Redukcja".into()).unwrap();
    w.next().unwrap();
    add_breakfast(&mut w);
    w.next().unwrap();
    assert!(w.finish(&store).await.is_err());
    categorize_all(&mut w);
    w.next().unwrap();

    let summary = w.summary();
    assert_eq!(summary.ingredients, 2);
    assert_eq!(summary.categories["misc"], 2);

    let saved = w.finish(&store).await.unwrap();
    assert_eq!(saved["misc"].len(), 2);
    let plan = store.get_plan(w.plan().plan_id).await.unwrap();
    assert_eq!(plan.map(|p| p.name).as_deref(), Some("Redukcja"));
  }
}
