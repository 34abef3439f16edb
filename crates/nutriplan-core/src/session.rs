//! A categorization session: the partition plus undo/redo and the side
//! effects that surround it.
//!
//! Every partition operation that changes something becomes one undo step.
//! Operations that are refused (unknown product, identity collision) leave
//! both the partition and the history untouched.

use tracing::warn;
use uuid::Uuid;

use crate::{
  Error, Result,
  catalog::CategorySuggester,
  history::History,
  lineitem::parse_line,
  notify::{NoticeLevel, Notifier, TracingNotifier},
  partition::Partition,
  plan::DietPlan,
  product::{ParsedProduct, RawLineItem},
  store::{Assignments, PlanStore, ProductCorrection},
};

pub struct CategorizationSession<N = TracingNotifier> {
  history:  History<Partition>,
  notifier: N,
}

impl<N: Notifier> CategorizationSession<N> {
  /// Start a session over `raw` with unbounded undo history.
  pub fn new(raw: &[RawLineItem], notifier: N) -> Self {
    Self {
      history: History::new(Partition::seed(raw)),
      notifier,
    }
  }

  /// Start a session over the shopping list of `plan`.
  pub fn for_plan(plan: &DietPlan, notifier: N) -> Self {
    Self::new(&plan.shopping_list(), notifier)
  }

  /// Keep at most `limit` undo steps.
  pub fn with_history_limit(self, limit: usize) -> Self {
    Self {
      history: History::with_limit(self.history.into_present(), limit),
      notifier: self.notifier,
    }
  }

  pub fn partition(&self) -> &Partition { self.history.present() }

  pub fn history(&self) -> &History<Partition> { &self.history }

  pub fn notifier(&self) -> &N { &self.notifier }

  /// Reseed from a new raw list. An equal list keeps the current state and
  /// history; a different list starts over with an empty history.
  pub fn reseed(&mut self, raw: &[RawLineItem]) -> bool {
    let mut next = self.history.present().clone();
    if !next.reseed(raw) {
      return false;
    }
    self.history.reset(next);
    true
  }

  // ── Partition operations ──────────────────────────────────────────────

  pub fn assign(&mut self, category: &str, product: &ParsedProduct) -> bool {
    self.apply(|p| p.assign(category.to_owned(), product))
  }

  pub fn unassign(&mut self, product: &ParsedProduct) -> bool {
    self.apply(|p| p.unassign(product))
  }

  pub fn edit(
    &mut self,
    category: Option<&str>,
    old: &ParsedProduct,
    new: ParsedProduct,
  ) -> bool {
    let category = category.map(str::to_owned);
    self.apply(|p| p.edit(category.as_ref(), old, new))
  }

  /// Edit by re-parsing free text. The product keeps its identity; its
  /// `original` becomes `text`.
  pub fn edit_text(
    &mut self,
    category: Option<&str>,
    old: &ParsedProduct,
    text: &str,
  ) -> bool {
    self.edit(category, old, parse_line(text))
  }

  /// Apply an edit locally, then record it as a [`ProductCorrection`].
  ///
  /// The local edit stands whether or not the store accepts the correction;
  /// a failed write is reported through the notifier. Returns whether the
  /// local edit was applied.
  pub async fn edit_and_persist<S: PlanStore>(
    &mut self,
    store: &S,
    category: Option<&str>,
    old: &ParsedProduct,
    new: ParsedProduct,
  ) -> bool {
    let mut stamped = new.clone();
    stamped.category_id = category.map(str::to_owned);
    let correction = ProductCorrection::from_edit(&old.original, &stamped);

    if !self.edit(category, old, new) {
      return false;
    }

    if let Err(e) = store.record_correction(&correction).await {
      warn!(
        error = %e,
        original = %correction.original,
        "failed to record product correction"
      );
      self.notifier.notify(
        NoticeLevel::Error,
        &format!("Nie udało się zapisać poprawki produktu: {e}"),
      );
    }
    true
  }

  /// Ask `suggester` for a category. Nothing is applied.
  pub fn suggest<S>(&self, suggester: &S, product: &ParsedProduct) -> Option<String>
  where
    S: CategorySuggester<String>,
  {
    suggester.suggest(product)
  }

  // ── History ───────────────────────────────────────────────────────────

  pub fn undo(&mut self) -> bool { self.history.undo() }

  pub fn redo(&mut self) -> bool { self.history.redo() }

  // ── Completion ────────────────────────────────────────────────────────

  /// `true` when every product has a category and the workflow may move on.
  pub fn can_proceed(&self) -> bool { self.partition().is_complete() }

  pub fn ensure_complete(&self) -> Result<()> {
    match self.partition().uncategorized_count() {
      0 => Ok(()),
      remaining => Err(Error::Incomplete { remaining }),
    }
  }

  /// Persist the categorization for `plan_id`. Refused while products are
  /// still uncategorized.
  pub async fn save<S: PlanStore>(
    &self,
    store: &S,
    plan_id: Uuid,
  ) -> Result<Assignments> {
    self.ensure_complete()?;
    let assignments = self.partition().clone().into_assignments();

    if let Err(e) = store.save_assignments(plan_id, &assignments).await {
      self.notifier.notify(
        NoticeLevel::Error,
        &format!("Nie udało się zapisać kategorii: {e}"),
      );
      return Err(Error::Store(Box::new(e)));
    }

    self
      .notifier
      .notify(NoticeLevel::Success, "Kategorie produktów zapisane");
    Ok(assignments)
  }

  /// Run `op` on a copy of the present partition and record the result as
  /// a new step if it reports a change.
  fn apply(&mut self, op: impl FnOnce(&mut Partition) -> bool) -> bool {
    let mut next = self.history.present().clone();
    if !op(&mut next) {
      return false;
    }
    self.history.push(next);
    true
  }
}
