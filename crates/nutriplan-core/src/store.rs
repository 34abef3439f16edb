//! The `PlanStore` trait and the records it persists.
//!
//! The trait is implemented by storage backends (e.g.
//! `nutriplan-store-sqlite`). The session and the CLI depend on this
//! abstraction, never on a concrete backend.

use std::{collections::BTreeMap, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{catalog::Category, plan::DietPlan, product::ParsedProduct};

/// Categorized products keyed by category id, as saved for a plan.
pub type Assignments = BTreeMap<String, Vec<ParsedProduct>>;

/// A user correction to a parsed product, recorded when a line is edited and
/// keyed by the text the product was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCorrection {
  /// The verbatim text the product was parsed from.
  pub original:    String,
  pub name:        String,
  pub quantity:    f64,
  pub unit:        String,
  pub category_id: Option<String>,
  pub recorded_at: DateTime<Utc>,
}

impl ProductCorrection {
  /// Describe the edit of a product whose source text was `original`.
  pub fn from_edit(original: &str, edited: &ParsedProduct) -> Self {
    Self {
      original:    original.to_owned(),
      name:        edited.name.clone(),
      quantity:    edited.quantity,
      unit:        edited.unit.clone(),
      category_id: edited.category_id.clone(),
      recorded_at: Utc::now(),
    }
  }
}

/// Abstraction over a persistence backend for plans, categorizations and
/// the category catalog.
///
/// All methods return `Send` futures so callers can run on a multi-threaded
/// runtime.
pub trait PlanStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Plans ─────────────────────────────────────────────────────────────

  /// Insert or replace a plan.
  fn save_plan<'a>(
    &'a self,
    plan: &'a DietPlan,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Retrieve a plan by id. Returns `None` if not found.
  fn get_plan(
    &self,
    plan_id: Uuid,
  ) -> impl Future<Output = Result<Option<DietPlan>, Self::Error>> + Send + '_;

  /// All plans, newest first.
  fn list_plans(
    &self,
  ) -> impl Future<Output = Result<Vec<DietPlan>, Self::Error>> + Send + '_;

  // ── Categorization ────────────────────────────────────────────────────

  /// Replace the saved categorization for `plan_id` with `assignments`.
  fn save_assignments<'a>(
    &'a self,
    plan_id: Uuid,
    assignments: &'a Assignments,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The saved categorization for `plan_id`; empty when none was saved.
  fn get_assignments(
    &self,
    plan_id: Uuid,
  ) -> impl Future<Output = Result<Assignments, Self::Error>> + Send + '_;

  /// Append a product correction.
  fn record_correction<'a>(
    &'a self,
    correction: &'a ProductCorrection,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Corrections recorded for a given source text, oldest first.
  fn list_corrections<'a>(
    &'a self,
    original: &'a str,
  ) -> impl Future<Output = Result<Vec<ProductCorrection>, Self::Error>> + Send + 'a;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// All categories, ordered by name.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  /// Insert or replace a category by id.
  fn upsert_category<'a>(
    &'a self,
    category: &'a Category,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
