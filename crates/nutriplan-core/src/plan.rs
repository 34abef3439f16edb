//! The diet plan document, the aggregate a dietitian edits.
//!
//! A plan is a list of days, each a list of meals, each a list of
//! ingredients. The shopping list used for categorization is derived from it
//! on demand and never stored on the plan itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::product::{RawLineItem, StructuredItem, format_quantity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
  pub name:     String,
  pub quantity: f64,
  pub unit:     String,
}

impl Ingredient {
  pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      quantity,
      unit: unit.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meal {
  pub name:        String,
  pub ingredients: Vec<Ingredient>,
}

impl Meal {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      ingredients: Vec::new(),
    }
  }

  pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
    self.ingredients.push(ingredient);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DietDay {
  /// Display label, e.g. "Poniedziałek" or "Dzień 1".
  pub label: String,
  pub meals: Vec<Meal>,
}

impl DietDay {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      meals: Vec::new(),
    }
  }

  pub fn with_meal(mut self, meal: Meal) -> Self {
    self.meals.push(meal);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
  pub plan_id:    Uuid,
  pub name:       String,
  /// The client the plan is prepared for, if any. Templates have none.
  pub client:     Option<String>,
  pub created_at: DateTime<Utc>,
  pub days:       Vec<DietDay>,
}

impl DietPlan {
  /// An empty plan with a fresh id.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      plan_id:    Uuid::new_v4(),
      name:       name.into(),
      client:     None,
      created_at: Utc::now(),
      days:       Vec::new(),
    }
  }

  /// A new plan for `client` with this plan's days, used to start from a
  /// template. The copy gets its own id and creation time.
  pub fn instantiate(&self, name: impl Into<String>, client: Option<String>) -> Self {
    Self {
      client,
      days: self.days.clone(),
      ..Self::new(name)
    }
  }

  pub fn with_day(mut self, day: DietDay) -> Self {
    self.days.push(day);
    self
  }

  pub fn ingredients(&self) -> impl Iterator<Item = &Ingredient> {
    self
      .days
      .iter()
      .flat_map(|d| &d.meals)
      .flat_map(|m| &m.ingredients)
  }

  pub fn ingredient_count(&self) -> usize { self.ingredients().count() }

  /// Aggregate all ingredients into shopping-list lines.
  ///
  /// Ingredients with the same name (case-insensitive) and unit are summed.
  /// Lines keep the order in which each ingredient first appears. Each line
  /// is structured, with `original` holding the rendered text.
  pub fn shopping_list(&self) -> Vec<RawLineItem> {
    let mut totals: Vec<(String, String, f64)> = Vec::new();

    for ingredient in self.ingredients() {
      let name = ingredient.name.trim();
      let unit = ingredient.unit.trim();
      if name.is_empty() {
        continue;
      }
      let existing = totals.iter_mut().find(|(n, u, _)| {
        n.to_lowercase() == name.to_lowercase() && u.eq_ignore_ascii_case(unit)
      });
      match existing {
        Some((_, _, quantity)) => *quantity += ingredient.quantity,
        None => totals.push((name.to_owned(), unit.to_owned(), ingredient.quantity)),
      }
    }

    totals
      .into_iter()
      .map(|(name, unit, quantity)| {
        let original = format!("{name} {}{unit}", format_quantity(quantity));
        RawLineItem::Structured(StructuredItem {
          name:     Some(name),
          quantity: Some(quantity),
          unit:     (!unit.is_empty()).then_some(unit),
          original: Some(original),
          id:       None,
        })
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{lineitem::parse_item, product::ParsedProduct};

  fn sample() -> DietPlan {
    DietPlan::new("Redukcja")
      .with_day(
        DietDay::new("Dzień 1")
          .with_meal(
            Meal::new("Śniadanie")
              .with_ingredient(Ingredient::new("Mleko", 200.0, "ml"))
              .with_ingredient(Ingredient::new("płatki owsiane", 50.0, "g")),
          )
          .with_meal(Meal::new("Obiad").with_ingredient(Ingredient::new("ryż", 100.0, "g"))),
      )
      .with_day(
        DietDay::new("Dzień 2").with_meal(
          Meal::new("Śniadanie")
            .with_ingredient(Ingredient::new("mleko", 250.0, "ml"))
            .with_ingredient(Ingredient::new("jajko", 2.0, "szt")),
        ),
      )
  }

  #[test]
  fn shopping_list_sums_same_ingredient() {
    let list = sample().shopping_list();
    assert_eq!(list.len(), 4);
    let first: ParsedProduct = parse_item(&list[0]);
    assert_eq!(first.name, "Mleko");
    assert_eq!(first.quantity, 450.0);
    assert_eq!(first.unit, "ml");
    assert_eq!(first.original, "Mleko 450ml");
  }

  #[test]
  fn shopping_list_keeps_first_seen_order() {
    let names: Vec<String> = sample()
      .shopping_list()
      .iter()
      .map(|raw| parse_item::<String>(raw).name)
      .collect();
    assert_eq!(names, ["Mleko", "płatki owsiane", "ryż", "jajko"]);
  }

  #[test]
  fn different_units_are_separate_lines() {
    let plan = DietPlan::new("x").with_day(
      DietDay::new("d").with_meal(
        Meal::new("m")
          .with_ingredient(Ingredient::new("ser", 2.0, "plaster"))
          .with_ingredient(Ingredient::new("ser", 100.0, "g")),
      ),
    );
    assert_eq!(plan.shopping_list().len(), 2);
  }

  #[test]
  fn shopping_list_is_deterministic() {
    let plan = sample();
    assert_eq!(plan.shopping_list(), plan.shopping_list());
  }

  #[test]
  fn instantiate_copies_days_with_new_identity() {
    let template = sample();
    let copy = template.instantiate("Kowalski, tydzień 1", Some("Jan Kowalski".into()));
    assert_ne!(copy.plan_id, template.plan_id);
    assert_eq!(copy.days, template.days);
    assert_eq!(copy.client.as_deref(), Some("Jan Kowalski"));
  }

  #[test]
  fn ingredient_count_spans_all_days() {
    assert_eq!(sample().ingredient_count(), 5);
  }
}
