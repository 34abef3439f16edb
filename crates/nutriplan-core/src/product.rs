//! Shopping-list line items, raw and parsed.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Raw input ───────────────────────────────────────────────────────────────

/// A shopping-list entry as it arrives from a plan or from user input.
///
/// Serialised untagged, so a JSON list may freely mix `"mleko 200ml"` strings
/// and `{"name": "mleko", "quantity": 200, "unit": "ml"}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLineItem {
  Text(String),
  Structured(StructuredItem),
}

/// A pre-structured entry. Every field is optional; missing ones are filled
/// in by [`crate::lineitem::parse_item`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredItem {
  pub name:     Option<String>,
  pub quantity: Option<f64>,
  pub unit:     Option<String>,
  pub original: Option<String>,
  pub id:       Option<String>,
}

impl From<&str> for RawLineItem {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for RawLineItem {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<StructuredItem> for RawLineItem {
  fn from(s: StructuredItem) -> Self { Self::Structured(s) }
}

// ─── Parsed product ──────────────────────────────────────────────────────────

/// A shopping-list line decomposed into quantity, unit and name.
///
/// `K` is the category key type. The partition treats it as opaque; the rest
/// of the workspace uses `String`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedProduct<K = String> {
  pub name:        String,
  pub quantity:    f64,
  pub unit:        String,
  /// Verbatim source text; part of the identity chain and used for redisplay.
  pub original:    String,
  /// Set while the product sits in a bucket, `None` while uncategorized.
  pub category_id: Option<K>,
  /// External or synthetic identifier; first link of the identity chain.
  pub id:          Option<String>,
}

impl<K> ParsedProduct<K> {
  /// The same product with its category replaced.
  pub fn with_category(self, category_id: Option<K>) -> Self {
    Self {
      category_id,
      ..self
    }
  }
}

impl<K> fmt::Display for ParsedProduct<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} {}",
      self.name,
      format_quantity(self.quantity),
      self.unit
    )
  }
}

/// Render a quantity for display: at most three decimals, no trailing zeros.
pub fn format_quantity(quantity: f64) -> String {
  let rounded = (quantity * 1000.0).round() / 1000.0;
  format!("{rounded}")
}
