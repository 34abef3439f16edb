//! Item identity resolution.
//!
//! A product is matched across partition operations by a single key chosen
//! from an ordered fallback chain:
//!
//! 1. the external `id`, when present and non-empty;
//! 2. the verbatim `original` text, when non-empty;
//! 3. a composite of `name`, `quantity` and `unit`.
//!
//! The first rule that applies wins; later rules are never consulted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::product::ParsedProduct;

/// The resolved identity of a product, tagged with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum ItemIdentity {
  Id(String),
  Original(String),
  Composite(String),
}

impl ItemIdentity {
  /// The raw key, without the rule tag.
  pub fn key(&self) -> &str {
    match self {
      Self::Id(k) | Self::Original(k) | Self::Composite(k) => k,
    }
  }
}

impl fmt::Display for ItemIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Id(k) => write!(f, "id:{k}"),
      Self::Original(k) => write!(f, "original:{k}"),
      Self::Composite(k) => write!(f, "composite:{k}"),
    }
  }
}

/// Resolve the identity of `product`.
pub fn identity_of<K>(product: &ParsedProduct<K>) -> ItemIdentity {
  if let Some(id) = product.id.as_deref().filter(|s| !s.is_empty()) {
    return ItemIdentity::Id(id.to_owned());
  }
  if !product.original.is_empty() {
    return ItemIdentity::Original(product.original.clone());
  }
  ItemIdentity::Composite(format!(
    "{}|{}|{}",
    product.name, product.quantity, product.unit
  ))
}

/// `true` when `a` and `b` resolve to the same identity.
pub fn same_item<K>(a: &ParsedProduct<K>, b: &ParsedProduct<K>) -> bool {
  identity_of(a) == identity_of(b)
}
