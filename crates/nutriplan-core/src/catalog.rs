//! Shopping categories and keyword-based category suggestions.
//!
//! The catalog describes the categories a user can drop products into. The
//! partition never checks its keys against it; suggestions are advisory and
//! only take effect through an explicit assign.

use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use serde::{Deserialize, Serialize};

use crate::product::ParsedProduct;

/// A category entry with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: String,
  pub name:        String,
  #[serde(default)]
  pub color:       Option<String>,
  #[serde(default)]
  pub icon:        Option<String>,
  /// Product-name fragments that hint at this category.
  #[serde(default)]
  pub keywords:    Vec<String>,
}

impl Category {
  pub fn new(category_id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      category_id: category_id.into(),
      name:        name.into(),
      color:       None,
      icon:        None,
      keywords:    Vec::new(),
    }
  }

  pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.keywords.extend(keywords.into_iter().map(Into::into));
    self
  }
}

/// Proposes a category for a product.
pub trait CategorySuggester<K> {
  fn suggest(&self, product: &ParsedProduct<K>) -> Option<K>;
}

/// Default minimum fuzzy score for a suggestion to count.
pub const DEFAULT_MIN_SCORE: i64 = 40;

/// Scores product names against each category's keywords (and its display
/// name) with a skim-style fuzzy matcher.
pub struct KeywordSuggester {
  entries:   Vec<(String, Vec<String>)>,
  matcher:   SkimMatcherV2,
  min_score: i64,
}

impl KeywordSuggester {
  pub fn new(categories: &[Category]) -> Self {
    let entries = categories
      .iter()
      .map(|c| {
        let mut words: Vec<String> =
          c.keywords.iter().map(|k| k.to_lowercase()).collect();
        words.push(c.name.to_lowercase());
        (c.category_id.clone(), words)
      })
      .collect();
    Self {
      entries,
      matcher: SkimMatcherV2::default(),
      min_score: DEFAULT_MIN_SCORE,
    }
  }

  pub fn with_min_score(mut self, min_score: i64) -> Self {
    self.min_score = min_score;
    self
  }

  /// Every category that scores at or above the threshold, best first.
  /// Ties keep catalog order.
  pub fn rank<K>(&self, product: &ParsedProduct<K>) -> Vec<(String, i64)> {
    let name = product.name.to_lowercase();
    let mut ranked: Vec<(String, i64)> = self
      .entries
      .iter()
      .filter_map(|(category_id, words)| {
        words
          .iter()
          .filter(|w| !w.is_empty())
          .filter_map(|w| self.matcher.fuzzy_match(&name, w))
          .max()
          .filter(|score| *score >= self.min_score)
          .map(|score| (category_id.clone(), score))
      })
      .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
  }
}

impl CategorySuggester<String> for KeywordSuggester {
  fn suggest(&self, product: &ParsedProduct<String>) -> Option<String> {
    self.rank(product).into_iter().next().map(|(id, _)| id)
  }
}
