//! The categorization partition.
//!
//! Splits the parsed shopping list into an `uncategorized` pool and one
//! bucket per category key. Every product lives in exactly one of those
//! places at all times; every operation below preserves that.
//!
//! Products are matched by [`identity_of`], never by position or by full
//! equality, so a product handed back by the view layer still matches after
//! its category has been stamped or its display fields edited.

use std::{
  collections::{BTreeMap, HashSet},
  fmt,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  identity::{ItemIdentity, identity_of},
  lineitem::parse_item,
  product::{ParsedProduct, RawLineItem},
};

/// Where a product currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location<K> {
  Uncategorized(usize),
  Bucket(K, usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
  serialize = "K: Serialize",
  deserialize = "K: Deserialize<'de> + Ord"
))]
pub struct Partition<K = String> {
  /// The raw list this partition was seeded from.
  source:        Vec<RawLineItem>,
  /// Products not yet assigned, in shopping-list order.
  uncategorized: Vec<ParsedProduct<K>>,
  /// Non-empty buckets only; a key disappears with its last product.
  categorized:   BTreeMap<K, Vec<ParsedProduct<K>>>,
}

impl<K> Default for Partition<K> {
  fn default() -> Self {
    Self {
      source:        Vec::new(),
      uncategorized: Vec::new(),
      categorized:   BTreeMap::new(),
    }
  }
}

impl<K: Ord + Clone + fmt::Debug> Partition<K> {
  // ── Seeding ───────────────────────────────────────────────────────────

  /// Parse every raw item and place it in the uncategorized pool.
  ///
  /// Items without an `id` receive a synthetic one so that duplicate lines
  /// (two identical `"mleko"` entries) remain distinct products. An external
  /// `id` already taken by an earlier item is replaced the same way.
  pub fn seed(raw: &[RawLineItem]) -> Self {
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let uncategorized = raw
      .iter()
      .map(|item| {
        let mut product: ParsedProduct<K> = parse_item(item);
        let id = match product.id.take().filter(|id| !id.is_empty()) {
          Some(id) if !used.contains(&id) => id,
          Some(id) => {
            warn!(%id, name = %product.name, "duplicate item id; assigning a fresh one");
            Uuid::new_v4().to_string()
          }
          None => Uuid::new_v4().to_string(),
        };
        used.insert(id.clone());
        product.id = Some(id);
        product
      })
      .collect::<Vec<_>>();

    debug!(items = uncategorized.len(), "seeded partition");
    Self {
      source: raw.to_vec(),
      uncategorized,
      categorized: BTreeMap::new(),
    }
  }

  /// Replace the partition with a fresh seed of `raw`, discarding all
  /// buckets. Reseeding with a list equal to the current source changes
  /// nothing. Returns `true` when the partition was replaced.
  pub fn reseed(&mut self, raw: &[RawLineItem]) -> bool {
    if self.source == raw {
      return false;
    }
    *self = Self::seed(raw);
    true
  }

  // ── Lookups ───────────────────────────────────────────────────────────

  pub fn source(&self) -> &[RawLineItem] { &self.source }

  pub fn uncategorized(&self) -> &[ParsedProduct<K>] { &self.uncategorized }

  pub fn categorized(&self) -> &BTreeMap<K, Vec<ParsedProduct<K>>> {
    &self.categorized
  }

  /// Products in bucket `category`; empty when the bucket does not exist.
  pub fn bucket(&self, category: &K) -> &[ParsedProduct<K>] {
    self.categorized.get(category).map_or(&[], Vec::as_slice)
  }

  /// Number of products still waiting for a category.
  pub fn uncategorized_count(&self) -> usize { self.uncategorized.len() }

  /// `true` once every product has a category.
  pub fn is_complete(&self) -> bool { self.uncategorized.is_empty() }

  /// Total number of products across the pool and all buckets.
  pub fn len(&self) -> usize {
    self.uncategorized.len()
      + self.categorized.values().map(Vec::len).sum::<usize>()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// All products: the uncategorized pool first, then buckets in key order.
  pub fn products(&self) -> impl Iterator<Item = &ParsedProduct<K>> {
    self
      .uncategorized
      .iter()
      .chain(self.categorized.values().flatten())
  }

  /// Find the product whose identity is `identity`.
  pub fn find(&self, identity: &ItemIdentity) -> Option<&ParsedProduct<K>> {
    self.products().find(|p| identity_of(p) == *identity)
  }

  /// Locate `product` by identity, looking in the bucket named by its own
  /// `category_id` first and then everywhere else.
  pub fn locate(&self, product: &ParsedProduct<K>) -> Option<Location<K>> {
    let identity = identity_of(product);

    if let Some(category) = &product.category_id
      && let Some(index) = self.index_in_bucket(category, &identity)
    {
      return Some(Location::Bucket(category.clone(), index));
    }
    if let Some(index) = position_of(&self.uncategorized, &identity) {
      return Some(Location::Uncategorized(index));
    }
    self.categorized.iter().find_map(|(category, items)| {
      position_of(items, &identity)
        .map(|index| Location::Bucket(category.clone(), index))
    })
  }

  fn index_in_bucket(
    &self,
    category: &K,
    identity: &ItemIdentity,
  ) -> Option<usize> {
    self
      .categorized
      .get(category)
      .and_then(|items| position_of(items, identity))
  }

  /// Remove the product at `location`, dropping the bucket if it empties.
  fn take(&mut self, location: Location<K>) -> Option<ParsedProduct<K>> {
    match location {
      Location::Uncategorized(index) => {
        (index < self.uncategorized.len())
          .then(|| self.uncategorized.remove(index))
      }
      Location::Bucket(category, index) => {
        let items = self.categorized.get_mut(&category)?;
        if index >= items.len() {
          return None;
        }
        let product = items.remove(index);
        if items.is_empty() {
          self.categorized.remove(&category);
        }
        Some(product)
      }
    }
  }

  // ── Operations ────────────────────────────────────────────────────────

  /// Move `product` into bucket `category`, appending it at the end.
  ///
  /// The product is taken from wherever it currently lives, so assigning an
  /// already-categorized product moves it between buckets. Returns `false`
  /// when no product with that identity exists.
  pub fn assign(&mut self, category: K, product: &ParsedProduct<K>) -> bool {
    let Some(location) = self.locate(product) else {
      warn!(
        identity = %identity_of(product),
        ?category,
        "assign: product not found in partition"
      );
      return false;
    };

    let Some(taken) = self.take(location) else {
      return false;
    };
    let moved = taken.with_category(Some(category.clone()));
    debug!(identity = %identity_of(&moved), ?category, "assigned product");
    self.categorized.entry(category).or_default().push(moved);
    true
  }

  /// Return `product` to the end of the uncategorized pool. Returns `false`
  /// when it is not in any bucket.
  pub fn unassign(&mut self, product: &ParsedProduct<K>) -> bool {
    match self.locate(product) {
      Some(location @ Location::Bucket(..)) => {
        let Some(taken) = self.take(location) else {
          return false;
        };
        let moved = taken.with_category(None);
        debug!(identity = %identity_of(&moved), "unassigned product");
        self.uncategorized.push(moved);
        true
      }
      Some(Location::Uncategorized(_)) => {
        debug!(identity = %identity_of(product), "unassign: already uncategorized");
        false
      }
      None => {
        warn!(
          identity = %identity_of(product),
          "unassign: product not found in partition"
        );
        false
      }
    }
  }

  /// Replace `old` with `new` at the same position inside the collection
  /// named by `category` (`None` for the uncategorized pool).
  ///
  /// `new` inherits `old`'s `id` when it has none, and its `category_id` is
  /// set to match the collection. The edit is refused (returning `false`)
  /// when `old` is not in that collection, or when `new` would take the
  /// identity of a different product.
  pub fn edit(
    &mut self,
    category: Option<&K>,
    old: &ParsedProduct<K>,
    mut new: ParsedProduct<K>,
  ) -> bool {
    let old_identity = identity_of(old);

    let index = match category {
      Some(category) => self.index_in_bucket(category, &old_identity),
      None => position_of(&self.uncategorized, &old_identity),
    };
    let Some(index) = index else {
      warn!(
        identity = %old_identity,
        ?category,
        "edit: product not found in the given collection"
      );
      return false;
    };

    if new.id.as_deref().is_none_or(str::is_empty) {
      new.id.clone_from(&old.id);
    }
    new.category_id = category.cloned();

    let new_identity = identity_of(&new);
    if new_identity != old_identity && self.find(&new_identity).is_some() {
      warn!(
        old = %old_identity,
        new = %new_identity,
        "edit: replacement collides with another product"
      );
      return false;
    }

    let slot = match category {
      Some(category) => self
        .categorized
        .get_mut(category)
        .and_then(|items| items.get_mut(index)),
      None => self.uncategorized.get_mut(index),
    };
    let Some(slot) = slot else {
      return false;
    };
    debug!(old = %old_identity, new = %new_identity, "edited product");
    *slot = new;
    true
  }

  // ── Export ────────────────────────────────────────────────────────────

  /// Consume the partition, yielding only the categorized buckets.
  pub fn into_assignments(self) -> BTreeMap<K, Vec<ParsedProduct<K>>> {
    self.categorized
  }
}

fn position_of<K>(
  items: &[ParsedProduct<K>],
  identity: &ItemIdentity,
) -> Option<usize> {
  items.iter().position(|p| identity_of(p) == *identity)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(items: &[&str]) -> Vec<RawLineItem> {
    items.iter().map(|s| RawLineItem::from(*s)).collect()
  }

  fn seeded() -> Partition {
    Partition::seed(&raw(&["mleko 200ml", "jabłko", "chleb 1 szt"]))
  }

  fn nth(p: &Partition, n: usize) -> ParsedProduct { p.uncategorized()[n].clone() }

  #[test]
  fn seed_puts_everything_in_the_pool_with_ids() {
    let p = seeded();
    assert_eq!(p.uncategorized_count(), 3);
    assert!(p.categorized().is_empty());
    assert!(p.uncategorized().iter().all(|p| p.id.is_some()));
    assert_eq!(p.uncategorized()[0].name, "mleko");
  }

  #[test]
  fn seed_keeps_external_ids() {
    let items = vec![RawLineItem::Structured(crate::product::StructuredItem {
      name: Some("kefir".into()),
      id: Some("cat-17".into()),
      ..Default::default()
    })];
    let p: Partition = Partition::seed(&items);
    assert_eq!(p.uncategorized()[0].id.as_deref(), Some("cat-17"));
  }

  #[test]
  fn duplicate_external_ids_get_fresh_ones() {
    let item = |name: &str| {
      RawLineItem::Structured(crate::product::StructuredItem {
        name: Some(name.into()),
        id: Some("p-1".into()),
        ..Default::default()
      })
    };
    let mut p: Partition = Partition::seed(&[item("mleko"), item("kefir")]);
    assert_eq!(p.uncategorized()[0].id.as_deref(), Some("p-1"));
    assert_ne!(p.uncategorized()[1].id, p.uncategorized()[0].id);

    let kefir = nth(&p, 1);
    assert!(p.assign("dairy".into(), &kefir));
    assert_eq!(p.bucket(&"dairy".into())[0].name, "kefir");
    assert_eq!(p.uncategorized()[0].name, "mleko");
  }

  #[test]
  fn duplicate_lines_stay_distinct() {
    let mut p: Partition = Partition::seed(&raw(&["mleko", "mleko"]));
    let first = nth(&p, 0);
    assert!(p.assign("dairy".into(), &first));
    assert_eq!(p.uncategorized_count(), 1);
    assert_eq!(p.bucket(&"dairy".into()).len(), 1);
  }

  #[test]
  fn end_to_end_scenario() {
    let source = raw(&["mleko 200ml", "jabłko", "chleb 1 szt"]);
    let mut p: Partition = Partition::seed(&source);
    let milk = nth(&p, 0);

    assert!(p.assign("dairy".into(), &milk));
    assert_eq!(p.uncategorized_count(), 2);
    assert_eq!(p.bucket(&"dairy".into()).len(), 1);
    assert_eq!(
      p.bucket(&"dairy".into())[0].category_id.as_deref(),
      Some("dairy")
    );

    let stamped = p.bucket(&"dairy".into())[0].clone();
    assert!(p.unassign(&stamped));
    assert_eq!(p.uncategorized_count(), 3);
    assert!(p.categorized().is_empty());
    assert!(p.uncategorized()[2].category_id.is_none());

    let before = p.clone();
    assert!(!p.reseed(&source));
    assert_eq!(p, before);
  }

  #[test]
  fn reseed_with_different_list_drops_buckets() {
    let mut p = seeded();
    let milk = nth(&p, 0);
    p.assign("dairy".into(), &milk);
    assert!(p.reseed(&raw(&["ryż 1kg"])));
    assert_eq!(p.len(), 1);
    assert!(p.categorized().is_empty());
  }

  #[test]
  fn assign_moves_between_buckets() {
    let mut p = seeded();
    let bread = nth(&p, 2);
    p.assign("dairy".into(), &bread);
    p.assign("bakery".into(), &bread);
    assert!(!p.categorized().contains_key("dairy"));
    assert_eq!(p.bucket(&"bakery".into()).len(), 1);
    assert_eq!(p.len(), 3);
  }

  #[test]
  fn assign_appends_to_bucket_end() {
    let mut p = seeded();
    let (a, b) = (nth(&p, 0), nth(&p, 1));
    p.assign("x".into(), &b);
    p.assign("x".into(), &a);
    let names: Vec<_> = p.bucket(&"x".into()).iter().map(|p| &p.name).collect();
    assert_eq!(names, ["jabłko", "mleko"]);
  }

  #[test]
  fn assign_unknown_product_is_noop() {
    let mut p = seeded();
    let before = p.clone();
    let stranger: ParsedProduct = crate::lineitem::parse_line("kawa 250g");
    assert!(!p.assign("drinks".into(), &stranger));
    assert_eq!(p, before);
  }

  #[test]
  fn unassign_last_item_removes_bucket_key() {
    let mut p = seeded();
    let (a, b) = (nth(&p, 0), nth(&p, 1));
    p.assign("x".into(), &a);
    p.assign("x".into(), &b);
    p.unassign(&a);
    assert!(p.categorized().contains_key("x"));
    p.unassign(&b);
    assert!(!p.categorized().contains_key("x"));
  }

  #[test]
  fn unassign_with_stale_category_still_finds_product() {
    let mut p = seeded();
    let a = nth(&p, 0);
    p.assign("x".into(), &a);
    p.assign("y".into(), &a);
    let stale = a.with_category(Some("x".to_string()));
    assert!(p.unassign(&stale));
    assert_eq!(p.uncategorized_count(), 3);
  }

  #[test]
  fn unassign_uncategorized_is_noop() {
    let mut p = seeded();
    let before = p.clone();
    assert!(!p.unassign(&nth(&p, 1)));
    assert_eq!(p, before);
  }

  #[test]
  fn edit_replaces_in_place_and_keeps_id() {
    let mut p = seeded();
    let apple = nth(&p, 1);
    let mut fixed: ParsedProduct = crate::lineitem::parse_line("jabłka 1kg");
    fixed.id = None;
    assert!(p.edit(None, &apple, fixed));
    let edited = &p.uncategorized()[1];
    assert_eq!(edited.name, "jabłka");
    assert_eq!(edited.unit, "kg");
    assert_eq!(edited.id, apple.id);
  }

  #[test]
  fn edit_inside_bucket_stamps_category() {
    let mut p = seeded();
    let milk = nth(&p, 0);
    p.assign("dairy".into(), &milk);
    let new: ParsedProduct = crate::lineitem::parse_line("mleko 1l");
    assert!(p.edit(Some(&"dairy".into()), &milk, new));
    let edited = &p.bucket(&"dairy".into())[0];
    assert_eq!(edited.quantity, 1.0);
    assert_eq!(edited.category_id.as_deref(), Some("dairy"));
  }

  #[test]
  fn edit_in_wrong_collection_is_noop() {
    let mut p = seeded();
    let milk = nth(&p, 0);
    let before = p.clone();
    let new: ParsedProduct = crate::lineitem::parse_line("mleko 1l");
    assert!(!p.edit(Some(&"dairy".into()), &milk, new));
    assert_eq!(p, before);
  }

  #[test]
  fn edit_refuses_identity_collision() {
    let mut p = seeded();
    let (milk, apple) = (nth(&p, 0), nth(&p, 1));
    let before = p.clone();
    assert!(!p.edit(None, &milk, apple));
    assert_eq!(p, before);
  }

  #[test]
  fn into_assignments_returns_buckets() {
    let mut p = seeded();
    let milk = nth(&p, 0);
    p.assign("dairy".into(), &milk);
    let map = p.into_assignments();
    assert_eq!(map.len(), 1);
    assert_eq!(map["dairy"][0].name, "mleko");
  }
}
