//! Best-effort shopping-line parser.
//!
//! Pipeline:
//!   raw &str
//!     └─ find_quantity()   → first numeric token (`200`, `1,5`, `0.25`)
//!          └─ unit_after() → 1–4 letter word right after it, if any
//!               └─ strip the matched span, collapse whitespace → name
//!
//! Parsing never fails. Anything that does not fit degrades to
//! `quantity = 1`, `unit = "szt"`, `name = <trimmed input>`.

use crate::product::{ParsedProduct, RawLineItem, StructuredItem};

/// Unit used when none can be recognised ("sztuka", a piece).
pub const DEFAULT_UNIT: &str = "szt";

/// Name given to structured items that carry neither a name nor source text.
pub const UNNAMED_PRODUCT: &str = "produkt";

/// Longest letter run still treated as a unit (`ml`, `kg`, `szt`, `opak`).
const MAX_UNIT_LEN: usize = 4;

// ─── Token scanning ──────────────────────────────────────────────────────────

struct QuantityMatch {
  /// Byte offset of the first digit.
  start:    usize,
  /// Byte offset one past the last consumed byte (number and unit).
  end:      usize,
  quantity: f64,
  unit:     Option<String>,
}

/// Locate the first integer or decimal number. A single `.` or `,` counts as
/// the decimal separator only when a digit follows it.
fn find_quantity(input: &str) -> Option<QuantityMatch> {
  let bytes = input.as_bytes();
  let start = bytes.iter().position(u8::is_ascii_digit)?;

  let mut end = start;
  while end < bytes.len() && bytes[end].is_ascii_digit() {
    end += 1;
  }
  if end + 1 < bytes.len()
    && matches!(bytes[end], b'.' | b',')
    && bytes[end + 1].is_ascii_digit()
  {
    end += 1;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
      end += 1;
    }
  }

  let quantity = input[start..end]
    .replace(',', ".")
    .parse::<f64>()
    .ok()
    .filter(|q| q.is_finite())
    .unwrap_or(1.0);

  let (unit, end) = match unit_after(&input[end..]) {
    Some((unit, consumed)) => (Some(unit), end + consumed),
    None => (None, end),
  };

  Some(QuantityMatch {
    start,
    end,
    quantity,
    unit,
  })
}

/// Match an optional whitespace gap followed by a whole word of 1–4 letters.
///
/// Returns the lowercased unit and the number of bytes consumed. A longer word
/// (`"banany"`) is not a unit and is left for the name.
fn unit_after(rest: &str) -> Option<(String, usize)> {
  let word = rest.trim_start();
  let gap = rest.len() - word.len();

  let letters = word.chars().take_while(|c| c.is_alphabetic()).count();
  if !(1..=MAX_UNIT_LEN).contains(&letters) {
    return None;
  }
  let len: usize = word.chars().take(letters).map(char::len_utf8).sum();
  Some((word[..len].to_lowercase(), gap + len))
}

fn collapse_whitespace(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse a free-text shopping line.
pub fn parse_line<K>(input: &str) -> ParsedProduct<K> {
  let fallback_name = collapse_whitespace(input);

  let (name, quantity, unit) = match find_quantity(input) {
    Some(m) => {
      let remainder = format!("{} {}", &input[..m.start], &input[m.end..]);
      let name = collapse_whitespace(&remainder);
      let name = if name.is_empty() { fallback_name } else { name };
      (
        name,
        m.quantity,
        m.unit.unwrap_or_else(|| DEFAULT_UNIT.to_owned()),
      )
    }
    None => (fallback_name, 1.0, DEFAULT_UNIT.to_owned()),
  };

  ParsedProduct {
    name,
    quantity,
    unit,
    original: input.to_owned(),
    category_id: None,
    id: None,
  }
}

/// Parse either shape of [`RawLineItem`].
pub fn parse_item<K>(raw: &RawLineItem) -> ParsedProduct<K> {
  match raw {
    RawLineItem::Text(text) => parse_line(text),
    RawLineItem::Structured(item) => parse_structured(item),
  }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
  s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Structured items are coerced through `name`, then `original`, before the
/// placeholder is used.
fn parse_structured<K>(item: &StructuredItem) -> ParsedProduct<K> {
  if let Some(name) = non_empty(&item.name) {
    let quantity = item
      .quantity
      .filter(|q| q.is_finite() && *q > 0.0)
      .unwrap_or(1.0);
    let unit = non_empty(&item.unit).unwrap_or(DEFAULT_UNIT).to_owned();
    let original = item.original.clone().unwrap_or_else(|| name.to_owned());
    return ParsedProduct {
      name: name.to_owned(),
      quantity,
      unit,
      original,
      category_id: None,
      id: item.id.clone(),
    };
  }

  if let Some(original) = item.original.as_deref().filter(|s| !s.trim().is_empty())
  {
    let mut parsed = parse_line(original);
    parsed.id = item.id.clone();
    return parsed;
  }

  ParsedProduct {
    name:        UNNAMED_PRODUCT.to_owned(),
    quantity:    item.quantity.filter(|q| q.is_finite()).unwrap_or(1.0),
    unit:        non_empty(&item.unit).unwrap_or(DEFAULT_UNIT).to_owned(),
    original:    String::new(),
    category_id: None,
    id:          item.id.clone(),
  }
}
