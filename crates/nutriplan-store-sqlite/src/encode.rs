//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs are hyphenated lowercase strings.
//! Nested structures (plan days, products, keyword lists) are compact JSON.

use chrono::{DateTime, Utc};
use nutriplan_core::{
  catalog::Category,
  plan::{DietDay, DietPlan},
  product::ParsedProduct,
  store::ProductCorrection,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_days(days: &[DietDay]) -> Result<String> {
  Ok(serde_json::to_string(days)?)
}

pub fn encode_product(product: &ParsedProduct) -> Result<String> {
  Ok(serde_json::to_string(product)?)
}

pub fn encode_keywords(keywords: &[String]) -> Result<String> {
  Ok(serde_json::to_string(keywords)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `plans` row.
pub struct RawPlan {
  pub plan_id:    String,
  pub name:       String,
  pub client:     Option<String>,
  pub created_at: String,
  pub days_json:  String,
}

impl RawPlan {
  pub fn into_plan(self) -> Result<DietPlan> {
    Ok(DietPlan {
      plan_id:    decode_uuid(&self.plan_id)?,
      name:       self.name,
      client:     self.client,
      created_at: decode_dt(&self.created_at)?,
      days:       serde_json::from_str(&self.days_json)?,
    })
  }
}

/// One `assignments` row; rows arrive ordered by category then position.
pub struct RawAssignment {
  pub category_id:  String,
  pub product_json: String,
}

impl RawAssignment {
  pub fn into_product(self) -> Result<(String, ParsedProduct)> {
    let product = serde_json::from_str(&self.product_json)?;
    Ok((self.category_id, product))
  }
}

pub struct RawCorrection {
  pub original:    String,
  pub name:        String,
  pub quantity:    f64,
  pub unit:        String,
  pub category_id: Option<String>,
  pub recorded_at: String,
}

impl RawCorrection {
  pub fn into_correction(self) -> Result<ProductCorrection> {
    Ok(ProductCorrection {
      original:    self.original,
      name:        self.name,
      quantity:    self.quantity,
      unit:        self.unit,
      category_id: self.category_id,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

pub struct RawCategory {
  pub category_id: String,
  pub name:        String,
  pub color:       Option<String>,
  pub icon:        Option<String>,
  pub keywords:    String,
}

impl RawCategory {
  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id: self.category_id,
      name:        self.name,
      color:       self.color,
      icon:        self.icon,
      keywords:    serde_json::from_str(&self.keywords)?,
    })
  }
}
