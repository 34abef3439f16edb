//! [`SqliteStore`], the SQLite implementation of [`PlanStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use nutriplan_core::{
  catalog::Category,
  plan::DietPlan,
  store::{Assignments, PlanStore, ProductCorrection},
};

use crate::{
  Error, Result,
  encode::{
    RawAssignment, RawCategory, RawCorrection, RawPlan, encode_days, encode_dt,
    encode_keywords, encode_product, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row mappers ─────────────────────────────────────────────────────────────

const PLAN_COLUMNS: &str = "plan_id, name, client, created_at, days_json";

fn plan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPlan> {
  Ok(RawPlan {
    plan_id:    row.get(0)?,
    name:       row.get(1)?,
    client:     row.get(2)?,
    created_at: row.get(3)?,
    days_json:  row.get(4)?,
  })
}

fn category_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCategory> {
  Ok(RawCategory {
    category_id: row.get(0)?,
    name:        row.get(1)?,
    color:       row.get(2)?,
    icon:        row.get(3)?,
    keywords:    row.get(4)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A plan store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests and throwaway sessions.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert each category unless one with the same id already exists.
  /// Returns how many were inserted.
  pub async fn seed_categories(&self, categories: &[Category]) -> Result<usize> {
    let rows = categories
      .iter()
      .map(|c| {
        Ok((
          c.category_id.clone(),
          c.name.clone(),
          c.color.clone(),
          c.icon.clone(),
          encode_keywords(&c.keywords)?,
        ))
      })
      .collect::<Result<Vec<_>>>()?;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO categories (category_id, name, color, icon, keywords)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (id, name, color, icon, keywords) in &rows {
            inserted += stmt.execute(rusqlite::params![id, name, color, icon, keywords])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    debug!(inserted, "seeded category catalog");
    Ok(inserted)
  }
}

// ─── PlanStore impl ──────────────────────────────────────────────────────────

impl PlanStore for SqliteStore {
  type Error = Error;

  // ── Plans ─────────────────────────────────────────────────────────────────

  async fn save_plan(&self, plan: &DietPlan) -> Result<()> {
    let id_str      = encode_uuid(plan.plan_id);
    let name        = plan.name.clone();
    let client      = plan.client.clone();
    let created_str = encode_dt(plan.created_at);
    let days_json   = encode_days(&plan.days)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO plans (plan_id, name, client, created_at, days_json)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (plan_id) DO UPDATE SET
             name = excluded.name,
             client = excluded.client,
             days_json = excluded.days_json",
          rusqlite::params![id_str, name, client, created_str, days_json],
        )?;
        Ok(())
      })
      .await?;

    debug!(plan_id = %plan.plan_id, "saved plan");
    Ok(())
  }

  async fn get_plan(&self, plan_id: Uuid) -> Result<Option<DietPlan>> {
    let id_str = encode_uuid(plan_id);

    let raw: Option<RawPlan> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE plan_id = ?1"),
            rusqlite::params![id_str],
            plan_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPlan::into_plan).transpose()
  }

  async fn list_plans(&self) -> Result<Vec<DietPlan>> {
    let raws: Vec<RawPlan> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PLAN_COLUMNS} FROM plans ORDER BY created_at DESC, plan_id"
        ))?;
        let rows = stmt
          .query_map([], plan_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlan::into_plan).collect()
  }

  // ── Categorization ────────────────────────────────────────────────────────

  async fn save_assignments(
    &self,
    plan_id:     Uuid,
    assignments: &Assignments,
  ) -> Result<()> {
    let id_str = encode_uuid(plan_id);
    let rows = assignments
      .iter()
      .flat_map(|(category_id, products)| {
        products.iter().enumerate().map(move |(position, product)| {
          Ok((category_id.clone(), position as i64, encode_product(product)?))
        })
      })
      .collect::<Result<Vec<_>>>()?;
    let count = rows.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM assignments WHERE plan_id = ?1",
          rusqlite::params![id_str],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO assignments (plan_id, category_id, position, product_json)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (category_id, position, product_json) in &rows {
            stmt.execute(rusqlite::params![id_str, category_id, position, product_json])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(%plan_id, products = count, "saved assignments");
    Ok(())
  }

  async fn get_assignments(&self, plan_id: Uuid) -> Result<Assignments> {
    let id_str = encode_uuid(plan_id);

    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT category_id, product_json FROM assignments
           WHERE plan_id = ?1
           ORDER BY category_id, position",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawAssignment {
              category_id:  row.get(0)?,
              product_json: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut assignments = Assignments::new();
    for raw in raws {
      let (category_id, product) = raw.into_product()?;
      assignments.entry(category_id).or_default().push(product);
    }
    Ok(assignments)
  }

  async fn record_correction(&self, correction: &ProductCorrection) -> Result<()> {
    if !correction.quantity.is_finite() {
      return Err(Error::InvalidQuantity {
        original: correction.original.clone(),
        quantity: correction.quantity,
      });
    }

    let original    = correction.original.clone();
    let name        = correction.name.clone();
    let quantity    = correction.quantity;
    let unit        = correction.unit.clone();
    let category_id = correction.category_id.clone();
    let at_str      = encode_dt(correction.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO corrections (original, name, quantity, unit, category_id, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![original, name, quantity, unit, category_id, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_corrections(&self, original: &str) -> Result<Vec<ProductCorrection>> {
    let original = original.to_owned();

    let raws: Vec<RawCorrection> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT original, name, quantity, unit, category_id, recorded_at
           FROM corrections
           WHERE original = ?1
           ORDER BY correction_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![original], |row| {
            Ok(RawCorrection {
              original:    row.get(0)?,
              name:        row.get(1)?,
              quantity:    row.get(2)?,
              unit:        row.get(3)?,
              category_id: row.get(4)?,
              recorded_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCorrection::into_correction).collect()
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT category_id, name, color, icon, keywords
           FROM categories
           ORDER BY name, category_id",
        )?;
        let rows = stmt
          .query_map([], category_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn upsert_category(&self, category: &Category) -> Result<()> {
    let id       = category.category_id.clone();
    let name     = category.name.clone();
    let color    = category.color.clone();
    let icon     = category.icon.clone();
    let keywords = encode_keywords(&category.keywords)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (category_id, name, color, icon, keywords)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (category_id) DO UPDATE SET
             name = excluded.name,
             color = excluded.color,
             icon = excluded.icon,
             keywords = excluded.keywords",
          rusqlite::params![id, name, color, icon, keywords],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
