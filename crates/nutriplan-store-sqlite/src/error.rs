//! Error type for `nutriplan-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored quantity that is not a finite number.
  #[error("invalid quantity {quantity} in correction for {original:?}")]
  InvalidQuantity { original: String, quantity: f64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
