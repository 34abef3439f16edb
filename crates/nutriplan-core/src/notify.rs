//! User-facing notifications.
//!
//! Components that need to tell the user something (a failed save, a
//! refused edit) take a [`Notifier`] instead of reaching for shared state.
//! [`TracingNotifier`] is the default sink.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
  Info,
  Success,
  Warning,
  Error,
}

/// A sink for user-visible messages.
pub trait Notifier {
  fn notify(&self, level: NoticeLevel, message: &str);
}

/// Logs every notice through `tracing` at a matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, level: NoticeLevel, message: &str) {
    match level {
      NoticeLevel::Info | NoticeLevel::Success => {
        tracing::info!(%level, "{message}")
      }
      NoticeLevel::Warning => tracing::warn!("{message}"),
      NoticeLevel::Error => tracing::error!("{message}"),
    }
  }
}

impl<F> Notifier for F
where
  F: Fn(NoticeLevel, &str),
{
  fn notify(&self, level: NoticeLevel, message: &str) { self(level, message) }
}
