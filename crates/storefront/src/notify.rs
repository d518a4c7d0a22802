//! User-facing cart notifications.
//!
//! Every rejected cart operation produces exactly one [`Notification`]. The
//! store hands it to a [`Notifier`] and moves on; delivery is fire-and-forget.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use rocketshoes_core::ProductId;

/// Language used for notification messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Locale {
    #[serde(rename = "en")]
    En,
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
}

/// Returned when a locale tag is not supported.
#[derive(Debug, thiserror::Error)]
#[error("unsupported locale '{0}' (expected 'en' or 'pt-BR')")]
pub struct UnknownLocale(String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            "pt" | "pt-br" | "pt_br" => Ok(Self::PtBr),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::En => "en",
            Self::PtBr => "pt-BR",
        })
    }
}

/// Which user action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AddFailed,
    RemoveFailed,
    UpdateFailed,
    OutOfStock,
}

impl NotificationKind {
    /// Message text for this kind in the given locale.
    #[must_use]
    pub const fn message(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::AddFailed, Locale::En) => "Could not add the product",
            (Self::AddFailed, Locale::PtBr) => "Erro na adição do produto",
            (Self::RemoveFailed, Locale::En) => "Could not remove the product",
            (Self::RemoveFailed, Locale::PtBr) => "Erro na remoção do produto",
            (Self::UpdateFailed, Locale::En) => "Could not change the product quantity",
            (Self::UpdateFailed, Locale::PtBr) => "Erro na alteração de quantidade do produto",
            (Self::OutOfStock, Locale::En) => "Requested quantity is out of stock",
            (Self::OutOfStock, Locale::PtBr) => "Quantidade solicitada fora de estoque",
        }
    }
}

/// A message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(kind: NotificationKind, product_id: ProductId, locale: Locale) -> Self {
        Self {
            kind,
            message: kind.message(locale).to_string(),
            product_id,
            created_at: Utc::now(),
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
///
/// Used by the server, where the HTTP response already carries the message
/// back to the shopper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::warn!(
            kind = ?notification.kind,
            product_id = %notification.product_id,
            "{}",
            notification.message
        );
    }
}

/// Keeps every notification in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
