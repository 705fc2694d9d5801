//! Cupo mensual de cambios de ubicación
//!
//! Orientativo: el cliente lo muestra, el servidor no lo aplica.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::dto::vehicle_dto::LocationHistoryResponse;

pub const DEFAULT_MAX_PER_MONTH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub used: u32,
    pub remaining: u32,
    pub max_per_month: u32,
}

impl QuotaStatus {
    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LocationQuota {
    max_per_month: u32,
}

impl Default for LocationQuota {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_MONTH)
    }
}

impl LocationQuota {
    pub fn new(max_per_month: u32) -> Self {
        Self { max_per_month }
    }

    /// Cuenta las entradas de `user_id` en el mes natural de `now`
    pub fn status(&self, entries: &[LocationHistoryResponse], user_id: i64, now: DateTime<Utc>) -> QuotaStatus {
        let used = entries
            .iter()
            .filter(|entry| entry.updated_by == user_id)
            .filter(|entry| entry.created_at.year() == now.year() && entry.created_at.month() == now.month())
            .count() as u32;

        QuotaStatus {
            used,
            remaining: self.max_per_month.saturating_sub(used),
            max_per_month: self.max_per_month,
        }
    }
}
