pub mod de;
pub mod records;
pub mod row;

use serde::{Deserialize, Serialize};

pub use records::{
    Fellow, Finder, Interaction, ListResponse, PaymentAccount, StatusChangeReason,
    UserChangeLog,
};
pub use row::{Cell, Row, canonical_number};

// ════════════════════════════════════════════════════════════════
//  Entity Kind
// ════════════════════════════════════════════════════════════════

/// Тип сущности marketplace'а, для которой строится список.
///
/// Одна и та же таблица/фильтры параметризуются этим значением
/// (колонки, bucket'ы, endpoint'ы backend'а).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Помощники (fellows / "fellos" в backend API).
    Fellows,
    /// Ищущие помощи.
    Finders,
    /// Запланированные сессии fellow ↔ finder.
    Interactions,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Fellows,
        EntityKind::Finders,
        EntityKind::Interactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Fellows => "fellows",
            EntityKind::Finders => "finders",
            EntityKind::Interactions => "interactions",
        }
    }

    /// Путь list-endpoint'а в admin API backend'а.
    pub fn list_endpoint(&self) -> &'static str {
        match self {
            EntityKind::Fellows => "/api/admin/fellos/",
            EntityKind::Finders => "/api/admin/finders/",
            EntityKind::Interactions => "/api/admin/interactions/",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fellows" | "fellos" => Ok(EntityKind::Fellows),
            "finders" => Ok(EntityKind::Finders),
            "interactions" => Ok(EntityKind::Interactions),
            other => Err(format!("unknown entity '{other}'")),
        }
    }
}
