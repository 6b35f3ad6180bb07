//! Неизменяемый снимок данных dashboard'а.
//!
//! Записи трёх сущностей + нормализованные строки. При refresh снимок
//! заменяется целиком, строки на месте не мутируются.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use fello_api::{EntityKind, Fellow, Finder, Interaction, ListResponse, Row};

use crate::config::EntityConfig;
use crate::error::TableError;
use crate::facets::ColumnFacets;
use crate::normalize::normalize_all;
use crate::stats::{EntityStats, FellowStats, FinderStats, InteractionStats};
use crate::table::{TableQuery, TableView, build_facets, build_view};

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub fellows: Vec<Fellow>,
    pub finders: Vec<Finder>,
    pub interactions: Vec<Interaction>,
    rows: BTreeMap<EntityKind, Vec<Row>>,
}

/// Формат snapshot-файла: три списка (envelope `{items, ...}` или голый массив).
#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    fellows: ListResponse<Fellow>,
    #[serde(default)]
    finders: ListResponse<Finder>,
    #[serde(default)]
    interactions: ListResponse<Interaction>,
}

impl Snapshot {
    pub fn new(fellows: Vec<Fellow>, finders: Vec<Finder>, interactions: Vec<Interaction>) -> Self {
        let rows = BTreeMap::from([
            (EntityKind::Fellows, normalize_all(&fellows)),
            (EntityKind::Finders, normalize_all(&finders)),
            (EntityKind::Interactions, normalize_all(&interactions)),
        ]);
        tracing::info!(
            fellows = fellows.len(),
            finders = finders.len(),
            interactions = interactions.len(),
            "snapshot built"
        );
        Self {
            fellows,
            finders,
            interactions,
            rows,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, TableError> {
        let file: SnapshotFile = serde_json::from_str(text).map_err(|e| TableError::Snapshot {
            context: "parse",
            detail: e.to_string(),
        })?;
        Ok(Self::new(
            file.fellows.items,
            file.finders.items,
            file.interactions.items,
        ))
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path).map_err(|e| TableError::Snapshot {
            context: "read",
            detail: format!("'{}': {e}", path.display()),
        })?;
        Self::from_json(&text)
    }

    pub fn rows(&self, kind: EntityKind) -> &[Row] {
        self.rows.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.rows(kind).len()
    }

    pub fn view(&self, kind: EntityKind, query: &TableQuery) -> TableView {
        build_view(EntityConfig::for_kind(kind), self.rows(kind), query)
    }

    pub fn facets(&self, kind: EntityKind, query: &TableQuery) -> Vec<ColumnFacets> {
        build_facets(EntityConfig::for_kind(kind), self.rows(kind), query)
    }

    pub fn stats(&self, kind: EntityKind) -> EntityStats {
        match kind {
            EntityKind::Fellows => EntityStats::Fellows(FellowStats::compute(&self.fellows)),
            EntityKind::Finders => EntityStats::Finders(FinderStats::compute(&self.finders)),
            EntityKind::Interactions => {
                EntityStats::Interactions(InteractionStats::compute(&self.interactions))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_accepts_envelopes_and_bare_arrays() {
        let snapshot = Snapshot::from_json(
            r#"{
                "fellows": {"items": [{"id": 1, "status": "active"}, 7], "amount": 2, "next_token": ""},
                "finders": [{"id": "2", "age": "44"}]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.len(EntityKind::Fellows), 1);
        assert_eq!(snapshot.len(EntityKind::Finders), 1);
        assert_eq!(snapshot.len(EntityKind::Interactions), 0);
        assert_eq!(snapshot.rows(EntityKind::Finders)[0].number("age"), Some(44.0));
    }

    #[test]
    fn null_list_does_not_fail_the_snapshot() {
        let snapshot = Snapshot::from_json(r#"{"fellows": null, "finders": [{"id": 3}]}"#).unwrap();
        assert_eq!(snapshot.len(EntityKind::Fellows), 0);
        assert_eq!(snapshot.len(EntityKind::Finders), 1);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = Snapshot::from_json("{not json").unwrap_err();
        assert!(matches!(err, TableError::Snapshot { context: "parse", .. }));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Snapshot::load(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, TableError::Snapshot { context: "read", .. }));
    }

    #[test]
    fn stats_dispatch_by_kind() {
        let snapshot = Snapshot::new(vec![Fellow::default()], Vec::new(), Vec::new());
        match snapshot.stats(EntityKind::Fellows) {
            EntityStats::Fellows(stats) => assert_eq!(stats.total, 1),
            other => panic!("unexpected stats: {other:?}"),
        }
    }
}
