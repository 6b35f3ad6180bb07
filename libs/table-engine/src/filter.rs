//! Filter Predicate Set.
//!
//! AND между колонками, OR внутри набора значений одной колонки.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use fello_api::{Cell, Row};

use crate::config::{ColumnKind, EntityConfig};

// ════════════════════════════════════════════════════════════════
//  FilterState
// ════════════════════════════════════════════════════════════════

/// Column key → принятые значения (сырые значения или метки bucket'ов).
///
/// Отсутствие ключа = нет фильтра по колонке. Пустой набор не хранится:
/// `set`/`toggle`, опустошившие набор, удаляют ключ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    columns: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Собрать из пар `(column, value)`; повторяющиеся колонки объединяются.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut state = Self::new();
        for (key, value) in pairs {
            let value = value.into();
            if value.is_empty() {
                continue;
            }
            state.columns.entry(key.into()).or_default().insert(value);
        }
        state
    }

    /// Заменить набор значений колонки.
    pub fn set<V: Into<String>>(&mut self, column: &str, values: impl IntoIterator<Item = V>) {
        let values: BTreeSet<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !v.is_empty())
            .collect();
        if values.is_empty() {
            self.columns.remove(column);
        } else {
            self.columns.insert(column.to_string(), values);
        }
    }

    /// Multi-select: добавить значение, если его нет, иначе убрать.
    pub fn toggle(&mut self, column: &str, value: &str) {
        let values = self.columns.entry(column.to_string()).or_default();
        if !values.remove(value) {
            values.insert(value.to_string());
        }
        if values.is_empty() {
            self.columns.remove(column);
        }
    }

    /// Single-select: оставить только `value`; повторный выбор того же
    /// значения (или `None`) снимает фильтр.
    pub fn select_single(&mut self, column: &str, value: Option<&str>) {
        match value {
            Some(v) if !self.is_only(column, v) => self.set(column, [v]),
            _ => self.clear(column),
        }
    }

    pub fn clear(&mut self, column: &str) {
        self.columns.remove(column);
    }

    pub fn reset(&mut self) {
        self.columns.clear();
    }

    pub fn get(&self, column: &str) -> Option<&BTreeSet<String>> {
        self.columns.get(column)
    }

    pub fn is_active(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.columns.iter()
    }

    fn is_only(&self, column: &str, value: &str) -> bool {
        self.get(column)
            .is_some_and(|values| values.len() == 1 && values.contains(value))
    }
}

// ════════════════════════════════════════════════════════════════
//  Predicates
// ════════════════════════════════════════════════════════════════

/// Предикат одной активной колонки, собранный один раз на запрос.
struct ColumnPredicate<'a> {
    key: &'a str,
    kind: ColumnKind,
    accepted: &'a BTreeSet<String>,
}

impl ColumnPredicate<'_> {
    fn accepts(&self, row: &Row) -> bool {
        let Some(cell) = row.cell(self.key) else {
            return false;
        };
        match self.kind {
            ColumnKind::Range(buckets) => cell.as_number().is_some_and(|value| {
                buckets
                    .iter()
                    .filter(|b| self.accepted.contains(b.label))
                    .any(|b| b.contains(value))
            }),
            ColumnKind::Categorical | ColumnKind::Tags => accepts_keys(cell, self.accepted),
        }
    }
}

fn accepts_keys(cell: &Cell, accepted: &BTreeSet<String>) -> bool {
    cell.keys().iter().any(|k| accepted.contains(&**k))
}

/// Набор предикатов для `state`, опционально без колонки `except`.
///
/// Колонки, не объявленные в config, фильтруются как категориальные.
pub struct RowFilter<'a> {
    predicates: Vec<ColumnPredicate<'a>>,
}

impl<'a> RowFilter<'a> {
    pub fn new(config: &EntityConfig, state: &'a FilterState, except: Option<&str>) -> Self {
        let predicates = state
            .iter()
            .filter(|(key, _)| except != Some(key.as_str()))
            .map(|(key, accepted)| ColumnPredicate {
                key: key.as_str(),
                kind: config
                    .column(key)
                    .map_or(ColumnKind::Categorical, |c| c.kind),
                accepted,
            })
            .collect();
        Self { predicates }
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| p.accepts(row))
    }

    pub fn is_noop(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Видимые строки: те, что проходят каждый активный фильтр.
/// Порядок строк сохраняется.
pub fn apply_filters(config: &EntityConfig, rows: &[Row], state: &FilterState) -> Vec<Row> {
    let filter = RowFilter::new(config, state, None);
    rows.iter().filter(|row| filter.matches(row)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys::*;
    use crate::config::{FELLOWS, INTERACTIONS};

    fn fellow(id: &str, status: Option<&str>, age: Option<f64>, tags: &[&str]) -> Row {
        Row::new(id)
            .with(STATUS, Cell::Text(status.map(String::from)))
            .with(AGE, Cell::Number(age))
            .with(CHALLENGES, Cell::Tags(tags.iter().map(|t| t.to_string()).collect()))
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn set_with_empty_values_removes_key() {
        let mut state = FilterState::new();
        state.set(STATUS, ["active"]);
        assert!(state.is_active(STATUS));
        state.set(STATUS, Vec::<String>::new());
        assert!(!state.is_active(STATUS));
        assert!(state.is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut state = FilterState::new();
        state.toggle(STATUS, "active");
        state.toggle(STATUS, "stale");
        assert_eq!(state.get(STATUS).map(BTreeSet::len), Some(2));
        state.toggle(STATUS, "active");
        state.toggle(STATUS, "stale");
        assert!(!state.is_active(STATUS));
    }

    #[test]
    fn select_single_replaces_and_deselects() {
        let mut state = FilterState::new();
        state.select_single(GENDER, Some("Male"));
        state.select_single(GENDER, Some("Female"));
        assert_eq!(state.get(GENDER).unwrap().iter().collect::<Vec<_>>(), ["Female"]);
        state.select_single(GENDER, Some("Female"));
        assert!(!state.is_active(GENDER));
    }

    #[test]
    fn from_pairs_merges_repeated_keys() {
        let state = FilterState::from_pairs([(STATUS, "active"), (STATUS, "stale"), (AGE, "")]);
        assert_eq!(state.len(), 1);
        assert_eq!(state.get(STATUS).unwrap().len(), 2);
    }

    #[test]
    fn or_within_column_and_across_columns() {
        let rows = vec![
            fellow("1", Some("active"), Some(25.0), &["parenting"]),
            fellow("2", Some("stale"), Some(35.0), &["drug_use"]),
            fellow("3", Some("active"), Some(45.0), &["alcohol_use", "parenting"]),
        ];
        let mut state = FilterState::new();
        state.set(STATUS, ["active", "stale"]);
        assert_eq!(ids(&apply_filters(&FELLOWS, &rows, &state)), ["1", "2", "3"]);

        state.set(CHALLENGES, ["parenting"]);
        assert_eq!(ids(&apply_filters(&FELLOWS, &rows, &state)), ["1", "3"]);

        state.set(AGE, ["41-50"]);
        assert_eq!(ids(&apply_filters(&FELLOWS, &rows, &state)), ["3"]);
    }

    #[test]
    fn range_filter_accepts_any_selected_bucket() {
        let rows = vec![
            fellow("1", None, Some(18.0), &[]),
            fellow("2", None, Some(31.0), &[]),
            fellow("3", None, Some(51.0), &[]),
            fellow("4", None, None, &[]),
            fellow("5", None, Some(17.0), &[]),
        ];
        let mut state = FilterState::new();
        state.set(AGE, ["18-30", "51plus"]);
        assert_eq!(ids(&apply_filters(&FELLOWS, &rows, &state)), ["1", "3"]);
    }

    #[test]
    fn null_values_never_match() {
        let rows = vec![fellow("1", None, None, &[]), fellow("2", Some(""), None, &[])];
        let state = FilterState::from_pairs([(STATUS, "active")]);
        assert!(apply_filters(&FELLOWS, &rows, &state).is_empty());
    }

    #[test]
    fn numeric_categorical_matches_canonical_text() {
        let rows = vec![
            Row::new("1").with(DURATION, Cell::Number(Some(30.0))),
            Row::new("2").with(DURATION, Cell::Number(Some(45.0))),
        ];
        let state = FilterState::from_pairs([(DURATION, "30")]);
        assert_eq!(ids(&apply_filters(&INTERACTIONS, &rows, &state)), ["1"]);
    }

    #[test]
    fn undeclared_column_is_categorical() {
        let rows = vec![
            Row::new("1").with("team", Cell::text("blue")),
            Row::new("2").with("team", Cell::text("red")),
        ];
        let state = FilterState::from_pairs([("team", "red")]);
        assert_eq!(ids(&apply_filters(&FELLOWS, &rows, &state)), ["2"]);
    }

    #[test]
    fn except_skips_own_column() {
        let rows = vec![
            fellow("1", Some("active"), Some(25.0), &[]),
            fellow("2", Some("stale"), Some(25.0), &[]),
        ];
        let state = FilterState::from_pairs([(STATUS, "active")]);
        let filter = RowFilter::new(&FELLOWS, &state, Some(STATUS));
        assert!(filter.is_noop());
        assert!(rows.iter().all(|r| filter.matches(r)));
    }
}
